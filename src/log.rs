use std::collections::VecDeque;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOG_CAPACITY: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub turn: usize,
    pub message: String,
}

/// The table-visible history of a game, newest entry first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl ActionLog {
    pub fn new(capacity: usize) -> Self {
        ActionLog {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, turn: usize, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "coup::log", turn, "{message}");

        self.entries.push_front(LogEntry { turn, message });
        self.entries.truncate(self.capacity);
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ActionLog {
    fn default() -> Self {
        ActionLog::new(DEFAULT_LOG_CAPACITY)
    }
}
