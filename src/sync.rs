//! Whole-table snapshot sync between peers.
//!
//! A peer publishes its [`GameState`] after each move it applies; the others
//! pull the newest snapshot and swap it in whole. Snapshots are never merged.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::coup::{Coup, GameState};
use crate::error::StateError;
use crate::room::RoomCode;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot describes an impossible table: {0}")]
    Invalid(#[from] StateError),

    #[error("snapshot version {version} for room {room} is not newer than {latest}")]
    Stale { room: RoomCode, version: u64, latest: u64 },

    #[error("snapshot store failed: {0}")]
    Store(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedSnapshot {
    pub version: u64,
    pub payload: String,
}

pub fn encode_snapshot(state: &GameState) -> Result<String, SyncError> {
    Ok(serde_json::to_string(state)?)
}

/// Parses a peer's snapshot and refuses tables the engine could not play on.
pub fn decode_snapshot(payload: &str) -> Result<GameState, SyncError> {
    let state: GameState = serde_json::from_str(payload)?;
    state.validate()?;
    Ok(state)
}

/// Where snapshots are exchanged. Implementations must reject a publish whose
/// version is not newer than the one they hold.
pub trait SnapshotStore {
    fn publish(&mut self, room: &RoomCode, snapshot: VersionedSnapshot) -> Result<(), SyncError>;

    fn fetch(&self, room: &RoomCode) -> Result<Option<VersionedSnapshot>, SyncError>;
}

/// In-memory store for a single process, used when no shared store is configured.
#[derive(Debug, Default)]
pub struct LocalStore {
    rooms: HashMap<RoomCode, VersionedSnapshot>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for LocalStore {
    fn publish(&mut self, room: &RoomCode, snapshot: VersionedSnapshot) -> Result<(), SyncError> {
        if let Some(latest) = self.rooms.get(room) {
            if snapshot.version <= latest.version {
                return Err(SyncError::Stale { room: room.clone(), version: snapshot.version, latest: latest.version });
            }
        }

        tracing::debug!(%room, version = snapshot.version, "snapshot stored");
        self.rooms.insert(room.clone(), snapshot);
        Ok(())
    }

    fn fetch(&self, room: &RoomCode) -> Result<Option<VersionedSnapshot>, SyncError> {
        Ok(self.rooms.get(room).cloned())
    }
}

/// One peer's view of a room's snapshot stream.
#[derive(Debug, Clone)]
pub struct Mirror {
    room: RoomCode,
    version: u64,
}

impl Mirror {
    pub fn new(room: RoomCode) -> Self {
        Mirror { room, version: 0 }
    }

    pub fn room(&self) -> &RoomCode {
        &self.room
    }

    /// The last version this peer published or applied.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn publish<S: SnapshotStore + ?Sized>(&mut self, store: &mut S, game: &Coup) -> Result<u64, SyncError> {
        let version = self.version + 1;
        let payload = encode_snapshot(game.game_state())?;

        store.publish(&self.room, VersionedSnapshot { version, payload })?;
        self.version = version;
        Ok(version)
    }

    /// Applies the store's snapshot if it is newer than ours. Returns whether it did.
    pub fn pull<S: SnapshotStore + ?Sized>(&mut self, store: &S, game: &mut Coup) -> Result<bool, SyncError> {
        let Some(snapshot) = store.fetch(&self.room)? else {
            return Ok(false);
        };
        if snapshot.version <= self.version {
            return Ok(false);
        }

        let state = decode_snapshot(&snapshot.payload)?;
        game.restore(state)?;
        self.version = snapshot.version;

        tracing::debug!(room = %self.room, version = self.version, "snapshot applied");
        Ok(true)
    }
}
