//! Room Manager
//!
//! Lobby bookkeeping for tables: who is seated where, who hosts, and which
//! rooms are stale. Each room owns its own [`Coup`] engine.
//!
//! Time is passed in by the caller, nothing here reads the clock.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use crate::character::GameMode;
use crate::config::Config;
use crate::coup::{Coup, Phase};
use crate::error::CoupError;
use crate::player::{PlayerId, Seat};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_ATTEMPTS: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        RoomCode(code.to_uppercase())
    }
}

impl Display for RoomCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors from RoomManager operations
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("room not found: {0}")]
    NotFound(RoomCode),

    #[error("room has expired: {0}")]
    Expired(RoomCode),

    #[error("room is full ({0} players)")]
    Full(usize),

    #[error("the game has already started")]
    AlreadyStarted,

    #[error("the name {0:?} is already taken in this room")]
    NameTaken(String),

    #[error("{0} is already in this room")]
    AlreadyJoined(PlayerId),

    #[error("{0} is not in this room")]
    NotMember(PlayerId),

    #[error("only the host can do that, not {0}")]
    NotHost(PlayerId),

    #[error("at least {min} players are needed, the room has {got}")]
    NotEnoughPlayers { min: usize, got: usize },

    #[error("no free room code of length {0}")]
    NoCodeAvailable(usize),

    #[error("game error: {0}")]
    Game(#[from] CoupError),
}

#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    host: PlayerId,
    mode: GameMode,
    members: Vec<Seat>,
    created_at: Instant,
    game: Coup,
}

impl Room {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host(&self) -> &PlayerId {
        &self.host
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Members in join order. This becomes the seating order at game start.
    pub fn members(&self) -> &[Seat] {
        &self.members
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn status(&self) -> Phase {
        self.game.phase()
    }

    pub fn game(&self) -> &Coup {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Coup {
        &mut self.game
    }

    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) > ttl
    }

    fn ensure_host(&self, player: &PlayerId) -> Result<(), RoomError> {
        if &self.host == player {
            Ok(())
        } else {
            Err(RoomError::NotHost(player.clone()))
        }
    }
}

pub struct RoomManager {
    rooms: HashMap<RoomCode, Room>,
    config: Config,
    rng: Pcg64,
}

impl RoomManager {
    pub fn new(config: Config) -> Self {
        Self::with_rng(config, Pcg64::from_entropy())
    }

    pub fn seeded(config: Config, seed: u64) -> Self {
        Self::with_rng(config, Pcg64::seed_from_u64(seed))
    }

    fn with_rng(config: Config, rng: Pcg64) -> Self {
        Self { rooms: HashMap::new(), config, rng }
    }

    pub fn has_room(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn room_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Opens a room with `host` as its only member.
    pub fn create_room(&mut self, host: Seat, mode: GameMode, now: Instant) -> Result<RoomCode, RoomError> {
        let code = self.generate_code()?;
        let game = Coup::seeded(self.config.clone(), self.rng.gen());

        tracing::info!(room = %code, host = %host.id, %mode, "room created");
        self.rooms.insert(code.clone(), Room {
            code: code.clone(),
            host: host.id.clone(),
            mode,
            members: vec![host],
            created_at: now,
            game,
        });

        Ok(code)
    }

    pub fn join_room(&mut self, code: &RoomCode, seat: Seat, now: Instant) -> Result<&Room, RoomError> {
        let ttl = self.ttl();
        let max_players = self.config.max_players;
        let room = self.rooms.get_mut(code).ok_or_else(|| RoomError::NotFound(code.clone()))?;

        if room.is_expired(now, ttl) {
            return Err(RoomError::Expired(code.clone()));
        }
        if room.status() != Phase::Waiting {
            return Err(RoomError::AlreadyStarted);
        }
        if room.members.len() >= max_players {
            return Err(RoomError::Full(max_players));
        }
        if room.members.iter().any(|m| m.id == seat.id) {
            return Err(RoomError::AlreadyJoined(seat.id));
        }
        if room.members.iter().any(|m| m.name == seat.name) {
            return Err(RoomError::NameTaken(seat.name));
        }

        tracing::info!(room = %code, player = %seat.id, "player joined");
        room.members.push(seat);
        Ok(room)
    }

    /// Removes a member. An emptied room is deleted; a departing host hands
    /// the room to the longest-standing member.
    pub fn leave_room(&mut self, code: &RoomCode, player: &PlayerId) -> Result<(), RoomError> {
        let room = self.rooms.get_mut(code).ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let idx = room
            .members
            .iter()
            .position(|m| &m.id == player)
            .ok_or_else(|| RoomError::NotMember(player.clone()))?;

        room.members.remove(idx);
        tracing::info!(room = %code, %player, "player left");

        if room.members.is_empty() {
            self.rooms.remove(code);
            tracing::info!(room = %code, "room closed");
            return Ok(());
        }

        if &room.host == player {
            room.host = room.members[0].id.clone();
            tracing::info!(room = %code, host = %room.host, "host reassigned");
        }

        Ok(())
    }

    pub fn start_game(&mut self, code: &RoomCode, host: &PlayerId) -> Result<&Coup, RoomError> {
        let min_players = self.config.min_players;
        let room = self.rooms.get_mut(code).ok_or_else(|| RoomError::NotFound(code.clone()))?;
        room.ensure_host(host)?;

        if room.status() != Phase::Waiting {
            return Err(RoomError::AlreadyStarted);
        }
        if room.members.len() < min_players {
            return Err(RoomError::NotEnoughPlayers { min: min_players, got: room.members.len() });
        }

        room.game.initialize_game(&room.members, room.mode)?;
        tracing::info!(room = %code, players = room.members.len(), "game started");
        Ok(&room.game)
    }

    /// Clears the finished (or abandoned) game and reopens the lobby.
    pub fn play_again(&mut self, code: &RoomCode, host: &PlayerId) -> Result<(), RoomError> {
        let room = self.rooms.get_mut(code).ok_or_else(|| RoomError::NotFound(code.clone()))?;
        room.ensure_host(host)?;

        room.game.reset();
        tracing::info!(room = %code, "room reopened");
        Ok(())
    }

    /// Drops every room older than the configured lifetime, returning their codes.
    pub fn expire(&mut self, now: Instant) -> Vec<RoomCode> {
        let ttl = self.ttl();
        let expired: Vec<RoomCode> = self.rooms
            .values()
            .filter(|room| room.is_expired(now, ttl))
            .map(|room| room.code.clone())
            .collect();

        for code in &expired {
            self.rooms.remove(code);
            tracing::info!(room = %code, "room expired");
        }
        expired
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.room_ttl_secs)
    }

    fn generate_code(&mut self) -> Result<RoomCode, RoomError> {
        let length = self.config.room_code_length;
        if length == 0 {
            return Err(RoomError::NoCodeAvailable(length));
        }

        for _ in 0..CODE_ATTEMPTS {
            let code: String = (0..length)
                .map(|_| CODE_ALPHABET[self.rng.gen_range(0..CODE_ALPHABET.len())] as char)
                .collect();
            let code = RoomCode(code);
            if !self.rooms.contains_key(&code) {
                return Ok(code);
            }
        }

        tracing::warn!(length, rooms = self.rooms.len(), "room codes exhausted");
        Err(RoomError::NoCodeAvailable(length))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;
    use crate::character::GameMode;
    use crate::config::Config;
    use crate::player::Seat;
    use crate::room::{RoomCode, RoomError, RoomManager, CODE_ALPHABET};

    #[test]
    fn codes_are_uppercase_alphanumeric() {
        let mut manager = RoomManager::seeded(Config::default(), 3);
        let now = Instant::now();

        for n in 0..50 {
            let code = manager.create_room(Seat::new(format!("h{n}"), "Host"), GameMode::Basic, now).unwrap();
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
        assert_eq!(manager.len(), 50);
    }

    #[test]
    fn code_space_runs_out() {
        let config = Config { room_code_length: 1, ..Config::default() };
        let mut manager = RoomManager::seeded(config, 4);
        let now = Instant::now();

        // 36 one-letter codes, so this fails well before the 200th room
        let failure = (0..200).find_map(|n| {
            manager.create_room(Seat::new(format!("h{n}"), "Host"), GameMode::Basic, now).err()
        });
        assert!(matches!(failure, Some(RoomError::NoCodeAvailable(1))));
        assert!(manager.len() <= CODE_ALPHABET.len());

        let config = Config { room_code_length: 0, ..Config::default() };
        let mut manager = RoomManager::seeded(config, 5);
        assert!(matches!(
            manager.create_room(Seat::new("h", "Host"), GameMode::Basic, now),
            Err(RoomError::NoCodeAvailable(0))
        ));
        assert!(manager.is_empty());
    }

    #[test]
    fn codes_are_case_insensitive_on_input() {
        assert_eq!(RoomCode::from("ab12cd").as_str(), "AB12CD");
    }
}
