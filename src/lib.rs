pub mod character;
pub mod config;
pub mod coup;
pub mod deck;
pub mod error;
pub mod log;
pub mod moves;
pub mod outcome;
pub mod player;
pub mod playout;
pub mod ranking;
pub mod room;
pub mod rules;
pub mod sync;

pub use character::{Character, GameMode, Religion};
pub use config::Config;
pub use coup::{AfterLoss, Coup, GameState, PendingAction, Phase, State};
pub use error::{CoupError, StateError};
pub use moves::Move;
pub use outcome::{GameOver, Outcome, WaitingFor};
pub use player::{Player, PlayerId, Seat};
pub use ranking::{rank_players, Ranking};
pub use rules::ActionKind;
