//! Engine failures. Every one of these is raised before any state is touched,
//! so the caller can simply re-prompt the same participant.

use crate::character::GameMode;
use crate::coup::{Phase, State};
use crate::player::PlayerId;
use crate::rules::ActionKind;
use crate::Character;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoupError {
    #[error("a game needs between {min} and {max} players, got {got}")]
    PlayerCount { min: usize, max: usize, got: usize },

    #[error("player {0} is seated twice")]
    DuplicatePlayer(PlayerId),

    #[error("no game is in progress")]
    GameNotInProgress,

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    #[error("another action is still being resolved")]
    ActionInProgress,

    #[error("there is no pending action")]
    NoPendingAction,

    #[error("the pending action is not waiting for that response")]
    UnexpectedResponse,

    #[error("{0} is not available in {1} mode")]
    ActionUnavailable(ActionKind, GameMode),

    #[error("this move is only available in expansion mode")]
    ExpansionOnly,

    #[error("{player} holds {coins} coins and must coup")]
    MustCoup { player: PlayerId, coins: u32 },

    #[error("not enough coins: {needed} needed, {available} available")]
    InsufficientCoins { needed: u32, available: u32 },

    #[error("{0} requires a target")]
    TargetRequired(ActionKind),

    #[error("{0} does not take a target")]
    UnexpectedTarget(ActionKind),

    #[error("players cannot target themselves")]
    SelfTarget,

    #[error("{0} has already been eliminated")]
    PlayerEliminated(PlayerId),

    #[error("players of the same religion cannot {0} each other")]
    SameReligion(ActionKind),

    #[error("{0} cannot respond to their own claim")]
    OwnClaim(PlayerId),

    #[error("{character} cannot block {action}")]
    InvalidBlock { action: ActionKind, character: Character },

    #[error("{0} does not have to make this decision")]
    NotYourDecision(PlayerId),

    #[error("card index {index} is out of range for a hand of {len}")]
    InvalidCardIndex { index: usize, len: usize },

    #[error("{0} is not the target of the pending action")]
    WrongTarget(PlayerId),

    #[error("only the examined card can be swapped, not card {0}")]
    NotExamined(usize),

    #[error("kept and returned cards do not match the hand being exchanged")]
    InvalidExchange,

    #[error("{0} is required")]
    MissingCharacter(Character),
}

/// Why a table received from elsewhere cannot be played on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("a table seats at most {max} players, got {got}")]
    TooManyPlayers { max: usize, got: usize },

    #[error("player {0} is seated twice")]
    DuplicatePlayer(PlayerId),

    #[error("seat {index} does not exist at a table of {len}")]
    SeatOutOfRange { index: usize, len: usize },

    #[error("{0} is marked alive exactly when holding no cards")]
    AliveMismatch(PlayerId),

    #[error("the table holds {got} cards instead of {expected}")]
    TokenCount { expected: usize, got: usize },

    #[error("a game in progress needs two living players, found {0}")]
    TooFewAlive(usize),

    #[error("the current player {0} has been eliminated")]
    CurrentPlayerEliminated(PlayerId),

    #[error("phase {phase:?} does not match machine state {state:?}")]
    PhaseMismatch { phase: Phase, state: State },

    #[error("machine state {0:?} does not match the pending action")]
    PendingMismatch(State),
}
