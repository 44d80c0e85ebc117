use serde::{Deserialize, Serialize};
use crate::player::PlayerId;
use crate::ranking::Ranking;
use crate::Character;

/// The decision the engine needs before it can move on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaitingFor {
    /// Any other living player may challenge the pending action, or allow it.
    Challenges,
    /// Any other living player may block the pending action, or allow it.
    Blocks,
    /// The declared block may be challenged, or allowed to stand.
    BlockChallenges,
    /// The actor must pick `keep` cards out of `hand` after an exchange.
    CardSelection {
        player: PlayerId,
        hand: Vec<Character>,
        drawn: Vec<Character>,
        keep: usize,
    },
    /// The player must pick which card to lose.
    CardElimination { player: PlayerId },
    /// The examiner has seen `card` and must decide whether to swap it out.
    CardExamine {
        examiner: PlayerId,
        target: PlayerId,
        card_index: usize,
        card: Character,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOver {
    /// The sole survivor, if exactly one player is left.
    pub winner: Option<PlayerId>,
    pub rankings: Vec<Ranking>,
}

/// What happened after a successful engine call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The input was applied and nothing further is needed for it.
    Resolved,
    Waiting(WaitingFor),
    GameOver(GameOver),
}

impl Outcome {
    pub fn waiting_for(&self) -> Option<&WaitingFor> {
        match self {
            Outcome::Waiting(waiting_for) => Some(waiting_for),
            _ => None,
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self, Outcome::GameOver(_))
    }

    pub fn rankings(&self) -> Option<&[Ranking]> {
        match self {
            Outcome::GameOver(game_over) => Some(&game_over.rankings),
            _ => None,
        }
    }
}
