//! Static rule tables: what every action costs, gives, and who may contest it.
//!
//! The engine never branches on an action at its call sites; it looks the
//! action up here and reads the flags.

use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};
use crate::character::GameMode;
use crate::Character;
use crate::Character::{Ambassador, Assassin, Captain, Contessa, Duke, Inquisitor};

pub const COUP_COST: u32 = 7;
pub const ASSASSINATION_COST: u32 = 3;
/// At or above this many coins the only legal action is a coup.
pub const FORCED_COUP_COINS: u32 = 10;
/// The most coins a single steal can take.
pub const STEAL_AMOUNT: u32 = 2;
/// Which of the target's cards an examination reveals.
pub const EXAMINED_CARD_INDEX: usize = 0;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Income,
    ForeignAid,
    Coup,
    Tax,
    Assassinate,
    Steal,
    Exchange,
    ExchangeOne,
    Examine,
}

pub static ACTION_VARIANTS: [ActionKind; 9] = [
    ActionKind::Income,
    ActionKind::ForeignAid,
    ActionKind::Coup,
    ActionKind::Tax,
    ActionKind::Assassinate,
    ActionKind::Steal,
    ActionKind::Exchange,
    ActionKind::ExchangeOne,
    ActionKind::Examine,
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    None,
    EliminateCard,
    StealCoins,
    ExchangeCards,
    ExchangeOneCard,
    ExamineCard,
}

#[derive(Debug)]
pub struct ActionDefinition {
    pub kind: ActionKind,
    pub name: &'static str,
    pub cost: Option<u32>,
    pub gain: Option<u32>,
    /// The character the actor claims by taking this action, if any.
    pub character: Option<Character>,
    pub challengeable: bool,
    pub blockable: bool,
    pub blockers: &'static [Character],
    pub target_required: bool,
    /// Same-religion pairs are immune to this action in the expansion.
    pub religion_protected: bool,
    pub effect: Effect,
}

static ACTIONS: [ActionDefinition; 9] = [
    ActionDefinition {
        kind: ActionKind::Income,
        name: "Income",
        cost: None,
        gain: Some(1),
        character: None,
        challengeable: false,
        blockable: false,
        blockers: &[],
        target_required: false,
        religion_protected: false,
        effect: Effect::None,
    },
    ActionDefinition {
        kind: ActionKind::ForeignAid,
        name: "Foreign Aid",
        cost: None,
        gain: Some(2),
        character: None,
        challengeable: false,
        blockable: true,
        blockers: &[Duke],
        target_required: false,
        religion_protected: false,
        effect: Effect::None,
    },
    ActionDefinition {
        kind: ActionKind::Coup,
        name: "Coup",
        cost: Some(COUP_COST),
        gain: None,
        character: None,
        challengeable: false,
        blockable: false,
        blockers: &[],
        target_required: true,
        religion_protected: true,
        effect: Effect::EliminateCard,
    },
    ActionDefinition {
        kind: ActionKind::Tax,
        name: "Tax",
        cost: None,
        gain: Some(3),
        character: Some(Duke),
        challengeable: true,
        blockable: false,
        blockers: &[],
        target_required: false,
        religion_protected: false,
        effect: Effect::None,
    },
    ActionDefinition {
        kind: ActionKind::Assassinate,
        name: "Assassinate",
        cost: Some(ASSASSINATION_COST),
        gain: None,
        character: Some(Assassin),
        challengeable: true,
        blockable: true,
        blockers: &[Contessa],
        target_required: true,
        religion_protected: true,
        effect: Effect::EliminateCard,
    },
    ActionDefinition {
        kind: ActionKind::Steal,
        name: "Steal",
        cost: None,
        gain: None,
        character: Some(Captain),
        challengeable: true,
        blockable: true,
        blockers: &[Captain, Ambassador, Inquisitor],
        target_required: true,
        religion_protected: true,
        effect: Effect::StealCoins,
    },
    ActionDefinition {
        kind: ActionKind::Exchange,
        name: "Exchange",
        cost: None,
        gain: None,
        character: Some(Ambassador),
        challengeable: true,
        blockable: false,
        blockers: &[],
        target_required: false,
        religion_protected: false,
        effect: Effect::ExchangeCards,
    },
    ActionDefinition {
        kind: ActionKind::ExchangeOne,
        name: "Exchange (one card)",
        cost: None,
        gain: None,
        character: Some(Inquisitor),
        challengeable: true,
        blockable: false,
        blockers: &[],
        target_required: false,
        religion_protected: false,
        effect: Effect::ExchangeOneCard,
    },
    ActionDefinition {
        kind: ActionKind::Examine,
        name: "Examine",
        cost: None,
        gain: None,
        character: Some(Inquisitor),
        challengeable: true,
        blockable: false,
        blockers: &[],
        target_required: true,
        religion_protected: false,
        effect: Effect::ExamineCard,
    },
];

impl ActionKind {
    pub fn definition(self) -> &'static ActionDefinition {
        let idx = match self {
            ActionKind::Income => 0,
            ActionKind::ForeignAid => 1,
            ActionKind::Coup => 2,
            ActionKind::Tax => 3,
            ActionKind::Assassinate => 4,
            ActionKind::Steal => 5,
            ActionKind::Exchange => 6,
            ActionKind::ExchangeOne => 7,
            ActionKind::Examine => 8,
        };
        &ACTIONS[idx]
    }

    /// The character a challenger disputes when this action is challenged.
    pub fn claimed_character(self) -> Option<Character> {
        self.definition().character
    }

    pub fn name(self) -> &'static str {
        self.definition().name
    }

    pub fn available_in(self, mode: GameMode) -> bool {
        match self.definition().character {
            Some(character) => character.in_mode(mode),
            None => true,
        }
    }

    /// Characters that may block this action in the given mode.
    pub fn blockers(self, mode: GameMode) -> impl Iterator<Item = Character> {
        self.definition().blockers.iter().copied().filter(move |c| c.in_mode(mode))
    }

    pub fn can_be_blocked_by(self, character: Character, mode: GameMode) -> bool {
        self.blockers(mode).any(|c| c == character)
    }

    /// Cards drawn by an exchange effect.
    pub fn exchange_draw_count(self) -> usize {
        match self.definition().effect {
            Effect::ExchangeCards => 2,
            Effect::ExchangeOneCard => 1,
            _ => 0,
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Expansion-only moves paid into (or taken out of) the sanctuary pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanctuaryAction {
    ChangeMyReligion,
    ChangeOtherReligion,
    TakeSanctuary,
}

impl SanctuaryAction {
    pub fn cost(self) -> u32 {
        match self {
            SanctuaryAction::ChangeMyReligion => 1,
            SanctuaryAction::ChangeOtherReligion => 2,
            SanctuaryAction::TakeSanctuary => 0,
        }
    }

    pub fn character(self) -> Option<Character> {
        match self {
            SanctuaryAction::TakeSanctuary => Some(Duke),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SanctuaryAction::ChangeMyReligion => "Change My Religion",
            SanctuaryAction::ChangeOtherReligion => "Change Other's Religion",
            SanctuaryAction::TakeSanctuary => "Take Sanctuary",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::character::GameMode;
    use crate::rules::{ActionKind, Effect, ACTION_VARIANTS};
    use crate::Character::{Ambassador, Captain, Duke, Inquisitor};

    #[test]
    fn table_is_indexed_by_kind() {
        for kind in ACTION_VARIANTS {
            assert_eq!(kind.definition().kind, kind);
        }
    }

    #[test]
    fn challengeable_and_blockable_sets() {
        let challengeable: Vec<_> = ACTION_VARIANTS.iter().filter(|k| k.definition().challengeable).copied().collect();
        assert_eq!(challengeable, vec![
            ActionKind::Tax,
            ActionKind::Assassinate,
            ActionKind::Steal,
            ActionKind::Exchange,
            ActionKind::ExchangeOne,
            ActionKind::Examine,
        ]);

        let blockable: Vec<_> = ACTION_VARIANTS.iter().filter(|k| k.definition().blockable).copied().collect();
        assert_eq!(blockable, vec![ActionKind::ForeignAid, ActionKind::Assassinate, ActionKind::Steal]);

        // every challengeable action names the character it claims
        for kind in challengeable {
            assert!(kind.claimed_character().is_some());
        }
    }

    #[test]
    fn steal_blockers_depend_on_mode() {
        let basic: Vec<_> = ActionKind::Steal.blockers(GameMode::Basic).collect();
        let expansion: Vec<_> = ActionKind::Steal.blockers(GameMode::Expansion).collect();

        assert_eq!(basic, vec![Captain, Ambassador]);
        assert_eq!(expansion, vec![Captain, Inquisitor]);

        assert!(ActionKind::ForeignAid.can_be_blocked_by(Duke, GameMode::Expansion));
        assert!(!ActionKind::Steal.can_be_blocked_by(Inquisitor, GameMode::Basic));
    }

    #[test]
    fn mode_availability() {
        assert!(ActionKind::Exchange.available_in(GameMode::Basic));
        assert!(!ActionKind::Exchange.available_in(GameMode::Expansion));
        assert!(ActionKind::Examine.available_in(GameMode::Expansion));
        assert!(!ActionKind::ExchangeOne.available_in(GameMode::Basic));
        assert!(ActionKind::Income.available_in(GameMode::Expansion));

        assert_eq!(ActionKind::Exchange.exchange_draw_count(), 2);
        assert_eq!(ActionKind::ExchangeOne.exchange_draw_count(), 1);
        assert_eq!(ActionKind::Examine.definition().effect, Effect::ExamineCard);
    }
}
