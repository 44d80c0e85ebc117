use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};
use crate::rules::ActionKind;
use crate::Character::{Ambassador, Assassin, Captain, Contessa, Duke, Inquisitor};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Character {
    Duke,
    Assassin,
    Captain,
    Ambassador,
    Contessa,
    // replaces the ambassador in the expansion
    Inquisitor,
}

pub static CHARACTER_VARIANTS: [Character; 6] = [
    Duke,
    Assassin,
    Captain,
    Ambassador,
    Contessa,
    Inquisitor,
];

/// Copies of each character shuffled into the deck.
pub const COPIES_PER_CHARACTER: usize = 3;

impl Character {
    pub fn id(self) -> &'static str {
        match self {
            Duke => "duke",
            Assassin => "assassin",
            Captain => "captain",
            Ambassador => "ambassador",
            Contessa => "contessa",
            Inquisitor => "inquisitor",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Duke => "Duke",
            Assassin => "Assassin",
            Captain => "Captain",
            Ambassador => "Ambassador",
            Contessa => "Contessa",
            Inquisitor => "Inquisitor",
        }
    }

    /// Actions this character lets its holder claim.
    pub fn actions(self) -> &'static [ActionKind] {
        match self {
            Duke => &[ActionKind::Tax],
            Assassin => &[ActionKind::Assassinate],
            Captain => &[ActionKind::Steal],
            Ambassador => &[ActionKind::Exchange],
            Contessa => &[],
            Inquisitor => &[ActionKind::ExchangeOne, ActionKind::Examine],
        }
    }

    /// Actions this character can block.
    pub fn blocks(self) -> &'static [ActionKind] {
        match self {
            Duke => &[ActionKind::ForeignAid],
            Assassin => &[],
            Captain | Ambassador | Inquisitor => &[ActionKind::Steal],
            Contessa => &[ActionKind::Assassinate],
        }
    }

    pub fn in_mode(self, mode: GameMode) -> bool {
        match self {
            Ambassador => mode == GameMode::Basic,
            Inquisitor => mode == GameMode::Expansion,
            _ => true,
        }
    }
}

impl Display for Character {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Basic,
    Expansion,
}

impl GameMode {
    /// The five characters that make up the deck in this mode.
    pub fn characters(self) -> impl Iterator<Item = Character> {
        CHARACTER_VARIANTS.iter().copied().filter(move |c| c.in_mode(self))
    }

    pub fn name(self) -> &'static str {
        match self {
            GameMode::Basic => "basic",
            GameMode::Expansion => "expansion",
        }
    }
}

impl Display for GameMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Religion {
    Catholic,
    Protestant,
}

impl Religion {
    pub fn flipped(self) -> Religion {
        match self {
            Religion::Catholic => Religion::Protestant,
            Religion::Protestant => Religion::Catholic,
        }
    }

    /// Starting religion for a seat: even seats catholic, odd seats protestant.
    pub fn for_seat(seat_idx: usize) -> Religion {
        if seat_idx % 2 == 0 {
            Religion::Catholic
        } else {
            Religion::Protestant
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Religion::Catholic => "Catholic",
            Religion::Protestant => "Protestant",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::character::{GameMode, Religion};
    use crate::Character::{Ambassador, Inquisitor};

    #[test]
    fn modes_have_five_characters() {
        let basic: Vec<_> = GameMode::Basic.characters().collect();
        let expansion: Vec<_> = GameMode::Expansion.characters().collect();

        assert_eq!(basic.len(), 5);
        assert_eq!(expansion.len(), 5);

        assert!(basic.contains(&Ambassador));
        assert!(!basic.contains(&Inquisitor));
        assert!(expansion.contains(&Inquisitor));
        assert!(!expansion.contains(&Ambassador));
    }

    #[test]
    fn religion_flips_and_alternates() {
        assert_eq!(Religion::Catholic.flipped(), Religion::Protestant);
        assert_eq!(Religion::Protestant.flipped(), Religion::Catholic);
        assert_eq!(Religion::for_seat(0), Religion::Catholic);
        assert_eq!(Religion::for_seat(1), Religion::Protestant);
        assert_eq!(Religion::for_seat(4), Religion::Catholic);
    }
}
