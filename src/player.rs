use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};
use crate::character::Religion;
use crate::Character;

/// Opaque, externally assigned participant id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        PlayerId(id.to_owned())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        PlayerId(id)
    }
}

impl Display for PlayerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A room member as handed to the engine at game start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: PlayerId,
    pub name: String,
}

impl Seat {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Seat { id: id.into(), name: name.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    // one card per remaining life, more only while an exchange is being decided
    pub hand: Vec<Character>,
    pub coins: u32,
    pub alive: bool,
    pub religion: Option<Religion>,
    pub is_host: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: String, coins: u32) -> Self {
        Player {
            id,
            name,
            hand: Vec::with_capacity(2),
            coins,
            alive: true,
            religion: None,
            is_host: false,
        }
    }

    pub fn holds(&self, character: Character) -> bool {
        self.hand.contains(&character)
    }

    pub fn find(&self, character: Character) -> Option<usize> {
        self.hand.iter().position(|&c| c == character)
    }

    pub fn lives(&self) -> usize {
        self.hand.len()
    }

    pub fn shares_religion_with(&self, other: &Player) -> bool {
        matches!((self.religion, other.religion), (Some(a), Some(b)) if a == b)
    }
}

#[cfg(test)]
mod tests {
    use crate::character::Religion;
    use crate::player::{Player, PlayerId};
    use crate::Character::{Captain, Duke};

    #[test]
    fn religion_is_shared_only_when_both_have_one() {
        let mut a = Player::new(PlayerId::from("a"), "A".into(), 2);
        let mut b = Player::new(PlayerId::from("b"), "B".into(), 2);
        assert!(!a.shares_religion_with(&b));

        a.religion = Some(Religion::Catholic);
        assert!(!a.shares_religion_with(&b));

        b.religion = Some(Religion::Catholic);
        assert!(a.shares_religion_with(&b));

        b.religion = Some(Religion::Protestant);
        assert!(!a.shares_religion_with(&b));
    }

    #[test]
    fn finds_cards() {
        let mut a = Player::new(PlayerId::from("a"), "A".into(), 2);
        a.hand = vec![Captain, Duke];
        assert!(a.holds(Duke));
        assert_eq!(a.find(Duke), Some(1));
        assert_eq!(a.find(crate::Character::Contessa), None);
        assert_eq!(a.lives(), 2);
    }
}
