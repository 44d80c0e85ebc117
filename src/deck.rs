use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use crate::character::{GameMode, COPIES_PER_CHARACTER};
use crate::player::Player;
use crate::Character;

/// Cards on a table in either mode: five characters, three copies each.
pub const DECK_SIZE: usize = 5 * COPIES_PER_CHARACTER;

/// The court deck. The end of the vec is the top of the stack.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Character>,
}

impl Deck {
    /// Three copies of each of the mode's five characters, shuffled.
    pub fn build<R: Rng + ?Sized>(mode: GameMode, rng: &mut R) -> Self {
        let cards = mode.characters()
            .flat_map(|card| std::iter::repeat(card).take(COPIES_PER_CHARACTER))
            .collect();

        let mut deck = Deck { cards };
        deck.shuffle(rng);
        deck
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn draw(&mut self) -> Option<Character> {
        self.cards.pop()
    }

    /// Returns cards to the deck and reshuffles it.
    pub fn return_cards<R, I>(&mut self, cards: I, rng: &mut R)
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = Character>,
    {
        self.cards.extend(cards);
        self.shuffle(rng);
    }

    /// Each player draws `count` cards, in seat order, one player at a time.
    pub fn deal_starting_hands(&mut self, players: &mut [Player], count: usize) {
        for player in players.iter_mut() {
            player.hand.clear();
            for _ in 0..count {
                match self.draw() {
                    Some(card) => player.hand.push(card),
                    None => tracing::warn!(player = %player.id, "deck ran out while dealing"),
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Character] {
        &self.cards
    }

    /// Pulls a specific card out of the deck, used to stage hands in tests.
    #[cfg(test)]
    pub(crate) fn take(&mut self, character: Character) -> Option<Character> {
        let idx = self.cards.iter().position(|&c| c == character)?;
        Some(self.cards.remove(idx))
    }
}
