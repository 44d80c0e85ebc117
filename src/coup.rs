//! The turn state machine.
//!
//! One [`Coup`] is one table. Every public method is a single transition: it
//! validates its input against the current [`State`], and either fails without
//! touching anything or applies the whole transition and reports what the table
//! is waiting for next.
//!
//! ```text
//! AwaitingAction --execute_action--> AwaitingChallenge --allow--> AwaitingBlock --allow--> resolve
//!                                        |                             |
//!                                    challenge                       block
//!                                        v                             v
//!                               (loser picks a card)         AwaitingBlockChallenge
//!                                        |                     |              |
//!                              resolve or end turn          allow         challenge
//!                                                       (block stands)  (loser picks a card)
//! ```

use std::fmt::{Debug, Formatter};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use crate::character::{GameMode, Religion};
use crate::config::{Config, MAX_SEATS};
use crate::deck::{Deck, DECK_SIZE};
use crate::error::{CoupError, StateError};
use crate::log::ActionLog;
use crate::outcome::{GameOver, Outcome, WaitingFor};
use crate::player::{Player, PlayerId, Seat};
use crate::ranking::{rank_players, Ranking};
use crate::rules::{ActionKind, Effect, SanctuaryAction, EXAMINED_CARD_INDEX, FORCED_COUP_COINS, STEAL_AMOUNT};
use crate::Character;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Waiting,
    Playing,
    Ended,
}

/// What happens once a player has picked the card they lose.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterLoss {
    EndTurn,
    Resolve,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum State {
    AwaitingAction,
    AwaitingChallenge,
    AwaitingBlock,
    AwaitingBlockChallenge,
    // how many cards the actor keeps
    AwaitingExchange { keep: usize },
    AwaitingExamine,
    // who's going to lose a card, and what to do afterward
    AwaitingElimination { player_idx: usize, then: AfterLoss },
    Ended,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub blocker_idx: usize,
    pub character: Character,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub kind: ActionKind,
    pub actor_idx: usize,
    pub target_idx: Option<usize>,
    pub block: Option<Block>,
    pub challenged: bool,
}

impl PendingAction {
    pub fn claimed_character(&self) -> Option<Character> {
        self.kind.claimed_character()
    }

    pub fn is_blocked(&self) -> bool {
        self.block.is_some()
    }
}

/// Everything that makes up a table, and nothing else. This is what peers exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub mode: GameMode,
    pub phase: Phase,
    pub players: Vec<Player>,
    pub current_player_idx: usize,
    pub turn: usize,
    pub state: State,
    pub pending: Option<PendingAction>,
    pub log: ActionLog,
    pub sanctuary: u32,
    pub deck: Deck,
    pub discard: Vec<Character>,
    // every shuffle draws from here, so peers replaying the same moves stay in step
    pub rng: Pcg64,
}

impl GameState {
    pub fn new(log_capacity: usize, rng: Pcg64) -> Self {
        GameState {
            mode: GameMode::Basic,
            phase: Phase::Waiting,
            players: Vec::new(),
            current_player_idx: 0,
            turn: 0,
            state: State::AwaitingAction,
            pending: None,
            log: ActionLog::new(log_capacity),
            sanctuary: 0,
            deck: Deck::default(),
            discard: Vec::new(),
            rng,
        }
    }

    /// Cards in the deck, in every hand, and in the discard pile.
    pub fn token_count(&self) -> usize {
        self.deck.len() + self.discard.len() + self.players.iter().map(|p| p.hand.len()).sum::<usize>()
    }

    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.alive).count()
    }

    /// Checks that a table is one the engine could have produced, as far as
    /// every index it will follow and every count it relies on.
    pub fn validate(&self) -> Result<(), StateError> {
        let len = self.players.len();
        if len > MAX_SEATS {
            return Err(StateError::TooManyPlayers { max: MAX_SEATS, got: len });
        }
        for (idx, player) in self.players.iter().enumerate() {
            if self.players[..idx].iter().any(|other| other.id == player.id) {
                return Err(StateError::DuplicatePlayer(player.id.clone()));
            }
        }
        if (self.phase == Phase::Ended) != (self.state == State::Ended) {
            return Err(StateError::PhaseMismatch { phase: self.phase, state: self.state });
        }
        if self.phase == Phase::Waiting {
            return Ok(());
        }

        if let Some(player) = self.players.iter().find(|p| p.alive == p.hand.is_empty()) {
            return Err(StateError::AliveMismatch(player.id.clone()));
        }
        if self.token_count() != DECK_SIZE {
            return Err(StateError::TokenCount { expected: DECK_SIZE, got: self.token_count() });
        }
        if self.phase == Phase::Ended {
            return Ok(());
        }

        if self.alive_count() < 2 {
            return Err(StateError::TooFewAlive(self.alive_count()));
        }
        let current = self.seat(self.current_player_idx)?;
        if !current.alive {
            return Err(StateError::CurrentPlayerEliminated(current.id.clone()));
        }

        let awaiting_turn = self.state == State::AwaitingAction;
        if awaiting_turn == self.pending.is_some() {
            return Err(StateError::PendingMismatch(self.state));
        }
        if let Some(pending) = &self.pending {
            self.seat(pending.actor_idx)?;
            if let Some(target_idx) = pending.target_idx {
                self.seat(target_idx)?;
            }
            if let Some(block) = &pending.block {
                self.seat(block.blocker_idx)?;
            }
        }
        if let State::AwaitingElimination { player_idx, .. } = self.state {
            self.seat(player_idx)?;
        }

        Ok(())
    }

    fn seat(&self, index: usize) -> Result<&Player, StateError> {
        self.players.get(index).ok_or(StateError::SeatOutOfRange { index, len: self.players.len() })
    }
}

#[derive(Clone)]
pub struct Coup {
    game: GameState,
    config: Config,
}

impl Debug for Coup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "T {} | P {} | {:?} | {:?}", self.game.turn, self.game.current_player_idx, self.game.state, self.game.pending)?;
        for (player_idx, player) in self.game.players.iter().enumerate() {
            writeln!(f, "\tP {player_idx}: ${} | {:?} | {:?}", player.coins, player.hand, player.religion)?;
        }
        Ok(())
    }
}

impl Coup {
    pub fn new(config: Config) -> Self {
        Self::with_rng(config, Pcg64::from_entropy())
    }

    /// A table whose every shuffle is determined by `seed`.
    pub fn seeded(config: Config, seed: u64) -> Self {
        Self::with_rng(config, Pcg64::seed_from_u64(seed))
    }

    fn with_rng(config: Config, rng: Pcg64) -> Self {
        Coup {
            game: GameState::new(config.log_capacity, rng),
            config,
        }
    }

    /// Back to an empty table waiting for a new game.
    pub fn reset(&mut self) {
        self.game = GameState::new(self.config.log_capacity, self.game.rng.clone());
    }

    pub fn initialize_game(&mut self, seats: &[Seat], mode: GameMode) -> Result<(), CoupError> {
        let min = self.config.min_players.max(2);
        let max = self.config.max_players.min(MAX_SEATS);
        if seats.len() < min || seats.len() > max {
            return Err(CoupError::PlayerCount { min, max, got: seats.len() });
        }
        for (idx, seat) in seats.iter().enumerate() {
            if seats[..idx].iter().any(|other| other.id == seat.id) {
                return Err(CoupError::DuplicatePlayer(seat.id.clone()));
            }
        }

        let mut players: Vec<Player> = seats
            .iter()
            .enumerate()
            .map(|(idx, seat)| {
                let mut player = Player::new(seat.id.clone(), seat.name.clone(), self.config.starting_coins);
                player.is_host = idx == 0;
                if mode == GameMode::Expansion {
                    player.religion = Some(Religion::for_seat(idx));
                }
                player
            })
            .collect();

        let mut rng = self.game.rng.clone();
        let mut deck = Deck::build(mode, &mut rng);
        deck.deal_starting_hands(&mut players, self.config.starting_cards);
        deck.shuffle(&mut rng);

        self.game = GameState {
            mode,
            phase: Phase::Playing,
            players,
            current_player_idx: 0,
            turn: 0,
            state: State::AwaitingAction,
            pending: None,
            log: ActionLog::new(self.config.log_capacity),
            sanctuary: 0,
            deck,
            discard: Vec::new(),
            rng,
        };

        tracing::info!(players = seats.len(), %mode, "game initialized");
        self.log(format!("The game has started ({mode} mode)."));
        self.log(format!("It is {}'s turn.", self.name(0)));
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn game_state(&self) -> &GameState {
        &self.game
    }

    pub fn snapshot(&self) -> GameState {
        self.game.clone()
    }

    /// Swaps in a table received from elsewhere, returning the one it replaces.
    /// A table that fails [`GameState::validate`] is refused and nothing changes.
    pub fn restore(&mut self, snapshot: GameState) -> Result<GameState, StateError> {
        snapshot.validate()?;
        Ok(std::mem::replace(&mut self.game, snapshot))
    }

    pub fn phase(&self) -> Phase {
        self.game.phase
    }

    pub fn state(&self) -> State {
        self.game.state
    }

    pub fn mode(&self) -> GameMode {
        self.game.mode
    }

    pub fn pending_action(&self) -> Option<&PendingAction> {
        self.game.pending.as_ref()
    }

    pub fn players(&self) -> &[Player] {
        &self.game.players
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.game.players.get(self.game.current_player_idx)
    }

    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.game.players.iter().filter(|p| p.alive)
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.game.players.iter().find(|p| &p.id == id)
    }

    pub fn is_same_religion(&self, a: &PlayerId, b: &PlayerId) -> bool {
        match (self.player(a), self.player(b)) {
            (Some(a), Some(b)) => a.shares_religion_with(b),
            _ => false,
        }
    }

    pub fn action_name(kind: ActionKind) -> &'static str {
        kind.name()
    }

    pub fn rankings(&self) -> Vec<Ranking> {
        rank_players(&self.game.players)
    }

    pub fn winner(&self) -> Option<&Player> {
        if self.game.phase == Phase::Ended && self.game.alive_count() == 1 {
            self.alive_players().next()
        } else {
            None
        }
    }

    pub fn execute_action(&mut self, kind: ActionKind, target: Option<&PlayerId>) -> Result<Outcome, CoupError> {
        self.ensure_playing()?;
        if self.game.state != State::AwaitingAction || self.game.pending.is_some() {
            return Err(CoupError::ActionInProgress);
        }

        let actor_idx = self.game.current_player_idx;
        let target_idx = self.validate_action(actor_idx, kind, target)?;
        let definition = kind.definition();

        self.game.pending = Some(PendingAction {
            kind,
            actor_idx,
            target_idx,
            block: None,
            challenged: false,
        });

        if definition.challengeable || definition.blockable {
            match target_idx {
                Some(target_idx) => self.log(format!("{} attempts {kind} on {}.", self.name(actor_idx), self.name(target_idx))),
                None => self.log(format!("{} attempts {kind}.", self.name(actor_idx))),
            }
        }

        if definition.challengeable {
            self.game.state = State::AwaitingChallenge;
            tracing::debug!(%kind, "awaiting challenges");
            return Ok(Outcome::Waiting(WaitingFor::Challenges));
        }

        if definition.blockable {
            self.game.state = State::AwaitingBlock;
            tracing::debug!(%kind, "awaiting blocks");
            return Ok(Outcome::Waiting(WaitingFor::Blocks));
        }

        self.resolve()
    }

    /// Challenges the pending action, or the block against it once one is declared.
    pub fn process_challenge(&mut self, challenger: &PlayerId) -> Result<Outcome, CoupError> {
        self.ensure_playing()?;
        let pending = self.game.pending.ok_or(CoupError::NoPendingAction)?;
        let challenger_idx = self.player_idx(challenger)?;

        match self.game.state {
            State::AwaitingChallenge => self.challenge_action(pending, challenger_idx),
            State::AwaitingBlockChallenge => self.challenge_block(pending, challenger_idx),
            _ => Err(CoupError::UnexpectedResponse),
        }
    }

    pub fn process_block(&mut self, blocker: &PlayerId, character: Character) -> Result<Outcome, CoupError> {
        self.ensure_playing()?;
        let pending = self.game.pending.ok_or(CoupError::NoPendingAction)?;
        if self.game.state != State::AwaitingBlock {
            return Err(CoupError::UnexpectedResponse);
        }

        let blocker_idx = self.player_idx(blocker)?;
        self.ensure_responder(blocker_idx, pending.actor_idx)?;
        if !pending.kind.can_be_blocked_by(character, self.game.mode) {
            return Err(CoupError::InvalidBlock { action: pending.kind, character });
        }

        if let Some(pending) = self.game.pending.as_mut() {
            pending.block = Some(Block { blocker_idx, character });
        }
        self.game.state = State::AwaitingBlockChallenge;

        self.log(format!("{} blocks the {} claiming the {character}.", self.name(blocker_idx), pending.kind));
        Ok(Outcome::Waiting(WaitingFor::BlockChallenges))
    }

    /// Nobody contests the open window: challenges give way to blocks, blocks
    /// give way to resolution, and an unchallenged block stands.
    pub fn resolve_action(&mut self) -> Result<Outcome, CoupError> {
        self.ensure_playing()?;
        let pending = self.game.pending.ok_or(CoupError::NoPendingAction)?;

        match self.game.state {
            State::AwaitingChallenge => {
                if pending.kind.definition().blockable {
                    self.game.state = State::AwaitingBlock;
                    tracing::debug!(kind = %pending.kind, "unchallenged, awaiting blocks");
                    Ok(Outcome::Waiting(WaitingFor::Blocks))
                } else {
                    self.resolve()
                }
            }
            State::AwaitingBlock => self.resolve(),
            State::AwaitingBlockChallenge => {
                self.log(format!("The {} is blocked.", pending.kind));
                self.finish_turn()
            }
            _ => Err(CoupError::UnexpectedResponse),
        }
    }

    pub fn complete_exchange(&mut self, player: &PlayerId, kept: &[Character], returned: &[Character]) -> Result<Outcome, CoupError> {
        self.ensure_playing()?;
        let keep = match self.game.state {
            State::AwaitingExchange { keep } => keep,
            _ => return Err(CoupError::UnexpectedResponse),
        };
        let pending = self.game.pending.ok_or(CoupError::NoPendingAction)?;
        let player_idx = self.player_idx(player)?;
        if player_idx != pending.actor_idx {
            return Err(CoupError::NotYourDecision(player.clone()));
        }
        if kept.len() != keep {
            return Err(CoupError::InvalidExchange);
        }

        let mut offered = self.game.players[player_idx].hand.clone();
        let mut chosen: Vec<Character> = kept.iter().chain(returned).copied().collect();
        offered.sort();
        chosen.sort();
        if offered != chosen {
            return Err(CoupError::InvalidExchange);
        }

        self.game.players[player_idx].hand = kept.to_vec();
        self.game.deck.return_cards(returned.iter().copied(), &mut self.game.rng);

        self.log(format!("{} completes the exchange.", self.name(player_idx)));
        self.finish_turn()
    }

    /// `card_index` only matters when swapping, and must be the examined card.
    pub fn complete_examine(&mut self, examiner: &PlayerId, target: &PlayerId, card_index: usize, should_swap: bool) -> Result<Outcome, CoupError> {
        self.ensure_playing()?;
        if self.game.state != State::AwaitingExamine {
            return Err(CoupError::UnexpectedResponse);
        }
        let pending = self.game.pending.ok_or(CoupError::NoPendingAction)?;
        let examiner_idx = self.player_idx(examiner)?;
        if examiner_idx != pending.actor_idx {
            return Err(CoupError::NotYourDecision(examiner.clone()));
        }
        let target_idx = self.player_idx(target)?;
        if Some(target_idx) != pending.target_idx {
            return Err(CoupError::WrongTarget(target.clone()));
        }

        if should_swap {
            let len = self.game.players[target_idx].hand.len();
            if card_index >= len {
                return Err(CoupError::InvalidCardIndex { index: card_index, len });
            }
            if card_index != EXAMINED_CARD_INDEX {
                return Err(CoupError::NotExamined(card_index));
            }

            match self.game.deck.draw() {
                Some(card) => {
                    let examined = std::mem::replace(&mut self.game.players[target_idx].hand[card_index], card);
                    self.game.deck.return_cards([examined], &mut self.game.rng);
                    self.log(format!("{} makes {} swap the examined card.", self.name(examiner_idx), self.name(target_idx)));
                }
                None => {
                    tracing::warn!("deck is empty, examined card stays");
                    self.log(format!("The deck is empty; {} keeps the examined card.", self.name(target_idx)));
                }
            }
        } else {
            self.log(format!("{} lets {} keep the examined card.", self.name(examiner_idx), self.name(target_idx)));
        }

        self.finish_turn()
    }

    pub fn complete_elimination(&mut self, player: &PlayerId, card_index: usize) -> Result<Outcome, CoupError> {
        self.ensure_playing()?;
        let (loser_idx, then) = match self.game.state {
            State::AwaitingElimination { player_idx, then } => (player_idx, then),
            _ => return Err(CoupError::UnexpectedResponse),
        };
        let player_idx = self.player_idx(player)?;
        if player_idx != loser_idx {
            return Err(CoupError::NotYourDecision(player.clone()));
        }
        let len = self.game.players[player_idx].hand.len();
        if card_index >= len {
            return Err(CoupError::InvalidCardIndex { index: card_index, len });
        }

        let card = self.game.players[player_idx].hand.remove(card_index);
        self.discard_card(player_idx, card);

        if let Some(game_over) = self.check_game_over() {
            return Ok(game_over);
        }
        self.continue_after(then)
    }

    /// Flips a religion, paying into the sanctuary. Does not end the turn.
    pub fn change_religion(&mut self, player: &PlayerId, target: Option<&PlayerId>) -> Result<Outcome, CoupError> {
        let (action, actor_idx, target_idx) = self.validate_religion_change(player, target)?;
        let cost = action.cost();

        self.game.players[actor_idx].coins -= cost;
        self.game.sanctuary += cost;

        let target_player = &mut self.game.players[target_idx];
        let religion = target_player.religion.map_or(Religion::Catholic, Religion::flipped);
        target_player.religion = Some(religion);

        if actor_idx == target_idx {
            self.log(format!("{} converts to {}.", self.name(actor_idx), religion.name()));
        } else {
            self.log(format!("{} converts {} to {}.", self.name(actor_idx), self.name(target_idx), religion.name()));
        }
        Ok(Outcome::Resolved)
    }

    /// Claims the whole sanctuary pool with a Duke. Does not end the turn.
    pub fn take_sanctuary(&mut self, player: &PlayerId) -> Result<Outcome, CoupError> {
        let player_idx = self.validate_take_sanctuary(player)?;

        let coins = std::mem::take(&mut self.game.sanctuary);
        self.game.players[player_idx].coins += coins;

        self.log(format!("{} takes {coins} coins from the sanctuary.", self.name(player_idx)));
        Ok(Outcome::Resolved)
    }

    /// Passes the turn to the next living player. Refuses while an action is pending.
    pub fn next_turn(&mut self) -> Result<Outcome, CoupError> {
        self.ensure_playing()?;
        if self.game.state != State::AwaitingAction || self.game.pending.is_some() {
            return Err(CoupError::ActionInProgress);
        }
        Ok(self.advance_turn())
    }

    pub(crate) fn validate_action(&self, actor_idx: usize, kind: ActionKind, target: Option<&PlayerId>) -> Result<Option<usize>, CoupError> {
        let mode = self.game.mode;
        let actor = &self.game.players[actor_idx];
        let definition = kind.definition();

        if !kind.available_in(mode) {
            return Err(CoupError::ActionUnavailable(kind, mode));
        }
        if actor.coins >= FORCED_COUP_COINS && kind != ActionKind::Coup {
            return Err(CoupError::MustCoup { player: actor.id.clone(), coins: actor.coins });
        }
        if let Some(cost) = definition.cost {
            if actor.coins < cost {
                return Err(CoupError::InsufficientCoins { needed: cost, available: actor.coins });
            }
        }

        if !definition.target_required {
            return match target {
                Some(_) => Err(CoupError::UnexpectedTarget(kind)),
                None => Ok(None),
            };
        }

        let target = target.ok_or(CoupError::TargetRequired(kind))?;
        let target_idx = self.player_idx(target)?;
        self.validate_target(actor_idx, target_idx)?;

        if mode == GameMode::Expansion && definition.religion_protected && actor.shares_religion_with(&self.game.players[target_idx]) {
            return Err(CoupError::SameReligion(kind));
        }

        Ok(Some(target_idx))
    }

    pub(crate) fn validate_religion_change(&self, player: &PlayerId, target: Option<&PlayerId>) -> Result<(SanctuaryAction, usize, usize), CoupError> {
        self.ensure_playing()?;
        if self.game.mode != GameMode::Expansion {
            return Err(CoupError::ExpansionOnly);
        }
        let actor_idx = self.ensure_turn_move(player)?;

        let (action, target_idx) = match target {
            None => (SanctuaryAction::ChangeMyReligion, actor_idx),
            Some(target) => {
                let target_idx = self.player_idx(target)?;
                self.validate_target(actor_idx, target_idx)?;
                (SanctuaryAction::ChangeOtherReligion, target_idx)
            }
        };

        let actor = &self.game.players[actor_idx];
        // a forced coup with nobody to coup may convert instead
        if actor.coins >= FORCED_COUP_COINS && self.has_coup_target(actor_idx) {
            return Err(CoupError::MustCoup { player: actor.id.clone(), coins: actor.coins });
        }
        if actor.coins < action.cost() {
            return Err(CoupError::InsufficientCoins { needed: action.cost(), available: actor.coins });
        }

        Ok((action, actor_idx, target_idx))
    }

    pub(crate) fn validate_take_sanctuary(&self, player: &PlayerId) -> Result<usize, CoupError> {
        self.ensure_playing()?;
        if self.game.mode != GameMode::Expansion {
            return Err(CoupError::ExpansionOnly);
        }
        let player_idx = self.ensure_turn_move(player)?;

        let actor = &self.game.players[player_idx];
        if actor.coins >= FORCED_COUP_COINS {
            return Err(CoupError::MustCoup { player: actor.id.clone(), coins: actor.coins });
        }
        if let Some(character) = SanctuaryAction::TakeSanctuary.character() {
            if !actor.holds(character) {
                return Err(CoupError::MissingCharacter(character));
            }
        }

        Ok(player_idx)
    }

    /// The player whose claim the open window is about: the actor, or the blocker.
    pub(crate) fn claimant_idx(&self) -> Option<usize> {
        let pending = self.game.pending.as_ref()?;
        match self.game.state {
            State::AwaitingChallenge | State::AwaitingBlock => Some(pending.actor_idx),
            State::AwaitingBlockChallenge => pending.block.map(|block| block.blocker_idx),
            _ => None,
        }
    }

    pub(crate) fn player_idx(&self, id: &PlayerId) -> Result<usize, CoupError> {
        self.game.players
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| CoupError::UnknownPlayer(id.clone()))
    }

    fn ensure_playing(&self) -> Result<(), CoupError> {
        if self.game.phase == Phase::Playing {
            Ok(())
        } else {
            Err(CoupError::GameNotInProgress)
        }
    }

    fn ensure_turn_move(&self, player: &PlayerId) -> Result<usize, CoupError> {
        let player_idx = self.player_idx(player)?;
        if self.game.state != State::AwaitingAction || self.game.pending.is_some() {
            return Err(CoupError::ActionInProgress);
        }
        if player_idx != self.game.current_player_idx {
            return Err(CoupError::NotYourTurn(player.clone()));
        }
        Ok(player_idx)
    }

    pub(crate) fn ensure_responder(&self, responder_idx: usize, claimant_idx: usize) -> Result<(), CoupError> {
        let responder = &self.game.players[responder_idx];
        if responder_idx == claimant_idx {
            return Err(CoupError::OwnClaim(responder.id.clone()));
        }
        if !responder.alive {
            return Err(CoupError::PlayerEliminated(responder.id.clone()));
        }
        Ok(())
    }

    fn validate_target(&self, actor_idx: usize, target_idx: usize) -> Result<(), CoupError> {
        if actor_idx == target_idx {
            return Err(CoupError::SelfTarget);
        }
        let target = &self.game.players[target_idx];
        if !target.alive {
            return Err(CoupError::PlayerEliminated(target.id.clone()));
        }
        Ok(())
    }

    pub(crate) fn has_coup_target(&self, actor_idx: usize) -> bool {
        let actor = &self.game.players[actor_idx];
        let expansion = self.game.mode == GameMode::Expansion;
        self.game.players
            .iter()
            .enumerate()
            .any(|(idx, p)| idx != actor_idx && p.alive && !(expansion && actor.shares_religion_with(p)))
    }

    fn challenge_action(&mut self, pending: PendingAction, challenger_idx: usize) -> Result<Outcome, CoupError> {
        self.ensure_responder(challenger_idx, pending.actor_idx)?;
        let claimed = pending.claimed_character().ok_or(CoupError::UnexpectedResponse)?;
        let actor_idx = pending.actor_idx;

        if let Some(pending) = self.game.pending.as_mut() {
            pending.challenged = true;
        }
        self.log(format!("{} challenges {}'s claim to the {claimed}.", self.name(challenger_idx), self.name(actor_idx)));

        match self.game.players[actor_idx].find(claimed) {
            Some(card_idx) => {
                self.log(format!("{} reveals the {claimed}. The challenge fails.", self.name(actor_idx)));
                self.replace_influence_card(actor_idx, card_idx);
                self.eliminate_card(challenger_idx, AfterLoss::Resolve)
            }
            None => {
                self.log(format!("{} does not hold the {claimed}. The {} is void.", self.name(actor_idx), pending.kind));
                self.eliminate_card(actor_idx, AfterLoss::EndTurn)
            }
        }
    }

    fn challenge_block(&mut self, pending: PendingAction, challenger_idx: usize) -> Result<Outcome, CoupError> {
        let block = pending.block.ok_or(CoupError::UnexpectedResponse)?;
        self.ensure_responder(challenger_idx, block.blocker_idx)?;
        let character = block.character;

        self.log(format!("{} challenges {}'s block with the {character}.", self.name(challenger_idx), self.name(block.blocker_idx)));

        match self.game.players[block.blocker_idx].find(character) {
            Some(card_idx) => {
                self.log(format!("{} reveals the {character}. The {} is blocked.", self.name(block.blocker_idx), pending.kind));
                self.replace_influence_card(block.blocker_idx, card_idx);
                self.eliminate_card(challenger_idx, AfterLoss::EndTurn)
            }
            None => {
                self.log(format!("{} does not hold the {character}. The block fails.", self.name(block.blocker_idx)));
                if let Some(pending) = self.game.pending.as_mut() {
                    pending.block = None;
                }
                self.eliminate_card(block.blocker_idx, AfterLoss::Resolve)
            }
        }
    }

    /// Applies the pending action's effect. Runs at most once per pending action.
    fn resolve(&mut self) -> Result<Outcome, CoupError> {
        let pending = self.game.pending.ok_or(CoupError::NoPendingAction)?;
        let definition = pending.kind.definition();
        let actor_idx = pending.actor_idx;

        if let Some(cost) = definition.cost {
            let actor = &mut self.game.players[actor_idx];
            actor.coins = actor.coins.saturating_sub(cost);
        }

        if let Some(target_idx) = pending.target_idx {
            // the target could already be dead from losing a challenge
            if !self.game.players[target_idx].alive {
                self.log(format!("{} is already out. The {} has no effect.", self.name(target_idx), pending.kind));
                return self.finish_turn();
            }
        }

        if let Some(gain) = definition.gain {
            self.game.players[actor_idx].coins += gain;
            self.log(format!("{} collects {gain} coins with {}.", self.name(actor_idx), pending.kind));
        }

        match (definition.effect, pending.target_idx) {
            (Effect::EliminateCard, Some(target_idx)) => {
                self.log(format!("{} launches a {} against {}.", self.name(actor_idx), pending.kind, self.name(target_idx)));
                return self.eliminate_card(target_idx, AfterLoss::EndTurn);
            }
            (Effect::StealCoins, Some(target_idx)) => {
                let amount = self.game.players[target_idx].coins.min(STEAL_AMOUNT);
                self.game.players[target_idx].coins -= amount;
                self.game.players[actor_idx].coins += amount;
                self.log(format!("{} steals {amount} coins from {}.", self.name(actor_idx), self.name(target_idx)));
            }
            (Effect::ExchangeCards | Effect::ExchangeOneCard, _) => {
                return Ok(self.begin_exchange(actor_idx, pending.kind.exchange_draw_count()));
            }
            (Effect::ExamineCard, Some(target_idx)) => {
                return Ok(self.begin_examine(actor_idx, target_idx));
            }
            _ => {}
        }

        self.finish_turn()
    }

    fn begin_exchange(&mut self, actor_idx: usize, count: usize) -> Outcome {
        let keep = self.game.players[actor_idx].hand.len();

        let mut drawn = Vec::with_capacity(count);
        for _ in 0..count {
            match self.game.deck.draw() {
                Some(card) => drawn.push(card),
                None => {
                    tracing::warn!(requested = count, drawn = drawn.len(), "deck ran out during exchange");
                    break;
                }
            }
        }

        if drawn.is_empty() {
            self.log(format!("The deck is empty; {} keeps their cards.", self.name(actor_idx)));
            return self.finish_turn_outcome();
        }

        let actor = &mut self.game.players[actor_idx];
        actor.hand.extend_from_slice(&drawn);
        let hand = actor.hand.clone();
        let player = actor.id.clone();

        self.game.state = State::AwaitingExchange { keep };
        self.log(format!("{} draws {} cards to exchange.", self.name(actor_idx), drawn.len()));

        Outcome::Waiting(WaitingFor::CardSelection { player, hand, drawn, keep })
    }

    fn begin_examine(&mut self, examiner_idx: usize, target_idx: usize) -> Outcome {
        let card = match self.game.players[target_idx].hand.get(EXAMINED_CARD_INDEX) {
            Some(&card) => card,
            None => return self.finish_turn_outcome(),
        };

        self.game.state = State::AwaitingExamine;
        self.log(format!("{} examines one of {}'s cards.", self.name(examiner_idx), self.name(target_idx)));

        Outcome::Waiting(WaitingFor::CardExamine {
            examiner: self.game.players[examiner_idx].id.clone(),
            target: self.game.players[target_idx].id.clone(),
            card_index: EXAMINED_CARD_INDEX,
            card,
        })
    }

    /// A single card goes at once; with more, the player picks.
    fn eliminate_card(&mut self, player_idx: usize, then: AfterLoss) -> Result<Outcome, CoupError> {
        match self.game.players[player_idx].hand.len() {
            0 => self.continue_after(then),
            1 => {
                let card = self.game.players[player_idx].hand.remove(0);
                self.discard_card(player_idx, card);

                if let Some(game_over) = self.check_game_over() {
                    return Ok(game_over);
                }
                self.continue_after(then)
            }
            _ => {
                self.game.state = State::AwaitingElimination { player_idx, then };
                self.log(format!("{} must choose a card to lose.", self.name(player_idx)));
                Ok(Outcome::Waiting(WaitingFor::CardElimination {
                    player: self.game.players[player_idx].id.clone(),
                }))
            }
        }
    }

    fn discard_card(&mut self, player_idx: usize, card: Character) {
        self.game.discard.push(card);
        self.log(format!("{} loses the {card}.", self.name(player_idx)));

        if self.game.players[player_idx].hand.is_empty() {
            self.game.players[player_idx].alive = false;
            tracing::info!(player = %self.game.players[player_idx].id, "player eliminated");
            self.log(format!("{} has been eliminated!", self.name(player_idx)));
        }
    }

    fn continue_after(&mut self, then: AfterLoss) -> Result<Outcome, CoupError> {
        match then {
            AfterLoss::EndTurn => self.finish_turn(),
            AfterLoss::Resolve => self.resolve(),
        }
    }

    fn check_game_over(&mut self) -> Option<Outcome> {
        if self.game.alive_count() <= 1 {
            Some(self.end_game())
        } else {
            None
        }
    }

    fn finish_turn(&mut self) -> Result<Outcome, CoupError> {
        Ok(self.finish_turn_outcome())
    }

    fn finish_turn_outcome(&mut self) -> Outcome {
        self.game.pending = None;
        self.game.state = State::AwaitingAction;
        self.advance_turn()
    }

    fn advance_turn(&mut self) -> Outcome {
        if self.game.alive_count() <= 1 {
            return self.end_game();
        }

        self.game.current_player_idx = self.next_living_player();
        self.game.turn += 1;

        let player = &self.game.players[self.game.current_player_idx];
        let message = if player.coins >= FORCED_COUP_COINS {
            tracing::warn!(player = %player.id, coins = player.coins, "forced coup");
            format!("{} holds {} coins and must launch a coup!", player.name, player.coins)
        } else {
            format!("It is {}'s turn.", player.name)
        };
        self.log(message);

        Outcome::Resolved
    }

    fn next_living_player(&self) -> usize {
        let len = self.game.players.len();
        let mut idx = self.game.current_player_idx;

        idx = (idx + 1) % len;
        while !self.game.players[idx].alive {
            idx = (idx + 1) % len;
        }

        idx
    }

    fn end_game(&mut self) -> Outcome {
        self.game.phase = Phase::Ended;
        self.game.state = State::Ended;
        self.game.pending = None;

        let rankings = rank_players(&self.game.players);
        let winner = if self.game.alive_count() == 1 {
            self.alive_players().next().map(|p| p.id.clone())
        } else {
            None
        };

        match &winner {
            Some(winner) => {
                let name = self.player(winner).map(|p| p.name.clone()).unwrap_or_default();
                self.log(format!("{name} wins the game!"));
            }
            None => self.log("The game has ended."),
        }
        tracing::info!(winner = ?winner, turns = self.game.turn, "game over");

        Outcome::GameOver(GameOver { winner, rankings })
    }

    /// Returns a revealed card to the deck and deals a fresh one into the same slot.
    fn replace_influence_card(&mut self, player_idx: usize, card_idx: usize) {
        let card = self.game.players[player_idx].hand.remove(card_idx);
        self.game.deck.return_cards([card], &mut self.game.rng);

        if let Some(card) = self.game.deck.draw() {
            self.game.players[player_idx].hand.insert(card_idx, card);
        }
    }

    fn name(&self, player_idx: usize) -> String {
        self.game.players[player_idx].name.clone()
    }

    fn log(&mut self, message: impl Into<String>) {
        let turn = self.game.turn;
        self.game.log.push(turn, message);
    }
}
