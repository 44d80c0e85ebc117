use std::fmt::{Debug, Formatter};
use serde::{Deserialize, Serialize};
use crate::coup::{Coup, Phase, State};
use crate::error::CoupError;
use crate::outcome::Outcome;
use crate::player::PlayerId;
use crate::rules::{ActionKind, ACTION_VARIANTS, EXAMINED_CARD_INDEX};
use crate::Character;

/// One participant input, as a value. Every engine entry point has a move.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "move", rename_all = "snake_case")]
pub enum Move {
    Act { player: PlayerId, action: ActionKind, target: Option<PlayerId> },
    ChangeReligion { player: PlayerId, target: Option<PlayerId> },
    TakeSanctuary { player: PlayerId },
    Challenge { player: PlayerId },
    Block { player: PlayerId, character: Character },
    Allow { player: PlayerId },
    Exchange { player: PlayerId, kept: Vec<Character>, returned: Vec<Character> },
    Examine { player: PlayerId, target: PlayerId, swap: bool },
    Lose { player: PlayerId, card_index: usize },
}

impl Move {
    pub fn player(&self) -> &PlayerId {
        match self {
            Move::Act { player, .. }
            | Move::ChangeReligion { player, .. }
            | Move::TakeSanctuary { player }
            | Move::Challenge { player }
            | Move::Block { player, .. }
            | Move::Allow { player }
            | Move::Exchange { player, .. }
            | Move::Examine { player, .. }
            | Move::Lose { player, .. } => player,
        }
    }
}

impl Debug for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Move::Act { player, action, target: Some(target) } => {
                f.write_fmt(format_args!("Player {player} uses {action} on {target}"))
            }
            Move::Act { player, action, target: None } => {
                f.write_fmt(format_args!("Player {player} uses {action}"))
            }
            Move::ChangeReligion { player, target: Some(target) } => {
                f.write_fmt(format_args!("Player {player} converts {target}"))
            }
            Move::ChangeReligion { player, target: None } => {
                f.write_fmt(format_args!("Player {player} converts"))
            }
            Move::TakeSanctuary { player } => {
                f.write_fmt(format_args!("Player {player} takes the sanctuary"))
            }
            Move::Challenge { player } => {
                f.write_fmt(format_args!("Player {player} challenges"))
            }
            Move::Block { player, character } => {
                f.write_fmt(format_args!("Player {player} blocks with {:?}", character))
            }
            Move::Allow { player } => {
                f.write_fmt(format_args!("Player {player} allows"))
            }
            Move::Exchange { player, kept, returned } => {
                f.write_fmt(format_args!("Player {player} keeps {:?} and returns {:?}", kept, returned))
            }
            Move::Examine { player, target, swap } => {
                let verb = if *swap { "swaps" } else { "keeps" };
                f.write_fmt(format_args!("Player {player} {verb} {target}'s examined card"))
            }
            Move::Lose { player, card_index } => {
                f.write_fmt(format_args!("Player {player} loses card {card_index}"))
            }
        }
    }
}

impl Coup {
    /// Every move some participant could make right now.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.phase() != Phase::Playing {
            return vec![];
        }

        match self.state() {
            State::AwaitingAction => self.turn_moves(),
            State::AwaitingChallenge | State::AwaitingBlockChallenge => {
                self.responders()
                    .into_iter()
                    .flat_map(|player| [Move::Challenge { player: player.clone() }, Move::Allow { player }])
                    .collect()
            }
            State::AwaitingBlock => {
                let Some(pending) = self.pending_action() else {
                    return vec![];
                };
                let mode = self.mode();

                let mut moves = vec![];
                for player in self.responders() {
                    for character in pending.kind.blockers(mode) {
                        moves.push(Move::Block { player: player.clone(), character });
                    }
                    moves.push(Move::Allow { player });
                }
                moves
            }
            State::AwaitingExchange { keep } => self.exchange_moves(keep),
            State::AwaitingExamine => {
                let Some(pending) = self.pending_action() else {
                    return vec![];
                };
                let players = self.players();
                let Some(target_idx) = pending.target_idx else {
                    return vec![];
                };
                let (player, target) = (&players[pending.actor_idx].id, &players[target_idx].id);

                [true, false]
                    .into_iter()
                    .map(|swap| Move::Examine { player: player.clone(), target: target.clone(), swap })
                    .collect()
            }
            State::AwaitingElimination { player_idx, .. } => {
                let player = &self.players()[player_idx];
                (0..player.hand.len())
                    .map(|card_index| Move::Lose { player: player.id.clone(), card_index })
                    .collect()
            }
            State::Ended => vec![],
        }
    }

    /// Routes a move to its entry point. Religion moves end the turn once applied.
    pub fn apply_move(&mut self, mv: &Move) -> Result<Outcome, CoupError> {
        match mv {
            Move::Act { player, action, target } => {
                if self.current_player().map(|p| &p.id) != Some(player) {
                    return Err(CoupError::NotYourTurn(player.clone()));
                }
                self.execute_action(*action, target.as_ref())
            }
            Move::ChangeReligion { player, target } => {
                self.change_religion(player, target.as_ref())?;
                self.next_turn()
            }
            Move::TakeSanctuary { player } => {
                self.take_sanctuary(player)?;
                self.next_turn()
            }
            Move::Challenge { player } => self.process_challenge(player),
            Move::Block { player, character } => self.process_block(player, *character),
            Move::Allow { player } => {
                let responder_idx = self.player_idx(player)?;
                let claimant_idx = self.claimant_idx().ok_or(CoupError::UnexpectedResponse)?;
                self.ensure_responder(responder_idx, claimant_idx)?;
                self.resolve_action()
            }
            Move::Exchange { player, kept, returned } => self.complete_exchange(player, kept, returned),
            Move::Examine { player, target, swap } => self.complete_examine(player, target, EXAMINED_CARD_INDEX, *swap),
            Move::Lose { player, card_index } => self.complete_elimination(player, *card_index),
        }
    }

    fn turn_moves(&self) -> Vec<Move> {
        let actor_idx = self.game_state().current_player_idx;
        let players = self.players();
        let actor = &players[actor_idx].id;

        let mut moves = vec![];
        for kind in ACTION_VARIANTS {
            if !kind.definition().target_required {
                if self.validate_action(actor_idx, kind, None).is_ok() {
                    moves.push(Move::Act { player: actor.clone(), action: kind, target: None });
                }
                continue;
            }
            for target in players.iter().map(|p| &p.id) {
                if self.validate_action(actor_idx, kind, Some(target)).is_ok() {
                    moves.push(Move::Act { player: actor.clone(), action: kind, target: Some(target.clone()) });
                }
            }
        }

        let targets = std::iter::once(None).chain(players.iter().map(|p| Some(&p.id)));
        for target in targets {
            if self.validate_religion_change(actor, target).is_ok() {
                moves.push(Move::ChangeReligion { player: actor.clone(), target: target.cloned() });
            }
        }
        if self.validate_take_sanctuary(actor).is_ok() {
            moves.push(Move::TakeSanctuary { player: actor.clone() });
        }

        moves
    }

    fn exchange_moves(&self, keep: usize) -> Vec<Move> {
        let Some(pending) = self.pending_action() else {
            return vec![];
        };
        let player = &self.players()[pending.actor_idx];
        let hand = &player.hand;

        let mut moves: Vec<Move> = vec![];
        for mask in 0u32..(1 << hand.len()) {
            if mask.count_ones() as usize != keep {
                continue;
            }
            let (kept, returned): (Vec<_>, Vec<_>) = hand
                .iter()
                .enumerate()
                .partition(|(idx, _)| mask & (1 << idx) != 0);

            let mv = Move::Exchange {
                player: player.id.clone(),
                kept: kept.into_iter().map(|(_, &c)| c).collect(),
                returned: returned.into_iter().map(|(_, &c)| c).collect(),
            };
            // duplicate cards make duplicate choices
            if !moves.contains(&mv) {
                moves.push(mv);
            }
        }
        moves
    }

    fn responders(&self) -> Vec<PlayerId> {
        let Some(claimant_idx) = self.claimant_idx() else {
            return vec![];
        };
        self.players()
            .iter()
            .enumerate()
            .filter(|&(idx, p)| idx != claimant_idx && p.alive)
            .map(|(_, p)| p.id.clone())
            .collect()
    }
}
