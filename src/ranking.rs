use serde::{Deserialize, Serialize};
use crate::player::{Player, PlayerId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    /// 1-based, no gaps.
    pub rank: usize,
    pub player: PlayerId,
    pub name: String,
    pub cards: usize,
    pub coins: u32,
    pub alive: bool,
}

/// Orders players by alive first, then cards held, then coins. Ties keep seat order.
pub fn rank_players(players: &[Player]) -> Vec<Ranking> {
    let mut ordered: Vec<&Player> = players.iter().collect();

    // sort_by is stable, so equal players stay in seat order
    ordered.sort_by(|a, b| {
        b.alive.cmp(&a.alive)
            .then(b.lives().cmp(&a.lives()))
            .then(b.coins.cmp(&a.coins))
    });

    ordered
        .into_iter()
        .enumerate()
        .map(|(idx, player)| Ranking {
            rank: idx + 1,
            player: player.id.clone(),
            name: player.name.clone(),
            cards: player.lives(),
            coins: player.coins,
            alive: player.alive,
        })
        .collect()
}
