//! Random playouts: every participant picks uniformly among their legal moves.

use rand::seq::SliceRandom;
use rand::Rng;
use crate::coup::Coup;
use crate::error::CoupError;
use crate::moves::Move;
use crate::outcome::{GameOver, Outcome};

pub fn random_move<R: Rng + ?Sized>(game: &Coup, rng: &mut R) -> Option<Move> {
    game.legal_moves().choose(rng).cloned()
}

/// Plays until the game ends or `max_moves` have been applied.
pub fn simulate<R: Rng + ?Sized>(game: &mut Coup, rng: &mut R, max_moves: usize) -> Result<Option<GameOver>, CoupError> {
    simulate_observed(game, rng, max_moves, |_, _| {})
}

/// Like [`simulate`], calling `observe` after every applied move.
pub fn simulate_observed<R, F>(game: &mut Coup, rng: &mut R, max_moves: usize, mut observe: F) -> Result<Option<GameOver>, CoupError>
where
    R: Rng + ?Sized,
    F: FnMut(&Coup, &Move),
{
    for _ in 0..max_moves {
        let Some(mv) = random_move(game, rng) else {
            break;
        };

        let outcome = game.apply_move(&mv)?;
        observe(game, &mv);

        if let Outcome::GameOver(game_over) = outcome {
            tracing::debug!(winner = ?game_over.winner, "playout finished");
            return Ok(Some(game_over));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg64;
    use crate::character::GameMode;
    use crate::config::Config;
    use crate::coup::{Coup, Phase};
    use crate::player::Seat;
    use crate::playout::simulate;

    fn game(num_players: usize, mode: GameMode, seed: u64) -> Coup {
        let seats: Vec<Seat> = (0..num_players).map(|n| Seat::new(format!("p{n}"), format!("P{n}"))).collect();
        let mut coup = Coup::seeded(Config::default(), seed);
        coup.initialize_game(&seats, mode).unwrap();
        coup
    }

    #[test]
    fn playouts_finish() {
        let mut rng = Pcg64::seed_from_u64(11);

        for num_players in 2..=6 {
            for mode in [GameMode::Basic, GameMode::Expansion] {
                let mut coup = game(num_players, mode, num_players as u64);
                if let Some(game_over) = simulate(&mut coup, &mut rng, 5_000).unwrap() {
                    assert_eq!(coup.phase(), Phase::Ended);
                    assert_eq!(game_over.rankings.len(), num_players);
                    assert_eq!(game_over.winner.as_ref(), Some(&game_over.rankings[0].player));
                }
                assert_eq!(coup.game_state().token_count(), 15);
            }
        }
    }

    #[test]
    fn seeded_playouts_repeat() {
        let play = || {
            let mut coup = game(4, GameMode::Expansion, 5);
            let mut rng = Pcg64::seed_from_u64(5);
            simulate(&mut coup, &mut rng, 2_000).unwrap();
            coup.snapshot()
        };

        assert_eq!(play(), play());
    }
}
