//! Property-based tests driving random games through the public API

use coup_reformation::playout::{random_move, simulate_observed};
use coup_reformation::{rank_players, Character, Config, Coup, GameMode, Move, Phase, Player, PlayerId, Seat, State};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg64;

fn game(num_players: usize, mode: GameMode, seed: u64) -> Coup {
    let seats: Vec<Seat> = (0..num_players).map(|n| Seat::new(format!("p{n}"), format!("P{n}"))).collect();
    let mut coup = Coup::seeded(Config::default(), seed);
    coup.initialize_game(&seats, mode).unwrap();
    coup
}

fn mode(expansion: bool) -> GameMode {
    if expansion {
        GameMode::Expansion
    } else {
        GameMode::Basic
    }
}

fn check_invariants(coup: &Coup) {
    let state = coup.game_state();

    assert_eq!(state.token_count(), 15, "cards appeared or vanished\n{coup:?}");
    assert!(state.log.len() <= 20);

    let exchanging = match (state.state, &state.pending) {
        (State::AwaitingExchange { .. }, Some(pending)) => Some(pending.actor_idx),
        _ => None,
    };

    for (idx, player) in state.players.iter().enumerate() {
        assert_eq!(player.alive, !player.hand.is_empty(), "alive must mean holding cards\n{coup:?}");

        let limit = if exchanging == Some(idx) { 4 } else { 2 };
        assert!(player.hand.len() <= limit, "hand too large\n{coup:?}");

        match state.mode {
            GameMode::Basic => {
                assert!(player.religion.is_none());
                assert!(!player.hand.contains(&Character::Inquisitor));
            }
            GameMode::Expansion => {
                assert!(player.religion.is_some());
                assert!(!player.hand.contains(&Character::Ambassador));
            }
        }
    }

    if state.mode == GameMode::Basic {
        assert_eq!(state.sanctuary, 0);
    }

    match state.phase {
        Phase::Playing => {
            assert!(state.alive_count() >= 2);
            assert!(state.players[state.current_player_idx].alive);
            assert_ne!(state.state, State::Ended);
        }
        Phase::Ended => {
            assert!(state.alive_count() <= 1);
            assert_eq!(state.state, State::Ended);
            assert!(state.pending.is_none());
        }
        Phase::Waiting => panic!("a started game never returns to waiting on its own"),
    }
}

/// Property: every reachable table keeps the deck, hands and turn order consistent
#[test]
fn prop_playouts_keep_invariants() {
    proptest!(ProptestConfig::with_cases(48), |(num_players in 2..=6usize, expansion in any::<bool>(), seed in any::<u64>())| {
        let mut coup = game(num_players, mode(expansion), seed);
        let mut rng = Pcg64::seed_from_u64(seed);

        check_invariants(&coup);
        let game_over = simulate_observed(&mut coup, &mut rng, 3_000, |coup, _| check_invariants(coup))?;

        if let Some(game_over) = game_over {
            let ranks: Vec<usize> = game_over.rankings.iter().map(|r| r.rank).collect();
            prop_assert_eq!(ranks, (1..=num_players).collect::<Vec<_>>());
            prop_assert_eq!(game_over.winner.as_ref(), Some(&game_over.rankings[0].player));
            prop_assert!(coup.legal_moves().is_empty());
        }
    });
}

/// Property: every move the engine lists is accepted
#[test]
fn prop_legal_moves_are_accepted() {
    proptest!(ProptestConfig::with_cases(32), |(num_players in 2..=6usize, expansion in any::<bool>(), seed in any::<u64>())| {
        let mut coup = game(num_players, mode(expansion), seed);
        let mut rng = Pcg64::seed_from_u64(seed ^ 0x5eed);

        for _ in 0..500 {
            let moves = coup.legal_moves();
            if moves.is_empty() {
                prop_assert_eq!(coup.phase(), Phase::Ended);
                break;
            }

            // every listed move works from the same table
            for mv in &moves {
                let mut probe = coup.clone();
                prop_assert!(probe.apply_move(mv).is_ok(), "{:?} was listed but rejected\n{:?}", mv, coup);
            }

            let Some(mv) = random_move(&coup, &mut rng) else { break };
            coup.apply_move(&mv)?;
        }
    });
}

/// Property: a rejected move leaves the table untouched
#[test]
fn prop_rejected_moves_change_nothing() {
    proptest!(ProptestConfig::with_cases(32), |(num_players in 2..=6usize, expansion in any::<bool>(), seed in any::<u64>())| {
        let mut coup = game(num_players, mode(expansion), seed);
        let mut rng = Pcg64::seed_from_u64(seed);

        for _ in 0..300 {
            if coup.phase() != Phase::Playing {
                break;
            }

            let current = coup.game_state().current_player_idx;
            let bystander = coup.players()[(current + 1) % num_players].id.clone();
            let probes = [
                Move::Act { player: bystander, action: coup_reformation::ActionKind::Income, target: None },
                Move::Lose { player: coup.players()[current].id.clone(), card_index: 9 },
                Move::Challenge { player: PlayerId::from("nobody") },
            ];

            for probe in &probes {
                let before = coup.snapshot();
                prop_assert!(coup.apply_move(probe).is_err(), "{:?} should have been rejected", probe);
                prop_assert_eq!(&coup.snapshot(), &before);
            }

            let Some(mv) = random_move(&coup, &mut rng) else { break };
            coup.apply_move(&mv)?;
        }
    });
}

fn arb_player() -> impl Strategy<Value = Player> {
    (0..=2usize, 0..20u32).prop_map(|(cards, coins)| {
        let mut player = Player::new(PlayerId::from("x"), "X".to_string(), coins);
        player.hand = vec![Character::Duke; cards];
        player.alive = cards > 0;
        player
    })
}

/// Property: rankings are a permutation ordered by alive, then cards, then coins
#[test]
fn prop_rankings_are_ordered() {
    proptest!(|(mut players in prop::collection::vec(arb_player(), 2..=6))| {
        for (idx, player) in players.iter_mut().enumerate() {
            player.id = PlayerId::from(format!("p{idx}"));
        }

        let rankings = rank_players(&players);
        prop_assert_eq!(rankings.len(), players.len());

        for (idx, pair) in rankings.windows(2).enumerate() {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert_eq!(a.rank, idx + 1);
            prop_assert!((a.alive, a.cards, a.coins) >= (b.alive, b.cards, b.coins));
            if (a.alive, a.cards, a.coins) == (b.alive, b.cards, b.coins) {
                prop_assert!(a.player < b.player, "ties keep seat order");
            }
        }

        let mut ids: Vec<_> = rankings.iter().map(|r| r.player.clone()).collect();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), players.len());
    });
}
