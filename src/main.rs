//! Self-play simulator.
//!
//! # Usage
//!
//! ```bash
//! # 100 four-player expansion games, rankings as CSV on stdout
//! coup-sim --players 4 --mode expansion --games 100 --seed 7 > rankings.csv
//! ```

use std::io;
use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::Serialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use coup_reformation::playout::simulate;
use coup_reformation::{Config, Coup, GameMode, Seat};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Mode {
    Basic,
    Expansion,
}

impl From<Mode> for GameMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Basic => GameMode::Basic,
            Mode::Expansion => GameMode::Expansion,
        }
    }
}

/// Plays random games of Coup and reports the final rankings
#[derive(Parser, Debug)]
#[command(name = "coup-sim")]
#[command(version)]
struct Args {
    /// Players per game
    #[arg(short, long, default_value = "4")]
    players: usize,

    /// Rule set to play
    #[arg(short, long, value_enum, default_value = "basic")]
    mode: Mode,

    /// Number of games to play
    #[arg(short, long, default_value = "1")]
    games: usize,

    /// Seed for every shuffle and every random choice
    #[arg(short, long, default_value = "0")]
    seed: u64,

    /// Moves after which an unfinished game is abandoned
    #[arg(long, default_value = "10000")]
    max_moves: usize,

    /// Path to a JSON config overriding the defaults
    #[arg(long)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Serialize)]
struct Row<'a> {
    game: usize,
    rank: usize,
    player: &'a str,
    cards: usize,
    coins: u32,
    alive: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let config = match &args.config {
        Some(path) => Config::from_json_str(&std::fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    let seats: Vec<Seat> = (1..=args.players)
        .map(|n| Seat::new(format!("p{n}"), format!("Player {n}")))
        .collect();

    let mut rng = Pcg64::seed_from_u64(args.seed);
    let mut writer = csv::Writer::from_writer(io::stdout());
    let mut unfinished = 0;

    for game in 0..args.games {
        let mut coup = Coup::seeded(config.clone(), args.seed.wrapping_add(game as u64));
        coup.initialize_game(&seats, args.mode.into())?;

        if simulate(&mut coup, &mut rng, args.max_moves)?.is_none() {
            tracing::warn!(game, max_moves = args.max_moves, "game abandoned unfinished");
            unfinished += 1;
        }

        for ranking in coup.rankings() {
            writer.serialize(Row {
                game,
                rank: ranking.rank,
                player: ranking.player.as_str(),
                cards: ranking.cards,
                coins: ranking.coins,
                alive: ranking.alive,
            })?;
        }
    }

    writer.flush()?;
    tracing::info!(games = args.games, unfinished, "simulation finished");
    Ok(())
}
