//! Ingenious match runner.
//!
//! Plays a series of games between two strategies and logs the results.
//!
//! Usage:
//!   cargo run --release -- --one rl_2ply --two mixed_2 --games 20

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use ingenious::selfplay::{self, GameOptions, SelfPlayConfig};
use ingenious::strategy::{StrategyParams, STRATEGY_IDS};

#[derive(Parser, Debug)]
#[command(name = "ingenious")]
#[command(about = "Play Ingenious matches between two strategies")]
struct Args {
    /// Strategy in seat One
    #[arg(long, default_value = "max")]
    one: String,

    /// Strategy in seat Two
    #[arg(long, default_value = "increase_min")]
    two: String,

    /// Number of games to play
    #[arg(long, default_value_t = 10)]
    games: usize,

    /// Parallel games (1 = sequential)
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Random seed, 0 for entropy
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// JSON file with strategy parameters
    #[arg(long)]
    params: Option<PathBuf>,

    /// ONNX value model (overrides the params file)
    #[arg(long)]
    ckpt: Option<PathBuf>,

    /// Candidates expanded by the 2-ply and 3-ply searches
    #[arg(long)]
    search_width: Option<usize>,

    /// Heuristic strategies always request an exchange when set
    #[arg(long)]
    inference: bool,

    /// Keep seats fixed instead of swapping every other game
    #[arg(long)]
    fixed_seats: bool,

    /// Write game records as JSON lines to this file
    #[arg(long)]
    output: Option<PathBuf>,

    /// List strategy ids and exit
    #[arg(long)]
    list: bool,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_params(args: &Args) -> Result<StrategyParams> {
    let mut params = match &args.params {
        Some(path) => StrategyParams::from_json_file(path)?,
        None => StrategyParams::default(),
    };
    if let Some(ckpt) = &args.ckpt {
        params.ckpt_path = Some(ckpt.clone());
    }
    if let Some(width) = args.search_width {
        params.search_width = width;
    }
    params.validate()?;
    Ok(params)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list {
        for id in STRATEGY_IDS {
            println!("{id}");
        }
        return Ok(());
    }

    init_tracing(&args.log_level);

    let config = SelfPlayConfig {
        num_games: args.games,
        player_one: args.one.clone(),
        player_two: args.two.clone(),
        params: load_params(&args)?,
        options: GameOptions {
            record: false,
            inference: args.inference,
        },
        alternate_seats: !args.fixed_seats,
        threads: args.threads,
        seed: args.seed,
        quiet: false,
    };
    info!(
        one = %config.player_one,
        two = %config.player_two,
        games = config.num_games,
        threads = config.threads,
        "starting match"
    );

    let start = Instant::now();
    let games = selfplay::run_self_play(&config)?;
    info!(
        "Completed {} games in {:.1}s",
        games.len(),
        start.elapsed().as_secs_f64()
    );
    selfplay::print_summary(&games);

    if let Some(path) = &args.output {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        selfplay::write_jsonl(&games, &mut writer)?;
        info!("Wrote {} games to {}", games.len(), path.display());
    }
    Ok(())
}
