//! Self-play record generator.
//!
//! Plays games and writes one JSON object per game, including the labelled
//! Representation rows of every decision, for an external trainer.
//!
//! Usage:
//!   cargo run --release --bin selfplay -- --games 100 --output games.jsonl

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use ingenious::selfplay::{self, GameOptions, SelfPlayConfig};
use ingenious::strategy::StrategyParams;

#[derive(Parser, Debug)]
#[command(name = "selfplay")]
#[command(about = "Generate Ingenious self-play training records as JSON lines")]
struct Args {
    /// Number of games to play
    #[arg(long, default_value_t = 10)]
    games: usize,

    /// Strategy in seat One
    #[arg(long, default_value = "rl")]
    one: String,

    /// Strategy in seat Two
    #[arg(long, default_value = "mixed_2")]
    two: String,

    /// Number of parallel threads
    #[arg(long, default_value_t = 4)]
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

    /// Permute colours and flip the board before each estimate
    #[arg(long)]
    augment: bool,

    /// Output file path (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Suppress per-game progress and the summary
    #[arg(long)]
    quiet: bool,
}

fn init_tracing(quiet: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.quiet);

    let mut params = match &args.params {
        Some(path) => StrategyParams::from_json_file(path)?,
        None => StrategyParams::default(),
    };
    if args.ckpt.is_some() {
        params.ckpt_path = args.ckpt.clone();
    }
    params.augment |= args.augment;

    let config = SelfPlayConfig {
        num_games: args.games,
        player_one: args.one,
        player_two: args.two,
        params,
        options: GameOptions {
            record: true,
            inference: false,
        },
        alternate_seats: true,
        threads: args.threads,
        seed: args.seed,
        quiet: args.quiet,
    };
    info!(
        "Self-play: {} games, {} vs {}, {} threads",
        config.num_games, config.player_one, config.player_two, config.threads
    );

    let start = Instant::now();
    let games = selfplay::run_self_play(&config)?;
    let elapsed = start.elapsed().as_secs_f64();
    info!(
        "Completed {} games in {:.1}s ({:.1} games/hour)",
        games.len(),
        elapsed,
        games.len() as f64 / elapsed.max(1e-9) * 3600.0
    );
    if !args.quiet {
        selfplay::print_summary(&games);
    }

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            selfplay::write_jsonl(&games, &mut writer)?;
            info!("Wrote {} games to {}", games.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            selfplay::write_jsonl(&games, &mut writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}
