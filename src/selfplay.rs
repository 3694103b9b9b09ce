//! Match play and self-play record generation.
//!
//! Plays complete games between two strategies: the mover chooses a move,
//! bonus moves follow while the last move was ingenious, then the mover may
//! exchange their hand and refills. Optionally records, for every decision,
//! the encoded row of the chosen move and labels the rows with the final
//! outcome so an external trainer can consume them as JSON lines.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::board::Move;
use crate::eval::ValueEstimator;
use crate::game::{GameState, Player};
use crate::nn::{encode_batched, Representation};
use crate::player::Score;
use crate::strategy::{
    get_strategy, learned_strategy, load_estimator, search_depth, Strategy, StrategyError,
    StrategyParams,
};

#[derive(Debug, Error)]
pub enum SelfPlayError {
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),

    #[error("self-play worker thread panicked")]
    WorkerPanicked,

    #[error("failed to write records: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialise record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-game switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameOptions {
    /// Keep a labelled Representation of every decision.
    pub record: bool,
    /// Passed through to [`Strategy::choose_move`].
    pub inference: bool,
}

/// Configuration for a batch of games.
#[derive(Debug, Clone)]
pub struct SelfPlayConfig {
    /// Number of games to play.
    pub num_games: usize,
    /// Strategy id in seat One.
    pub player_one: String,
    /// Strategy id in seat Two.
    pub player_two: String,
    /// Parameters shared by both strategies.
    pub params: StrategyParams,
    pub options: GameOptions,
    /// Swap seats on every odd game.
    pub alternate_seats: bool,
    /// Number of parallel threads for concurrent games.
    pub threads: usize,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    /// Suppress per-game progress output.
    pub quiet: bool,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        SelfPlayConfig {
            num_games: 10,
            player_one: "rl".to_string(),
            player_two: "mixed_2".to_string(),
            params: StrategyParams::default(),
            options: GameOptions {
                record: true,
                inference: false,
            },
            alternate_seats: true,
            threads: 4,
            seed: 0,
            quiet: false,
        }
    }
}

/// One move as played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub player: Player,
    pub mv: Move,
    /// The move was a bonus move earned by an ingenious event.
    pub bonus: bool,
    pub should_exchange: bool,
    /// The hand was actually exchanged at the end of this turn.
    pub exchanged: bool,
    pub confidence: f32,
}

/// A complete game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: usize,
    /// Strategy ids in seat order.
    pub players: [String; 2],
    pub winner: Option<Player>,
    pub final_scores: [Score; 2],
    pub turns: usize,
    pub moves: Vec<MoveRecord>,
    /// Rows of the chosen moves, labelled with the outcome.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub representation: Option<Representation>,
}

impl GameRecord {
    /// Strategy id of the winner, if any.
    pub fn winner_id(&self) -> Option<&str> {
        self.winner.map(|w| self.players[w.index()].as_str())
    }
}

/// Encoded row for a decision that has not been applied yet.
fn decision_row(
    state: &GameState,
    mover: Player,
    mv: Move,
    should_exchange: bool,
) -> Representation {
    let (repr, _) = encode_batched(state, mover, &[mv]);
    let row = (0..repr.len())
        .find(|&i| repr.should_exchange(i) == should_exchange)
        .unwrap_or(0);
    repr.select(&[row])
}

/// Plays one game to completion. `one` sits in seat One and moves first.
pub fn play_game(
    one: &mut Strategy,
    two: &mut Strategy,
    rng: &mut SmallRng,
    options: GameOptions,
) -> Result<GameRecord, StrategyError> {
    let mut state = GameState::new(rng);
    let mut moves: Vec<MoveRecord> = Vec::new();
    let mut repr = Representation::new();
    let mut turns = 0usize;

    'game: while !state.is_terminal() {
        let mover = state.turn;
        let strategy = match mover {
            Player::One => &mut *one,
            Player::Two => &mut *two,
        };

        let mut bonus = false;
        let mut should_exchange = false;
        loop {
            let decision = match strategy.choose_move(&state, mover, options.inference) {
                Ok(d) => d,
                Err(StrategyError::NoCandidates) if bonus => break,
                Err(StrategyError::NoCandidates) => break 'game,
                Err(e) => return Err(e),
            };
            if options.record {
                repr.combine(&decision_row(
                    &state,
                    mover,
                    decision.mv,
                    decision.should_exchange,
                ));
            }
            let ingenious = state.apply_move(mover, &decision.mv);
            moves.push(MoveRecord {
                player: mover,
                mv: decision.mv,
                bonus,
                should_exchange: decision.should_exchange,
                exchanged: false,
                confidence: decision.confidence,
            });
            should_exchange = decision.should_exchange;
            if ingenious == 0 || state.is_terminal() {
                break;
            }
            bonus = true;
        }
        turns += 1;
        if state.is_terminal() {
            break;
        }

        let exchanged = should_exchange && state.can_exchange(mover);
        state.end_turn(mover, should_exchange, rng);
        if let Some(last) = moves.last_mut() {
            last.exchanged = exchanged;
        }
    }

    let winner = state.winner();
    let representation = options.record.then(|| {
        repr.label_outcome(winner);
        repr
    });
    Ok(GameRecord {
        game_id: 0,
        players: [one.id().to_string(), two.id().to_string()],
        winner,
        final_scores: state.scores,
        turns,
        moves,
        representation,
    })
}

/// Everything a worker needs to build a game's strategies.
struct Seats {
    params: StrategyParams,
    ids: [String; 2],
    estimator: Option<Arc<dyn ValueEstimator>>,
}

impl Seats {
    fn new(config: &SelfPlayConfig) -> Result<Self, StrategyError> {
        config.params.validate()?;
        let ids = [config.player_one.clone(), config.player_two.clone()];
        let estimator = if ids.iter().any(|id| search_depth(id).is_some()) {
            Some(load_estimator(&config.params)?)
        } else {
            None
        };
        Ok(Seats {
            params: config.params.clone(),
            ids,
            estimator,
        })
    }

    fn build(&self, id: &str, seed: u64) -> Result<Strategy, StrategyError> {
        let params = self.params.with_seed(seed);
        match (search_depth(id), &self.estimator) {
            (Some(depth), Some(estimator)) => {
                Ok(learned_strategy(id, depth, Arc::clone(estimator), &params))
            }
            _ => get_strategy(id, &params),
        }
    }

    /// Plays game `i`, swapping seats on odd games when asked to.
    fn play(&self, config: &SelfPlayConfig, i: usize) -> Result<GameRecord, StrategyError> {
        let (mut rng, seeds) = if config.seed != 0 {
            let base = config.seed.wrapping_add(i as u64);
            let s = base.wrapping_mul(0x9E37_79B9_7F4A_7C15);
            (SmallRng::seed_from_u64(base), [s | 1, s.rotate_left(17) | 1])
        } else {
            (SmallRng::from_entropy(), [0, 0])
        };
        let swap = config.alternate_seats && i % 2 == 1;
        let (first, second) = if swap { (1, 0) } else { (0, 1) };
        let mut one = self.build(&self.ids[first], seeds[0])?;
        let mut two = self.build(&self.ids[second], seeds[1])?;

        let start = Instant::now();
        let mut game = play_game(&mut one, &mut two, &mut rng, config.options)?;
        game.game_id = i;
        debug!(
            game = i,
            elapsed_ms = start.elapsed().as_millis() as u64,
            moves = game.moves.len(),
            "game finished"
        );
        Ok(game)
    }
}

fn log_game(game: &GameRecord, n: usize, total: usize) {
    let outcome = match game.winner_id() {
        Some(id) => format!("{id} wins"),
        None => "draw".to_string(),
    };
    info!(
        "Game {}/{}: {} after {} turns ({} vs {})",
        n, total, outcome, game.turns, game.players[0], game.players[1]
    );
}

/// Runs all configured games and returns their records.
///
/// When `config.threads > 1`, games are played concurrently using rayon.
pub fn run_self_play(config: &SelfPlayConfig) -> Result<Vec<GameRecord>, SelfPlayError> {
    let mut games = Vec::with_capacity(config.num_games);
    run_self_play_with_callback(config, |game| {
        games.push(game);
    })?;
    games.sort_by_key(|g| g.game_id);
    Ok(games)
}

/// Runs all configured games, calling `on_game` with each completed record.
pub fn run_self_play_with_callback<F>(
    config: &SelfPlayConfig,
    on_game: F,
) -> Result<(), SelfPlayError>
where
    F: FnMut(GameRecord) + Send,
{
    let seats = Seats::new(config)?;
    if config.threads > 1 {
        run_self_play_parallel(config, seats, on_game)
    } else {
        run_self_play_sequential(config, &seats, on_game)
    }
}

fn run_self_play_sequential<F>(
    config: &SelfPlayConfig,
    seats: &Seats,
    mut on_game: F,
) -> Result<(), SelfPlayError>
where
    F: FnMut(GameRecord),
{
    for i in 0..config.num_games {
        let game = seats.play(config, i)?;
        if !config.quiet {
            log_game(&game, i + 1, config.num_games);
        }
        on_game(game);
    }
    Ok(())
}

/// Plays games on a rayon pool; records reach the callback over a channel.
fn run_self_play_parallel<F>(
    config: &SelfPlayConfig,
    seats: Seats,
    mut on_game: F,
) -> Result<(), SelfPlayError>
where
    F: FnMut(GameRecord) + Send,
{
    use rayon::prelude::*;
    use std::sync::mpsc;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .map_err(|e| SelfPlayError::ThreadPool(e.to_string()))?;

    let (tx, rx) = mpsc::channel::<Result<GameRecord, StrategyError>>();
    let config_clone = config.clone();
    let handle = std::thread::spawn(move || {
        let completed = AtomicUsize::new(0);
        pool.install(|| {
            (0..config_clone.num_games)
                .into_par_iter()
                .for_each_with(tx, |tx, i| {
                    let result = seats.play(&config_clone, i);
                    if let (Ok(game), false) = (&result, config_clone.quiet) {
                        let n = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        log_game(game, n, config_clone.num_games);
                    }
                    let _ = tx.send(result);
                });
        });
    });

    let mut first_error = None;
    for result in rx {
        match result {
            Ok(game) => on_game(game),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    handle.join().map_err(|_| SelfPlayError::WorkerPanicked)?;

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Writes game records as JSONL (one JSON object per game, one per line).
pub fn write_jsonl<W: Write>(games: &[GameRecord], out: &mut W) -> Result<(), SelfPlayError> {
    for game in games {
        write_game_json(game, out)?;
    }
    out.flush()?;
    Ok(())
}

/// Writes a single game record followed by a newline.
pub fn write_game_json<W: Write>(game: &GameRecord, out: &mut W) -> Result<(), SelfPlayError> {
    serde_json::to_writer(&mut *out, game)?;
    writeln!(out)?;
    Ok(())
}

/// Aggregate results over a set of games.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub games: usize,
    pub draws: usize,
    /// Wins per strategy id, in first-seen order.
    pub wins: Vec<(String, usize)>,
    pub avg_turns: f64,
    pub avg_winning_min: f64,
}

pub fn summarize(games: &[GameRecord]) -> Summary {
    let mut summary = Summary {
        games: games.len(),
        ..Summary::default()
    };
    let mut turns = 0usize;
    let mut winning_min = 0u32;
    for game in games {
        for id in &game.players {
            if !summary.wins.iter().any(|(w, _)| w == id) {
                summary.wins.push((id.clone(), 0));
            }
        }
        turns += game.turns;
        match game.winner {
            Some(w) => {
                let id = &game.players[w.index()];
                if let Some(entry) = summary.wins.iter_mut().find(|(x, _)| x == id) {
                    entry.1 += 1;
                }
                winning_min += game.final_scores[w.index()].min() as u32;
            }
            None => summary.draws += 1,
        }
    }
    let decided = (summary.games - summary.draws).max(1) as f64;
    summary.avg_turns = turns as f64 / summary.games.max(1) as f64;
    summary.avg_winning_min = winning_min as f64 / decided;
    summary
}

/// Logs a summary of the results.
pub fn print_summary(games: &[GameRecord]) {
    let summary = summarize(games);
    info!("=== Match Summary ===");
    info!("Games: {}", summary.games);
    info!("Avg turns/game: {:.1}", summary.avg_turns);
    info!("Avg winner minimum colour: {:.1}", summary.avg_winning_min);
    info!("Draws: {}", summary.draws);
    for (id, wins) in &summary.wins {
        let pct = 100.0 * *wins as f64 / summary.games.max(1) as f64;
        info!("  {:>20}: {} ({:.1}%)", id, wins, pct);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(games: usize, threads: usize, seed: u64) -> SelfPlayConfig {
        SelfPlayConfig {
            num_games: games,
            player_one: "max".into(),
            player_two: "increase_min".into(),
            threads,
            seed,
            quiet: true,
            ..Default::default()
        }
    }

    fn seeded(id: &str, seed: u64) -> Strategy {
        get_strategy(id, &StrategyParams::default().with_seed(seed)).unwrap()
    }

    #[test]
    fn play_single_game_completes() {
        let mut one = seeded("max", 1);
        let mut two = seeded("reduce_deficit", 2);
        let mut rng = SmallRng::seed_from_u64(42);
        let game = play_game(&mut one, &mut two, &mut rng, GameOptions::default()).unwrap();

        assert!(!game.moves.is_empty());
        assert!(game.representation.is_none());
        let expected = crate::game::find_winner(&game.final_scores[0], &game.final_scores[1]);
        assert_eq!(game.winner, expected);
        // Seats alternate except for bonus moves.
        for pair in game.moves.windows(2) {
            if pair[1].bonus {
                assert_eq!(pair[0].player, pair[1].player);
            } else {
                assert_ne!(pair[0].player, pair[1].player);
            }
        }
    }

    #[test]
    fn recorded_rows_match_moves_and_outcome() {
        let mut one = seeded("mixed_3", 3);
        let mut two = seeded("rl", 4);
        let mut rng = SmallRng::seed_from_u64(7);
        let options = GameOptions {
            record: true,
            inference: false,
        };
        let game = play_game(&mut one, &mut two, &mut rng, options).unwrap();
        let repr = game.representation.as_ref().unwrap();
        assert_eq!(repr.len(), game.moves.len());
        for (i, mv) in game.moves.iter().enumerate() {
            assert_eq!(repr.turn_of[i], mv.player.id());
            let won = game.winner == Some(mv.player);
            assert_eq!(repr.values[i * 2], u8::from(won));
            if repr.should_exchange(i) {
                assert!(mv.should_exchange);
            }
        }
    }

    #[test]
    fn exchanges_happen_only_when_legal() {
        let mut one = seeded("random", 5);
        let mut two = seeded("random", 6);
        let mut rng = SmallRng::seed_from_u64(8);
        let options = GameOptions {
            record: false,
            inference: true,
        };
        let game = play_game(&mut one, &mut two, &mut rng, options).unwrap();
        assert!(game.moves.iter().all(|m| m.should_exchange));
        assert!(game.moves.iter().filter(|m| m.exchanged).all(|m| m.should_exchange));
    }

    #[test]
    fn sequential_run_produces_correct_count() {
        let games = run_self_play(&config(3, 1, 99)).unwrap();
        assert_eq!(games.len(), 3);
        assert_eq!(games[1].players, ["increase_min".to_string(), "max".to_string()]);
    }

    #[test]
    fn parallel_run_produces_correct_count() {
        let games = run_self_play(&config(4, 2, 77)).unwrap();
        assert_eq!(games.len(), 4);
        let ids: Vec<usize> = games.iter().map(|g| g.game_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let a = run_self_play(&config(2, 1, 5)).unwrap();
        let b = run_self_play(&config(2, 2, 5)).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.moves, y.moves);
            assert_eq!(x.winner, y.winner);
        }
    }

    #[test]
    fn unknown_strategy_fails_before_playing() {
        let mut cfg = config(2, 1, 1);
        cfg.player_two = "oracle".into();
        assert!(matches!(
            run_self_play(&cfg),
            Err(SelfPlayError::Strategy(StrategyError::UnknownStrategy(_)))
        ));
    }

    #[test]
    fn jsonl_output_is_valid() {
        let mut cfg = config(2, 1, 55);
        cfg.options.record = true;
        let games = run_self_play(&cfg).unwrap();
        let mut buf = Vec::new();
        write_jsonl(&games, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(output.lines().count(), 2);
        for line in output.lines() {
            let back: GameRecord = serde_json::from_str(line).unwrap();
            assert!(back.representation.is_some());
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("final_scores").is_some());
            assert!(value.get("moves").is_some());
        }
    }

    #[test]
    fn summary_counts_wins_by_id() {
        let games = run_self_play(&config(4, 1, 21)).unwrap();
        let summary = summarize(&games);
        assert_eq!(summary.games, 4);
        let wins: usize = summary.wins.iter().map(|(_, w)| w).sum();
        assert_eq!(wins + summary.draws, 4);
        assert_eq!(summary.wins.len(), 2);
    }
}
