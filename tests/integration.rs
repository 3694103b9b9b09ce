//! Integration tests for the ingenious binaries and full games.
//!
//! Spawns the match runner and the self-play generator, and plays complete
//! games between every pair of heuristic strategies through the library.

use std::process::{Command, Stdio};

use ingenious::game::find_winner;
use ingenious::selfplay::{play_game, run_self_play, GameOptions, GameRecord, SelfPlayConfig};
use ingenious::strategy::{get_strategy, StrategyParams, STRATEGY_IDS};
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Runs a binary with the given arguments and returns (success, stdout).
fn run_bin(exe: &str, args: &[&str]) -> (bool, String) {
    let output = Command::new(exe)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .expect("failed to start binary");
    (
        output.status.success(),
        String::from_utf8(output.stdout).expect("stdout is not UTF-8"),
    )
}

#[test]
fn list_prints_every_strategy_id() {
    let (ok, out) = run_bin(env!("CARGO_BIN_EXE_ingenious"), &["--list"]);
    assert!(ok);
    let ids: Vec<&str> = out.lines().collect();
    assert_eq!(ids, STRATEGY_IDS.to_vec());
}

#[test]
fn match_runner_plays_games() {
    let (ok, _) = run_bin(
        env!("CARGO_BIN_EXE_ingenious"),
        &["--one", "max", "--two", "mixed_4", "--games", "2", "--seed", "3"],
    );
    assert!(ok);
}

#[test]
fn match_runner_rejects_unknown_strategy() {
    let (ok, _) = run_bin(
        env!("CARGO_BIN_EXE_ingenious"),
        &["--one", "grandmaster", "--games", "1", "--seed", "3"],
    );
    assert!(!ok);
}

#[test]
fn selfplay_writes_jsonl_to_stdout() {
    let (ok, out) = run_bin(
        env!("CARGO_BIN_EXE_selfplay"),
        &[
            "--games", "2", "--threads", "1", "--seed", "11", "--one", "rl", "--two",
            "random", "--quiet",
        ],
    );
    assert!(ok);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let game: GameRecord = serde_json::from_str(line).expect("line should be a game record");
        let repr = game.representation.expect("self-play records rows");
        assert_eq!(repr.len(), game.moves.len());
    }
}

#[test]
fn every_heuristic_pairing_finishes_consistently() {
    let heuristics: Vec<&str> = STRATEGY_IDS
        .iter()
        .copied()
        .filter(|id| !id.starts_with("rl"))
        .collect();
    let mut seed = 100;
    for &a in &heuristics {
        for &b in &heuristics {
            seed += 1;
            let params = StrategyParams::default();
            let mut one = get_strategy(a, &params.with_seed(seed)).unwrap();
            let mut two = get_strategy(b, &params.with_seed(seed + 1000)).unwrap();
            let mut rng = SmallRng::seed_from_u64(seed);
            let game = play_game(&mut one, &mut two, &mut rng, GameOptions::default()).unwrap();
            assert_eq!(
                game.winner,
                find_winner(&game.final_scores[0], &game.final_scores[1]),
                "{a} vs {b}"
            );
            assert!(game.turns > 0);
        }
    }
}

#[test]
fn learned_strategies_play_full_games() {
    let params = StrategyParams {
        search_width: 1,
        max_eval_batch_size: 64,
        ..StrategyParams::default()
    };
    for (i, id) in ["rl", "rl_2ply", "rl_3ply"].iter().enumerate() {
        let mut one = get_strategy(id, &params.with_seed(i as u64 + 1)).unwrap();
        let mut two = get_strategy("max", &params.with_seed(i as u64 + 50)).unwrap();
        let mut rng = SmallRng::seed_from_u64(i as u64 + 9);
        let options = GameOptions {
            record: true,
            inference: true,
        };
        let game = play_game(&mut one, &mut two, &mut rng, options).unwrap();
        let repr = game.representation.unwrap();
        assert_eq!(repr.len(), game.moves.len());
        // Exchange flags in recorded rows are only ever set where legal.
        for r in 0..repr.len() {
            if repr.should_exchange(r) {
                assert!(repr.can_exchange(r));
            }
        }
    }
}

#[test]
fn parallel_self_play_with_learned_seat() {
    let config = SelfPlayConfig {
        num_games: 3,
        player_one: "rl".into(),
        player_two: "increase_other_min".into(),
        threads: 3,
        seed: 4,
        quiet: true,
        ..SelfPlayConfig::default()
    };
    let games = run_self_play(&config).unwrap();
    assert_eq!(games.len(), 3);
    assert!(games.iter().all(|g| g.representation.is_some()));
}
