//! Move-choosing strategies.
//!
//! A [`Strategy`] is built from a string id by [`get_strategy`] and exposes
//! a single capability, [`Strategy::choose_move`]. Heuristic strategies
//! pick from a batch-scored candidate list; learned strategies delegate to
//! the value-guided search in [`crate::search`].

pub mod heuristic;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::board::Move;
use crate::eval::{EstimatorError, HeuristicEstimator, ValueEstimator};
use crate::game::{GameState, Player};
use crate::search::{SearchDepth, SearchEngine};

pub use heuristic::{score_candidates, MarginSchedule, Rule, ScoredBatch};

/// Every id accepted by [`get_strategy`].
pub const STRATEGY_IDS: [&str; 12] = [
    "random",
    "max",
    "increase_min",
    "increase_other_min",
    "reduce_deficit",
    "mixed_1",
    "mixed_2",
    "mixed_3",
    "mixed_4",
    "rl",
    "rl_2ply",
    "rl_3ply",
];

/// Margin used by the plain `reduce_deficit` strategy and by Mixed2.
pub const DEFAULT_DEFICIT_MARGIN: u8 = 5;

/// Confidence reported by the heuristic strategies.
const HEURISTIC_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("unknown strategy id: {0}")]
    UnknownStrategy(String),

    #[error("no legal candidate moves")]
    NoCandidates,

    #[error("estimator returned no finite value")]
    NoFiniteValue,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Estimator(#[from] EstimatorError),
}

/// Tunables shared by every strategy built from one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    /// ONNX value model. `None` uses the heuristic estimator.
    pub ckpt_path: Option<PathBuf>,
    /// Largest sub-batch handed to the estimator in one call.
    pub max_eval_batch_size: usize,
    /// Candidates expanded by the 2-ply and 3-ply searches.
    pub search_width: usize,
    /// Randomly permute colours and flip the grid before estimation.
    pub augment: bool,
    /// RNG seed; 0 draws from entropy.
    pub seed: u64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            ckpt_path: None,
            max_eval_batch_size: 1024,
            search_width: 8,
            augment: false,
            seed: 0,
        }
    }
}

impl StrategyParams {
    /// Reads parameters from a JSON file; missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StrategyError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| StrategyError::Config(format!("{}: {e}", path.display())))?;
        let params: StrategyParams = serde_json::from_str(&text)
            .map_err(|e| StrategyError::Config(format!("{}: {e}", path.display())))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.max_eval_batch_size == 0 {
            return Err(StrategyError::Config(
                "max_eval_batch_size must be at least 1".into(),
            ));
        }
        if self.search_width == 0 {
            return Err(StrategyError::Config("search_width must be at least 1".into()));
        }
        Ok(())
    }

    /// Same parameters with a different seed.
    pub fn with_seed(&self, seed: u64) -> Self {
        StrategyParams {
            seed,
            ..self.clone()
        }
    }

    fn rng(&self) -> SmallRng {
        if self.seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(self.seed)
        }
    }
}

/// A chosen move plus the exchange decision that goes with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub mv: Move,
    pub should_exchange: bool,
    pub confidence: f32,
}

/// Heuristic strategy kinds and the state they carry between decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeuristicKind {
    Random,
    Max,
    IncreaseMin,
    IncreaseOtherMin,
    ReduceDeficit { margin: u8 },
    Mixed1,
    Mixed2,
    Mixed3(MarginSchedule),
    Mixed4(MarginSchedule),
}

impl HeuristicKind {
    /// Picks the rule for this decision.
    fn resolve(&self, rng: &mut impl Rng) -> Rule {
        match *self {
            HeuristicKind::Random => Rule::Random,
            HeuristicKind::Max => Rule::Max,
            HeuristicKind::IncreaseMin => Rule::IncreaseMin,
            HeuristicKind::IncreaseOtherMin => Rule::IncreaseOtherMin,
            HeuristicKind::ReduceDeficit { margin } => Rule::ReduceDeficit(margin),
            HeuristicKind::Mixed1 => Rule::ReduceDeficit(rng.gen_range(0..5)),
            HeuristicKind::Mixed2 => match rng.gen_range(0..5) {
                0 => Rule::Max,
                1 => Rule::IncreaseMin,
                2 => Rule::IncreaseOtherMin,
                3 => Rule::ReduceDeficit(DEFAULT_DEFICIT_MARGIN),
                _ => Rule::ReduceDeficit(rng.gen_range(0..5)),
            },
            HeuristicKind::Mixed3(schedule) | HeuristicKind::Mixed4(schedule) => {
                Rule::ReduceDeficit(schedule.current())
            }
        }
    }

    fn on_move_chosen(&mut self) {
        if let HeuristicKind::Mixed3(schedule) | HeuristicKind::Mixed4(schedule) = self {
            schedule.on_move_chosen();
        }
    }
}

/// Closed set of strategy kinds.
#[derive(Clone)]
pub enum StrategyKind {
    Heuristic(HeuristicKind),
    Learned {
        engine: SearchEngine,
        depth: SearchDepth,
    },
}

impl fmt::Debug for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Heuristic(kind) => f.debug_tuple("Heuristic").field(kind).finish(),
            StrategyKind::Learned { depth, .. } => {
                f.debug_struct("Learned").field("depth", depth).finish()
            }
        }
    }
}

/// A strategy instance: its kind plus its own random stream.
#[derive(Debug, Clone)]
pub struct Strategy {
    id: String,
    kind: StrategyKind,
    rng: SmallRng,
}

impl Strategy {
    pub fn new(id: impl Into<String>, kind: StrategyKind, rng: SmallRng) -> Self {
        Strategy {
            id: id.into(),
            kind,
            rng,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &StrategyKind {
        &self.kind
    }

    /// Chooses a move for `turn_of`.
    ///
    /// `inference` only matters to the heuristic strategies: when false the
    /// exchange flag is a fair coin, when true it is always set. Learned
    /// strategies take the flag from the winning row.
    pub fn choose_move(
        &mut self,
        state: &GameState,
        turn_of: Player,
        inference: bool,
    ) -> Result<Decision, StrategyError> {
        match &mut self.kind {
            StrategyKind::Learned { engine, depth } => {
                engine.choose_move(state, turn_of, *depth, &mut self.rng)
            }
            StrategyKind::Heuristic(kind) => {
                let batch = score_candidates(state, turn_of);
                if batch.is_empty() {
                    return Err(StrategyError::NoCandidates);
                }
                let rule = kind.resolve(&mut self.rng);
                let idx = rule.select(&batch, &mut self.rng);
                kind.on_move_chosen();
                let should_exchange = inference || self.rng.gen_bool(0.5);
                Ok(Decision {
                    mv: batch.moves[idx],
                    should_exchange,
                    confidence: HEURISTIC_CONFIDENCE,
                })
            }
        }
    }
}

/// Loads the value estimator named by the parameters.
pub fn load_estimator(params: &StrategyParams) -> Result<Arc<dyn ValueEstimator>, StrategyError> {
    match &params.ckpt_path {
        None => {
            info!("no checkpoint configured, using heuristic value estimator");
            Ok(Arc::new(HeuristicEstimator::default()))
        }
        #[cfg(feature = "neural")]
        Some(path) => Ok(Arc::new(crate::eval::OnnxEstimator::load(path)?)),
        #[cfg(not(feature = "neural"))]
        Some(path) => Err(StrategyError::Config(format!(
            "checkpoint {} needs a build with the `neural` feature",
            path.display()
        ))),
    }
}

/// Builds a strategy from its id.
pub fn get_strategy(id: &str, params: &StrategyParams) -> Result<Strategy, StrategyError> {
    params.validate()?;
    match search_depth(id) {
        Some(depth) => {
            let estimator = load_estimator(params)?;
            Ok(learned_strategy(id, depth, estimator, params))
        }
        None => {
            let kind = heuristic_kind(id)?;
            Ok(Strategy::new(id, StrategyKind::Heuristic(kind), params.rng()))
        }
    }
}

/// Lookahead depth for the learned strategy ids, `None` for the rest.
pub fn search_depth(id: &str) -> Option<SearchDepth> {
    match id {
        "rl" => Some(SearchDepth::One),
        "rl_2ply" => Some(SearchDepth::Two),
        "rl_3ply" => Some(SearchDepth::Three),
        _ => None,
    }
}

/// Builds a learned strategy around an already-loaded estimator.
pub fn learned_strategy(
    id: &str,
    depth: SearchDepth,
    estimator: Arc<dyn ValueEstimator>,
    params: &StrategyParams,
) -> Strategy {
    let engine = SearchEngine::new(
        estimator,
        params.max_eval_batch_size,
        params.search_width,
        params.augment,
    );
    Strategy::new(id, StrategyKind::Learned { engine, depth }, params.rng())
}

fn heuristic_kind(id: &str) -> Result<HeuristicKind, StrategyError> {
    Ok(match id {
        "random" => HeuristicKind::Random,
        "max" => HeuristicKind::Max,
        "increase_min" => HeuristicKind::IncreaseMin,
        "increase_other_min" => HeuristicKind::IncreaseOtherMin,
        "reduce_deficit" => HeuristicKind::ReduceDeficit {
            margin: DEFAULT_DEFICIT_MARGIN,
        },
        "mixed_1" => HeuristicKind::Mixed1,
        "mixed_2" => HeuristicKind::Mixed2,
        "mixed_3" => HeuristicKind::Mixed3(MarginSchedule::mixed3()),
        "mixed_4" => HeuristicKind::Mixed4(MarginSchedule::mixed4()),
        other => return Err(StrategyError::UnknownStrategy(other.to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> StrategyParams {
        StrategyParams {
            seed,
            ..StrategyParams::default()
        }
    }

    #[test]
    fn factory_knows_every_id() {
        for id in STRATEGY_IDS {
            let s = get_strategy(id, &seeded(1)).unwrap();
            assert_eq!(s.id(), id);
        }
    }

    #[test]
    fn unknown_id_is_an_error() {
        match get_strategy("alpha_zero", &seeded(1)) {
            Err(StrategyError::UnknownStrategy(id)) => assert_eq!(id, "alpha_zero"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn invalid_params_are_rejected() {
        let params = StrategyParams {
            max_eval_batch_size: 0,
            ..StrategyParams::default()
        };
        assert!(matches!(
            get_strategy("rl", &params),
            Err(StrategyError::Config(_))
        ));
    }

    #[cfg(not(feature = "neural"))]
    #[test]
    fn checkpoint_without_neural_feature_is_a_config_error() {
        let params = StrategyParams {
            ckpt_path: Some(PathBuf::from("model.onnx")),
            ..seeded(1)
        };
        assert!(matches!(
            get_strategy("rl", &params),
            Err(StrategyError::Config(_))
        ));
    }

    #[test]
    fn params_load_from_json_with_defaults() {
        let dir = std::env::temp_dir().join(format!("ingenious-params-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("params.json");
        std::fs::write(&path, r#"{"search_width": 3, "seed": 42}"#).unwrap();
        let params = StrategyParams::from_json_file(&path).unwrap();
        assert_eq!(params.search_width, 3);
        assert_eq!(params.seed, 42);
        assert_eq!(params.max_eval_batch_size, 1024);
        assert!(!params.augment);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn heuristic_exchange_flag_follows_inference() {
        let mut rng = SmallRng::seed_from_u64(3);
        let state = GameState::new(&mut rng);
        let mut s = get_strategy("max", &seeded(5)).unwrap();
        for _ in 0..20 {
            let d = s.choose_move(&state, Player::One, true).unwrap();
            assert!(d.should_exchange);
            assert_eq!(d.confidence, 0.5);
        }
        let flags: Vec<bool> = (0..64)
            .map(|_| s.choose_move(&state, Player::One, false).unwrap().should_exchange)
            .collect();
        assert!(flags.iter().any(|&f| f));
        assert!(flags.iter().any(|&f| !f));
    }

    #[test]
    fn mixed3_schedule_advances_per_decision() {
        let mut rng = SmallRng::seed_from_u64(4);
        let state = GameState::new(&mut rng);
        let mut s = get_strategy("mixed_3", &seeded(6)).unwrap();
        for _ in 0..4 {
            s.choose_move(&state, Player::One, false).unwrap();
        }
        match s.kind() {
            StrategyKind::Heuristic(HeuristicKind::Mixed3(schedule)) => {
                assert_eq!(schedule.current(), 11)
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn no_candidates_is_an_error() {
        use crate::board::{Board, Colour, ALL_HEXES};
        use crate::player::{Deck, Score};
        let mut board = Board::new();
        for &hex in ALL_HEXES.iter() {
            board.set(hex, Some(Colour::Blue));
        }
        let state = GameState::from_parts(
            board,
            [Deck::new(), Deck::new()],
            [Score::default(), Score::default()],
            Player::One,
        );
        let mut s = get_strategy("increase_min", &seeded(1)).unwrap();
        assert!(matches!(
            s.choose_move(&state, Player::One, false),
            Err(StrategyError::NoCandidates)
        ));
    }
}
