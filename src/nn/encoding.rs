//! Game state -> representation encoding.
//!
//! A `Representation` is a batch of hypothetical states stored
//! structure-of-arrays as flat `u8` buffers. Per row:
//!   board   [11 * 11 * 8]  (row, col, [6 colours, occupied, available])
//!   deck    [2 * 6]        ([mixed tiles, doubles] x colour counts)
//!   scores  [2 * 6]        ([mover, opponent] x colour counts)
//!   general [5]            (ingenious, ingenious count, can exchange,
//!                           should exchange, move number)
//!   turn_of [1]            (player id, 1 or 2)
//!   values  [2]            (label placeholder filled by the game loop)
//!
//! The batched encoder doubles every candidate into a "play" row and a
//! "play then exchange" row, dropping the latter where exchange is illegal.

use serde::{Deserialize, Serialize};

use crate::board::{Move, BOARD_TENSOR_LEN, NUM_COLOURS};
use crate::game::{GameState, Player};
use crate::player::{Deck, DECK_TENSOR_LEN};

/// Flat length of one scores entry (2 x 6).
pub const SCORES_TENSOR_LEN: usize = 2 * NUM_COLOURS;

/// Length of the general-info vector.
pub const GENERAL_LEN: usize = 5;

/// Length of the values placeholder per row.
pub const VALUES_LEN: usize = 2;

pub const GENERAL_INGENIOUS: usize = 0;
pub const GENERAL_NUM_INGENIOUS: usize = 1;
pub const GENERAL_CAN_EXCHANGE: usize = 2;
pub const GENERAL_SHOULD_EXCHANGE: usize = 3;
pub const GENERAL_MOVE_NUM: usize = 4;

/// A batch of encoded states. Always carries `size` and `empty` so batches
/// can be merged incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Representation {
    pub version: u8,
    pub size: usize,
    pub empty: bool,
    pub board: Vec<u8>,
    pub deck: Vec<u8>,
    pub scores: Vec<u8>,
    pub general: Vec<u8>,
    pub turn_of: Vec<u8>,
    pub values: Vec<u8>,
}

impl Default for Representation {
    fn default() -> Self {
        Self::new()
    }
}

/// One row's worth of fields, used while assembling a batch.
struct Row<'a> {
    board: &'a [u8],
    deck: &'a [u8; DECK_TENSOR_LEN],
    scores: [u8; SCORES_TENSOR_LEN],
    general: [u8; GENERAL_LEN],
    turn_of: u8,
}

impl Representation {
    /// An empty batch.
    pub fn new() -> Self {
        Representation {
            version: 1,
            size: 0,
            empty: true,
            board: Vec::new(),
            deck: Vec::new(),
            scores: Vec::new(),
            general: Vec::new(),
            turn_of: Vec::new(),
            values: Vec::new(),
        }
    }

    fn with_capacity(rows: usize) -> Self {
        Representation {
            board: Vec::with_capacity(rows * BOARD_TENSOR_LEN),
            deck: Vec::with_capacity(rows * DECK_TENSOR_LEN),
            scores: Vec::with_capacity(rows * SCORES_TENSOR_LEN),
            general: Vec::with_capacity(rows * GENERAL_LEN),
            turn_of: Vec::with_capacity(rows),
            values: Vec::with_capacity(rows * VALUES_LEN),
            ..Representation::new()
        }
    }

    fn push_row(&mut self, row: Row<'_>) {
        self.board.extend_from_slice(row.board);
        self.deck.extend_from_slice(row.deck);
        self.scores.extend_from_slice(&row.scores);
        self.general.extend_from_slice(&row.general);
        self.turn_of.push(row.turn_of);
        self.values.extend_from_slice(&[0; VALUES_LEN]);
        self.size += 1;
        self.empty = false;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn board_row(&self, i: usize) -> &[u8] {
        &self.board[i * BOARD_TENSOR_LEN..(i + 1) * BOARD_TENSOR_LEN]
    }

    pub fn deck_row(&self, i: usize) -> &[u8] {
        &self.deck[i * DECK_TENSOR_LEN..(i + 1) * DECK_TENSOR_LEN]
    }

    pub fn scores_row(&self, i: usize) -> &[u8] {
        &self.scores[i * SCORES_TENSOR_LEN..(i + 1) * SCORES_TENSOR_LEN]
    }

    pub fn general_row(&self, i: usize) -> &[u8] {
        &self.general[i * GENERAL_LEN..(i + 1) * GENERAL_LEN]
    }

    /// Should-exchange flag of a row.
    pub fn should_exchange(&self, i: usize) -> bool {
        self.general_row(i)[GENERAL_SHOULD_EXCHANGE] == 1
    }

    /// Can-exchange flag of a row.
    pub fn can_exchange(&self, i: usize) -> bool {
        self.general_row(i)[GENERAL_CAN_EXCHANGE] == 1
    }

    /// Appends another batch after this one.
    pub fn combine(&mut self, other: &Representation) {
        if other.empty {
            return;
        }
        self.board.extend_from_slice(&other.board);
        self.deck.extend_from_slice(&other.deck);
        self.scores.extend_from_slice(&other.scores);
        self.general.extend_from_slice(&other.general);
        self.turn_of.extend_from_slice(&other.turn_of);
        self.values.extend_from_slice(&other.values);
        self.size += other.size;
        self.empty = false;
    }

    /// Truncates to the first `size` rows.
    pub fn clip_to_size(&mut self, size: usize) {
        let size = size.min(self.size);
        self.board.truncate(size * BOARD_TENSOR_LEN);
        self.deck.truncate(size * DECK_TENSOR_LEN);
        self.scores.truncate(size * SCORES_TENSOR_LEN);
        self.general.truncate(size * GENERAL_LEN);
        self.turn_of.truncate(size);
        self.values.truncate(size * VALUES_LEN);
        self.size = size;
        self.empty = size == 0;
    }

    /// A new batch holding only the given rows, in the given order.
    pub fn select(&self, idxs: &[usize]) -> Representation {
        let mut out = Representation::with_capacity(idxs.len());
        for &i in idxs {
            out.board.extend_from_slice(self.board_row(i));
            out.deck.extend_from_slice(self.deck_row(i));
            out.scores.extend_from_slice(self.scores_row(i));
            out.general.extend_from_slice(self.general_row(i));
            out.turn_of.push(self.turn_of[i]);
            out.values
                .extend_from_slice(&self.values[i * VALUES_LEN..(i + 1) * VALUES_LEN]);
            out.size += 1;
            out.empty = false;
        }
        out
    }

    /// Writes a game-outcome label into every row: 1 where the row's mover
    /// won, 0 otherwise.
    pub fn label_outcome(&mut self, winner: Option<Player>) {
        for i in 0..self.size {
            let won = winner.is_some_and(|w| w.id() == self.turn_of[i]);
            self.values[i * VALUES_LEN] = u8::from(won);
        }
    }
}

fn scores_pair(own: [u8; NUM_COLOURS], other: [u8; NUM_COLOURS]) -> [u8; SCORES_TENSOR_LEN] {
    let mut out = [0u8; SCORES_TENSOR_LEN];
    out[..NUM_COLOURS].copy_from_slice(&own);
    out[NUM_COLOURS..].copy_from_slice(&other);
    out
}

/// Encodes the current state from `turn_of`'s viewpoint as a single row.
pub fn encode_single(
    state: &GameState,
    turn_of: Player,
    ingenious: bool,
    num_ingenious: u8,
    should_exchange: bool,
) -> Representation {
    let mut board = vec![0u8; BOARD_TENSOR_LEN];
    state.board.encode_into(&mut board);
    let deck = state.deck(turn_of).encode();
    let can_exchange = state.can_exchange(turn_of);

    let mut repr = Representation::with_capacity(1);
    repr.push_row(Row {
        board: &board,
        deck: &deck,
        scores: scores_pair(
            state.score(turn_of).counts(),
            state.score(turn_of.other()).counts(),
        ),
        general: [
            u8::from(ingenious),
            num_ingenious,
            u8::from(can_exchange),
            u8::from(should_exchange && can_exchange),
            state.board.move_num,
        ],
        turn_of: turn_of.id(),
    });
    repr
}

/// Encodes the post-move state of every candidate, doubled by exchange
/// choice. Returns the batch and the move behind each row.
///
/// Rows come out as all "keep hand" rows in candidate order followed by the
/// "exchange" rows of candidates where exchange is legal, in candidate order.
pub fn encode_batched(
    state: &GameState,
    turn_of: Player,
    moves: &[Move],
) -> (Representation, Vec<Move>) {
    let n = moves.len();
    if n == 0 {
        return (Representation::new(), Vec::new());
    }

    let board = &state.board;
    let deck = state.deck(turn_of);
    let other_scores = state.score(turn_of.other()).counts();

    let deltas = board.batch_move_scores(moves);
    let preview = state.score(turn_of).peek_next_scores(&deltas);
    let tiles: Vec<_> = moves.iter().map(|m| m.tile).collect();
    let next_decks = deck.peek_next_decks(&tiles);
    let can_exchange = Deck::batch_can_exchange(&next_decks, &preview.scores);

    let mut boards = vec![0u8; n * BOARD_TENSOR_LEN];
    let mut deck_reprs = Vec::with_capacity(n);
    for (i, mv) in moves.iter().enumerate() {
        board
            .peek_after(mv)
            .encode_into(&mut boards[i * BOARD_TENSOR_LEN..(i + 1) * BOARD_TENSOR_LEN]);
        deck_reprs.push(next_decks[i].encode());
    }

    let exchange_rows = can_exchange.iter().filter(|&&c| c).count();
    let mut repr = Representation::with_capacity(n + exchange_rows);
    let mut subset = Vec::with_capacity(n + exchange_rows);
    let move_num = board.move_num;

    for should_exchange in [false, true] {
        for (i, mv) in moves.iter().enumerate() {
            if should_exchange && !can_exchange[i] {
                continue;
            }
            repr.push_row(Row {
                board: &boards[i * BOARD_TENSOR_LEN..(i + 1) * BOARD_TENSOR_LEN],
                deck: &deck_reprs[i],
                scores: scores_pair(preview.scores[i], other_scores),
                general: [
                    u8::from(preview.ingenious[i]),
                    preview.num_ingenious[i],
                    u8::from(can_exchange[i]),
                    u8::from(should_exchange && can_exchange[i]),
                    move_num,
                ],
                turn_of: turn_of.id(),
            });
            subset.push(*mv);
        }
    }

    (repr, subset)
}
