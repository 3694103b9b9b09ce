//! Game state aggregate.
//!
//! Bundles the board, both decks, both score ledgers, the bag, and whose
//! turn it is. Strategies only ever borrow a `GameState` immutably; search
//! branches work on clones.

use std::cmp::Ordering;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{combine_moves_and_deck, Board, Move};
use crate::player::{Bag, Deck, Score};

/// One of the two seats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    #[inline]
    pub const fn other(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Numeric id used in encoded representations (1 or 2).
    #[inline]
    pub const fn id(self) -> u8 {
        self.index() as u8 + 1
    }
}

/// Complete game snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub decks: [Deck; 2],
    pub scores: [Score; 2],
    pub bag: Bag,
    pub turn: Player,
}

impl GameState {
    /// Starts a new game: full shuffled bag, six tiles dealt to each player,
    /// player One to move.
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut bag = Bag::full(rng);
        let mut decks = [Deck::new(), Deck::new()];
        for deck in decks.iter_mut() {
            deck.refill(&mut bag);
        }
        GameState {
            board: Board::new(),
            decks,
            scores: [Score::default(), Score::default()],
            bag,
            turn: Player::One,
        }
    }

    /// Builds a state from explicit parts, mostly for tests.
    pub fn from_parts(board: Board, decks: [Deck; 2], scores: [Score; 2], turn: Player) -> Self {
        GameState {
            board,
            decks,
            scores,
            bag: Bag::from_tiles(Vec::new()),
            turn,
        }
    }

    #[inline]
    pub fn deck(&self, player: Player) -> &Deck {
        &self.decks[player.index()]
    }

    #[inline]
    pub fn score(&self, player: Player) -> &Score {
        &self.scores[player.index()]
    }

    /// Every legal move for the player: placements x distinct deck tiles x
    /// orientations.
    pub fn candidate_moves(&self, player: Player) -> Vec<Move> {
        let placements = self.board.placements();
        combine_moves_and_deck(&placements, self.deck(player).tiles())
    }

    /// Applies a move for the player: board, score and deck all change.
    /// Returns the number of colours that reached the cap.
    pub fn apply_move(&mut self, player: Player, mv: &Move) -> u8 {
        let delta = self.board.move_score(mv);
        self.board.place(mv);
        self.decks[player.index()].play_tile(mv.tile);
        self.scores[player.index()].update(&delta)
    }

    /// Returns true if the player may exchange their hand right now.
    pub fn can_exchange(&self, player: Player) -> bool {
        self.deck(player).can_exchange(self.score(player))
    }

    /// Ends the player's turn: optional exchange, refill, pass the move.
    pub fn end_turn(&mut self, player: Player, should_exchange: bool, rng: &mut impl Rng) {
        let idx = player.index();
        if should_exchange && self.can_exchange(player) {
            self.decks[idx].exchange(&mut self.bag, rng);
        }
        self.decks[idx].refill(&mut self.bag);
        self.turn = player.other();
    }

    /// The game ends when no tile fits anywhere, or a player has capped
    /// every colour.
    pub fn is_terminal(&self) -> bool {
        self.scores.iter().any(Score::all_capped) || !self.board.has_placement()
    }

    /// Winner of a finished (or hypothetically finished) game; `None` is a
    /// draw.
    pub fn winner(&self) -> Option<Player> {
        find_winner(&self.scores[0], &self.scores[1])
    }
}

/// Compares two score ledgers.
///
/// A player with every colour capped wins outright. Otherwise the ascending
/// sorted counts are compared lexicographically: the better weakest colour
/// wins, ties fall through to the next weakest.
pub fn find_winner(one: &Score, two: &Score) -> Option<Player> {
    match (one.all_capped(), two.all_capped()) {
        (true, false) => return Some(Player::One),
        (false, true) => return Some(Player::Two),
        _ => {}
    }
    match one.sorted().cmp(&two.sorted()) {
        Ordering::Greater => Some(Player::One),
        Ordering::Less => Some(Player::Two),
        Ordering::Equal => None,
    }
}
