//! Knight's tour search with bit-based board representation.
//!
//! # Square Encoding
//!
//! ```text
//! index = y * 8 + x      (x = file 0-7, y = rank 0-7)
//!
//!   y=7 | 56 57 58 59 60 61 62 63
//!   y=6 | 48 49 50 51 52 53 54 55
//!   ...
//!   y=1 |  8  9 10 11 12 13 14 15
//!   y=0 |  0  1  2  3  4  5  6  7
//!        -----------------------
//!         x=0                 x=7
//!
//! OFF_BOARD = 64 marks a knight move that leaves the board.
//! ```
//!
//! # Visited Encoding (64-bit)
//!
//! ```text
//! Bit i set  <=>  square i is already on the path being built.
//! popcount   ==   number of squares placed so far.
//! ```
//!
//! The search itself lives in [`search`]: [`knights_tour`] walks the move
//! table in canonical order, [`warnsdorff_knights_tour`] tries the
//! least-connected square first.

pub mod error;
pub mod moves;
pub mod search;
pub mod time;
pub mod warnsdorff;

#[cfg(feature = "wasm")]
pub mod wasm;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use error::TourError;
pub use moves::{move_table, MoveTable, KNIGHT_OFFSETS};
pub use search::{
    find_tour, find_tour_with, knights_tour, validate_tour, warnsdorff_knights_tour, Method,
    SearchConfig, SearchReport, SearchStats, Status, TourPath, TourSearch,
};
pub use warnsdorff::{onward_degree, Candidates, BLOCKED_DEGREE};

/// Squares along one edge of the board.
pub const BOARD_LEN: u8 = 8;
/// Total squares on the board.
pub const BOARD_SIZE: usize = 64;
/// Knight moves available from a square before clipping to the board.
pub const MOVE_COUNT: usize = 8;
/// Move table slot value for a move that leaves the board.
pub const OFF_BOARD: u8 = BOARD_SIZE as u8;

/// A square on the 8x8 board (0-63).
///
/// Layout: `index = y * 8 + x`, so `(0, 0)` is `a1` and `(7, 7)` is `h8`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Square(pub u8);

impl Square {
    /// Create a square from coordinates already known to be on the board.
    #[inline]
    pub fn new(x: u8, y: u8) -> Square {
        debug_assert!(x < BOARD_LEN && y < BOARD_LEN);
        Square(y * BOARD_LEN + x)
    }

    /// Create a square from caller-supplied coordinates.
    pub fn from_xy(x: u8, y: u8) -> Result<Square, TourError> {
        if x < BOARD_LEN && y < BOARD_LEN {
            Ok(Square::new(x, y))
        } else {
            Err(TourError::InvalidSquare { x, y })
        }
    }

    /// Create a square from a raw index.
    pub fn from_index(index: u8) -> Result<Square, TourError> {
        if (index as usize) < BOARD_SIZE {
            Ok(Square(index))
        } else {
            Err(TourError::InvalidSquareIndex(index))
        }
    }

    /// File (0-7).
    #[inline]
    pub fn x(self) -> u8 {
        self.0 % BOARD_LEN
    }

    /// Rank (0-7).
    #[inline]
    pub fn y(self) -> u8 {
        self.0 / BOARD_LEN
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if this is a valid square (0-63).
    #[inline]
    pub fn is_valid(self) -> bool {
        (self.0 as usize) < BOARD_SIZE
    }

    /// Check whether `other` is one knight's move away.
    pub fn is_knight_move(self, other: Square) -> bool {
        let dx = (self.x() as i8 - other.x() as i8).abs();
        let dy = (self.y() as i8 - other.y() as i8).abs();
        (dx == 1 && dy == 2) || (dx == 2 && dy == 1)
    }

    /// Iterate over all 64 squares.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..BOARD_SIZE as u8).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "#{}", self.0);
        }
        write!(f, "{}{}", (b'a' + self.x()) as char, self.y() + 1)
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Square({self})")
    }
}

impl FromStr for Square {
    type Err = TourError;

    /// Parse algebraic notation such as `a1` or `H8`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        let invalid = || TourError::InvalidNotation(s.to_string());
        if bytes.len() != 2 {
            return Err(invalid());
        }
        let file = bytes[0].to_ascii_lowercase();
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(invalid());
        }
        Ok(Square::new(file - b'a', rank - b'1'))
    }
}

impl TryFrom<u8> for Square {
    type Error = TourError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Square::from_index(index)
    }
}

impl From<Square> for u8 {
    fn from(square: Square) -> u8 {
        square.0
    }
}

/// Set of squares already placed on the path, one bit per square.
///
/// `Copy`, so a search frame can take it by value and a failed branch
/// needs no explicit undo.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Visited(pub u64);

impl Visited {
    const FULL: u64 = u64::MAX;

    /// An empty set.
    #[inline]
    pub const fn empty() -> Visited {
        Visited(0)
    }

    /// Copy of this set with `square` added.
    #[inline]
    #[must_use]
    pub const fn with(self, square: Square) -> Visited {
        Visited(self.0 | (1u64 << square.0))
    }

    #[inline]
    pub fn insert(&mut self, square: Square) {
        debug_assert!(square.is_valid());
        self.0 |= 1u64 << square.0;
    }

    #[inline]
    pub fn remove(&mut self, square: Square) {
        debug_assert!(square.is_valid());
        self.0 &= !(1u64 << square.0);
    }

    #[inline]
    pub const fn contains(self, square: Square) -> bool {
        (self.0 >> square.0) & 1 == 1
    }

    /// Number of squares in the set.
    #[inline]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// All 64 squares visited.
    #[inline]
    pub const fn is_full(self) -> bool {
        self.0 == Self::FULL
    }

    /// Iterate squares in ascending index order.
    pub fn iter(self) -> impl Iterator<Item = Square> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let index = bits.trailing_zeros() as u8;
            bits &= bits - 1;
            Some(Square(index))
        })
    }
}

impl FromIterator<Square> for Visited {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> Self {
        let mut visited = Visited::empty();
        for square in iter {
            visited.insert(square);
        }
        visited
    }
}

impl fmt::Debug for Visited {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
