//! Errors for caller contract violations.
//!
//! Search outcomes (found, exhausted, timed out) are not errors; they are
//! reported through [`crate::Status`].

use crate::Square;

/// Error raised when an argument does not describe a square, method or tour.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TourError {
    /// Coordinates outside the 8x8 board.
    #[error("square ({x}, {y}) is off the board (coordinates must be 0-7)")]
    InvalidSquare { x: u8, y: u8 },

    /// A raw square index outside 0-63.
    #[error("square index {0} is off the board (must be 0-63)")]
    InvalidSquareIndex(u8),

    #[error("invalid square notation: {0:?}")]
    InvalidNotation(String),

    #[error("unknown search method: {0:?} (expected \"brute-force\" or \"warnsdorff\")")]
    UnknownMethod(String),

    /// The tour does not begin on the requested square.
    #[error("tour starts at {found}, expected {expected}")]
    WrongStart { expected: Square, found: Square },

    #[error("square {0} is visited more than once")]
    RepeatedSquare(Square),

    /// Two consecutive path entries are not a knight's move apart.
    #[error("step {index}: {from} -> {to} is not a knight move")]
    IllegalStep { index: usize, from: Square, to: Square },
}
