//! Precomputed knight move table.
//!
//! Every square gets exactly [`MOVE_COUNT`] slots, one per entry of
//! [`KNIGHT_OFFSETS`] in that order. A slot holds the target square index,
//! or [`OFF_BOARD`] when the move would leave the board.
//!
//! The process-wide table returned by [`move_table`] is built on first use
//! and never mutated afterwards. Move ordering heuristics work on a copy of
//! a row (see [`crate::warnsdorff::Candidates`]).

use crate::{Square, Visited, BOARD_LEN, BOARD_SIZE, MOVE_COUNT, OFF_BOARD};

/// Knight offsets `(dx, dy)` in canonical order.
pub const KNIGHT_OFFSETS: [(i8, i8); MOVE_COUNT] = [
    (2, 1),
    (1, 2),
    (-1, 2),
    (-2, 1),
    (-2, -1),
    (-1, -2),
    (1, -2),
    (2, -1),
];

lazy_static::lazy_static! {
    static ref MOVE_TABLE: MoveTable = {
        log::debug!("building knight move table");
        MoveTable::build()
    };
}

/// The shared move table, built on first access.
pub fn move_table() -> &'static MoveTable {
    &MOVE_TABLE
}

/// Per-square knight targets.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MoveTable {
    rows: [[u8; MOVE_COUNT]; BOARD_SIZE],
}

impl MoveTable {
    /// Compute the table from board geometry.
    pub fn build() -> MoveTable {
        let mut rows = [[OFF_BOARD; MOVE_COUNT]; BOARD_SIZE];
        for square in Square::all() {
            let x = square.x() as i8;
            let y = square.y() as i8;
            for (slot, &(dx, dy)) in rows[square.index()].iter_mut().zip(KNIGHT_OFFSETS.iter()) {
                let (nx, ny) = (x + dx, y + dy);
                let on_board = (0..BOARD_LEN as i8).contains(&nx) && (0..BOARD_LEN as i8).contains(&ny);
                *slot = if on_board {
                    Square::new(nx as u8, ny as u8).0
                } else {
                    OFF_BOARD
                };
            }
        }
        MoveTable { rows }
    }

    /// Raw slots for `square`, in canonical offset order.
    #[inline]
    pub fn row(&self, square: Square) -> &[u8; MOVE_COUNT] {
        &self.rows[square.index()]
    }

    /// Target of slot `slot` from `square`, or `None` if it leaves the board.
    #[inline]
    pub fn target(&self, square: Square, slot: usize) -> Option<Square> {
        match self.rows[square.index()][slot] {
            OFF_BOARD => None,
            index => Some(Square(index)),
        }
    }

    /// On-board neighbours of `square`, in canonical order.
    pub fn neighbors(&self, square: Square) -> impl Iterator<Item = Square> + '_ {
        self.row(square)
            .iter()
            .filter(|&&slot| slot != OFF_BOARD)
            .map(|&slot| Square(slot))
    }

    /// On-board neighbours of `square` that are not in `visited`.
    pub fn open_neighbors(
        &self,
        square: Square,
        visited: Visited,
    ) -> impl Iterator<Item = Square> + '_ {
        self.neighbors(square).filter(move |&n| !visited.contains(n))
    }
}

impl Default for MoveTable {
    fn default() -> Self {
        Self::build()
    }
}
