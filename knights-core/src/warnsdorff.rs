//! Warnsdorff move ordering.
//!
//! Candidates are ranked by onward degree: how many unvisited on-board
//! squares the knight could reach from the candidate. Lower degree is tried
//! first. Off-board and visited candidates get [`BLOCKED_DEGREE`] so they
//! sink to the end. Ties keep canonical offset order.

use crate::moves::MoveTable;
use crate::{Square, Visited, MOVE_COUNT, OFF_BOARD};

/// Degree assigned to a slot that cannot be entered. Greater than any real degree.
pub const BLOCKED_DEGREE: u8 = MOVE_COUNT as u8 + 1;

/// Count of `square`'s neighbours that are on the board and not yet visited.
#[inline]
pub fn onward_degree(table: &MoveTable, square: Square, visited: Visited) -> u8 {
    table.open_neighbors(square, visited).count() as u8
}

/// Ordered candidate moves out of one square.
///
/// A per-frame copy of a move table row, so reordering never touches the
/// shared table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Candidates {
    targets: [u8; MOVE_COUNT],
    degrees: [u8; MOVE_COUNT],
}

impl Candidates {
    /// Candidates in canonical table order, unscored.
    #[inline]
    pub fn canonical(table: &MoveTable, square: Square) -> Candidates {
        Candidates {
            targets: *table.row(square),
            degrees: [0; MOVE_COUNT],
        }
    }

    /// Candidates sorted by ascending onward degree.
    ///
    /// `visited` must already contain `square`.
    pub fn by_degree(table: &MoveTable, square: Square, visited: Visited) -> Candidates {
        let mut candidates = Self::canonical(table, square);
        for (degree, &target) in candidates.degrees.iter_mut().zip(candidates.targets.iter()) {
            *degree = if target == OFF_BOARD || visited.contains(Square(target)) {
                BLOCKED_DEGREE
            } else {
                onward_degree(table, Square(target), visited)
            };
        }
        candidates.sort_by_degree();
        candidates
    }

    /// Stable insertion sort of both arrays, keyed on degree.
    fn sort_by_degree(&mut self) {
        for i in 1..MOVE_COUNT {
            let key = self.degrees[i];
            let target = self.targets[i];
            let mut j = i;
            while j > 0 && self.degrees[j - 1] > key {
                self.degrees[j] = self.degrees[j - 1];
                self.targets[j] = self.targets[j - 1];
                j -= 1;
            }
            self.degrees[j] = key;
            self.targets[j] = target;
        }
    }

    /// Raw target slots (may contain [`OFF_BOARD`]).
    #[inline]
    pub fn targets(&self) -> &[u8; MOVE_COUNT] {
        &self.targets
    }

    #[inline]
    pub fn degrees(&self) -> &[u8; MOVE_COUNT] {
        &self.degrees
    }

    /// Enterable targets in order: on the board and not in `visited`.
    pub fn open(&self, visited: Visited) -> impl Iterator<Item = Square> + '_ {
        self.targets
            .iter()
            .filter(|&&slot| slot != OFF_BOARD)
            .map(|&slot| Square(slot))
            .filter(move |&square| !visited.contains(square))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::move_table;

    #[test]
    fn test_center_square_degree_is_eight() {
        let table = move_table();
        let d4 = Square::new(3, 3);
        assert_eq!(onward_degree(table, d4, Visited::empty()), 8);
    }

    #[test]
    fn test_visiting_neighbor_lowers_degree() {
        let table = move_table();
        let d4 = Square::new(3, 3);
        let neighbor = table.neighbors(d4).next().unwrap();
        let visited = Visited::empty().with(neighbor);
        assert_eq!(onward_degree(table, d4, visited), 7);

        let visited = table.neighbors(d4).collect::<Visited>();
        assert_eq!(onward_degree(table, d4, visited), 0);
    }

    #[test]
    fn test_corner_degree() {
        let table = move_table();
        assert_eq!(onward_degree(table, Square::new(0, 0), Visited::empty()), 2);
        assert_eq!(onward_degree(table, Square::new(7, 7), Visited::empty()), 2);
    }

    #[test]
    fn test_canonical_preserves_row() {
        let table = move_table();
        for square in Square::all() {
            assert_eq!(Candidates::canonical(table, square).targets(), table.row(square));
        }
    }

    #[test]
    fn test_sort_is_stable() {
        let mut candidates = Candidates {
            targets: [10, 11, 12, 13, 14, 15, 16, 17],
            degrees: [3, 1, 3, 1, BLOCKED_DEGREE, 2, 1, 3],
        };
        candidates.sort_by_degree();
        assert_eq!(candidates.degrees, [1, 1, 1, 2, 3, 3, 3, BLOCKED_DEGREE]);
        assert_eq!(candidates.targets, [11, 13, 16, 15, 10, 12, 17, 14]);
    }

    #[test]
    fn test_sort_already_sorted_is_noop() {
        let mut candidates = Candidates {
            targets: [1, 2, 3, 4, 5, 6, 7, 8],
            degrees: [0, 1, 2, 3, 4, 5, 6, 7],
        };
        let before = candidates;
        candidates.sort_by_degree();
        assert_eq!(candidates, before);
    }

    #[test]
    fn test_by_degree_from_corner() {
        let table = move_table();
        let a1 = Square::new(0, 0);
        let visited = Visited::empty().with(a1);
        let candidates = Candidates::by_degree(table, a1, visited);

        // c2 (10) and b3 (17) both have 5 open squares once a1 is taken
        assert_eq!(&candidates.degrees()[..2], &[5, 5]);
        assert_eq!(&candidates.targets()[..2], &[10, 17]);
        assert!(candidates.degrees()[2..].iter().all(|&d| d == BLOCKED_DEGREE));
        assert!(candidates.targets()[2..].iter().all(|&t| t == OFF_BOARD));
    }

    #[test]
    fn test_by_degree_blocks_visited_and_orders_ascending() {
        let table = move_table();
        let d4 = Square::new(3, 3);
        let blocked = table.target(d4, 0).unwrap();
        let visited = Visited::empty().with(d4).with(blocked);
        let candidates = Candidates::by_degree(table, d4, visited);

        assert!(candidates.degrees().windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(candidates.degrees()[MOVE_COUNT - 1], BLOCKED_DEGREE);
        assert_eq!(candidates.targets()[MOVE_COUNT - 1], blocked.0);
        assert!(candidates.open(visited).all(|sq| sq != blocked && sq != d4));
        assert_eq!(candidates.open(visited).count(), 7);

        // the shared table row is untouched
        assert_eq!(table.row(d4), MoveTable::build().row(d4));
    }

    #[test]
    fn test_by_degree_scores_match_onward_degree() {
        let table = move_table();
        let e5 = Square::new(4, 4);
        let visited = Visited::empty().with(e5).with(Square::new(2, 2));
        let candidates = Candidates::by_degree(table, e5, visited);
        for (&target, &degree) in candidates.targets().iter().zip(candidates.degrees()) {
            if degree != BLOCKED_DEGREE {
                assert_eq!(degree, onward_degree(table, Square(target), visited));
            }
        }
    }
}
