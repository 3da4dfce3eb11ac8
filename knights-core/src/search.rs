//! Backtracking tour search.
//!
//! One top-level call owns a [`TourSearch`]: the shared move table, the
//! method, the wall-clock budget and running statistics. Each recursion
//! frame takes the visited set by value, marks its own square, writes
//! `path[depth]`, and tries candidates in order. A frame that runs out of
//! candidates reports [`Status::NotFound`] and its parent simply moves on;
//! the parent's copy of the visited set never saw the child's square.
//!
//! The budget is checked on entry to every frame. Once it has elapsed every
//! active frame unwinds with [`Status::TimedOut`] without trying siblings.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::moves::{move_table, MoveTable};
use crate::time::Instant;
use crate::warnsdorff::Candidates;
use crate::{Square, TourError, Visited, BOARD_SIZE};

/// Squares of a tour in visiting order. Index 0 is the start square.
pub type TourPath = [Square; BOARD_SIZE];

/// A zeroed path buffer.
pub const EMPTY_PATH: TourPath = [Square(0); BOARD_SIZE];

/// Move ordering strategy.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// Canonical table order, no heuristic.
    BruteForce,
    /// Least onward degree first.
    Warnsdorff,
}

impl Method {
    pub fn all() -> [Method; 2] {
        [Method::BruteForce, Method::Warnsdorff]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::BruteForce => "brute-force",
            Method::Warnsdorff => "warnsdorff",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = TourError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brute-force" | "brute_force" | "bruteforce" | "brute" => Ok(Method::BruteForce),
            "warnsdorff" | "heuristic" => Ok(Method::Warnsdorff),
            _ => Err(TourError::UnknownMethod(s.to_string())),
        }
    }
}

/// Result of one search.
///
/// `NotFound` means the search space was exhausted; `TimedOut` means the
/// budget ran out first and nothing is known about existence.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Found,
    NotFound,
    TimedOut,
}

impl Status {
    #[inline]
    pub fn is_found(self) -> bool {
        self == Status::Found
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Found => "found",
            Status::NotFound => "not_found",
            Status::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunables for a single top-level search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Wall-clock budget, measured from the start of the call.
    pub budget: Duration,
}

impl SearchConfig {
    pub const DEFAULT_BUDGET: Duration = Duration::from_secs(300);

    pub fn with_budget(budget: Duration) -> Self {
        Self { budget }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::with_budget(Self::DEFAULT_BUDGET)
    }
}

/// Counters collected during one search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Frames entered before the budget ran out.
    pub nodes: u64,
    /// Frames that exhausted their candidates.
    pub backtracks: u64,
    /// Deepest path index written.
    pub max_depth: u8,
    pub elapsed: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    pub status: Status,
    pub stats: SearchStats,
}

/// State of one top-level search.
pub struct TourSearch<'a> {
    table: &'a MoveTable,
    method: Method,
    budget: Duration,
    started: Instant,
    stats: SearchStats,
}

impl<'a> TourSearch<'a> {
    /// Start the clock for a new search.
    pub fn new(table: &'a MoveTable, method: Method, config: &SearchConfig) -> Self {
        Self {
            table,
            method,
            budget: config.budget,
            started: Instant::now(),
            stats: SearchStats::default(),
        }
    }

    /// Search for a tour from `start` on an empty board.
    pub fn run(self, start: Square, path: &mut TourPath) -> SearchReport {
        self.run_from(start, Visited::empty(), path)
    }

    /// Search from `start`, treating squares in `blocked` as already visited.
    ///
    /// `Found` then means every square not in `blocked` was covered, and the
    /// path is written from index 0 up to `63 - blocked.len()`.
    pub fn run_from(mut self, start: Square, blocked: Visited, path: &mut TourPath) -> SearchReport {
        debug_assert!(!blocked.contains(start));
        let status = self.descend(start, blocked, 0, path);
        self.stats.elapsed = self.started.elapsed();
        log::debug!(
            "{} search from {}: {} after {} nodes, {} backtracks, {:?}",
            self.method,
            start,
            status,
            self.stats.nodes,
            self.stats.backtracks,
            self.stats.elapsed,
        );
        SearchReport {
            status,
            stats: self.stats,
        }
    }

    #[inline]
    fn expired(&self) -> bool {
        self.started.elapsed() >= self.budget
    }

    fn descend(
        &mut self,
        square: Square,
        visited: Visited,
        depth: usize,
        path: &mut TourPath,
    ) -> Status {
        if self.expired() {
            return Status::TimedOut;
        }
        self.stats.nodes += 1;

        let visited = visited.with(square);
        path[depth] = square;
        self.stats.max_depth = self.stats.max_depth.max(depth as u8);

        if visited.is_full() {
            return Status::Found;
        }

        let candidates = match self.method {
            Method::BruteForce => Candidates::canonical(self.table, square),
            Method::Warnsdorff => Candidates::by_degree(self.table, square, visited),
        };

        for next in candidates.open(visited) {
            match self.descend(next, visited, depth + 1, path) {
                Status::NotFound => continue,
                status => return status,
            }
        }

        self.stats.backtracks += 1;
        Status::NotFound
    }
}

/// Search for a tour from `(x, y)` with the default budget.
///
/// On `Found`, `path` holds the tour. On `NotFound` or `TimedOut` it keeps
/// whatever prefix the search last wrote. Out-of-range coordinates are
/// rejected before `path` is touched.
pub fn find_tour(x: u8, y: u8, path: &mut TourPath, method: Method) -> Result<Status, TourError> {
    find_tour_with(x, y, path, method, &SearchConfig::default()).map(|report| report.status)
}

/// [`find_tour`] with an explicit config, returning statistics as well.
pub fn find_tour_with(
    x: u8,
    y: u8,
    path: &mut TourPath,
    method: Method,
    config: &SearchConfig,
) -> Result<SearchReport, TourError> {
    let start = Square::from_xy(x, y)?;
    Ok(TourSearch::new(move_table(), method, config).run(start, path))
}

/// Brute-force search in canonical move order.
pub fn knights_tour(x: u8, y: u8, path: &mut TourPath) -> Result<Status, TourError> {
    find_tour(x, y, path, Method::BruteForce)
}

/// Backtracking search ordered by Warnsdorff's rule.
pub fn warnsdorff_knights_tour(x: u8, y: u8, path: &mut TourPath) -> Result<Status, TourError> {
    find_tour(x, y, path, Method::Warnsdorff)
}

/// Check that `path` is a complete open tour starting at `start`.
pub fn validate_tour(path: &TourPath, start: Square) -> Result<(), TourError> {
    if path[0] != start {
        return Err(TourError::WrongStart {
            expected: start,
            found: path[0],
        });
    }

    let mut seen = Visited::empty();
    for (index, &square) in path.iter().enumerate() {
        if !square.is_valid() {
            return Err(TourError::InvalidSquareIndex(square.0));
        }
        if seen.contains(square) {
            return Err(TourError::RepeatedSquare(square));
        }
        seen.insert(square);

        if index > 0 && !path[index - 1].is_knight_move(square) {
            return Err(TourError::IllegalStep {
                index,
                from: path[index - 1],
                to: square,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocked_except(open: &[Square]) -> Visited {
        Square::all().filter(|sq| !open.contains(sq)).collect()
    }

    #[test]
    fn test_warnsdorff_from_corner() {
        let mut path = EMPTY_PATH;
        let status = warnsdorff_knights_tour(0, 0, &mut path).unwrap();
        assert_eq!(status, Status::Found);
        assert_eq!(validate_tour(&path, Square::new(0, 0)), Ok(()));
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        let mut path = EMPTY_PATH;
        path[0] = Square(42);
        for (x, y) in [(8, 0), (0, 8), (255, 3)] {
            assert_eq!(
                knights_tour(x, y, &mut path),
                Err(TourError::InvalidSquare { x, y })
            );
            assert_eq!(
                warnsdorff_knights_tour(x, y, &mut path),
                Err(TourError::InvalidSquare { x, y })
            );
        }
        assert_eq!(path[0], Square(42), "path must be untouched");
    }

    #[test]
    fn test_zero_budget_times_out_before_writing() {
        let mut path = EMPTY_PATH;
        path[0] = Square(42);
        let config = SearchConfig::with_budget(Duration::ZERO);
        for method in Method::all() {
            let report = find_tour_with(3, 3, &mut path, method, &config).unwrap();
            assert_eq!(report.status, Status::TimedOut);
            assert_eq!(report.stats.nodes, 0);
        }
        assert_eq!(path[0], Square(42));
    }

    #[test]
    fn test_short_budget_returns_promptly() {
        let budget = Duration::from_millis(20);
        let config = SearchConfig::with_budget(budget);
        let mut path = EMPTY_PATH;
        let start = Instant::now();
        let report = find_tour_with(3, 4, &mut path, Method::BruteForce, &config).unwrap();

        assert_ne!(report.status, Status::NotFound);
        if report.status == Status::TimedOut {
            assert!(start.elapsed() < budget + Duration::from_millis(500));
        } else {
            assert_eq!(validate_tour(&path, Square::new(3, 4)), Ok(()));
        }
    }

    #[test]
    fn test_not_found_when_exhausted() {
        // Only a1, b3 and c2 are open: a1 can step to either, but neither
        // can continue, so the whole space is exhausted.
        let a1 = Square::new(0, 0);
        let b3 = Square::new(1, 2);
        let c2 = Square::new(2, 1);
        let blocked = blocked_except(&[a1, b3, c2]);

        for method in Method::all() {
            let mut path = EMPTY_PATH;
            let report = TourSearch::new(move_table(), method, &SearchConfig::default())
                .run_from(a1, blocked, &mut path);
            assert_eq!(report.status, Status::NotFound);
            assert_eq!(report.stats.nodes, 3);
            assert_eq!(report.stats.backtracks, 3);
            assert_eq!(report.stats.max_depth, 1);
            // the aborted prefix is left in place
            assert_eq!(path[0], a1);
            assert!(path[1] == b3 || path[1] == c2);
        }
    }

    #[test]
    fn test_found_on_reduced_board() {
        let a1 = Square::new(0, 0);
        let c2 = Square::new(2, 1);
        let blocked = blocked_except(&[a1, c2]);
        let mut path = EMPTY_PATH;
        let report = TourSearch::new(move_table(), Method::BruteForce, &SearchConfig::default())
            .run_from(a1, blocked, &mut path);
        assert_eq!(report.status, Status::Found);
        assert_eq!(&path[..2], &[a1, c2]);
        assert_eq!(report.stats.backtracks, 0);
    }

    #[test]
    fn test_stats_for_found_tour() {
        let mut path = EMPTY_PATH;
        let report =
            find_tour_with(0, 0, &mut path, Method::Warnsdorff, &SearchConfig::default()).unwrap();
        assert_eq!(report.status, Status::Found);
        assert_eq!(report.stats.max_depth as usize, BOARD_SIZE - 1);
        assert!(report.stats.nodes >= BOARD_SIZE as u64);
    }

    #[test]
    fn test_validate_detects_errors() {
        let mut path = EMPTY_PATH;
        assert_eq!(warnsdorff_knights_tour(0, 0, &mut path), Ok(Status::Found));
        let start = Square::new(0, 0);

        assert_eq!(
            validate_tour(&path, Square(1)),
            Err(TourError::WrongStart {
                expected: Square(1),
                found: start
            })
        );

        let mut repeated = path;
        repeated[10] = repeated[8];
        assert!(matches!(
            validate_tour(&repeated, start),
            Err(TourError::RepeatedSquare(_)) | Err(TourError::IllegalStep { .. })
        ));

        // squares two moves apart share a colour, so they are never a knight move apart
        let mut swapped = path;
        swapped.swap(1, 2);
        assert_eq!(
            validate_tour(&swapped, start),
            Err(TourError::IllegalStep {
                index: 1,
                from: start,
                to: path[2]
            })
        );

        let mut off_board = path;
        off_board[5] = Square(64);
        assert_eq!(
            validate_tour(&off_board, start),
            Err(TourError::InvalidSquareIndex(64))
        );
    }

    #[test]
    fn test_method_parse_and_display() {
        for method in Method::all() {
            assert_eq!(method.to_string().parse::<Method>(), Ok(method));
        }
        assert_eq!("Brute".parse::<Method>(), Ok(Method::BruteForce));
        assert_eq!(
            "dfs".parse::<Method>(),
            Err(TourError::UnknownMethod("dfs".to_string()))
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&Method::BruteForce).unwrap(), "\"brute-force\"");
        assert_eq!(serde_json::to_string(&Status::TimedOut).unwrap(), "\"timed_out\"");
        assert_eq!(
            serde_json::from_str::<Status>("\"not_found\"").unwrap(),
            Status::NotFound
        );
        let config: SearchConfig =
            serde_json::from_str(&serde_json::to_string(&SearchConfig::default()).unwrap()).unwrap();
        assert_eq!(config.budget, SearchConfig::DEFAULT_BUDGET);
    }
}
