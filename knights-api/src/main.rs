//! Knight's Tour Web API
//!
//! Serves tours from a SQLite tour book (written by the solver's
//! `export_sqlite` bin) and falls back to a live search when the book has
//! no tour for the requested start square.

use std::path::Path as FilePath;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use knights_core::search::EMPTY_PATH;
use knights_core::{
    find_tour_with, validate_tour, Method, SearchConfig, Square, Status, TourError, TourPath,
    BOARD_SIZE,
};

const DEFAULT_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_BUDGET_MS: u64 = 10_000;

// =============================================================================
// Tour book
// =============================================================================

/// A stored search result.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredTour {
    status: Status,
    path: Option<TourPath>,
}

/// SQLite-backed tour book
struct Tablebase {
    conn: Mutex<Connection>,
}

impl Tablebase {
    /// Load tour book from SQLite file
    fn load(path: &FilePath) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "query_only", true)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Tablebase {
            conn: Mutex::new(conn),
        }
    }

    /// Look up the stored result for a start square and method.
    /// Rows that fail to decode are treated as missing.
    fn lookup(&self, start: Square, method: Method) -> Option<StoredTour> {
        let conn = self.conn.lock().ok()?;
        let row: Option<(String, Option<Vec<u8>>)> = conn
            .query_row(
                "SELECT status, path FROM tours WHERE start = ?1 AND method = ?2",
                rusqlite::params![start.0, method.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| log::warn!("tour book query failed for {} {}: {}", start, method, e))
            .ok()?;
        let (status, path) = row?;

        let status = parse_status(&status)?;
        let path = match path {
            Some(bytes) => Some(decode_path(&bytes)?),
            None => None,
        };
        Some(StoredTour { status, path })
    }
}

fn parse_status(text: &str) -> Option<Status> {
    [Status::Found, Status::NotFound, Status::TimedOut]
        .into_iter()
        .find(|status| status.as_str() == text)
}

fn decode_path(bytes: &[u8]) -> Option<TourPath> {
    if bytes.len() != BOARD_SIZE {
        return None;
    }
    let mut path = EMPTY_PATH;
    for (slot, &index) in path.iter_mut().zip(bytes) {
        *slot = Square::from_index(index).ok()?;
    }
    Some(path)
}

// =============================================================================
// State
// =============================================================================

/// Live search limits
#[derive(Debug, Clone, Copy)]
struct ApiConfig {
    /// Budget for searches that do not name one
    default_budget: Duration,
    /// Upper bound on a requested budget
    max_budget: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let budget = Duration::from_millis(DEFAULT_BUDGET_MS);
        ApiConfig {
            default_budget: budget,
            max_budget: budget,
        }
    }
}

impl ApiConfig {
    fn budget(&self, requested_ms: Option<u64>) -> Duration {
        requested_ms
            .map(Duration::from_millis)
            .unwrap_or(self.default_budget)
            .min(self.max_budget)
    }
}

/// Shared application state
struct AppStateInner {
    tablebase: Option<Tablebase>,
    config: ApiConfig,
}

type AppState = Arc<AppStateInner>;

// =============================================================================
// JSON Models
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum TourSource {
    Book,
    Search,
}

#[derive(Debug, Serialize)]
struct SearchStatsModel {
    nodes: u64,
    backtracks: u64,
    max_depth: u8,
    elapsed_ms: f64,
}

#[derive(Debug, Serialize)]
struct TourModel {
    start: Square,
    method: Method,
    status: Status,
    source: TourSource,
    /// `[x, y]` pairs, empty unless a tour was found
    path: Vec<[u8; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<SearchStatsModel>,
}

#[derive(Debug, Deserialize)]
struct TourQuery {
    method: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TourRequest {
    x: i64,
    y: i64,
    method: Option<String>,
    budget_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ValidateRequest {
    x: i64,
    y: i64,
    path: Vec<[i64; 2]>,
}

#[derive(Debug, Serialize)]
struct ValidateModel {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthModel {
    status: String,
    book: bool,
}

#[derive(Debug, Serialize)]
struct ErrorModel {
    detail: String,
}

type ApiError = (StatusCode, Json<ErrorModel>);

fn bad_request(err: impl ToString) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorModel {
            detail: err.to_string(),
        }),
    )
}

// =============================================================================
// Helpers
// =============================================================================

/// Checked square from untrusted coordinates.
fn square_from(x: i64, y: i64) -> Result<Square, TourError> {
    let off_board = || TourError::InvalidSquare {
        x: x.clamp(0, u8::MAX as i64) as u8,
        y: y.clamp(0, u8::MAX as i64) as u8,
    };
    let x = u8::try_from(x).map_err(|_| off_board())?;
    let y = u8::try_from(y).map_err(|_| off_board())?;
    Square::from_xy(x, y)
}

fn parse_method(method: Option<&str>) -> Result<Method, TourError> {
    method.map_or(Ok(Method::Warnsdorff), str::parse)
}

fn path_to_model(path: &TourPath) -> Vec<[u8; 2]> {
    path.iter().map(|sq| [sq.x(), sq.y()]).collect()
}

/// Run a search on the blocking pool.
async fn live_search(
    start: Square,
    method: Method,
    budget: Duration,
) -> Result<TourModel, ApiError> {
    let config = SearchConfig::with_budget(budget);
    let (report, path) = tokio::task::spawn_blocking(move || {
        let mut path = EMPTY_PATH;
        find_tour_with(start.x(), start.y(), &mut path, method, &config)
            .map(|report| (report, path))
    })
    .await
    .map_err(|e| {
        log::error!("search task failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorModel {
                detail: "search failed".to_string(),
            }),
        )
    })?
    .map_err(bad_request)?;

    log::info!(
        "live {} search from {}: {} in {:?}",
        method,
        start,
        report.status,
        report.stats.elapsed
    );

    Ok(TourModel {
        start,
        method,
        status: report.status,
        source: TourSource::Search,
        path: if report.status.is_found() {
            path_to_model(&path)
        } else {
            Vec::new()
        },
        stats: Some(SearchStatsModel {
            nodes: report.stats.nodes,
            backtracks: report.stats.backtracks,
            max_depth: report.stats.max_depth,
            elapsed_ms: report.stats.elapsed.as_secs_f64() * 1000.0,
        }),
    })
}

// =============================================================================
// Handlers
// =============================================================================

async fn health(State(state): State<AppState>) -> Json<HealthModel> {
    Json(HealthModel {
        status: "ok".to_string(),
        book: state.tablebase.is_some(),
    })
}

/// Book lookup by algebraic square, then live search.
async fn get_tour(
    State(state): State<AppState>,
    Path(square): Path<String>,
    Query(query): Query<TourQuery>,
) -> Result<Json<TourModel>, ApiError> {
    let start: Square = square.parse().map_err(bad_request)?;
    let method = parse_method(query.method.as_deref()).map_err(bad_request)?;

    let stored = state
        .tablebase
        .as_ref()
        .and_then(|tb| tb.lookup(start, method));
    if let Some(StoredTour {
        status: Status::Found,
        path: Some(path),
    }) = stored
    {
        return Ok(Json(TourModel {
            start,
            method,
            status: Status::Found,
            source: TourSource::Book,
            path: path_to_model(&path),
            stats: None,
        }));
    }

    let budget = state.config.default_budget;
    live_search(start, method, budget).await.map(Json)
}

/// Live search with an optional budget.
async fn post_tour(
    State(state): State<AppState>,
    Json(req): Json<TourRequest>,
) -> Result<Json<TourModel>, ApiError> {
    let start = square_from(req.x, req.y).map_err(bad_request)?;
    let method = parse_method(req.method.as_deref()).map_err(bad_request)?;
    let budget = state.config.budget(req.budget_ms);
    live_search(start, method, budget).await.map(Json)
}

async fn validate(Json(req): Json<ValidateRequest>) -> Result<Json<ValidateModel>, ApiError> {
    let start = square_from(req.x, req.y).map_err(bad_request)?;

    let result = if req.path.len() != BOARD_SIZE {
        Err(format!(
            "expected {} squares, got {}",
            BOARD_SIZE,
            req.path.len()
        ))
    } else {
        req.path
            .iter()
            .map(|&[x, y]| square_from(x, y))
            .collect::<Result<Vec<_>, _>>()
            .and_then(|squares| {
                let mut path = EMPTY_PATH;
                path.copy_from_slice(&squares);
                validate_tour(&path, start)
            })
            .map_err(|e| e.to_string())
    };

    Ok(Json(match result {
        Ok(()) => ValidateModel {
            valid: true,
            error: None,
        },
        Err(error) => ValidateModel {
            valid: false,
            error: Some(error),
        },
    }))
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/tour/{square}", get(get_tour))
        .route("/tour", post(post_tour))
        .route("/validate", post(validate))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Main
// =============================================================================

fn env_millis(name: &str) -> Option<Duration> {
    let value = std::env::var(name).ok()?;
    match value.parse() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            log::warn!("ignoring {}={:?}: not a number of milliseconds", name, value);
            None
        }
    }
}

fn load_tablebase() -> Option<Tablebase> {
    let candidates: Vec<String> = match std::env::var("KNIGHTS_BOOK_DB") {
        Ok(path) => vec![path],
        Err(_) => vec![
            "data/tours.db".to_string(),
            "../knights-solver/data/tours.db".to_string(),
            "tours.db".to_string(),
        ],
    };

    candidates.iter().find_map(|path| {
        let path = FilePath::new(path);
        if !path.exists() {
            return None;
        }
        match Tablebase::load(path) {
            Ok(tb) => {
                log::info!("Loaded tour book from {:?}", path);
                Some(tb)
            }
            Err(e) => {
                log::error!("Failed to load tour book from {:?}: {}", path, e);
                None
            }
        }
    })
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let tablebase = load_tablebase();
    if tablebase.is_none() {
        log::warn!("No tour book found - every request runs a live search");
    }

    let mut config = ApiConfig::default();
    if let Some(budget) = env_millis("KNIGHTS_API_BUDGET_MS") {
        config.default_budget = budget;
    }
    if let Some(max) = env_millis("KNIGHTS_API_MAX_BUDGET_MS") {
        config.max_budget = max;
    }
    config.max_budget = config.max_budget.max(config.default_budget);

    let state: AppState = Arc::new(AppStateInner { tablebase, config });

    let addr = std::env::var("KNIGHTS_API_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("Knight's tour API running on http://{}", addr);
    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use knights_core::warnsdorff_knights_tour;

    fn state_with(tablebase: Option<Tablebase>) -> AppState {
        Arc::new(AppStateInner {
            tablebase,
            config: ApiConfig {
                default_budget: Duration::from_secs(5),
                max_budget: Duration::from_secs(5),
            },
        })
    }

    fn corner_tour() -> TourPath {
        let mut path = EMPTY_PATH;
        assert_eq!(warnsdorff_knights_tour(0, 0, &mut path), Ok(Status::Found));
        path
    }

    /// In-memory book holding one stored tour from a1 and a timeout for d4.
    fn sample_tablebase() -> Tablebase {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE tours (
                start INTEGER NOT NULL,
                method TEXT NOT NULL,
                status TEXT NOT NULL,
                path BLOB,
                PRIMARY KEY (start, method)
            )",
            [],
        )
        .unwrap();
        let path: Vec<u8> = corner_tour().iter().map(|sq| sq.0).collect();
        conn.execute(
            "INSERT INTO tours VALUES (0, 'warnsdorff', 'found', ?1)",
            [path],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO tours VALUES (27, 'brute-force', 'timed_out', NULL)",
            [],
        )
        .unwrap();
        Tablebase::from_connection(conn)
    }

    #[test]
    fn test_lookup() {
        let tb = sample_tablebase();
        let stored = tb.lookup(Square(0), Method::Warnsdorff).unwrap();
        assert_eq!(stored.status, Status::Found);
        assert_eq!(stored.path, Some(corner_tour()));

        let timed_out = tb.lookup(Square(27), Method::BruteForce).unwrap();
        assert_eq!(timed_out.status, Status::TimedOut);
        assert_eq!(timed_out.path, None);

        assert!(tb.lookup(Square(0), Method::BruteForce).is_none());
    }

    #[test]
    fn test_budget_clamped() {
        let config = ApiConfig {
            default_budget: Duration::from_millis(500),
            max_budget: Duration::from_secs(2),
        };
        assert_eq!(config.budget(None), Duration::from_millis(500));
        assert_eq!(config.budget(Some(100)), Duration::from_millis(100));
        assert_eq!(config.budget(Some(60_000)), Duration::from_secs(2));
    }

    #[test]
    fn test_square_from_rejects_off_board() {
        assert_eq!(square_from(3, 4), Ok(Square::new(3, 4)));
        assert!(matches!(square_from(8, 0), Err(TourError::InvalidSquare { .. })));
        assert!(matches!(square_from(-1, 2), Err(TourError::InvalidSquare { .. })));
        assert!(matches!(square_from(0, 300), Err(TourError::InvalidSquare { .. })));
    }

    #[tokio::test]
    async fn test_get_tour_from_book() {
        let state = state_with(Some(sample_tablebase()));
        let Json(tour) = get_tour(
            State(state),
            Path("a1".to_string()),
            Query(TourQuery { method: None }),
        )
        .await
        .unwrap();

        assert!(matches!(tour.source, TourSource::Book));
        assert_eq!(tour.status, Status::Found);
        assert_eq!(tour.path.len(), BOARD_SIZE);
        assert_eq!(tour.path[0], [0, 0]);
        assert!(tour.stats.is_none());
    }

    #[tokio::test]
    async fn test_get_tour_falls_back_to_search() {
        let state = state_with(None);
        let Json(tour) = get_tour(
            State(state),
            Path("h8".to_string()),
            Query(TourQuery {
                method: Some("warnsdorff".to_string()),
            }),
        )
        .await
        .unwrap();

        assert!(matches!(tour.source, TourSource::Search));
        assert_eq!(tour.status, Status::Found);
        assert_eq!(tour.path[0], [7, 7]);
        assert!(tour.stats.unwrap().nodes >= BOARD_SIZE as u64);
    }

    #[tokio::test]
    async fn test_get_tour_bad_square() {
        let err = get_tour(
            State(state_with(None)),
            Path("z9".to_string()),
            Query(TourQuery { method: None }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_post_tour_off_board_is_400() {
        let err = post_tour(
            State(state_with(None)),
            Json(TourRequest {
                x: 8,
                y: 0,
                method: None,
                budget_ms: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.detail.contains("off the board"));
    }

    #[tokio::test]
    async fn test_post_tour_unknown_method_is_400() {
        let err = post_tour(
            State(state_with(None)),
            Json(TourRequest {
                x: 0,
                y: 0,
                method: Some("random-walk".to_string()),
                budget_ms: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_post_tour_zero_budget_times_out() {
        let Json(tour) = post_tour(
            State(state_with(None)),
            Json(TourRequest {
                x: 3,
                y: 3,
                method: Some("brute-force".to_string()),
                budget_ms: Some(0),
            }),
        )
        .await
        .unwrap();
        assert_eq!(tour.status, Status::TimedOut);
        assert!(tour.path.is_empty());
        assert_eq!(tour.stats.unwrap().nodes, 0);
    }

    #[tokio::test]
    async fn test_validate() {
        let path: Vec<[i64; 2]> = corner_tour()
            .iter()
            .map(|sq| [sq.x() as i64, sq.y() as i64])
            .collect();

        let Json(ok) = validate(Json(ValidateRequest {
            x: 0,
            y: 0,
            path: path.clone(),
        }))
        .await
        .unwrap();
        assert!(ok.valid);
        assert!(ok.error.is_none());

        let Json(wrong_start) = validate(Json(ValidateRequest {
            x: 1,
            y: 0,
            path: path.clone(),
        }))
        .await
        .unwrap();
        assert!(!wrong_start.valid);

        let Json(short) = validate(Json(ValidateRequest {
            x: 0,
            y: 0,
            path: path[..10].to_vec(),
        }))
        .await
        .unwrap();
        assert!(!short.valid);
        assert_eq!(short.error.as_deref(), Some("expected 64 squares, got 10"));
    }

    #[test]
    fn test_tour_model_json() {
        let model = TourModel {
            start: Square(0),
            method: Method::BruteForce,
            status: Status::TimedOut,
            source: TourSource::Search,
            path: Vec::new(),
            stats: None,
        };
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["start"], 0);
        assert_eq!(json["method"], "brute-force");
        assert_eq!(json["status"], "timed_out");
        assert_eq!(json["source"], "search");
        assert!(json.get("stats").is_none());
    }
}
