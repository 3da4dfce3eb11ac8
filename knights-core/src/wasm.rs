//! WASM bindings for knights-core
//!
//! Provides a JavaScript-friendly API for the tour search.

use std::time::Duration;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::search::EMPTY_PATH;
use crate::{find_tour_with, validate_tour, Method, SearchConfig, SearchStats, Square, Status};

/// Tour finder with a fixed search budget.
#[wasm_bindgen]
pub struct WasmTourFinder {
    config: SearchConfig,
}

#[wasm_bindgen]
impl WasmTourFinder {
    /// Create a finder with a budget in milliseconds (0 = default budget)
    #[wasm_bindgen(constructor)]
    pub fn new(budget_ms: u32) -> WasmTourFinder {
        let config = if budget_ms == 0 {
            SearchConfig::default()
        } else {
            SearchConfig::with_budget(Duration::from_millis(budget_ms as u64))
        };
        WasmTourFinder { config }
    }

    /// Search from (x, y). `method` is "brute-force" or "warnsdorff".
    /// Returns { status, path: [[x, y], ...], nodes, backtracks, elapsedMs }
    #[wasm_bindgen(js_name = findTour)]
    pub fn find_tour(&self, x: u8, y: u8, method: &str) -> Result<JsValue, JsError> {
        let method: Method = method.parse()?;
        let mut path = EMPTY_PATH;
        let report = find_tour_with(x, y, &mut path, method, &self.config)?;

        let result = WasmTourResult::new(report.status, &path, &report.stats);
        serde_wasm_bindgen::to_value(&result).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Check a flat [x0, y0, x1, y1, ...] path against a start square
    pub fn validate(&self, path: Vec<u8>, x: u8, y: u8) -> bool {
        let Ok(start) = Square::from_xy(x, y) else {
            return false;
        };
        if path.len() != 2 * EMPTY_PATH.len() {
            return false;
        }
        let mut tour = EMPTY_PATH;
        for (slot, pair) in tour.iter_mut().zip(path.chunks_exact(2)) {
            match Square::from_xy(pair[0], pair[1]) {
                Ok(square) => *slot = square,
                Err(_) => return false,
            }
        }
        validate_tour(&tour, start).is_ok()
    }
}

/// Serializable search result for JavaScript
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WasmTourResult {
    status: Status,
    path: Vec<[u8; 2]>,
    nodes: u64,
    backtracks: u64,
    elapsed_ms: f64,
}

impl WasmTourResult {
    fn new(status: Status, path: &[Square], stats: &SearchStats) -> Self {
        let path = if status.is_found() {
            path.iter().map(|sq| [sq.x(), sq.y()]).collect()
        } else {
            Vec::new()
        };
        WasmTourResult {
            status,
            path,
            nodes: stats.nodes,
            backtracks: stats.backtracks,
            elapsed_ms: stats.elapsed.as_secs_f64() * 1000.0,
        }
    }
}
