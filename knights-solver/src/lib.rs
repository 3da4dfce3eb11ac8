//! Tooling around the knights-core search: tour book files, sweep
//! statistics and board rendering.

pub mod book;
pub mod render;
pub mod stats;
