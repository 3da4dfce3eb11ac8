//! Re-validate every tour stored in a tour book.
//!
//! Usage: verify [book.bin]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use knights_core::{validate_tour, Status};
use knights_solver::book::TourBook;

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/tours.bin"));

    let book = TourBook::load(&path).with_context(|| format!("loading {:?}", path))?;
    println!("Tour book has {} entries", book.len());

    let mut found = 0usize;
    let mut timed_out = 0usize;
    let mut not_found = 0usize;
    let mut failures = 0usize;

    for entry in &book.entries {
        match entry.status {
            Status::Found => found += 1,
            Status::TimedOut => timed_out += 1,
            Status::NotFound => not_found += 1,
        }
        let Some(path) = &entry.path else {
            continue;
        };
        if let Err(e) = validate_tour(path, entry.start) {
            println!("  {} {}: {}", entry.start, entry.method, e);
            failures += 1;
        }
    }

    println!("\nStatus distribution:");
    println!("  Found:     {}", found);
    println!("  Timed out: {}", timed_out);
    println!("  Not found: {}", not_found);

    if failures > 0 {
        bail!("{} of {} stored tours are invalid", failures, found);
    }
    println!("\nAll {} stored tours are valid.", found);
    Ok(())
}
