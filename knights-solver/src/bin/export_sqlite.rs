//! Export a binary tour book to SQLite.
//!
//! Usage: export_sqlite [input.bin] [output.db]
//!
//! The API server answers tour queries from this database.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use knights_solver::book::TourBook;
use knights_solver::stats::format_bytes;
use rusqlite::{params, Connection};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let input_path = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/tours.bin"));
    let output_path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/tours.db"));

    println!("Tour Book to SQLite Exporter");
    println!("============================");
    println!("Input:  {:?}", input_path);
    println!("Output: {:?}", output_path);
    println!();

    let start = Instant::now();
    let book = TourBook::load(&input_path)
        .with_context(|| format!("loading tour book {:?}", input_path))?;
    println!(
        "Loaded {} entries in {:.2}s",
        book.len(),
        start.elapsed().as_secs_f64()
    );

    if output_path.exists() {
        std::fs::remove_file(&output_path).ok();
    }

    let start = Instant::now();
    let mut conn = Connection::open(&output_path)
        .with_context(|| format!("creating database {:?}", output_path))?;

    conn.execute(
        "CREATE TABLE tours (
            start INTEGER NOT NULL,
            method TEXT NOT NULL,
            status TEXT NOT NULL,
            path BLOB,
            PRIMARY KEY (start, method)
        )",
        [],
    )?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO tours (start, method, status, path) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for entry in &book.entries {
            let path: Option<Vec<u8>> = entry.path.map(|p| p.iter().map(|sq| sq.0).collect());
            stmt.execute(params![
                entry.start.0,
                entry.method.as_str(),
                entry.status.as_str(),
                path
            ])?;
        }
    }
    tx.commit()?;
    println!(
        "Inserted {} rows in {:.2}s",
        book.len(),
        start.elapsed().as_secs_f64()
    );

    println!("\nVerifying database...");
    for entry in book.entries.iter().step_by((book.len() / 5).max(1)).take(5) {
        let status: String = conn.query_row(
            "SELECT status FROM tours WHERE start = ?1 AND method = ?2",
            params![entry.start.0, entry.method.as_str()],
            |row| row.get(0),
        )?;
        ensure!(
            status == entry.status.as_str(),
            "status mismatch for {} {}",
            entry.start,
            entry.method
        );
    }
    println!("Verification passed!");

    let input_size = std::fs::metadata(&input_path).map(|m| m.len()).unwrap_or(0);
    let output_size = std::fs::metadata(&output_path).map(|m| m.len()).unwrap_or(0);
    println!("\nFile sizes:");
    println!("  Binary: {}", format_bytes(input_size));
    println!("  SQLite: {}", format_bytes(output_size));

    println!("\nDone! Database created at {:?}", output_path);
    Ok(())
}
