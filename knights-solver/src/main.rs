//! Knight's Tour Solver
//!
//! Searches for tours from one square or sweeps all 64, recording results
//! in a tour book.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use knights_core::search::EMPTY_PATH;
use knights_core::{find_tour_with, Method, SearchConfig, Square, Status};

use knights_solver::book::{BookEntry, TourBook};
use knights_solver::render::{render_grid, render_moves};
use knights_solver::stats::SweepStats;

#[derive(Parser, Debug)]
#[command(author, version, about = "Knight's tour search on an 8x8 board")]
struct Cli {
    /// Start square in algebraic notation (e.g. a1)
    #[arg(long, conflicts_with_all = ["x", "y", "sweep"])]
    square: Option<Square>,

    /// Start file, 0-7
    #[arg(long, requires = "y", conflicts_with = "sweep")]
    x: Option<u8>,

    /// Start rank, 0-7
    #[arg(long, requires = "x", conflicts_with = "sweep")]
    y: Option<u8>,

    /// Search method
    #[arg(long, value_enum, default_value_t = MethodArg::Warnsdorff)]
    method: MethodArg,

    /// Wall-clock budget per search
    #[arg(long, default_value_t = SearchConfig::DEFAULT_BUDGET.as_secs())]
    budget_secs: u64,

    /// Search from every square
    #[arg(long)]
    sweep: bool,

    /// Tour book to update
    #[arg(long, default_value = "data/tours.bin")]
    book: PathBuf,

    /// Seconds between progress lines during a sweep
    #[arg(long, default_value_t = 5)]
    log_interval_secs: u64,

    /// Only print the summary
    #[arg(long)]
    quiet: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MethodArg {
    BruteForce,
    Warnsdorff,
    Both,
}

impl MethodArg {
    fn methods(self) -> Vec<Method> {
        match self {
            MethodArg::BruteForce => vec![Method::BruteForce],
            MethodArg::Warnsdorff => vec![Method::Warnsdorff],
            MethodArg::Both => Method::all().to_vec(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let starts: Vec<Square> = if cli.sweep {
        Square::all().collect()
    } else if let Some(square) = cli.square {
        vec![square]
    } else if let (Some(x), Some(y)) = (cli.x, cli.y) {
        vec![Square::from_xy(x, y)?]
    } else {
        bail!("pass --square, --x/--y, or --sweep");
    };

    let config = SearchConfig::with_budget(Duration::from_secs(cli.budget_secs));
    let methods = cli.method.methods();

    println!("Knight's Tour Solver");
    println!("====================");
    println!(
        "Methods: {}",
        methods.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ")
    );
    println!("Budget: {}s per search", cli.budget_secs);
    println!("Starts: {}", starts.len());
    println!();

    // Stop between searches; a running search still finishes or times out
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        log::warn!("Interrupt received, stopping after the current search");
        r.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl-C handler")?;

    let mut book = load_book(&cli.book);
    let mut stats = SweepStats::new();
    let total = starts.len() * methods.len();
    let log_interval = Duration::from_secs(cli.log_interval_secs);
    let mut last_log = Instant::now();

    'sweep: for &start in &starts {
        for &method in &methods {
            if !running.load(Ordering::SeqCst) {
                break 'sweep;
            }

            let mut path = EMPTY_PATH;
            let report = find_tour_with(start.x(), start.y(), &mut path, method, &config)?;
            stats.record(start, &report);
            book.insert(BookEntry::new(start, method, report.status, &path));

            if !cli.quiet {
                print_search(start, method, report.status, &report.stats, &path, cli.sweep);
            }

            if last_log.elapsed() >= log_interval {
                stats.log_progress(total);
                last_log = Instant::now();
            }
        }
    }

    println!("\n====================");
    if running.load(Ordering::SeqCst) {
        println!("Search complete!");
    } else {
        println!("Search interrupted.");
    }
    println!("====================");
    stats.print_summary();

    if let Some(parent) = cli.book.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let save_start = Instant::now();
    let count = book
        .save(&cli.book)
        .with_context(|| format!("saving tour book to {:?}", cli.book))?;
    println!(
        "\nSaved {} entries to {:?} in {:.2}s",
        count,
        cli.book,
        save_start.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Load an existing book to extend, or start a new one.
fn load_book(path: &Path) -> TourBook {
    if !path.exists() {
        return TourBook::new();
    }
    match TourBook::load(path) {
        Ok(book) => {
            log::info!("Loaded {} entries from {:?}", book.len(), path);
            book
        }
        Err(e) => {
            log::warn!("Failed to load tour book {:?}: {}. Starting fresh.", path, e);
            TourBook::new()
        }
    }
}

fn print_search(
    start: Square,
    method: Method,
    status: Status,
    stats: &knights_core::SearchStats,
    path: &knights_core::TourPath,
    brief: bool,
) {
    println!(
        "{} {:<11} {:<9} nodes={} backtracks={} depth={} time={:.3}s",
        start,
        method.as_str(),
        status.as_str(),
        stats.nodes,
        stats.backtracks,
        stats.max_depth,
        stats.elapsed.as_secs_f64()
    );
    if brief || !status.is_found() {
        return;
    }
    println!();
    print!("{}", render_grid(path));
    println!();
    println!("{}", render_moves(path));
    println!();
}
