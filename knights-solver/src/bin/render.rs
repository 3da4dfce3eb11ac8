//! Render tours from a tour book to SVG.
//!
//! Usage:
//!   # Whole tour from a start square
//!   cargo run --release --bin render -- --square a1 --method warnsdorff -o tour.svg
//!
//!   # One frame per step, for animations
//!   cargo run --release --bin render -- --square a1 --frames --output-dir ./frames/

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use knights_core::{Method, Square, TourPath, BOARD_LEN};
use knights_solver::book::TourBook;

// ============================================================================
// Layout
// ============================================================================

const CELL_SIZE: f32 = 64.0;
const BOARD_PADDING: f32 = 24.0;
const BOARD_RADIUS: f32 = 12.0;
const IMAGE_PADDING: f32 = 16.0;

// Colors
const BG_COLOR: &str = "#1a1a1a";
const BOARD_BG: &str = "#2a2a2a";
const LIGHT_SQUARE: &str = "#4a4a4a";
const DARK_SQUARE: &str = "#3a3a3a";
const PATH_COLOR: &str = "#f39c12";
const START_COLOR: &str = "#88cc88";
const END_COLOR: &str = "#e74c3c";
const LABEL_COLOR: &str = "#888";

/// Options for rendering
struct RenderOptions {
    /// Draw the step number on each visited square
    numbers: bool,
    /// Scale factor (1.0 = 64px cells)
    scale: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            numbers: true,
            scale: 1.0,
        }
    }
}

// ============================================================================
// SVG generation
// ============================================================================

/// Centre of a square in image coordinates, rank 8 at the top.
fn square_center(square: Square) -> (f32, f32) {
    let origin = IMAGE_PADDING + BOARD_PADDING;
    let col = square.x() as f32;
    let row = (BOARD_LEN - 1 - square.y()) as f32;
    (
        origin + col * CELL_SIZE + CELL_SIZE / 2.0,
        origin + row * CELL_SIZE + CELL_SIZE / 2.0,
    )
}

/// Draw the board and the first `steps` squares of `path`.
fn render_tour_svg(path: &TourPath, steps: usize, opts: &RenderOptions) -> String {
    let scale = if opts.scale > 0.0 { opts.scale } else { 1.0 };
    let board_inner = BOARD_LEN as f32 * CELL_SIZE;
    let board_outer = board_inner + 2.0 * BOARD_PADDING;
    let size = board_outer + 2.0 * IMAGE_PADDING;

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        size * scale,
        size * scale,
        size,
        size
    ));
    svg.push('\n');

    svg.push_str(&format!(
        r#"  <rect width="{}" height="{}" fill="{}"/>"#,
        size, size, BG_COLOR
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"  <rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{}"/>"#,
        IMAGE_PADDING, IMAGE_PADDING, board_outer, board_outer, BOARD_RADIUS, BOARD_BG
    ));
    svg.push('\n');

    for square in Square::all() {
        let (cx, cy) = square_center(square);
        let fill = if (square.x() + square.y()) % 2 == 0 {
            DARK_SQUARE
        } else {
            LIGHT_SQUARE
        };
        svg.push_str(&format!(
            r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            cx - CELL_SIZE / 2.0,
            cy - CELL_SIZE / 2.0,
            CELL_SIZE,
            CELL_SIZE,
            fill
        ));
        svg.push('\n');
    }

    // File and rank labels in the padding
    let origin = IMAGE_PADDING + BOARD_PADDING;
    for i in 0..BOARD_LEN {
        let offset = origin + i as f32 * CELL_SIZE + CELL_SIZE / 2.0;
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-family=\"system-ui, sans-serif\" font-size=\"12\" fill=\"{}\" text-anchor=\"middle\">{}</text>\n",
            offset,
            origin + board_inner + 16.0,
            LABEL_COLOR,
            (b'a' + i) as char
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-family=\"system-ui, sans-serif\" font-size=\"12\" fill=\"{}\" text-anchor=\"middle\">{}</text>\n",
            origin - 12.0,
            offset + 4.0,
            LABEL_COLOR,
            BOARD_LEN - i
        ));
    }

    let visited = &path[..steps.min(path.len())];
    if visited.len() > 1 {
        let points: Vec<String> = visited
            .iter()
            .map(|&sq| {
                let (x, y) = square_center(sq);
                format!("{},{}", x, y)
            })
            .collect();
        svg.push_str(&format!(
            "  <polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"3\" stroke-linejoin=\"round\" opacity=\"0.8\"/>\n",
            points.join(" "),
            PATH_COLOR
        ));
    }

    let last = visited.len().saturating_sub(1);
    for (step, &square) in visited.iter().enumerate() {
        let (cx, cy) = square_center(square);
        let fill = match step {
            0 => START_COLOR,
            s if s == last => END_COLOR,
            _ => PATH_COLOR,
        };
        svg.push_str(&format!(
            "  <circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\" stroke=\"rgba(0,0,0,0.2)\" stroke-width=\"2\"/>\n",
            cx,
            cy,
            CELL_SIZE * 0.28,
            fill
        ));
        if opts.numbers {
            svg.push_str(&format!(
                "  <text x=\"{}\" y=\"{}\" font-family=\"system-ui, sans-serif\" font-size=\"14\" font-weight=\"bold\" fill=\"{}\" text-anchor=\"middle\">{}</text>\n",
                cx,
                cy + 5.0,
                BG_COLOR,
                step + 1
            ));
        }
    }

    svg.push_str("</svg>\n");
    svg
}

// ============================================================================
// CLI
// ============================================================================

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  render --square a1 [--method warnsdorff] -o tour.svg");
    eprintln!("  render --square a1 --frames --output-dir ./frames/");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --square <a1..h8>      Start square of the tour");
    eprintln!("  --method <name>        brute-force or warnsdorff (default: warnsdorff)");
    eprintln!("  --book <file>          Tour book (default: data/tours.bin)");
    eprintln!("  -o, --output <file>    Output file (default: tour.svg)");
    eprintln!("  --frames               Render one frame per step");
    eprintln!("  --output-dir <dir>     Output directory for frames");
    eprintln!("  --no-numbers           Omit step numbers");
    eprintln!("  --scale <float>        Scale factor (default: 1.0)");
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let mut square: Option<Square> = None;
    let mut method = Method::Warnsdorff;
    let mut book_path = PathBuf::from("data/tours.bin");
    let mut output = PathBuf::from("tour.svg");
    let mut output_dir = PathBuf::from(".");
    let mut frames = false;
    let mut opts = RenderOptions::default();

    let mut i = 1;
    while i < args.len() {
        let value = |i: usize| {
            args.get(i)
                .ok_or_else(|| anyhow!("{} needs a value", args[i - 1]))
        };
        match args[i].as_str() {
            "--square" => {
                i += 1;
                square = Some(value(i)?.parse()?);
            }
            "--method" => {
                i += 1;
                method = value(i)?.parse()?;
            }
            "--book" => {
                i += 1;
                book_path = PathBuf::from(value(i)?);
            }
            "-o" | "--output" => {
                i += 1;
                output = PathBuf::from(value(i)?);
            }
            "--output-dir" => {
                i += 1;
                output_dir = PathBuf::from(value(i)?);
            }
            "--frames" => {
                frames = true;
            }
            "--no-numbers" => {
                opts.numbers = false;
            }
            "--scale" => {
                i += 1;
                opts.scale = value(i)?.parse().unwrap_or(1.0);
            }
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other => {
                print_usage();
                bail!("Unknown argument: {}", other);
            }
        }
        i += 1;
    }

    let Some(square) = square else {
        print_usage();
        bail!("--square is required");
    };

    let book = TourBook::load(&book_path)
        .with_context(|| format!("loading tour book {:?}", book_path))?;
    let entry = book
        .get(square, method)
        .ok_or_else(|| anyhow!("no {} entry for {} in {:?}", method, square, book_path))?;
    let Some(path) = entry.path else {
        bail!("{} search from {} ended {}, nothing to draw", method, square, entry.status);
    };

    // Batch mode: one frame per step
    if frames {
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("creating {:?}", output_dir))?;
        for steps in 1..=path.len() {
            let svg = render_tour_svg(&path, steps, &opts);
            let file = output_dir.join(format!("step-{:02}.svg", steps));
            fs::write(&file, &svg).with_context(|| format!("writing {:?}", file))?;
        }
        println!("Rendered {} frames to {:?}", path.len(), output_dir);
        return Ok(());
    }

    let svg = render_tour_svg(&path, path.len(), &opts);
    fs::write(&output, &svg).with_context(|| format!("writing {:?}", output))?;
    println!("Wrote {:?}", output);
    Ok(())
}
