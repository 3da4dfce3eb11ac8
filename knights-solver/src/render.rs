//! Text rendering of a tour as a grid of step numbers.

use knights_core::{Square, TourPath, BOARD_LEN, BOARD_SIZE};

/// Step number (1-based) at which each square is visited.
pub fn step_numbers(path: &TourPath) -> [u8; BOARD_SIZE] {
    let mut steps = [0u8; BOARD_SIZE];
    for (step, square) in path.iter().enumerate() {
        steps[square.index()] = step as u8 + 1;
    }
    steps
}

/// Render the board with rank 8 on top, each square showing its step number.
///
/// ```text
///  8 |  .  .  .
///  ...
///     a  b  c ...
/// ```
pub fn render_grid(path: &TourPath) -> String {
    let steps = step_numbers(path);
    let mut out = String::new();

    for y in (0..BOARD_LEN).rev() {
        out.push_str(&format!("{} |", y + 1));
        for x in 0..BOARD_LEN {
            out.push_str(&format!("{:>3}", steps[Square::new(x, y).index()]));
        }
        out.push('\n');
    }

    out.push_str("   ");
    out.push_str(&"-".repeat(3 * BOARD_LEN as usize));
    out.push('\n');
    out.push_str("   ");
    for x in 0..BOARD_LEN {
        out.push_str(&format!("{:>3}", (b'a' + x) as char));
    }
    out.push('\n');
    out
}

/// Space-separated algebraic squares, e.g. `a1 c2 e1 ...`.
pub fn render_moves(path: &TourPath) -> String {
    path.iter()
        .map(|sq| sq.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
