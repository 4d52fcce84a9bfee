//! Cut line and scissors mark for combined two-up copies
//!
//! Coordinates here are already in PDF space (origin bottom-left).

use crate::constants::{BEZIER_CIRCLE_FACTOR, CUT_LINE_DASH, CUT_LINE_WIDTH, SCISSORS_SIZE};

/// Dashed horizontal cut line with a scissors mark at its left end
pub(crate) fn cut_line(x_start: f32, x_end: f32, y: f32) -> String {
    let mut ops = String::new();

    ops.push_str("q\n");
    ops.push_str("0.4 0.4 0.4 RG\n");
    ops.push_str(&format!("{} w\n", CUT_LINE_WIDTH));
    ops.push_str(&format!("[{} {}] 0 d\n", CUT_LINE_DASH.0, CUT_LINE_DASH.1));
    ops.push_str(&format!(
        "{:.2} {:.2} m {:.2} {:.2} l S\n",
        x_start + SCISSORS_SIZE + 4.0,
        y,
        x_end,
        y
    ));
    ops.push_str("[] 0 d\n");
    ops.push_str(&scissors(x_start, y));
    ops.push_str("Q\n");

    ops
}

/// Two finger loops and two blades pointing right, centered vertically on `y`
fn scissors(x: f32, y: f32) -> String {
    let half = SCISSORS_SIZE / 2.0;
    let r = half * 0.4;

    let mut ops = String::new();
    ops.push_str("q\n0.3 w\n");

    let upper = (x + half * 0.3, y + half * 0.5);
    let lower = (x + half * 0.3, y - half * 0.5);
    ops.push_str(&circle(upper.0, upper.1, r));
    ops.push_str(&circle(lower.0, lower.1, r));

    ops.push_str(&format!(
        "{:.2} {:.2} m {:.2} {:.2} l S\n",
        upper.0 + r,
        upper.1 - r * 0.5,
        x + SCISSORS_SIZE,
        y - 1.0
    ));
    ops.push_str(&format!(
        "{:.2} {:.2} m {:.2} {:.2} l S\n",
        lower.0 + r,
        lower.1 + r * 0.5,
        x + SCISSORS_SIZE,
        y + 1.0
    ));

    ops.push_str("Q\n");
    ops
}

/// Stroked circle from four Bezier quadrants
fn circle(cx: f32, cy: f32, r: f32) -> String {
    let k = r * BEZIER_CIRCLE_FACTOR;
    let quadrants = [
        (cx + r, cy + k, cx + k, cy + r, cx, cy + r),
        (cx - k, cy + r, cx - r, cy + k, cx - r, cy),
        (cx - r, cy - k, cx - k, cy - r, cx, cy - r),
        (cx + k, cy - r, cx + r, cy - k, cx + r, cy),
    ];

    let mut ops = format!("{:.2} {:.2} m\n", cx + r, cy);
    for (x1, y1, x2, y2, x3, y3) in quadrants {
        ops.push_str(&format!(
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
            x1, y1, x2, y2, x3, y3
        ));
    }
    ops.push_str("S\n");
    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_line_is_dashed_and_reset() {
        let ops = cut_line(20.0, 400.0, 300.0);
        assert!(ops.contains("[4 3] 0 d"));
        assert!(ops.contains("[] 0 d"));
        assert!(ops.starts_with("q\n"));
        assert!(ops.ends_with("Q\n"));
    }

    #[test]
    fn test_circle_closes_on_start_point() {
        let ops = circle(10.0, 10.0, 2.0);
        assert!(ops.starts_with("12.00 10.00 m"));
        assert!(ops.contains("12.00 10.00 c"));
        assert_eq!(ops.matches(" c\n").count(), 4);
    }
}
