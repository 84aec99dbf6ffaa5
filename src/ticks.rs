// Convert 32nds price text into normalized numeric prices and back.
// US Treasuries trade in 1/256th increments: "<whole>-<32nds><eighth>", where
// the eighth digit counts half-32nds in units of 1/256 and a value of 4 is
// rendered as "+". "99-162" = 99 + 16/32 + 2/256.

use crate::errors::{DeskError, DeskResult};

/// Smallest price increment.
pub const TICK: f64 = 1.0 / 256.0;

fn malformed(text: &str, reason: &str) -> DeskError {
    DeskError::MalformedRecord { line: text.to_string(), reason: reason.to_string() }
}

/// Parse 32nds text into a price. Goes through exact integer 256ths so every
/// parsed price is an exact binary fraction; comparisons downstream are exact.
pub fn parse_px(text: &str) -> DeskResult<f64> {
    if !text.is_ascii() {
        return Err(malformed(text, "not ascii"));
    }
    let (whole_part, frac_part) = text
        .split_once('-')
        .ok_or_else(|| malformed(text, "missing '-' separator"))?;

    let whole: i64 = whole_part
        .parse()
        .map_err(|_| malformed(text, "whole points not a number"))?;

    if frac_part.len() != 3 {
        return Err(malformed(text, "fraction must be two 32nds digits and an eighth digit"));
    }
    let thirty_seconds: i64 = frac_part[..2]
        .parse()
        .map_err(|_| malformed(text, "32nds not a number"))?;
    if thirty_seconds > 31 {
        return Err(malformed(text, "32nds out of range"));
    }

    let eighths: i64 = match &frac_part[2..] {
        "+" => 4,
        d => {
            let e: i64 = d.parse().map_err(|_| malformed(text, "eighth digit not a number"))?;
            if e > 7 {
                return Err(malformed(text, "eighth digit out of range"));
            }
            e
        }
    };

    let ticks = whole * 256 + thirty_seconds * 8 + eighths;
    Ok(ticks as f64 * TICK)
}

/// Render a price back into 32nds text. Only meaningful for prices on the
/// 1/256 grid (everything parsed or generated by this crate).
pub fn format_px(px: f64) -> String {
    let ticks = (px * 256.0).round() as i64;
    let whole = ticks.div_euclid(256);
    let rem = ticks.rem_euclid(256);
    let thirty_seconds = rem / 8;
    let eighths = rem % 8;
    if eighths == 4 {
        format!("{}-{:02}+", whole, thirty_seconds)
    } else {
        format!("{}-{:02}{}", whole, thirty_seconds, eighths)
    }
}
