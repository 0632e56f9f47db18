//! Duration math over a base instant.
//!
//! A math suffix is a concatenation of tokens `([+-]\d*|/)(y|M|w|d|h|H|m|s)`
//! applied left to right: `+2h` adds, `-7y` subtracts, `/d` floors the
//! running instant to the start of the unit. Units are fixed durations —
//! a year is 365 days and a month is 30 days, deliberately not calendar
//! arithmetic — so `/M` floors to a 30-day boundary measured from the epoch,
//! not to the first of a calendar month.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DateMathError, Result};

static DUR_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"([+-]\d*|/)(y|M|w|d|h|H|m|s)").unwrap());

/// Fixed duration of one unit, in seconds. `h` and `H` are synonyms.
fn unit_seconds(unit: &str) -> Option<i64> {
    Some(match unit {
        "y" => 365 * 86_400,
        "M" => 30 * 86_400,
        "w" => 7 * 86_400,
        "d" => 86_400,
        "h" | "H" => 3_600,
        "m" => 60,
        "s" => 1,
        _ => return None,
    })
}

/// Apply a math suffix to `anchor`, token by token.
///
/// The whole suffix must be tiled by grammar tokens; a gap anywhere (before,
/// between, or after tokens) invalidates the expression. A bare sign counts
/// as magnitude one: `+y` adds a year-duration, `-y` subtracts one.
///
/// # Errors
///
/// [`DateMathError::MalformedMathExpression`] when the suffix is not fully
/// covered by tokens, [`DateMathError::MathOutOfRange`] when a step leaves
/// the representable time range.
pub(crate) fn apply(suffix: &str, anchor: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let malformed = || DateMathError::MalformedMathExpression(suffix.to_string());

    // Coverage check first: token matches must start where the previous one
    // ended and the last must end the string.
    let mut pos = 0;
    let mut matched_any = false;
    for m in DUR_TOKEN.find_iter(suffix) {
        if m.start() != pos {
            return Err(malformed());
        }
        pos = m.end();
        matched_any = true;
    }
    if !matched_any || pos != suffix.len() {
        return Err(malformed());
    }

    let mut res = anchor;
    for caps in DUR_TOKEN.captures_iter(suffix) {
        let unit = unit_seconds(&caps[2]).ok_or_else(malformed)?;
        let op = &caps[1];
        if op == "/" {
            res = floor_to(res, unit)
                .ok_or_else(|| DateMathError::MathOutOfRange(suffix.to_string()))?;
        } else {
            let magnitude: i64 = match op {
                "+" => 1,
                "-" => -1,
                digits => digits.parse().map_err(|_| malformed())?,
            };
            res = add_seconds(res, magnitude, unit)
                .ok_or_else(|| DateMathError::MathOutOfRange(suffix.to_string()))?;
        }
    }
    Ok(res)
}

/// Floor an instant down to the previous multiple of `unit` seconds on the
/// epoch timeline. `rem_euclid` keeps the floor direction toward −∞ for
/// pre-epoch instants.
fn floor_to(instant: DateTime<Utc>, unit: i64) -> Option<DateTime<Utc>> {
    let unit_micros = unit.checked_mul(1_000_000)?;
    let micros = instant.timestamp_micros();
    DateTime::from_timestamp_micros(micros - micros.rem_euclid(unit_micros))
}

fn add_seconds(instant: DateTime<Utc>, magnitude: i64, unit: i64) -> Option<DateTime<Utc>> {
    let delta_micros = magnitude.checked_mul(unit)?.checked_mul(1_000_000)?;
    DateTime::from_timestamp_micros(instant.timestamp_micros().checked_add(delta_micros)?)
}
