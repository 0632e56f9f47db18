//! Timezone resolution for anchor parsing.
//!
//! A zone spec resolves in three steps: IANA database name, built-in
//! abbreviation, then a `±H:MM` offset. The resolved zone only localizes the
//! anchor; results are always returned in UTC.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DateMathError, Result};

// ── Abbreviation table ──────────────────────────────────────────────────────

/// Common timezone abbreviation → offset string, looked up case-insensitively.
///
/// Abbreviations that the IANA database also ships as legacy zone names
/// (UTC, GMT, EST, MST, HST) resolve in the database step first with the
/// same meaning; they are kept here so the table stands on its own.
const BUILT_IN_ZONES: &[(&str, &str)] = &[
    ("IDLW", "-12:00"),
    ("NT", "-11:00"),
    ("HST", "-10:00"),
    ("AKST", "-9:00"),
    ("AKDT", "-8:00"),
    ("PST", "-8:00"),
    ("PDT", "-7:00"),
    ("MST", "-7:00"),
    ("MDT", "-6:00"),
    ("CST", "-6:00"),
    ("CDT", "-5:00"),
    ("EST", "-5:00"),
    ("EDT", "-4:00"),
    ("AST", "-4:00"),
    ("NST", "-3:30"),
    ("ART", "-3:00"),
    ("BRT", "-3:00"),
    ("UT", "+0:00"),
    ("UTC", "+0:00"),
    ("GMT", "+0:00"),
    ("WET", "+0:00"),
    ("BST", "+1:00"),
    ("CET", "+1:00"),
    ("WAT", "+1:00"),
    ("CEST", "+2:00"),
    ("EET", "+2:00"),
    ("SAST", "+2:00"),
    ("EEST", "+3:00"),
    ("MSK", "+3:00"),
    ("IRST", "+3:30"),
    ("GST", "+4:00"),
    ("PKT", "+5:00"),
    ("IST", "+5:30"),
    ("NPT", "+5:45"),
    ("BDT", "+6:00"),
    ("ICT", "+7:00"),
    ("WIB", "+7:00"),
    ("AWST", "+8:00"),
    ("HKT", "+8:00"),
    ("SGT", "+8:00"),
    ("JST", "+9:00"),
    ("KST", "+9:00"),
    ("ACST", "+9:30"),
    ("AEST", "+10:00"),
    ("ACDT", "+10:30"),
    ("AEDT", "+11:00"),
    ("NZST", "+12:00"),
    ("NZDT", "+13:00"),
];

static ZONE_ABBREVIATIONS: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| BUILT_IN_ZONES.iter().copied().collect());

/// Offset grammar: sign, 1-2 digit hour, 1-2 digit minute. Matched
/// unanchored, like the original contract.
static OFFSET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\+|-)(\d{1,2}):(\d{1,2})").unwrap());

// ── ResolvedZone ────────────────────────────────────────────────────────────

/// A concrete zone used to localize anchor wall-clock readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedZone {
    /// An IANA database zone (historical offsets, DST rules).
    Named(Tz),
    /// A fixed offset, in seconds east of UTC.
    Fixed(FixedOffset),
}

impl ResolvedZone {
    /// Interpret a naive wall-clock reading in this zone and return the UTC
    /// instant. Ambiguous local times (DST fall-back) take the earlier
    /// mapping; nonexistent ones (DST gap) yield `None`.
    pub(crate) fn from_local(&self, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            ResolvedZone::Named(tz) => tz
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            ResolvedZone::Fixed(offset) => offset
                .from_local_datetime(naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// Resolve a zone spec: IANA name, abbreviation, or `±H:MM` offset.
///
/// A zone string `+07:00` means "local wall-clock time is seven hours ahead
/// of UTC", so localizing `1970-01-01T00:00:00` in it yields the UTC instant
/// seven hours *before* the epoch.
///
/// # Errors
///
/// [`DateMathError::InvalidTimezoneFormat`] if `spec` matches none of the
/// three shapes; [`DateMathError::InvalidTimezoneRange`] if the offset hour
/// exceeds 23 or the minute exceeds 59.
///
/// # Examples
///
/// ```
/// use chrono::FixedOffset;
/// use datemath::{resolve_zone, ResolvedZone};
///
/// let zone = resolve_zone("+7:00").unwrap();
/// assert_eq!(
///     zone,
///     ResolvedZone::Fixed(FixedOffset::east_opt(7 * 3600).unwrap())
/// );
/// assert!(resolve_zone("Asia/Shanghai").is_ok());
/// assert!(resolve_zone("pst").is_ok());
/// ```
pub fn resolve_zone(spec: &str) -> Result<ResolvedZone> {
    if let Ok(tz) = spec.parse::<Tz>() {
        return Ok(ResolvedZone::Named(tz));
    }

    // Abbreviations substitute an offset string; unknown specs continue with
    // the original text so offsets like "+7:00" fall through to the grammar.
    let upper = spec.to_uppercase();
    let candidate = ZONE_ABBREVIATIONS
        .get(upper.as_str())
        .copied()
        .unwrap_or(spec);

    let caps = OFFSET_PATTERN
        .captures(candidate)
        .ok_or_else(|| DateMathError::InvalidTimezoneFormat(spec.to_string()))?;

    let hour: i32 = caps[2]
        .parse()
        .map_err(|_| DateMathError::InvalidTimezoneFormat(spec.to_string()))?;
    if hour > 23 {
        return Err(DateMathError::InvalidTimezoneRange {
            spec: spec.to_string(),
            field: "hour",
            max: 23,
        });
    }
    let minute: i32 = caps[3]
        .parse()
        .map_err(|_| DateMathError::InvalidTimezoneFormat(spec.to_string()))?;
    if minute > 59 {
        return Err(DateMathError::InvalidTimezoneRange {
            spec: spec.to_string(),
            field: "minute",
            max: 59,
        });
    }

    let sign = if &caps[1] == "-" { -1 } else { 1 };
    let offset = FixedOffset::east_opt(sign * (hour * 3600 + minute * 60))
        .ok_or_else(|| DateMathError::InvalidTimezoneFormat(spec.to_string()))?;
    Ok(ResolvedZone::Fixed(offset))
}
