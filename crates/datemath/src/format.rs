//! Symbolic format names and Joda-style pattern translation.
//!
//! Callers configure formats with Elasticsearch-style names
//! (`date_optional_time`, `basic_date`, ...) or raw Joda-style patterns
//! (`yyyy-MM-ddTHH:mm:ss`). Names are expanded through a fixed alias table;
//! the resulting patterns are rewritten into chrono strftime layouts once, at
//! configuration time.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::{DateMathError, Result};

// ── Format alias table ──────────────────────────────────────────────────────

/// Symbolic format name → Joda-style pattern list, in documented order.
///
/// The entries mirror the Elasticsearch built-in formats. Several of them
/// (ordinal dates, week dates, week years) expand to patterns the translator
/// rejects; the table still carries them so that configuration fails with a
/// precise unsupported-token error instead of an unknown-name fallback.
const BUILT_IN_FORMATS: &[(&str, &[&str])] = &[
    // The number of milliseconds since the epoch.
    ("epoch_millis", &["epoch_millis"]),
    // The number of seconds since the epoch.
    ("epoch_second", &["epoch_second"]),
    // A generic ISO datetime parser, where the date must include the year at
    // a minimum, and the time (separated by T) is optional.
    ("date_optional_time", &["yyyy-MM-ddTHH:mm:ss.SSSZ", "yyyy-MM-dd"]),
    ("strict_date_optional_time", &["yyyy-MM-ddTHH:mm:ss.SSSZ", "yyyy-MM-dd"]),
    // Like the above with a nanosecond-resolution fraction of a second.
    ("strict_date_optional_time_nanos", &["yyyy-MM-ddTHH:mm:ss.SSSSSSZ", "yyyy-MM-dd"]),
    // A basic formatter for a full date: yyyyMMdd.
    ("basic_date", &["yyyyMMdd"]),
    // A basic formatter that combines a basic date and time, separated by a T.
    ("basic_date_time", &["yyyyMMddTHHmmss.SSSZ"]),
    ("basic_date_time_no_millis", &["yyyyMMddTHHmmssZ"]),
    // A formatter for a full ordinal date, using a four digit year and three
    // digit dayOfYear.
    ("basic_ordinal_date", &["yyyyDDD"]),
    ("basic_ordinal_date_time", &["yyyyDDDTHHmmss.SSSZ"]),
    ("basic_ordinal_date_time_no_millis", &["yyyyDDDTHHmmssZ"]),
    // Basic time formatters: hour, minute, second, optional millis, zone
    // offset.
    ("basic_time", &["HHmmss.SSSZ"]),
    ("basic_time_no_millis", &["HHmmssZ"]),
    // As above, prefixed by T.
    ("basic_t_time", &["THHmmss.SSSZ"]),
    ("basic_t_time_no_millis", &["THHmmssZ"]),
    // Week-date formatters: four digit weekyear, two digit week of weekyear,
    // one digit day of week.
    ("basic_week_date", &["xxxxWwwe"]),
    ("strict_basic_week_date", &["xxxxWwwe"]),
    ("basic_week_date_time", &["xxxxWwweTHHmmss.SSSZ"]),
    ("strict_basic_week_date_time", &["xxxxWwweTHHmmss.SSSZ"]),
    ("basic_week_date_time_no_millis", &["xxxxWwweTHHmmssZ"]),
    ("strict_basic_week_date_time_no_millis", &["xxxxWwweTHHmmssZ"]),
    // A formatter for a full date: yyyy-MM-dd.
    ("date", &["yyyy-MM-dd"]),
    ("strict_date", &["yyyy-MM-dd"]),
    // A full date plus progressively more time components.
    ("date_hour", &["yyyy-MM-ddTHH"]),
    ("strict_date_hour", &["yyyy-MM-ddTHH"]),
    ("date_hour_minute", &["yyyy-MM-ddTHH:mm"]),
    ("strict_date_hour_minute", &["yyyy-MM-ddTHH:mm"]),
    ("date_hour_minute_second", &["yyyy-MM-ddTHH:mm:ss"]),
    ("strict_date_hour_minute_second", &["yyyy-MM-ddTHH:mm:ss"]),
    ("date_hour_minute_second_fraction", &["yyyy-MM-ddTHH:mm:ss.SSS"]),
    ("strict_date_hour_minute_second_fraction", &["yyyy-MM-ddTHH:mm:ss.SSS"]),
    ("date_hour_minute_second_millis", &["yyyy-MM-ddTHH:mm:ss.SSS"]),
    ("strict_date_hour_minute_second_millis", &["yyyy-MM-ddTHH:mm:ss.SSS"]),
    // A full date and time, separated by a T.
    ("date_time", &["yyyy-MM-ddTHH:mm:ss.SSSZZ"]),
    ("strict_date_time", &["yyyy-MM-ddTHH:mm:ss.SSSZZ"]),
    ("date_time_no_millis", &["yyyy-MM-ddTHH:mm:ssZZ"]),
    ("strict_date_time_no_millis", &["yyyy-MM-ddTHH:mm:ssZZ"]),
    // Bare time-of-day formatters.
    ("hour", &["HH"]),
    ("strict_hour", &["HH"]),
    ("hour_minute", &["HH:mm"]),
    ("strict_hour_minute", &["HH:mm"]),
    ("hour_minute_second", &["HH:mm:ss"]),
    ("strict_hour_minute_second", &["HH:mm:ss"]),
    ("hour_minute_second_fraction", &["HH:mm:ss.SSS"]),
    ("strict_hour_minute_second_fraction", &["HH:mm:ss.SSS"]),
    ("hour_minute_second_millis", &["HH:mm:ss.SSS"]),
    ("strict_hour_minute_second_millis", &["HH:mm:ss.SSS"]),
    // Ordinal dates with separators.
    ("ordinal_date", &["yyyy-DDD"]),
    ("strict_ordinal_date", &["yyyy-DDD"]),
    ("ordinal_date_time", &["yyyy-DDDTHH:mm:ss.SSSZZ"]),
    ("strict_ordinal_date_time", &["yyyy-DDDTHH:mm:ss.SSSZZ"]),
    ("ordinal_date_time_no_millis", &["yyyy-DDDTHH:mm:ssZZ"]),
    ("strict_ordinal_date_time_no_millis", &["yyyy-DDDTHH:mm:ssZZ"]),
    // Time-of-day with zone offset.
    ("time", &["HH:mm:ss.SSSZZ"]),
    ("strict_time", &["HH:mm:ss.SSSZZ"]),
    ("time_no_millis", &["HH:mm:ssZZ"]),
    ("strict_time_no_millis", &["HH:mm:ssZZ"]),
    // As above, prefixed by T. Note the lowercase zone-name suffix on t_time;
    // the quirk is inherited data.
    ("t_time", &["THH:mm:ss.SSSzz"]),
    ("strict_t_time", &["THH:mm:ss.SSSzz"]),
    ("t_time_no_millis", &["THH:mm:ssZZ"]),
    ("strict_t_time_no_millis", &["THH:mm:ssZZ"]),
    // Week dates with separators.
    ("week_date", &["xxxx-Www-e"]),
    ("strict_week_date", &["xxxx-Www-e"]),
    ("week_date_time", &["xxxx-Www-eTHH:mm:ss.SSSZZ"]),
    ("strict_week_date_time", &["xxxx-Www-eTHH:mm:ss.SSSZZ"]),
    ("week_date_time_no_millis", &["xxxx-Www-eTHH:mm:ssZZ"]),
    ("strict_week_date_time_no_millis", &["xxxx-Www-eTHH:mm:ssZZ"]),
    ("weekyear", &["xxxx"]),
    ("strict_weekyear", &["xxxx"]),
    ("weekyear_week", &["xxxx-Www"]),
    ("strict_weekyear_week", &["xxxx-Www"]),
    ("weekyear_week_day", &["xxxx-Www-e"]),
    ("strict_weekyear_week_day", &["xxxx-Www-e"]),
    // Year and year-month formatters.
    ("year_month", &["yyyy-MM"]),
    ("strict_year_month", &["yyyy-MM"]),
    ("year", &["yyyy"]),
    ("strict_year", &["yyyy"]),
    ("year_month_day", &["yyyy-MM-dd"]),
    ("strict_year_month_day", &["yyyy-MM-dd"]),
];

static FORMAT_ALIASES: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| BUILT_IN_FORMATS.iter().copied().collect());

/// Look up the pattern list for a symbolic format name.
pub fn alias_patterns(name: &str) -> Option<&'static [&'static str]> {
    FORMAT_ALIASES.get(name).copied()
}

// ── FormatSpec ──────────────────────────────────────────────────────────────

/// One entry of a parser's format list, tried left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSpec {
    /// The anchor is a raw integer of milliseconds since the epoch.
    EpochMillis,
    /// The anchor is a raw integer of seconds since the epoch.
    EpochSecond,
    /// The anchor is matched strictly against a translated pattern.
    Pattern {
        /// The Joda-style pattern as supplied or expanded from an alias.
        source: String,
        /// The equivalent chrono strftime layout.
        layout: String,
    },
}

impl FormatSpec {
    /// Build a spec from a single Joda-style pattern or epoch sentinel.
    pub fn from_pattern(pattern: &str) -> Result<Self> {
        match pattern {
            "epoch_millis" => Ok(FormatSpec::EpochMillis),
            "epoch_second" => Ok(FormatSpec::EpochSecond),
            _ => Ok(FormatSpec::Pattern {
                source: pattern.to_string(),
                layout: translate_pattern(pattern)?,
            }),
        }
    }

    /// The caller-facing name of this format, used in diagnostics.
    pub fn label(&self) -> &str {
        match self {
            FormatSpec::EpochMillis => "epoch_millis",
            FormatSpec::EpochSecond => "epoch_second",
            FormatSpec::Pattern { source, .. } => source,
        }
    }
}

/// Expand a list of symbolic names and/or raw patterns into format specs.
///
/// Names found in the alias table expand to their full pattern list, in
/// order; anything else is treated as a literal Joda-style pattern. Fails if
/// any resulting pattern uses a token the translator does not support.
pub fn expand_formats<I, S>(names: I) -> Result<Vec<FormatSpec>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut specs = Vec::new();
    for name in names {
        let name = name.as_ref();
        match alias_patterns(name) {
            Some(patterns) => {
                for pattern in patterns {
                    specs.push(FormatSpec::from_pattern(pattern)?);
                }
            }
            None => specs.push(FormatSpec::from_pattern(name)?),
        }
    }
    Ok(specs)
}

// ── Pattern translation ─────────────────────────────────────────────────────

/// Translate a Joda-style pattern into a chrono strftime layout.
///
/// The rewrite walks maximal runs of identical pattern letters and maps each
/// run as a whole, so `MM` (month) and `mm` (minute) stay distinct and `SSS`
/// never half-matches inside `SSSSSS`. Non-letters pass through as literals
/// (`%` is escaped). `T` is the one bare literal letter the alias table uses
/// and passes through verbatim.
///
/// # Errors
///
/// Returns [`DateMathError::UnsupportedPatternToken`] for week-date (`w`,
/// `W`, `e`), ordinal-day (`D`), week-year (`x`), and any other letter run
/// with no chrono equivalent.
///
/// # Examples
///
/// ```
/// use datemath::translate_pattern;
///
/// let layout = translate_pattern("yyyy-MM-ddTHH:mm:ss").unwrap();
/// assert_eq!(layout, "%Y-%m-%dT%H:%M:%S");
/// assert!(translate_pattern("yyyy-DDD").is_err());
/// ```
pub fn translate_pattern(pattern: &str) -> Result<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut layout = String::with_capacity(pattern.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if !ch.is_ascii_alphabetic() {
            if ch == '%' {
                layout.push_str("%%");
            } else {
                layout.push(ch);
            }
            i += 1;
            continue;
        }

        let mut j = i;
        while j < chars.len() && chars[j] == ch {
            j += 1;
        }
        let run = j - i;

        let mapped = match (ch, run) {
            ('y', 1) | ('y', 4) => "%Y",
            ('y', 2) => "%y",
            ('M', 1..=2) => "%m",
            ('d', 1..=2) => "%d",
            ('H', 1..=2) => "%H",
            ('h', 1..=2) => "%I",
            ('m', 1..=2) => "%M",
            ('s', 1..=2) => "%S",
            ('S', 3) => "%3f",
            ('S', 6) => "%6f",
            ('S', 9) => "%9f",
            ('Z', 1) => "%z",
            ('Z', 2) => "%:z",
            ('z', 1..=2) => "%Z",
            ('a', 1) => "%p",
            // Bare literal separator used by the ISO-style patterns.
            ('T', _) => {
                for _ in 0..run {
                    layout.push('T');
                }
                i = j;
                continue;
            }
            _ => {
                return Err(DateMathError::UnsupportedPatternToken {
                    pattern: pattern.to_string(),
                    token: chars[i..j].iter().collect(),
                });
            }
        };
        layout.push_str(mapped);
        i = j;
    }

    Ok(layout)
}
