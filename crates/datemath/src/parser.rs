//! The date-math parser: configuration, anchor resolution, and evaluation.
//!
//! An expression is an anchor plus an optional math suffix. `now` anchors to
//! the wall clock and everything after it is math; otherwise the first `||`
//! separates the anchor text from the math. Anchors resolve through the
//! configured format list, or through a best-effort flexible parser when no
//! formats are configured. Results are always UTC.

use chrono::format::{parse as parse_items, Parsed, StrftimeItems};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{DateMathError, Result};
use crate::format::{expand_formats, FormatSpec};
use crate::math;
use crate::zone::{resolve_zone, ResolvedZone};

/// Naive layouts the flexible parser tries, most specific first.
const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y%m%d%H%M%S",
    "%d %b %Y %H:%M:%S",
];

/// Date-only layouts the flexible parser tries; the time defaults to
/// midnight in the configured zone.
const DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

// ── Configuration ───────────────────────────────────────────────────────────

/// An immutable date-math parser configuration.
///
/// Build one once via [`DateMathParser::builder`] and reuse it across calls;
/// parsing never mutates the configuration, so a parser can be shared across
/// threads freely. The default configuration has no formats (flexible anchor
/// parsing) and no zone (implicit UTC).
///
/// # Examples
///
/// ```
/// use datemath::DateMathParser;
///
/// let parser = DateMathParser::builder()
///     .formats(["yyyy-MM-dd"])
///     .build()
///     .unwrap();
/// let instant = parser.parse("2021-12-22||+1d/d").unwrap();
/// assert_eq!(instant.timestamp(), 1_640_217_600);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DateMathParser {
    formats: Vec<FormatSpec>,
    time_zone: Option<ResolvedZone>,
}

/// Builder for [`DateMathParser`]. Format and zone resolution happen in
/// [`build`](DateMathParserBuilder::build), so a bad symbolic name or zone
/// spec fails construction rather than every later parse.
#[derive(Debug, Clone, Default)]
pub struct DateMathParserBuilder {
    formats: Vec<String>,
    time_zone: Option<String>,
}

impl DateMathParserBuilder {
    /// Set the anchor formats, tried left to right. Entries may be symbolic
    /// names (`date_optional_time`), epoch sentinels (`epoch_millis`,
    /// `epoch_second`), or raw Joda-style patterns.
    pub fn formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.formats = formats.into_iter().map(Into::into).collect();
        self
    }

    /// Set the zone that localizes anchor wall-clock readings: an IANA name,
    /// an abbreviation, or a `±H:MM` offset.
    pub fn time_zone(mut self, zone: impl Into<String>) -> Self {
        self.time_zone = Some(zone.into());
        self
    }

    /// Resolve all configured names and build the parser.
    ///
    /// # Errors
    ///
    /// [`DateMathError::UnsupportedPatternToken`] for unmappable format
    /// patterns, [`DateMathError::InvalidTimezoneFormat`] /
    /// [`DateMathError::InvalidTimezoneRange`] for bad zone specs.
    pub fn build(self) -> Result<DateMathParser> {
        let formats = expand_formats(&self.formats)?;
        let time_zone = match &self.time_zone {
            Some(spec) => Some(resolve_zone(spec)?),
            None => None,
        };
        Ok(DateMathParser { formats, time_zone })
    }
}

impl DateMathParser {
    /// A parser with flexible anchor parsing and implicit UTC.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> DateMathParserBuilder {
        DateMathParserBuilder::default()
    }

    /// The resolved format list, in trial order.
    pub fn formats(&self) -> &[FormatSpec] {
        &self.formats
    }

    /// The resolved zone, if one was configured.
    pub fn time_zone(&self) -> Option<ResolvedZone> {
        self.time_zone
    }

    // ── Expression evaluation ───────────────────────────────────────────

    /// Evaluate a date-math expression to a UTC instant.
    ///
    /// `now` (case-sensitive) anchors to the current wall clock, with the
    /// rest of the expression as math; otherwise everything before the first
    /// `||` is the anchor and everything after it is math. An expression
    /// with no math returns the anchor directly.
    ///
    /// # Errors
    ///
    /// Any anchor-resolution or math error aborts the call; there are no
    /// partial results.
    ///
    /// # Examples
    ///
    /// ```
    /// use datemath::DateMathParser;
    ///
    /// let parser = DateMathParser::new();
    /// let instant = parser.parse("1640183392||+h/d").unwrap();
    /// assert_eq!(instant.timestamp(), 1_640_131_200);
    /// ```
    pub fn parse(&self, expr: &str) -> Result<DateTime<Utc>> {
        let (anchor, suffix) = match expr.strip_prefix("now") {
            Some(rest) => (Utc::now(), rest),
            None => match expr.find("||") {
                Some(sep) => (self.parse_anchor(&expr[..sep])?, &expr[sep + 2..]),
                None => (self.parse_anchor(expr)?, ""),
            },
        };
        if suffix.is_empty() {
            Ok(anchor)
        } else {
            math::apply(suffix, anchor)
        }
    }

    // ── Anchor resolution ───────────────────────────────────────────────

    /// Resolve an anchor through the configured formats, or through the
    /// flexible parser when none are configured.
    ///
    /// Epoch-sentinel failures are soft (the next format is tried) except in
    /// last position, where the sentinel's failure is the terminal error.
    /// Pattern successes are authoritative; pattern failures are always
    /// soft.
    fn parse_anchor(&self, text: &str) -> Result<DateTime<Utc>> {
        if self.formats.is_empty() {
            return self.parse_any(text);
        }

        let last = self.formats.len() - 1;
        for (idx, spec) in self.formats.iter().enumerate() {
            match spec {
                FormatSpec::EpochMillis | FormatSpec::EpochSecond => {
                    let instant = text.parse::<i64>().ok().and_then(|v| match spec {
                        FormatSpec::EpochMillis => DateTime::from_timestamp_millis(v),
                        _ => DateTime::from_timestamp(v, 0),
                    });
                    match instant {
                        Some(dt) => return Ok(dt),
                        None if idx == last => {
                            return Err(DateMathError::NoFormatMatched {
                                expr: text.to_string(),
                                formats: vec![spec.label().to_string()],
                            });
                        }
                        None => continue,
                    }
                }
                FormatSpec::Pattern { layout, .. } => {
                    if let Some(dt) = self.parse_pattern(text, layout) {
                        return Ok(dt);
                    }
                }
            }
        }

        Err(DateMathError::NoFormatMatched {
            expr: text.to_string(),
            formats: self.formats.iter().map(|f| f.label().to_string()).collect(),
        })
    }

    /// Strict single-layout parse. Fields the layout does not mention
    /// default to 1970-01-01 / 00:00:00, so partial layouts like `%Y-%m` or
    /// `%H:%M` resolve deterministically. An offset captured from the text
    /// wins over the configured zone.
    fn parse_pattern(&self, text: &str, layout: &str) -> Option<DateTime<Utc>> {
        let mut parsed = Parsed::new();
        parse_items(&mut parsed, text, StrftimeItems::new(layout)).ok()?;

        if parsed.year().is_none() {
            parsed.set_year(1970).ok()?;
        }
        if parsed.month().is_none() {
            parsed.set_month(1).ok()?;
        }
        if parsed.day().is_none() {
            parsed.set_day(1).ok()?;
        }
        if parsed.hour_div_12().is_none() {
            if parsed.hour_mod_12().is_none() {
                parsed.set_hour(0).ok()?;
            } else {
                // A 12-hour reading without a meridiem marker reads as AM.
                parsed.set_ampm(false).ok()?;
            }
        }
        if parsed.minute().is_none() {
            parsed.set_minute(0).ok()?;
        }
        if parsed.second().is_none() {
            parsed.set_second(0).ok()?;
        }

        let naive = NaiveDateTime::new(parsed.to_naive_date().ok()?, parsed.to_naive_time().ok()?);
        match parsed.offset() {
            Some(offset) => Some(Utc.from_utc_datetime(&(naive - Duration::seconds(offset as i64)))),
            None => self.localize(&naive),
        }
    }

    /// Best-effort parse of common layouts, for configurations with no
    /// explicit formats. Deterministic configurations should set formats
    /// instead; this path trades determinism for convenience.
    fn parse_any(&self, text: &str) -> Result<DateTime<Utc>> {
        let fail = || DateMathError::AmbiguousOrUnparsableTime(text.to_string());
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(fail());
        }

        // Raw integers are epoch values; the unit is inferred from the digit
        // count (more than ten digits reads as milliseconds).
        if let Some(dt) = parse_epoch_magnitude(trimmed) {
            return Ok(dt);
        }

        // Offset-bearing layouts are zone-independent.
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
            return Ok(dt.with_timezone(&Utc));
        }

        for layout in DATETIME_LAYOUTS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, layout) {
                return self.localize(&naive).ok_or_else(fail);
            }
        }
        for layout in DATE_LAYOUTS {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, layout) {
                let naive = date.and_hms_opt(0, 0, 0).ok_or_else(fail)?;
                return self.localize(&naive).ok_or_else(fail);
            }
        }

        Err(fail())
    }

    fn localize(&self, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
        match &self.time_zone {
            Some(zone) => zone.from_local(naive),
            None => Some(Utc.from_utc_datetime(naive)),
        }
    }
}

/// Parse a signed base-10 integer as an epoch value, inferring seconds or
/// milliseconds from the digit count.
fn parse_epoch_magnitude(text: &str) -> Option<DateTime<Utc>> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i64 = text.parse().ok()?;
    if digits.len() > 10 {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    // ── flexible anchor parsing ─────────────────────────────────────────

    #[test]
    fn test_flexible_epoch_seconds() {
        let parser = DateMathParser::new();
        assert_eq!(parser.parse("1640183392").unwrap().timestamp(), 1_640_183_392);
    }

    #[test]
    fn test_flexible_epoch_millis_by_digit_count() {
        let parser = DateMathParser::new();
        let got = parser.parse("1640183392001").unwrap();
        assert_eq!(got.timestamp_millis(), 1_640_183_392_001);
    }

    #[test]
    fn test_flexible_date_in_configured_zone() {
        let parser = DateMathParser::builder().time_zone("+8:00").build().unwrap();
        assert_eq!(parser.parse("2021-12-22").unwrap().timestamp(), 1_640_102_400);
    }

    #[test]
    fn test_flexible_datetime_in_configured_zone() {
        let parser = DateMathParser::builder().time_zone("+8:00").build().unwrap();
        let got = parser.parse("2021-12-22T10:09:00").unwrap();
        assert_eq!(got.timestamp(), 1_640_138_940);
    }

    #[test]
    fn test_flexible_datetime_without_zone_is_utc() {
        let parser = DateMathParser::new();
        let got = parser.parse("2021-12-22T10:09:00").unwrap();
        assert_eq!(got, utc(2021, 12, 22, 10, 9, 0));
    }

    #[test]
    fn test_flexible_rfc3339_offset_wins_over_zone() {
        let parser = DateMathParser::builder().time_zone("+8:00").build().unwrap();
        let got = parser.parse("2021-12-22T10:09:00+00:00").unwrap();
        assert_eq!(got, utc(2021, 12, 22, 10, 9, 0));
    }

    #[test]
    fn test_flexible_failure_names_the_input() {
        let parser = DateMathParser::new();
        assert_eq!(
            parser.parse("not a time").unwrap_err(),
            DateMathError::AmbiguousOrUnparsableTime("not a time".to_string())
        );
    }

    #[test]
    fn test_flexible_nonexistent_local_time_fails() {
        // 02:30 on 2021-03-14 falls inside the US spring-forward gap.
        let parser = DateMathParser::builder()
            .time_zone("America/New_York")
            .build()
            .unwrap();
        assert_eq!(
            parser.parse("2021-03-14T02:30:00").unwrap_err(),
            DateMathError::AmbiguousOrUnparsableTime("2021-03-14T02:30:00".to_string())
        );
    }

    // ── explicit format lists ───────────────────────────────────────────

    #[test]
    fn test_epoch_millis_format() {
        let parser = DateMathParser::builder()
            .formats(["epoch_millis"])
            .time_zone("+8:00")
            .build()
            .unwrap();
        // The configured zone localizes wall-clock anchors only; epoch
        // values are absolute.
        assert_eq!(parser.parse("1640138940000").unwrap().timestamp(), 1_640_138_940);
    }

    #[test]
    fn test_epoch_sentinel_in_last_position_fails_hard() {
        let parser = DateMathParser::builder().formats(["epoch_millis"]).build().unwrap();
        assert_eq!(
            parser.parse("xx1640138940000").unwrap_err(),
            DateMathError::NoFormatMatched {
                expr: "xx1640138940000".to_string(),
                formats: vec!["epoch_millis".to_string()],
            }
        );
    }

    #[test]
    fn test_epoch_sentinel_failure_is_soft_before_other_formats() {
        let parser = DateMathParser::builder()
            .formats(["epoch_second", "yyyy-MM-dd"])
            .build()
            .unwrap();
        assert_eq!(parser.parse("2021-12-22").unwrap(), utc(2021, 12, 22, 0, 0, 0));
    }

    #[test]
    fn test_epoch_second_format() {
        let parser = DateMathParser::builder().formats(["epoch_second"]).build().unwrap();
        assert_eq!(parser.parse("1640138940").unwrap().timestamp(), 1_640_138_940);
    }

    #[test]
    fn test_pattern_round_trips_in_implicit_utc() {
        let parser = DateMathParser::builder().formats(["yyyy-MM-dd"]).build().unwrap();
        assert_eq!(parser.parse("1900-02-28").unwrap(), utc(1900, 2, 28, 0, 0, 0));
    }

    #[test]
    fn test_pattern_localizes_with_configured_zone() {
        let parser = DateMathParser::builder()
            .formats(["yyyy-MM-dd"])
            .time_zone("+8:00")
            .build()
            .unwrap();
        let got = parser.parse("1900-02-28").unwrap();
        assert_eq!(got, utc(1900, 2, 28, 0, 0, 0) - Duration::hours(8));
    }

    #[test]
    fn test_invalid_calendar_date_fails_not_clamps() {
        // 1900 is not a leap year.
        let parser = DateMathParser::builder().formats(["yyyy-MM-dd"]).build().unwrap();
        assert!(matches!(
            parser.parse("1900-02-29").unwrap_err(),
            DateMathError::NoFormatMatched { .. }
        ));
    }

    #[test]
    fn test_no_format_matched_lists_attempts() {
        let parser = DateMathParser::builder()
            .formats(["yyyy-MM-dd", "basic_date"])
            .build()
            .unwrap();
        assert_eq!(
            parser.parse("12:30").unwrap_err(),
            DateMathError::NoFormatMatched {
                expr: "12:30".to_string(),
                formats: vec!["yyyy-MM-dd".to_string(), "yyyyMMdd".to_string()],
            }
        );
    }

    #[test]
    fn test_partial_pattern_defaults_missing_fields() {
        let parser = DateMathParser::builder().formats(["year_month"]).build().unwrap();
        assert_eq!(parser.parse("2021-12").unwrap(), utc(2021, 12, 1, 0, 0, 0));

        let parser = DateMathParser::builder().formats(["hour_minute"]).build().unwrap();
        assert_eq!(parser.parse("10:09").unwrap(), utc(1970, 1, 1, 10, 9, 0));
    }

    #[test]
    fn test_twelve_hour_pattern_without_meridiem_reads_as_am() {
        let parser = DateMathParser::builder().formats(["hh:mm"]).build().unwrap();
        assert_eq!(parser.parse("09:30").unwrap(), utc(1970, 1, 1, 9, 30, 0));
    }

    #[test]
    fn test_twelve_hour_pattern_with_meridiem() {
        let parser = DateMathParser::builder().formats(["hh:mm a"]).build().unwrap();
        assert_eq!(parser.parse("09:30 PM").unwrap(), utc(1970, 1, 1, 21, 30, 0));
    }

    #[test]
    fn test_pattern_with_offset_overrides_zone() {
        let parser = DateMathParser::builder()
            .formats(["date_time_no_millis"])
            .build()
            .unwrap();
        let got = parser.parse("2021-12-22T10:09:00+08:00").unwrap();
        assert_eq!(got.timestamp(), 1_640_138_940);
    }

    // ── full expressions ────────────────────────────────────────────────

    #[test]
    fn test_expression_add_then_floor() {
        let parser = DateMathParser::new();
        assert_eq!(parser.parse("1640183392||+h/d").unwrap().timestamp(), 1_640_131_200);
        assert_eq!(parser.parse("1640183392||+2d/d").unwrap().timestamp(), 1_640_304_000);
    }

    #[test]
    fn test_expression_millis_anchor_floors_away_subseconds() {
        let parser = DateMathParser::new();
        assert_eq!(
            parser.parse("1640183392001||+h/d").unwrap().timestamp_millis(),
            1_640_131_200_000
        );
    }

    #[test]
    fn test_expression_with_zone_and_month_add() {
        let parser = DateMathParser::builder().time_zone("+8:00").build().unwrap();
        assert_eq!(
            parser.parse("2021-12-22||+h+M/d").unwrap().timestamp(),
            1_642_636_800
        );
    }

    #[test]
    fn test_expression_from_datetime_anchor() {
        let parser = DateMathParser::new();
        assert_eq!(
            parser.parse("2021-12-22T10:09:00||+1M+2h/d").unwrap().timestamp(),
            1_642_723_200
        );
    }

    #[test]
    fn test_anchor_without_math_passes_through() {
        let parser = DateMathParser::new();
        assert_eq!(
            parser.parse("2021-12-22T10:09:00").unwrap(),
            utc(2021, 12, 22, 10, 9, 0)
        );
    }

    #[test]
    fn test_malformed_math_aborts_whole_expression() {
        let parser = DateMathParser::builder().formats(["yyyy-MM-dd"]).build().unwrap();
        assert!(matches!(
            parser.parse("1900-02-28||+x").unwrap_err(),
            DateMathError::MalformedMathExpression(_)
        ));
    }

    #[test]
    fn test_anchor_error_wins_over_math() {
        let parser = DateMathParser::builder().formats(["yyyy-MM-dd"]).build().unwrap();
        assert!(matches!(
            parser.parse("1900-02-29||+y").unwrap_err(),
            DateMathError::NoFormatMatched { .. }
        ));
    }

    #[test]
    fn test_empty_anchor_before_separator_fails() {
        let parser = DateMathParser::new();
        assert!(matches!(
            parser.parse("||+1d").unwrap_err(),
            DateMathError::AmbiguousOrUnparsableTime(_)
        ));
    }

    // ── now ─────────────────────────────────────────────────────────────

    #[test]
    fn test_now_is_current_wall_clock() {
        let parser = DateMathParser::new();
        let got = parser.parse("now").unwrap();
        let after = Utc::now();
        assert!(after - got < Duration::seconds(5));
    }

    #[test]
    fn test_now_floors_to_current_second() {
        let parser = DateMathParser::new();
        let got = parser.parse("now/s").unwrap();
        let after = Utc::now();
        assert_eq!(got.timestamp_subsec_micros(), 0);
        assert!(got <= after);
        assert!(after.timestamp() - got.timestamp() <= 1);
    }

    #[test]
    fn test_now_with_offset_math() {
        let parser = DateMathParser::new();
        let before = Utc::now();
        let got = parser.parse("now-1d/s").unwrap();
        let shifted = before - Duration::days(1);
        assert!((shifted - got).abs() < Duration::seconds(5));
    }

    // ── builder ─────────────────────────────────────────────────────────

    #[test]
    fn test_builder_rejects_bad_zone() {
        let err = DateMathParser::builder().time_zone("+45:00").build().unwrap_err();
        assert!(matches!(err, DateMathError::InvalidTimezoneRange { .. }));
    }

    #[test]
    fn test_builder_rejects_unsupported_alias() {
        let err = DateMathParser::builder()
            .formats(["ordinal_date"])
            .build()
            .unwrap_err();
        assert!(matches!(err, DateMathError::UnsupportedPatternToken { .. }));
    }

    #[test]
    fn test_builder_expands_aliases_in_order() {
        let parser = DateMathParser::builder()
            .formats(["epoch_millis", "date_optional_time"])
            .build()
            .unwrap();
        let labels: Vec<&str> = parser.formats().iter().map(|f| f.label()).collect();
        assert_eq!(
            labels,
            vec!["epoch_millis", "yyyy-MM-ddTHH:mm:ss.SSSZ", "yyyy-MM-dd"]
        );
    }

    #[test]
    fn test_default_parser_is_flexible_utc() {
        let parser = DateMathParser::new();
        assert!(parser.formats().is_empty());
        assert!(parser.time_zone().is_none());
    }
}
