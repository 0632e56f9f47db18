//! Error types for date-math evaluation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateMathError {
    /// The math suffix is not tiled by grammar tokens.
    #[error("math expression '{0}' does not match ([+-]\\d*|/)(y|M|w|d|h|H|m|s)")]
    MalformedMathExpression(String),

    /// A math operation moved the running instant outside the representable
    /// time range.
    #[error("math expression '{0}' moves the result outside the representable time range")]
    MathOutOfRange(String),

    /// The anchor text failed every explicitly configured format.
    #[error("failed to parse time '{expr}' with formats {formats:?}")]
    NoFormatMatched { expr: String, formats: Vec<String> },

    /// The anchor text failed the flexible fallback parser, or its local
    /// reading does not exist in the configured zone (DST gap).
    #[error("failed to parse time '{0}' with any known layout")]
    AmbiguousOrUnparsableTime(String),

    /// The zone spec is neither a zone database name, an abbreviation, nor an
    /// offset.
    #[error("time zone '{0}' is invalid, expected offset format (\\+|-)(\\d{{1,2}}):(\\d{{1,2}}), an abbreviation, or an IANA name")]
    InvalidTimezoneFormat(String),

    /// The zone spec matched the offset grammar but a field is out of bounds.
    #[error("time zone '{spec}' is invalid, {field} is out of range [0, {max}]")]
    InvalidTimezoneRange {
        spec: String,
        field: &'static str,
        max: u32,
    },

    /// A format pattern uses a token the translator cannot map to a chrono
    /// layout (week-date, ordinal-day, week-year, or anything else unknown).
    #[error("format pattern '{pattern}' uses unsupported token '{token}'")]
    UnsupportedPatternToken { pattern: String, token: String },
}

pub type Result<T> = std::result::Result<T, DateMathError>;
