//! # datemath
//!
//! Elasticsearch-style date-math expression evaluation.
//!
//! An expression is an anchor plus optional math: `now-1d/d`,
//! `2021-12-22||+1M/d`, `1640183392||+h/d`. Anchors resolve through a
//! configurable list of formats (symbolic names, epoch sentinels, or raw
//! Joda-style patterns) and an optional timezone; the math suffix adds,
//! subtracts, and floors fixed-length durations. Results are always UTC
//! instants.
//!
//! ## Modules
//!
//! - [`parser`] — parser configuration, anchor resolution, expression evaluation
//! - [`format`] — symbolic format names and Joda-style pattern translation
//! - [`zone`] — timezone resolution (IANA names, abbreviations, offsets)
//! - [`math`] — duration math over a base instant
//! - [`error`] — error types
//!
//! ## Example
//!
//! ```
//! use datemath::DateMathParser;
//!
//! let parser = DateMathParser::builder()
//!     .formats(["epoch_millis", "yyyy-MM-dd"])
//!     .time_zone("Asia/Shanghai")
//!     .build()
//!     .unwrap();
//!
//! // Midnight Shanghai time, plus a day, floored to the UTC day boundary.
//! let instant = parser.parse("2021-12-22||+1d/d").unwrap();
//! assert_eq!(instant.timestamp(), 1_640_131_200);
//! ```

pub mod error;
pub mod format;
pub mod math;
pub mod parser;
pub mod zone;

pub use error::{DateMathError, Result};
pub use format::{alias_patterns, expand_formats, translate_pattern, FormatSpec};
pub use parser::{DateMathParser, DateMathParserBuilder};
pub use zone::{resolve_zone, ResolvedZone};
