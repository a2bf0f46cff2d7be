//! Line-oriented database parsers.
//!
//! Both dialects report failures as [`ParseError`] carrying the 1-based line
//! number of the offending line.

mod band_db;
mod callsign;
mod prefix_db;

use thiserror::Error;

use crate::model::{FactId, FactIdError, FrequencyError};

pub use band_db::parse_band_database;
pub use callsign::{MAX_PREFIX_LEN, MAX_RANGE_SIZE, expand_prefix_range, expand_specifiers};
pub use prefix_db::{COUNTRY_FACT_PREFIX, parse_prefix_database, parse_prefix_database_both_ways};

/// Malformed database line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    #[must_use]
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("invalid priority directive: {0:?}")]
    InvalidPriority(String),

    #[error("expected `<prefixes>,<country>`")]
    MissingComma,

    #[error("no prefixes given")]
    EmptyPrefixes,

    #[error("no answer given")]
    EmptyAnswer,

    #[error("invalid prefix specifier: {0}")]
    InvalidPrefix(String),

    #[error("invalid prefix range: {start}--{end}")]
    EmptyPrefixRange { start: String, end: String },

    #[error("prefix range {start}--{end} expands to more than {} prefixes", MAX_RANGE_SIZE)]
    PrefixRangeTooLarge { start: String, end: String },

    #[error("expected 6 columns (class band range status power bandwidth), found {found}")]
    ColumnCount { found: usize },

    #[error(transparent)]
    Frequency(#[from] FrequencyError),

    #[error("incoherent band data for {band}: {segment} does not adjoin {merged}")]
    IncoherentBand {
        band: String,
        segment: String,
        merged: String,
    },

    #[error(transparent)]
    FactId(#[from] FactIdError),

    #[error("duplicate fact {0} (first defined on line {1})")]
    DuplicateFact(FactId, usize),
}
