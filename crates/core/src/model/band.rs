use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FrequencyError {
    #[error("not a valid frequency: {0}")]
    InvalidFrequency(String),

    #[error("not a valid frequency range: {0}")]
    InvalidRange(String),

    #[error("frequency range must start below its end: {0}")]
    EmptyRange(String),

    #[error("not a valid power limit: {0}")]
    InvalidPower(String),
}

//
// ─── FREQUENCIES ───────────────────────────────────────────────────────────────
//

static FREQUENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([0-9]+(?:\.[0-9]*)?|\.[0-9]+)\s*([kMG]?)\s*$").expect("valid regex")
});

static POWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([0-9]+)\s*W\s*(ERP|PEP)\s*$").expect("valid regex")
});

const SUFFIXES: [&str; 4] = ["", "k", "M", "G"];

fn multiplier(suffix: &str) -> f64 {
    match suffix {
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        _ => 1.0,
    }
}

/// Parses a frequency such as `14.35M` or `1810k` into whole hertz.
///
/// # Errors
///
/// Returns `FrequencyError::InvalidFrequency` if the text is not a number with an
/// optional `k`, `M` or `G` multiplier.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_frequency(raw: &str) -> Result<u64, FrequencyError> {
    let invalid = || FrequencyError::InvalidFrequency(raw.trim().to_owned());
    let caps = FREQUENCY_RE.captures(raw).ok_or_else(invalid)?;
    let value: f64 = caps[1].parse().map_err(|_| invalid())?;
    let hz = (value * multiplier(&caps[2])).round();
    if !hz.is_finite() || hz > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(hz as u64)
}

/// Formats hertz with the largest multiplier that keeps the mantissa below 3000.
///
/// ```
/// # use drill_core::model::format_frequency;
/// assert_eq!(format_frequency(1_810_000), "1810k");
/// assert_eq!(format_frequency(14_000_000), "14M");
/// assert_eq!(format_frequency(14_350_000), "14.35M");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_frequency(hz: u64) -> String {
    if hz == 0 {
        return "0".to_owned();
    }
    let digits = hz.ilog10() as usize;
    let mut order = (digits / 3).saturating_sub(1);
    if hz / 1000_u64.pow(order as u32) >= 3000 {
        order += 1;
    }
    let order = order.min(SUFFIXES.len() - 1);
    let scale = 1000_u64.pow(order as u32);

    if hz % scale == 0 {
        format!("{}{}", hz / scale, SUFFIXES[order])
    } else {
        format!("{}{}", hz as f64 / scale as f64, SUFFIXES[order])
    }
}

/// Span of a band segment in hertz, `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FrequencyRange {
    start: u64,
    end: u64,
}

impl FrequencyRange {
    /// # Errors
    ///
    /// Returns `FrequencyError::EmptyRange` unless `start < end`.
    pub fn new(start: u64, end: u64) -> Result<Self, FrequencyError> {
        if start >= end {
            return Err(FrequencyError::EmptyRange(format!(
                "{} -- {}",
                format_frequency(start),
                format_frequency(end)
            )));
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Extends this range with an adjacent segment.
    ///
    /// Returns `None` when `other` neither continues at our end nor ends at our start.
    #[must_use]
    pub fn join(&self, other: &FrequencyRange) -> Option<FrequencyRange> {
        if self.end == other.start {
            Some(FrequencyRange {
                start: self.start,
                end: other.end,
            })
        } else if self.start == other.end {
            Some(FrequencyRange {
                start: other.start,
                end: self.end,
            })
        } else {
            None
        }
    }

    /// Compact form used inside fact identifiers (`14M--14.35M`).
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}--{}", format_frequency(self.start), format_frequency(self.end))
    }
}

impl fmt::Display for FrequencyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -- {}",
            format_frequency(self.start),
            format_frequency(self.end)
        )
    }
}

impl FromStr for FrequencyRange {
    type Err = FrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FrequencyError::InvalidRange(s.trim().to_owned());
        let (start, end) = s.split_once("--").ok_or_else(invalid)?;
        let start = parse_frequency(start).map_err(|_| invalid())?;
        let end = parse_frequency(end).map_err(|_| invalid())?;
        Self::new(start, end)
    }
}

//
// ─── POWER ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PowerReference {
    /// Peak envelope power at the transmitter output.
    Pep,
    /// Effective radiated power.
    Erp,
}

impl fmt::Display for PowerReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerReference::Pep => f.write_str("PEP"),
            PowerReference::Erp => f.write_str("ERP"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PowerLimit {
    pub watts: u32,
    pub reference: PowerReference,
}

impl fmt::Display for PowerLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} W {}", self.watts, self.reference)
    }
}

impl FromStr for PowerLimit {
    type Err = FrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FrequencyError::InvalidPower(s.trim().to_owned());
        let caps = POWER_RE.captures(s).ok_or_else(invalid)?;
        let watts = caps[1].parse().map_err(|_| invalid())?;
        let reference = if caps[2].eq_ignore_ascii_case("PEP") {
            PowerReference::Pep
        } else {
            PowerReference::Erp
        };
        Ok(Self { watts, reference })
    }
}

//
// ─── BAND FACTS ────────────────────────────────────────────────────────────────
//

/// Which constraint of a band segment a fact asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BandTopic {
    /// Full frequency range of a band.
    Range,
    /// Maximum power of a license class in a segment.
    Power,
    /// Maximum bandwidth of a license class in a segment.
    Bandwidth,
}

/// Auxiliary constraint data carried by band trainer facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandFact {
    pub topic: BandTopic,
    pub band: String,
    /// License class; `None` for merged full-band facts.
    pub class: Option<String>,
    pub range: FrequencyRange,
    pub status: Option<String>,
    pub power: Option<PowerLimit>,
    pub bandwidth: Option<u64>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
