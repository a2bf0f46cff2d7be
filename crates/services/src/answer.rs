//! Checking a learner's answer against a fact.

use std::collections::HashSet;

use drill_core::model::{BandFact, BandTopic, Fact, FactDetail, FrequencyRange, PowerLimit, parse_frequency};
use drill_core::parser::expand_specifiers;

use crate::error::InvalidAnswer;

/// Lower-cases and collapses runs of whitespace.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decide whether `raw` answers `fact`.
///
/// Free text is compared case-insensitively after whitespace normalization.
/// Band answers are parsed and compared by value, so `14000k -- 14350k`
/// matches `14M -- 14.35M`. A list of prefixes is expanded and must name
/// exactly the country's prefix set, in any order. An empty answer is wrong.
///
/// # Errors
///
/// Returns `InvalidAnswer` when a band answer or prefix list cannot be
/// parsed; the caller should ask again without scoring.
pub fn check_answer(fact: &Fact, raw: &str) -> Result<bool, InvalidAnswer> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(false);
    }

    match fact.detail() {
        FactDetail::Prefix { .. } => Ok(normalize_text(raw) == normalize_text(fact.answer())),
        FactDetail::CountryPrefixes { prefixes, .. } => check_prefix_list(prefixes, raw),
        FactDetail::Band(band) => check_band_answer(band, raw),
    }
}

// Commas are accepted as separators: "DL, DA-DR".
fn check_prefix_list(expected: &[String], raw: &str) -> Result<bool, InvalidAnswer> {
    let given = expand_specifiers(&raw.to_uppercase().replace(',', " "))?;
    let given: HashSet<&str> = given.iter().map(String::as_str).collect();
    let expected: HashSet<&str> = expected.iter().map(String::as_str).collect();
    Ok(given == expected)
}

fn check_band_answer(band: &BandFact, raw: &str) -> Result<bool, InvalidAnswer> {
    match band.topic {
        BandTopic::Range => {
            let given: FrequencyRange = raw.parse()?;
            Ok(given == band.range)
        }
        BandTopic::Power => {
            let given: PowerLimit = raw.parse()?;
            Ok(Some(given) == band.power)
        }
        BandTopic::Bandwidth => {
            let given = parse_frequency(raw)?;
            Ok(Some(given) == band.bandwidth)
        }
    }
}
