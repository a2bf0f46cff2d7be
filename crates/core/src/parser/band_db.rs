use std::collections::HashMap;

use crate::model::{
    BandFact, BandTopic, Fact, FactDetail, FactId, FactStore, FrequencyRange, PowerLimit,
    Priority, format_frequency, parse_frequency,
};

use super::{ParseError, ParseErrorKind};

const HEADER_COLUMN: &str = "class";
const ENTRY_CLASS: &str = "E";
const NOT_SET: &str = "-";

/// One segment row: `class band range status power bandwidth`.
#[derive(Debug, Clone)]
struct SegmentRow {
    line: usize,
    class: String,
    band: String,
    range: FrequencyRange,
    status: Option<String>,
    power: Option<PowerLimit>,
    bandwidth: Option<u64>,
}

/// Parse a band plan into range, power and bandwidth facts.
///
/// The full range of each band is merged from the segments of every class
/// except the entry class `E`.
///
/// # Errors
///
/// Returns `ParseError` for malformed rows, incoherent band segments, or
/// duplicate segments.
pub fn parse_band_database(text: &str) -> Result<FactStore, ParseError> {
    let rows = parse_rows(text)?;

    let mut facts = Vec::new();
    let mut defined_on: HashMap<FactId, usize> = HashMap::new();
    let mut push = |fact: Fact, line: usize| -> Result<(), ParseError> {
        if let Some(&first) = defined_on.get(fact.id()) {
            return Err(ParseError::new(
                line,
                ParseErrorKind::DuplicateFact(fact.id().clone(), first),
            ));
        }
        defined_on.insert(fact.id().clone(), line);
        facts.push(fact);
        Ok(())
    };

    for (band, range, line) in merge_full_bands(&rows)? {
        let id = FactId::new(format!("range:{band}")).map_err(|e| ParseError::new(line, e.into()))?;
        let detail = BandFact {
            topic: BandTopic::Range,
            band,
            class: None,
            range,
            status: None,
            power: None,
            bandwidth: None,
        };
        push(band_fact(id, range.to_string(), detail), line)?;
    }

    for row in &rows {
        let segment = format!("{}:{}:{}", row.class, row.band, row.range.key());
        if let Some(power) = row.power {
            let id = FactId::new(format!("power:{segment}"))
                .map_err(|e| ParseError::new(row.line, e.into()))?;
            push(
                band_fact(id, power.to_string(), row_detail(row, BandTopic::Power)),
                row.line,
            )?;
        }
        if let Some(bandwidth) = row.bandwidth {
            let id = FactId::new(format!("bandwidth:{segment}"))
                .map_err(|e| ParseError::new(row.line, e.into()))?;
            push(
                band_fact(
                    id,
                    format_frequency(bandwidth),
                    row_detail(row, BandTopic::Bandwidth),
                ),
                row.line,
            )?;
        }
    }

    FactStore::new(facts).map_err(|dup| ParseError::new(0, ParseErrorKind::DuplicateFact(dup.0, 0)))
}

fn band_fact(id: FactId, answer: String, detail: BandFact) -> Fact {
    Fact::new(id, answer, Priority::DEFAULT, FactDetail::Band(detail))
}

fn row_detail(row: &SegmentRow, topic: BandTopic) -> BandFact {
    BandFact {
        topic,
        band: row.band.clone(),
        class: Some(row.class.clone()),
        range: row.range,
        status: row.status.clone(),
        power: row.power,
        bandwidth: row.bandwidth,
    }
}

fn parse_rows(text: &str) -> Result<Vec<SegmentRow>, ParseError> {
    let mut rows = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let columns: Vec<&str> = trimmed.split_whitespace().collect();
        if columns[0] == HEADER_COLUMN {
            continue;
        }
        rows.push(parse_row(line, &columns).map_err(|kind| ParseError::new(line, kind))?);
    }
    Ok(rows)
}

fn parse_row(line: usize, columns: &[&str]) -> Result<SegmentRow, ParseErrorKind> {
    let &[class, band, range, status, power, bandwidth] = columns else {
        return Err(ParseErrorKind::ColumnCount {
            found: columns.len(),
        });
    };

    let optional = |value: &str| (value != NOT_SET).then(|| value.to_owned());

    Ok(SegmentRow {
        line,
        class: class.to_owned(),
        band: band.to_owned(),
        range: range.parse()?,
        status: optional(status),
        power: optional(power)
            .map(|p| p.parse::<PowerLimit>())
            .transpose()?,
        bandwidth: optional(bandwidth)
            .map(|bw| parse_frequency(&bw))
            .transpose()?,
    })
}

/// Returns `(band, merged range, first line)` in order of first appearance.
fn merge_full_bands(rows: &[SegmentRow]) -> Result<Vec<(String, FrequencyRange, usize)>, ParseError> {
    let mut merged: Vec<(String, FrequencyRange, usize)> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();

    for row in rows.iter().filter(|r| r.class != ENTRY_CLASS) {
        match position.get(row.band.as_str()) {
            None => {
                position.insert(&row.band, merged.len());
                merged.push((row.band.clone(), row.range, row.line));
            }
            Some(&pos) => {
                let current = merged[pos].1;
                let joined = current.join(&row.range).ok_or_else(|| {
                    ParseError::new(
                        row.line,
                        ParseErrorKind::IncoherentBand {
                            band: row.band.clone(),
                            segment: row.range.to_string(),
                            merged: current.to_string(),
                        },
                    )
                })?;
                merged[pos].1 = joined;
            }
        }
    }

    Ok(merged)
}
