use std::collections::HashMap;

use crate::model::{Fact, FactDetail, FactId, FactStore, Priority};

use super::callsign::expand_specifiers;
use super::{ParseError, ParseErrorKind};

const PRIORITY_DIRECTIVE: &str = "#prio";

/// Id prefix of the country-to-prefixes fact built from each database line.
pub const COUNTRY_FACT_PREFIX: &str = "country:";

/// Parse a prefix database into a fact store.
///
/// Each fact line reads `<prefixes>,<country>`; `#prio N` applies priority `N`
/// to every following fact until the next directive.
///
/// ```
/// # use drill_core::parser::parse_prefix_database;
/// let store = parse_prefix_database("DL,Germany\n#prio 5\nF,France\n")?;
/// assert_eq!(store.get("DL").unwrap().priority().value(), 1);
/// assert_eq!(store.get("F").unwrap().priority().value(), 5);
/// # Ok::<(), drill_core::parser::ParseError>(())
/// ```
///
/// # Errors
///
/// Returns `ParseError` with the line number of the first malformed line.
pub fn parse_prefix_database(text: &str) -> Result<FactStore, ParseError> {
    parse_lines(text, false)
}

/// Parse a prefix database into facts asked in both directions.
///
/// Every line yields the prefix-to-country fact of [`parse_prefix_database`]
/// followed by a fact asking for all prefixes of the country, with id
/// `country:<primary prefix>` and the same priority. Its expected answer is
/// the prefix field as written.
///
/// ```
/// # use drill_core::parser::parse_prefix_database_both_ways;
/// let store = parse_prefix_database_both_ways("DL DA-DR,Germany\n")?;
/// assert_eq!(store.len(), 2);
/// assert_eq!(store.get("country:DL").unwrap().answer(), "DL DA-DR");
/// # Ok::<(), drill_core::parser::ParseError>(())
/// ```
///
/// # Errors
///
/// Returns `ParseError` with the line number of the first malformed line.
pub fn parse_prefix_database_both_ways(text: &str) -> Result<FactStore, ParseError> {
    parse_lines(text, true)
}

fn parse_lines(text: &str, both_ways: bool) -> Result<FactStore, ParseError> {
    let mut priority = Priority::DEFAULT;
    let mut facts = Vec::new();
    let mut defined_on: HashMap<FactId, usize> = HashMap::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('#') {
            let mut parts = line.split_whitespace();
            if parts.next() == Some(PRIORITY_DIRECTIVE) {
                priority = parse_priority(parts.next())
                    .map_err(|kind| ParseError::new(line_no, kind))?;
            }
            continue;
        }

        let (forward, reverse) =
            parse_fact_line(line, priority).map_err(|kind| ParseError::new(line_no, kind))?;
        let reverse = both_ways.then_some(reverse);
        for fact in std::iter::once(forward).chain(reverse) {
            if let Some(&first) = defined_on.get(fact.id()) {
                return Err(ParseError::new(
                    line_no,
                    ParseErrorKind::DuplicateFact(fact.id().clone(), first),
                ));
            }
            defined_on.insert(fact.id().clone(), line_no);
            facts.push(fact);
        }
    }

    FactStore::new(facts).map_err(|dup| {
        let line = defined_on.get(&dup.0).copied().unwrap_or_default();
        ParseError::new(line, ParseErrorKind::DuplicateFact(dup.0, line))
    })
}

fn parse_priority(raw: Option<&str>) -> Result<Priority, ParseErrorKind> {
    let raw = raw.unwrap_or_default();
    raw.parse::<u32>()
        .ok()
        .and_then(Priority::new)
        .ok_or_else(|| ParseErrorKind::InvalidPriority(raw.to_owned()))
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Prefix-to-country fact and its country-to-prefixes counterpart.
fn parse_fact_line(line: &str, priority: Priority) -> Result<(Fact, Fact), ParseErrorKind> {
    let (prefix_field, country) = line.split_once(',').ok_or(ParseErrorKind::MissingComma)?;

    let country = collapse_whitespace(country);
    if country.is_empty() {
        return Err(ParseErrorKind::EmptyAnswer);
    }

    let prefixes = expand_specifiers(prefix_field)?;
    let id = FactId::new(prefixes[0].clone())?;
    let country_id = FactId::new(format!("{COUNTRY_FACT_PREFIX}{id}"))?;

    let reverse = Fact::new(
        country_id,
        collapse_whitespace(prefix_field),
        priority,
        FactDetail::CountryPrefixes {
            country: country.clone(),
            prefixes: prefixes.clone(),
        },
    );
    let forward = Fact::new(id, country, priority, FactDetail::Prefix { prefixes });
    Ok((forward, reverse))
}
