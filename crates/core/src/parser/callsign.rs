use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::ParseErrorKind;

/// Longest prefix accepted in a database.
pub const MAX_PREFIX_LEN: usize = 8;

/// Upper bound on the number of prefixes a single range may produce.
pub const MAX_RANGE_SIZE: u64 = 50_000;

// Position in this alphabet is the base-37 digit value.
const ALPHABET: &[u8; 37] = b" 0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

static SPECIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z0-9]+)(?:-+([A-Z0-9]+))?$").expect("valid regex")
});

fn digit(c: u8) -> Option<u64> {
    ALPHABET.iter().position(|&a| a == c).map(|p| p as u64)
}

fn encode(prefix: &str) -> Option<u64> {
    if prefix.is_empty() || prefix.len() > MAX_PREFIX_LEN {
        return None;
    }
    prefix
        .bytes()
        .try_fold(0_u64, |acc, c| Some(acc * 37 + digit(c)?))
}

#[allow(clippy::cast_possible_truncation)]
fn decode(mut value: u64) -> String {
    let mut out = Vec::new();
    while value > 0 {
        out.push(ALPHABET[(value % 37) as usize]);
        value /= 37;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Expand `start`..=`end` over the call-sign alphabet.
///
/// Intermediate values that would contain a blank (e.g. between `A9` and `B0`)
/// are not prefixes and are skipped.
///
/// # Errors
///
/// Returns `InvalidPrefix` for malformed bounds, `EmptyPrefixRange` when `end`
/// sorts before `start`, and `PrefixRangeTooLarge` past [`MAX_RANGE_SIZE`].
pub fn expand_prefix_range(start: &str, end: &str) -> Result<Vec<String>, ParseErrorKind> {
    let lo = encode(start).ok_or_else(|| ParseErrorKind::InvalidPrefix(start.to_owned()))?;
    let hi = encode(end).ok_or_else(|| ParseErrorKind::InvalidPrefix(end.to_owned()))?;

    if hi < lo {
        return Err(ParseErrorKind::EmptyPrefixRange {
            start: start.to_owned(),
            end: end.to_owned(),
        });
    }
    if hi - lo >= MAX_RANGE_SIZE {
        return Err(ParseErrorKind::PrefixRangeTooLarge {
            start: start.to_owned(),
            end: end.to_owned(),
        });
    }

    Ok((lo..=hi)
        .map(decode)
        .filter(|p| !p.contains(' '))
        .collect())
}

/// Expand a whitespace-separated list of prefixes and prefix ranges.
///
/// Order is preserved and duplicates are dropped, so the first prefix stays
/// the primary one.
///
/// # Errors
///
/// Returns `EmptyPrefixes` for a blank field or the first specifier error.
pub fn expand_specifiers(field: &str) -> Result<Vec<String>, ParseErrorKind> {
    let mut seen = HashSet::new();
    let mut prefixes = Vec::new();

    for spec in field.split_whitespace() {
        let caps = SPECIFIER_RE
            .captures(spec)
            .ok_or_else(|| ParseErrorKind::InvalidPrefix(spec.to_owned()))?;
        let expanded = match caps.get(2) {
            Some(end) => expand_prefix_range(&caps[1], end.as_str())?,
            None => {
                let single = &caps[1];
                if encode(single).is_none() {
                    return Err(ParseErrorKind::InvalidPrefix(single.to_owned()));
                }
                vec![single.to_owned()]
            }
        };
        for prefix in expanded {
            if seen.insert(prefix.clone()) {
                prefixes.push(prefix);
            }
        }
    }

    if prefixes.is_empty() {
        return Err(ParseErrorKind::EmptyPrefixes);
    }
    Ok(prefixes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        for p in ["DL", "F", "9A", "VK9X", "ZZ"] {
            assert_eq!(decode(encode(p).unwrap()), p);
        }
    }

    #[test]
    fn expands_letter_range() {
        let prefixes = expand_prefix_range("DA", "DR").unwrap();
        assert_eq!(prefixes.len(), 18);
        assert_eq!(prefixes.first().unwrap(), "DA");
        assert_eq!(prefixes.last().unwrap(), "DR");
        assert!(prefixes.contains(&"DL".to_owned()));
    }

    #[test]
    fn skips_blank_positions() {
        let prefixes = expand_prefix_range("A9", "B1").unwrap();
        assert!(prefixes.iter().all(|p| !p.contains(' ')));
        assert!(prefixes.contains(&"AZ".to_owned()));
        assert!(prefixes.contains(&"B0".to_owned()));
        assert_eq!(prefixes.last().unwrap(), "B1");
    }

    #[test]
    fn rejects_reversed_range() {
        assert_eq!(
            expand_prefix_range("DR", "DA").unwrap_err(),
            ParseErrorKind::EmptyPrefixRange {
                start: "DR".into(),
                end: "DA".into()
            }
        );
    }

    #[test]
    fn rejects_huge_range() {
        assert!(matches!(
            expand_prefix_range("A", "ZZZZ"),
            Err(ParseErrorKind::PrefixRangeTooLarge { .. })
        ));
    }

    #[test]
    fn specifiers_keep_primary_first_and_dedupe() {
        let prefixes = expand_specifiers("DL DA-DR Y2--Y3").unwrap();
        assert_eq!(prefixes[0], "DL");
        assert_eq!(prefixes.iter().filter(|p| *p == "DL").count(), 1);
        assert!(prefixes.contains(&"Y2".to_owned()));
        assert!(prefixes.contains(&"Y3".to_owned()));
        assert_eq!(prefixes.len(), 1 + 17 + 2);
    }

    #[test]
    fn specifiers_reject_lowercase_and_blank() {
        assert_eq!(
            expand_specifiers("dl").unwrap_err(),
            ParseErrorKind::InvalidPrefix("dl".into())
        );
        assert_eq!(
            expand_specifiers("   ").unwrap_err(),
            ParseErrorKind::EmptyPrefixes
        );
    }
}
