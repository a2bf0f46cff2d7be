use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;

use serde::Serialize;
use thiserror::Error;

use crate::model::band::BandFact;
use crate::model::ids::FactId;

//
// ─── PRIORITY ──────────────────────────────────────────────────────────────────
//

/// Learner-assigned importance weight; always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "u32")]
pub struct Priority(NonZeroU32);

impl Priority {
    pub const DEFAULT: Priority = Priority(NonZeroU32::MIN);

    /// Returns `None` for zero.
    #[must_use]
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    #[must_use]
    pub fn value(self) -> u32 {
        self.0.get()
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Priority> for u32 {
    fn from(p: Priority) -> Self {
        p.value()
    }
}

//
// ─── FACT ──────────────────────────────────────────────────────────────────────
//

/// Trainer-specific data attached to a fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FactDetail {
    /// All prefixes allocated to a country, primary first.
    Prefix { prefixes: Vec<String> },
    /// The same allocation asked the other way round: name every prefix of
    /// `country`.
    CountryPrefixes { country: String, prefixes: Vec<String> },
    Band(BandFact),
}

/// One learnable item. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fact {
    id: FactId,
    answer: String,
    priority: Priority,
    detail: FactDetail,
}

impl Fact {
    #[must_use]
    pub fn new(id: FactId, answer: impl Into<String>, priority: Priority, detail: FactDetail) -> Self {
        Self {
            id,
            answer: answer.into(),
            priority,
            detail,
        }
    }

    #[must_use]
    pub fn id(&self) -> &FactId {
        &self.id
    }

    /// Canonical answer as shown to the learner.
    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    #[must_use]
    pub fn detail(&self) -> &FactDetail {
        &self.detail
    }
}

//
// ─── FACT STORE ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("duplicate fact identifier: {0}")]
pub struct DuplicateFact(pub FactId);

/// Ordered collection of facts with lookup by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactStore {
    facts: Vec<Fact>,
    index: HashMap<FactId, usize>,
}

impl FactStore {
    /// # Errors
    ///
    /// Returns `DuplicateFact` if two facts share an identifier.
    pub fn new(facts: Vec<Fact>) -> Result<Self, DuplicateFact> {
        let mut index = HashMap::with_capacity(facts.len());
        for (pos, fact) in facts.iter().enumerate() {
            if index.insert(fact.id().clone(), pos).is_some() {
                return Err(DuplicateFact(fact.id().clone()));
            }
        }
        Ok(Self { facts, index })
    }

    #[must_use]
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Fact> {
        self.index.get(id).map(|&pos| &self.facts[pos])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix_fact(id: &str, country: &str) -> Fact {
        Fact::new(
            FactId::new(id).unwrap(),
            country,
            Priority::DEFAULT,
            FactDetail::Prefix {
                prefixes: vec![id.to_owned()],
            },
        )
    }

    #[test]
    fn priority_rejects_zero() {
        assert!(Priority::new(0).is_none());
        assert_eq!(Priority::new(5).unwrap().value(), 5);
        assert_eq!(Priority::default().value(), 1);
    }

    #[test]
    fn store_looks_up_by_id() {
        let store = FactStore::new(vec![
            prefix_fact("DL", "Germany"),
            prefix_fact("F", "France"),
        ])
        .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("F").unwrap().answer(), "France");
        assert!(store.get("G").is_none());
    }

    #[test]
    fn store_rejects_duplicates() {
        let err = FactStore::new(vec![
            prefix_fact("DL", "Germany"),
            prefix_fact("DL", "Deutschland"),
        ])
        .unwrap_err();
        assert_eq!(err.0.as_str(), "DL");
    }
}
