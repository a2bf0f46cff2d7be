use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::FactId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("times correct ({correct}) exceeds times asked ({asked})")]
    CorrectExceedsAsked { asked: u32, correct: u32 },
}

//
// ─── ENTRY ─────────────────────────────────────────────────────────────────────
//

/// Attempts needed before a fact can count as mastered.
pub const MASTERY_MIN_ATTEMPTS: u32 = 3;

/// Accuracy at which a fact counts as mastered.
pub const MASTERY_ACCURACY: f64 = 0.8;

/// Cumulative performance on one fact. `times_correct <= times_asked` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressEntry {
    times_asked: u32,
    times_correct: u32,
    last_asked_at: Option<DateTime<Utc>>,
}

impl ProgressEntry {
    /// Rehydrate an entry from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::CorrectExceedsAsked` if the counters are inconsistent.
    pub fn from_persisted(
        times_asked: u32,
        times_correct: u32,
        last_asked_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ProgressError> {
        if times_correct > times_asked {
            return Err(ProgressError::CorrectExceedsAsked {
                asked: times_asked,
                correct: times_correct,
            });
        }
        Ok(Self {
            times_asked,
            times_correct,
            last_asked_at,
        })
    }

    #[must_use]
    pub fn times_asked(&self) -> u32 {
        self.times_asked
    }

    #[must_use]
    pub fn times_correct(&self) -> u32 {
        self.times_correct
    }

    #[must_use]
    pub fn last_asked_at(&self) -> Option<DateTime<Utc>> {
        self.last_asked_at
    }

    /// Fraction answered correctly, `None` before the first attempt.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        if self.times_asked == 0 {
            None
        } else {
            Some(f64::from(self.times_correct) / f64::from(self.times_asked))
        }
    }

    #[must_use]
    pub fn is_mastered(&self) -> bool {
        self.times_asked >= MASTERY_MIN_ATTEMPTS
            && self.accuracy().is_some_and(|a| a >= MASTERY_ACCURACY)
    }

    fn record(&mut self, was_correct: bool, at: DateTime<Utc>) {
        // Both counters saturate together so the invariant survives overflow.
        if self.times_asked == u32::MAX {
            if !was_correct && self.times_correct > 0 {
                self.times_correct -= 1;
            }
        } else {
            self.times_asked += 1;
            if was_correct {
                self.times_correct += 1;
            }
        }
        self.last_asked_at = Some(at);
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// Per-fact progress for one learner, keyed by fact identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressRecord {
    entries: BTreeMap<FactId, ProgressEntry>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_entries(entries: BTreeMap<FactId, ProgressEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ProgressEntry> {
        self.entries.get(id)
    }

    /// Count one answer for `id`, creating the entry on first use.
    pub fn record(&mut self, id: &FactId, was_correct: bool, at: DateTime<Utc>) -> &ProgressEntry {
        let entry = self.entries.entry(id.clone()).or_default();
        entry.record(was_correct, at);
        entry
    }

    pub fn entries(&self) -> impl Iterator<Item = (&FactId, &ProgressEntry)> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn mastered_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_mastered()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn id(raw: &str) -> FactId {
        FactId::new(raw).unwrap()
    }

    #[test]
    fn record_creates_entry_lazily() {
        let mut record = ProgressRecord::new();
        assert!(record.get("DL").is_none());

        record.record(&id("DL"), true, fixed_now());
        let entry = record.get("DL").unwrap();
        assert_eq!(entry.times_asked(), 1);
        assert_eq!(entry.times_correct(), 1);
        assert_eq!(entry.last_asked_at(), Some(fixed_now()));
    }

    #[test]
    fn correct_never_exceeds_asked() {
        let mut record = ProgressRecord::new();
        let fact = id("F");
        for i in 0..50 {
            let entry = record.record(&fact, i % 3 != 0, fixed_now());
            assert!(entry.times_correct() <= entry.times_asked());
        }
        let entry = record.get("F").unwrap();
        assert_eq!(entry.times_asked(), 50);
        assert_eq!(entry.times_correct(), 33);
    }

    #[test]
    fn saturated_entry_keeps_invariant() {
        let mut entry = ProgressEntry::from_persisted(u32::MAX, u32::MAX, None).unwrap();
        entry.record(false, fixed_now());
        assert_eq!(entry.times_asked(), u32::MAX);
        assert!(entry.times_correct() < entry.times_asked());
    }

    #[test]
    fn persisted_entry_rejects_inconsistent_counts() {
        let err = ProgressEntry::from_persisted(2, 3, None).unwrap_err();
        assert_eq!(
            err,
            ProgressError::CorrectExceedsAsked {
                asked: 2,
                correct: 3
            }
        );
    }

    #[test]
    fn mastery_needs_attempts_and_accuracy() {
        let fresh = ProgressEntry::default();
        assert_eq!(fresh.accuracy(), None);
        assert!(!fresh.is_mastered());

        let lucky = ProgressEntry::from_persisted(2, 2, None).unwrap();
        assert!(!lucky.is_mastered());

        let solid = ProgressEntry::from_persisted(5, 4, None).unwrap();
        assert!(solid.is_mastered());

        let shaky = ProgressEntry::from_persisted(5, 3, None).unwrap();
        assert!(!shaky.is_mastered());
    }
}
