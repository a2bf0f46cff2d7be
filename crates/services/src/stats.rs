//! Progress statistics for the `stats` command.

use std::cmp::Ordering;
use std::fmt;

use drill_core::model::{FactId, FactStore, Priority, ProgressRecord};
use drill_core::selector::weight;

/// One fact's history as seen from the current database.
#[derive(Debug, Clone, PartialEq)]
pub struct FactStats {
    pub id: FactId,
    pub answer: String,
    pub priority: Priority,
    pub times_asked: u32,
    pub times_correct: u32,
    pub accuracy: Option<f64>,
    pub mastered: bool,
    /// Current selection weight.
    pub weight: f64,
}

/// Summary of a progress record against a fact store.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    facts: Vec<FactStats>,
    /// Trainfile entries whose fact is no longer in the database.
    orphaned: usize,
}

impl ProgressStats {
    #[must_use]
    pub fn collect(store: &FactStore, progress: &ProgressRecord) -> Self {
        let facts = store
            .facts()
            .iter()
            .map(|fact| {
                let entry = progress.get(fact.id().as_str());
                FactStats {
                    id: fact.id().clone(),
                    answer: fact.answer().to_owned(),
                    priority: fact.priority(),
                    times_asked: entry.map_or(0, |e| e.times_asked()),
                    times_correct: entry.map_or(0, |e| e.times_correct()),
                    accuracy: entry.and_then(|e| e.accuracy()),
                    mastered: entry.is_some_and(|e| e.is_mastered()),
                    weight: weight(fact, progress),
                }
            })
            .collect();
        let orphaned = progress
            .entries()
            .filter(|(id, _)| store.get(id.as_str()).is_none())
            .count();
        Self { facts, orphaned }
    }

    #[must_use]
    pub fn facts(&self) -> &[FactStats] {
        &self.facts
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.facts.len()
    }

    #[must_use]
    pub fn asked(&self) -> usize {
        self.facts.iter().filter(|f| f.times_asked > 0).count()
    }

    #[must_use]
    pub fn mastered(&self) -> usize {
        self.facts.iter().filter(|f| f.mastered).count()
    }

    #[must_use]
    pub fn orphaned(&self) -> usize {
        self.orphaned
    }

    /// Asked facts, worst accuracy first; ties go to the more often asked.
    #[must_use]
    pub fn weakest(&self, limit: usize) -> Vec<&FactStats> {
        let mut asked: Vec<&FactStats> = self.facts.iter().filter(|f| f.times_asked > 0).collect();
        asked.sort_by(|a, b| {
            a.accuracy
                .partial_cmp(&b.accuracy)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.times_asked.cmp(&a.times_asked))
                .then_with(|| a.id.cmp(&b.id))
        });
        asked.truncate(limit);
        asked
    }
}

impl fmt::Display for ProgressStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Facts: {}  asked: {}  mastered: {}",
            self.total(),
            self.asked(),
            self.mastered()
        )?;
        if self.orphaned > 0 {
            writeln!(f, "Entries for facts not in the database: {}", self.orphaned)?;
        }

        let weakest = self.weakest(10);
        if !weakest.is_empty() {
            writeln!(f, "Weakest:")?;
            for s in weakest {
                writeln!(
                    f,
                    "  {:<10} {:>3}/{:<3} {:>4.0}%  {}",
                    s.id.as_str(),
                    s.times_correct,
                    s.times_asked,
                    s.accuracy.unwrap_or(0.0) * 100.0,
                    s.answer
                )?;
            }
        }
        Ok(())
    }
}
