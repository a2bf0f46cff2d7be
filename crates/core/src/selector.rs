//! Priority- and error-weighted fact selection.
//!
//! Every draw considers the whole fact store. A fact's weight is
//! `priority × error_factor`, where the error factor is `1.0` for a fact that
//! was never asked and shrinks linearly with accuracy down to
//! [`MIN_ERROR_FACTOR`], so well-known facts still come back now and then.

use rand::Rng;

use crate::model::{Fact, FactStore, ProgressEntry, ProgressRecord};

/// Error factor of a fact answered correctly every time.
pub const MIN_ERROR_FACTOR: f64 = 0.1;

/// Selection-weight multiplier derived from historical accuracy.
///
/// ```
/// # use drill_core::selector::{error_factor, MIN_ERROR_FACTOR};
/// # use drill_core::model::ProgressEntry;
/// assert_eq!(error_factor(None), 1.0);
/// let perfect = ProgressEntry::from_persisted(10, 10, None).unwrap();
/// assert_eq!(error_factor(Some(&perfect)), MIN_ERROR_FACTOR);
/// ```
#[must_use]
pub fn error_factor(entry: Option<&ProgressEntry>) -> f64 {
    match entry.and_then(ProgressEntry::accuracy) {
        None => 1.0,
        Some(accuracy) => MIN_ERROR_FACTOR + (1.0 - MIN_ERROR_FACTOR) * (1.0 - accuracy),
    }
}

/// Selection weight of `fact` given the learner's progress.
#[must_use]
pub fn weight(fact: &Fact, progress: &ProgressRecord) -> f64 {
    f64::from(fact.priority().value()) * error_factor(progress.get(fact.id().as_str()))
}

/// Cumulative weights over a fact store, built once per draw.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    cumulative: Vec<f64>,
}

impl WeightTable {
    #[must_use]
    pub fn build(facts: &FactStore, progress: &ProgressRecord) -> Self {
        let mut total = 0.0;
        let cumulative = facts
            .facts()
            .iter()
            .map(|fact| {
                total += weight(fact, progress);
                total
            })
            .collect();
        Self { cumulative }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Probability of drawing the fact at `index`.
    #[must_use]
    pub fn probability(&self, index: usize) -> f64 {
        let total = self.total();
        if total <= 0.0 || index >= self.cumulative.len() {
            return 0.0;
        }
        let below = if index == 0 { 0.0 } else { self.cumulative[index - 1] };
        (self.cumulative[index] - below) / total
    }

    /// Map one uniform draw in `[0, total)` to a fact index.
    fn locate(&self, point: f64) -> usize {
        let idx = self.cumulative.partition_point(|&c| c <= point);
        idx.min(self.cumulative.len().saturating_sub(1))
    }

    /// Draw an index; `None` when the table is empty.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        let total = self.total();
        if self.cumulative.is_empty() || total <= 0.0 {
            return None;
        }
        Some(self.locate(rng.random_range(0.0..total)))
    }
}

/// Picks the next fact to ask.
#[derive(Debug)]
pub struct Selector<R> {
    rng: R,
}

impl<R: Rng> Selector<R> {
    #[must_use]
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Weighted draw over all facts; `None` only for an empty store.
    pub fn pick<'a>(&mut self, facts: &'a FactStore, progress: &ProgressRecord) -> Option<&'a Fact> {
        let index = WeightTable::build(facts, progress).sample(&mut self.rng)?;
        facts.facts().get(index)
    }
}
