use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreReportError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,
}

/// Asked/correct counts for one kind of question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionScore {
    label: String,
    asked: u32,
    correct: u32,
}

impl SectionScore {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn asked(&self) -> u32 {
        self.asked
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    fn record(&mut self, was_correct: bool) {
        self.asked = self.asked.saturating_add(1);
        if was_correct {
            self.correct = self.correct.saturating_add(1);
        }
    }
}

fn percent(correct: u32, asked: u32) -> f64 {
    if asked == 0 {
        0.0
    } else {
        f64::from(correct) * 100.0 / f64::from(asked)
    }
}

/// Running asked/correct totals for the current invocation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTally {
    started_at: DateTime<Utc>,
    asked: u32,
    correct: u32,
    sections: Vec<SectionScore>,
}

impl SessionTally {
    #[must_use]
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            asked: 0,
            correct: 0,
            sections: Vec::new(),
        }
    }

    pub fn record(&mut self, was_correct: bool) {
        self.asked = self.asked.saturating_add(1);
        if was_correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    /// Count an answer in the total and in the section named `label`.
    ///
    /// Sections are reported in the order they were first seen.
    pub fn record_in(&mut self, label: &str, was_correct: bool) {
        self.record(was_correct);
        let pos = match self.sections.iter().position(|s| s.label == label) {
            Some(pos) => pos,
            None => {
                self.sections.push(SectionScore {
                    label: label.to_owned(),
                    asked: 0,
                    correct: 0,
                });
                self.sections.len() - 1
            }
        };
        self.sections[pos].record(was_correct);
    }

    #[must_use]
    pub fn sections(&self) -> &[SectionScore] {
        &self.sections
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn asked(&self) -> u32 {
        self.asked
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }
}

/// How many facts of the database the learner has mastered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mastery {
    pub mastered: usize,
    pub total: usize,
}

/// Final score shown when a session ends on end-of-input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreReport {
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    asked: u32,
    correct: u32,
    sections: Vec<SectionScore>,
    mastery: Option<Mastery>,
}

impl ScoreReport {
    /// Close a tally into a report.
    ///
    /// # Errors
    ///
    /// Returns `ScoreReportError::InvalidTimeRange` if `completed_at` is before the tally start.
    pub fn from_tally(
        tally: &SessionTally,
        completed_at: DateTime<Utc>,
        mastery: Option<Mastery>,
    ) -> Result<Self, ScoreReportError> {
        if completed_at < tally.started_at() {
            return Err(ScoreReportError::InvalidTimeRange);
        }
        Ok(Self {
            started_at: tally.started_at(),
            completed_at,
            asked: tally.asked(),
            correct: tally.correct(),
            sections: tally.sections().to_vec(),
            mastery,
        })
    }

    #[must_use]
    pub fn asked(&self) -> u32 {
        self.asked
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn sections(&self) -> &[SectionScore] {
        &self.sections
    }

    #[must_use]
    pub fn mastery(&self) -> Option<Mastery> {
        self.mastery
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Percentage answered correctly; zero when nothing was asked.
    #[must_use]
    pub fn percent(&self) -> f64 {
        percent(self.correct, self.asked)
    }
}

impl fmt::Display for ScoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total score: {} / {}  ({:.0}%)",
            self.correct,
            self.asked,
            self.percent()
        )?;
        for s in &self.sections {
            write!(
                f,
                "\n  {}: {} / {}  ({:.0}%)",
                s.label,
                s.correct,
                s.asked,
                percent(s.correct, s.asked)
            )?;
        }
        if let Some(m) = self.mastery {
            write!(f, "\n  Mastered facts: {} / {}", m.mastered, m.total)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn tally_counts_answers() {
        let mut tally = SessionTally::new(fixed_now());
        tally.record(true);
        tally.record(false);
        tally.record(true);
        assert_eq!(tally.asked(), 3);
        assert_eq!(tally.correct(), 2);
    }

    #[test]
    fn report_formats_score_and_mastery() {
        let mut tally = SessionTally::new(fixed_now());
        for ok in [true, true, false, true] {
            tally.record(ok);
        }
        let report = ScoreReport::from_tally(
            &tally,
            fixed_now() + chrono::Duration::minutes(3),
            Some(Mastery {
                mastered: 2,
                total: 40,
            }),
        )
        .unwrap();

        assert_eq!(report.percent(), 75.0);
        assert_eq!(
            report.to_string(),
            "Total score: 3 / 4  (75%)\n  Mastered facts: 2 / 40"
        );
    }

    #[test]
    fn report_lists_sections_in_first_seen_order() {
        let mut tally = SessionTally::new(fixed_now());
        tally.record_in("Prefixes -> countries", true);
        tally.record_in("Countries -> prefixes", false);
        tally.record_in("Prefixes -> countries", false);
        assert_eq!(tally.asked(), 3);
        assert_eq!(tally.sections()[0].asked(), 2);
        assert_eq!(tally.sections()[1].correct(), 0);

        let report = ScoreReport::from_tally(
            &tally,
            fixed_now(),
            Some(Mastery {
                mastered: 0,
                total: 4,
            }),
        )
        .unwrap();
        assert_eq!(
            report.to_string(),
            "Total score: 1 / 3  (33%)\n  Prefixes -> countries: 1 / 2  (50%)\n  \
             Countries -> prefixes: 0 / 1  (0%)\n  Mastered facts: 0 / 4"
        );
    }

    #[test]
    fn empty_report_is_zero_percent() {
        let tally = SessionTally::new(fixed_now());
        let report = ScoreReport::from_tally(&tally, fixed_now(), None).unwrap();
        assert_eq!(report.percent(), 0.0);
        assert_eq!(report.to_string(), "Total score: 0 / 0  (0%)");
    }

    #[test]
    fn report_rejects_time_travel() {
        let tally = SessionTally::new(fixed_now());
        let err = ScoreReport::from_tally(&tally, fixed_now() - chrono::Duration::seconds(1), None)
            .unwrap_err();
        assert_eq!(err, ScoreReportError::InvalidTimeRange);
    }
}
