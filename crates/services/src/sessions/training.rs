use rand::rngs::StdRng;
use tracing::{debug, info};

use drill_core::Clock;
use drill_core::model::{
    Fact, FactId, FactStore, Mastery, ProgressRecord, ScoreReport, SessionTally,
};
use drill_core::selector::Selector;
use drill_storage::repository::ProgressRepository;

use crate::answer::check_answer;
use crate::error::SessionError;
use crate::question::{Feedback, Question, score_section};

//
// ─── POLICY ────────────────────────────────────────────────────────────────────
//

/// How a trainer treats progress and the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Save the progress record whenever the session ends, however it ends.
    pub persist_progress: bool,
    /// Include mastered-fact counts in the score report.
    pub report_mastery: bool,
}

impl SessionPolicy {
    /// Band trainer: nothing is kept between runs.
    #[must_use]
    pub fn band_trainer() -> Self {
        Self {
            persist_progress: false,
            report_mastery: false,
        }
    }

    /// Prefix trainer: progress survives every kind of exit.
    #[must_use]
    pub fn prefix_trainer() -> Self {
        Self {
            persist_progress: true,
            report_mastery: true,
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Input closed; the learner is done.
    EndOfInput,
    /// Ctrl+C or an interrupted read.
    Interrupted,
    /// The loop stopped on an error; progress is kept, no score is shown.
    Failed,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One run of a trainer: fact store, learner progress, and the running tally.
pub struct TrainingSession {
    facts: FactStore,
    progress: ProgressRecord,
    repository: Box<dyn ProgressRepository>,
    selector: Selector<StdRng>,
    tally: SessionTally,
    clock: Clock,
    policy: SessionPolicy,
    finished: bool,
}

impl TrainingSession {
    /// Load prior progress and start a session over `facts`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` for an empty fact store and
    /// `SessionError::Storage` when the progress record cannot be loaded.
    pub fn start(
        facts: FactStore,
        repository: Box<dyn ProgressRepository>,
        rng: StdRng,
        clock: Clock,
        policy: SessionPolicy,
    ) -> Result<Self, SessionError> {
        if facts.is_empty() {
            return Err(SessionError::Empty);
        }
        let progress = repository.load_progress()?;
        info!(
            facts = facts.len(),
            known = progress.len(),
            "training session started"
        );

        Ok(Self {
            facts,
            progress,
            repository,
            selector: Selector::new(rng),
            tally: SessionTally::new(clock.now()),
            clock,
            policy,
            finished: false,
        })
    }

    #[must_use]
    pub fn facts(&self) -> &FactStore {
        &self.facts
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressRecord {
        &self.progress
    }

    #[must_use]
    pub fn tally(&self) -> &SessionTally {
        &self.tally
    }

    #[must_use]
    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Pick the next fact and render it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` once the session has ended.
    pub fn next_question(&mut self) -> Result<Question, SessionError> {
        if self.finished {
            return Err(SessionError::Finished);
        }
        let fact = self
            .selector
            .pick(&self.facts, &self.progress)
            .ok_or(SessionError::Empty)?;
        Ok(Question::for_fact(fact))
    }

    /// Score `raw` as the answer to `fact_id` and update progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidAnswer` without recording anything when
    /// the answer cannot be parsed, and `SessionError::Finished` or
    /// `SessionError::UnknownFact` for misuse.
    pub fn submit(&mut self, fact_id: &FactId, raw: &str) -> Result<Feedback, SessionError> {
        if self.finished {
            return Err(SessionError::Finished);
        }
        let fact: &Fact = self
            .facts
            .get(fact_id.as_str())
            .ok_or_else(|| SessionError::UnknownFact(fact_id.clone()))?;

        let correct = check_answer(fact, raw)?;
        let expected = fact.answer().to_owned();
        let section = score_section(fact);

        let entry = self.progress.record(fact_id, correct, self.clock.now());
        debug!(
            fact = %fact_id,
            correct,
            asked = entry.times_asked(),
            "answer recorded"
        );
        match section {
            Some(label) => self.tally.record_in(label, correct),
            None => self.tally.record(correct),
        }

        Ok(Feedback { correct, expected })
    }

    /// Persist the progress record if this trainer keeps one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the write fails.
    pub fn save(&self) -> Result<(), SessionError> {
        if self.policy.persist_progress {
            self.repository.save_progress(&self.progress)?;
            debug!(entries = self.progress.len(), "progress saved");
        }
        Ok(())
    }

    /// Number of facts in the store the learner has mastered.
    #[must_use]
    pub fn mastery(&self) -> Mastery {
        let mastered = self
            .facts
            .facts()
            .iter()
            .filter(|f| {
                self.progress
                    .get(f.id().as_str())
                    .is_some_and(|e| e.is_mastered())
            })
            .count();
        Mastery {
            mastered,
            total: self.facts.len(),
        }
    }

    /// End the session.
    ///
    /// Progress is saved on every path when the policy asks for it; the score
    /// is produced only when input ended normally. Finishing twice is a no-op
    /// that returns `None`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if saving fails or the report cannot be built.
    /// A failed save leaves the session open, so `finish` can be retried.
    pub fn finish(&mut self, reason: StopReason) -> Result<Option<ScoreReport>, SessionError> {
        if self.finished {
            return Ok(None);
        }
        self.save()?;
        self.finished = true;
        info!(
            ?reason,
            asked = self.tally.asked(),
            correct = self.tally.correct(),
            "training session finished"
        );

        match reason {
            StopReason::Interrupted | StopReason::Failed => Ok(None),
            StopReason::EndOfInput => {
                let mastery = self.policy.report_mastery.then(|| self.mastery());
                let report = ScoreReport::from_tally(&self.tally, self.clock.now(), mastery)?;
                Ok(Some(report))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::parser::parse_prefix_database;
    use drill_core::time::fixed_clock;
    use drill_storage::repository::{InMemoryProgressRepository, StorageError};
    use rand::SeedableRng;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Repository whose writes always fail, counting the attempts.
    #[derive(Clone, Default)]
    struct ReadOnlyRepository {
        attempts: Arc<Mutex<usize>>,
    }

    impl ProgressRepository for ReadOnlyRepository {
        fn load_progress(&self) -> Result<ProgressRecord, StorageError> {
            Ok(ProgressRecord::new())
        }

        fn save_progress(&self, _record: &ProgressRecord) -> Result<(), StorageError> {
            *self.attempts.lock().unwrap() += 1;
            Err(StorageError::Write {
                path: PathBuf::from("/read-only/me.train"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    const DB: &str = "DL,Germany\nF,France\n";

    fn session(repo: &InMemoryProgressRepository, policy: SessionPolicy) -> TrainingSession {
        TrainingSession::start(
            parse_prefix_database(DB).unwrap(),
            Box::new(repo.clone()),
            StdRng::seed_from_u64(3),
            fixed_clock(),
            policy,
        )
        .unwrap()
    }

    fn answer_correctly(session: &mut TrainingSession) -> Feedback {
        let q = session.next_question().unwrap();
        let answer = session.facts().get(q.fact_id.as_str()).unwrap().answer().to_owned();
        session.submit(&q.fact_id, &answer).unwrap()
    }

    #[test]
    fn empty_store_cannot_start() {
        let err = TrainingSession::start(
            FactStore::default(),
            Box::new(InMemoryProgressRepository::new()),
            StdRng::seed_from_u64(1),
            fixed_clock(),
            SessionPolicy::prefix_trainer(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, SessionError::Empty));
    }

    #[test]
    fn submit_updates_progress_and_tally() {
        let repo = InMemoryProgressRepository::new();
        let mut s = session(&repo, SessionPolicy::prefix_trainer());

        assert!(answer_correctly(&mut s).correct);
        let dl = FactId::new("DL").unwrap();
        let feedback = s.submit(&dl, "Deutschland").unwrap();
        assert!(!feedback.correct);
        assert_eq!(feedback.expected, "Germany");

        assert_eq!(s.tally().asked(), 2);
        assert_eq!(s.tally().correct(), 1);
        assert!(s.progress().get("DL").unwrap().times_asked() >= 1);
        // Nothing is written until the session ends.
        assert_eq!(repo.save_count(), 0);
    }

    #[test]
    fn unknown_fact_is_rejected() {
        let repo = InMemoryProgressRepository::new();
        let mut s = session(&repo, SessionPolicy::prefix_trainer());
        let err = s.submit(&FactId::new("ZZ").unwrap(), "x").unwrap_err();
        assert!(matches!(err, SessionError::UnknownFact(_)));
    }

    #[test]
    fn interrupt_saves_without_score() {
        let repo = InMemoryProgressRepository::new();
        let mut s = session(&repo, SessionPolicy::prefix_trainer());
        answer_correctly(&mut s);

        assert!(s.finish(StopReason::Interrupted).unwrap().is_none());
        assert_eq!(repo.save_count(), 1);
        assert_eq!(repo.snapshot().unwrap(), *s.progress());
    }

    #[test]
    fn end_of_input_saves_and_reports_mastery() {
        let repo = InMemoryProgressRepository::new();
        let mut s = session(&repo, SessionPolicy::prefix_trainer());
        for _ in 0..3 {
            s.submit(&FactId::new("DL").unwrap(), "germany").unwrap();
        }

        let report = s.finish(StopReason::EndOfInput).unwrap().unwrap();
        assert_eq!(report.asked(), 3);
        assert_eq!(report.correct(), 3);
        let mastery = report.mastery().unwrap();
        assert_eq!((mastery.mastered, mastery.total), (1, 2));
        assert_eq!(repo.save_count(), 1);

        // Second finish does nothing.
        assert!(s.finish(StopReason::EndOfInput).unwrap().is_none());
        assert_eq!(repo.save_count(), 1);
        assert!(matches!(s.next_question(), Err(SessionError::Finished)));
    }

    #[test]
    fn failed_save_leaves_session_open() {
        let repo = ReadOnlyRepository::default();
        let mut s = TrainingSession::start(
            parse_prefix_database(DB).unwrap(),
            Box::new(repo.clone()),
            StdRng::seed_from_u64(3),
            fixed_clock(),
            SessionPolicy::prefix_trainer(),
        )
        .unwrap();
        answer_correctly(&mut s);

        let err = s.finish(StopReason::Interrupted).unwrap_err();
        assert!(matches!(err, SessionError::Storage(StorageError::Write { .. })));
        assert!(!s.is_finished());

        // The retry writes again instead of reporting success.
        assert!(s.finish(StopReason::Interrupted).is_err());
        assert_eq!(*repo.attempts.lock().unwrap(), 2);
    }

    #[test]
    fn failed_stop_saves_without_score() {
        let repo = InMemoryProgressRepository::new();
        let mut s = session(&repo, SessionPolicy::prefix_trainer());
        answer_correctly(&mut s);

        assert!(s.finish(StopReason::Failed).unwrap().is_none());
        assert_eq!(repo.save_count(), 1);
        assert!(s.is_finished());
    }

    #[test]
    fn band_policy_never_saves() {
        let repo = InMemoryProgressRepository::new();
        let mut s = session(&repo, SessionPolicy::band_trainer());
        answer_correctly(&mut s);

        let report = s.finish(StopReason::EndOfInput).unwrap().unwrap();
        assert!(report.mastery().is_none());
        assert_eq!(repo.save_count(), 0);
    }
}
