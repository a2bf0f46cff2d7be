use std::sync::{Mutex, MutexGuard};

use tracing::{debug, error};

use drill_core::model::ScoreReport;

use crate::error::SessionError;
use crate::prompt::{Prompter, Reply};
use super::training::{StopReason, TrainingSession};

/// How a session ended and what, if anything, should be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub reason: StopReason,
    pub report: Option<ScoreReport>,
}

fn lock(session: &Mutex<TrainingSession>) -> Result<MutexGuard<'_, TrainingSession>, SessionError> {
    session.lock().map_err(|_| SessionError::Poisoned)
}

/// Drive the ask/check/record loop until input ends or is interrupted.
///
/// The session lock is held only while picking and scoring, never while
/// waiting for input, so [`interrupt_session`] can finish the session from
/// another thread at any time.
///
/// When the loop stops on an error, progress answered so far is saved before
/// the error is returned. A failure of that save is logged; the original
/// error is the one returned.
///
/// # Errors
///
/// Returns `SessionError` for prompt I/O or storage failures. Returns
/// `SessionError::Finished` if the session was ended elsewhere.
pub fn run_session<P: Prompter + ?Sized>(
    session: &Mutex<TrainingSession>,
    prompter: &mut P,
) -> Result<SessionOutcome, SessionError> {
    match drive(session, prompter) {
        Ok(reason) => finish_session(session, reason),
        Err(e) => {
            save_after_error(session, &e);
            Err(e)
        }
    }
}

fn drive<P: Prompter + ?Sized>(
    session: &Mutex<TrainingSession>,
    prompter: &mut P,
) -> Result<StopReason, SessionError> {
    loop {
        let question = lock(session)?.next_question()?;

        // Unparsable answers are re-asked without scoring.
        let feedback = loop {
            match prompter.ask(&question.text)? {
                Reply::Answer(raw) => {
                    let scored = lock(session)?.submit(&question.fact_id, &raw);
                    match scored {
                        Ok(feedback) => break feedback,
                        Err(SessionError::InvalidAnswer(e)) => {
                            debug!(fact = %question.fact_id, error = %e, "answer not understood");
                            prompter.say(&format!("  {e}"))?;
                        }
                        Err(e) => return Err(e),
                    }
                }
                Reply::EndOfInput => return Ok(StopReason::EndOfInput),
                Reply::Interrupted => return Ok(StopReason::Interrupted),
            }
        };

        prompter.say(&feedback.to_string())?;
    }
}

fn save_after_error(session: &Mutex<TrainingSession>, cause: &SessionError) {
    // Nothing to save: already ended elsewhere, or the state is unreachable.
    if matches!(cause, SessionError::Finished | SessionError::Poisoned) {
        return;
    }
    if let Err(e) = lock(session).and_then(|mut s| s.finish(StopReason::Failed)) {
        error!(error = %e, cause = %cause, "progress not saved after session error");
    }
}

/// Finish the session for `reason`, saving as its policy dictates.
///
/// # Errors
///
/// Returns `SessionError` if saving fails; the session stays open.
pub fn finish_session(
    session: &Mutex<TrainingSession>,
    reason: StopReason,
) -> Result<SessionOutcome, SessionError> {
    let report = lock(session)?.finish(reason)?;
    Ok(SessionOutcome { reason, report })
}

/// Interrupt path used by the signal listener.
///
/// # Errors
///
/// Returns `SessionError` if saving fails.
pub fn interrupt_session(session: &Mutex<TrainingSession>) -> Result<SessionOutcome, SessionError> {
    finish_session(session, StopReason::Interrupted)
}
