mod runner;
mod training;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use runner::{SessionOutcome, finish_session, interrupt_session, run_session};
pub use training::{SessionPolicy, StopReason, TrainingSession};
