#![forbid(unsafe_code)]

pub mod answer;
pub mod error;
pub mod prompt;
pub mod question;
pub mod sessions;
pub mod stats;

pub use drill_core::Clock;

pub use answer::check_answer;
pub use error::{InvalidAnswer, SessionError};
pub use prompt::{Prompter, Reply, ScriptedPrompter, StdioPrompter};
pub use question::{Feedback, Question};
pub use sessions::{
    SessionOutcome, SessionPolicy, StopReason, TrainingSession, finish_session, interrupt_session,
    run_session,
};
pub use stats::{FactStats, ProgressStats};
