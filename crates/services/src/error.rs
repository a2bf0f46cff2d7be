//! Shared error types for the services crate.

use std::io;

use thiserror::Error;

use drill_core::model::{FactId, FrequencyError, ScoreReportError};
use drill_core::parser::ParseErrorKind;
use drill_storage::repository::StorageError;

/// An answer that could not be understood; the question is asked again.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidAnswer {
    #[error(transparent)]
    Frequency(#[from] FrequencyError),
    #[error(transparent)]
    Prefixes(#[from] ParseErrorKind),
}

/// Errors emitted by training sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("the fact database is empty")]
    Empty,
    #[error("session already finished")]
    Finished,
    #[error("unknown fact {0}")]
    UnknownFact(FactId),
    #[error("session state is unavailable after a panic")]
    Poisoned,
    #[error(transparent)]
    InvalidAnswer(#[from] InvalidAnswer),
    #[error("prompt failed: {0}")]
    Prompt(#[from] io::Error),
    #[error(transparent)]
    Summary(#[from] ScoreReportError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
