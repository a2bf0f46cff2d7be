mod band;
mod fact;
mod ids;
mod progress;
mod session;

pub use ids::{FactId, FactIdError};

pub use band::{
    BandFact, BandTopic, FrequencyError, FrequencyRange, PowerLimit, PowerReference,
    format_frequency, parse_frequency,
};
pub use fact::{DuplicateFact, Fact, FactDetail, FactStore, Priority};
pub use progress::{
    MASTERY_ACCURACY, MASTERY_MIN_ATTEMPTS, ProgressEntry, ProgressError, ProgressRecord,
};
pub use session::{Mastery, ScoreReport, ScoreReportError, SectionScore, SessionTally};
