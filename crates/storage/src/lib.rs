#![forbid(unsafe_code)]

pub mod repository;
pub mod trainfile;

pub use repository::{InMemoryProgressRepository, ProgressRepository, StorageError};
pub use trainfile::TrainfileRepository;
