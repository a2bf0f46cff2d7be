#![forbid(unsafe_code)]

//! Facts, progress tracking and weighted selection shared by both trainers.

pub mod model;
pub mod parser;
pub mod selector;
pub mod time;

pub use time::Clock;
