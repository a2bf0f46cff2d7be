use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a fact identifier is empty or contains whitespace.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid fact identifier: {raw:?}")]
pub struct FactIdError {
    pub raw: String,
}

/// Unique identifier for a Fact.
///
/// For the prefix trainer this is the primary call-sign prefix (`DL`); band
/// facts use a topic key such as `range:20m`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FactId(String);

impl FactId {
    /// Creates a new `FactId`.
    ///
    /// # Errors
    ///
    /// Returns `FactIdError` if the value is empty or contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, FactIdError> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(FactIdError { raw: id });
        }
        Ok(Self(id))
    }

    /// Returns the underlying string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FactId").field(&self.0).finish()
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FactId {
    type Err = FactIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for FactId {
    type Error = FactIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FactId> for String {
    fn from(id: FactId) -> Self {
        id.0
    }
}

impl Borrow<str> for FactId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
