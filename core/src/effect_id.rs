//! Identifiers for cancellable effects.
//!
//! A long-lived effect (a subscription stream, a polling loop) is registered
//! under an [`EffectId`] so that a later reducer call can stop it with
//! `Effect::Cancel(id)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for `EffectId` parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid effect ID: {0}")]
pub struct ParseEffectIdError(String);

/// Identifier shared by all tasks spawned for one cancellable effect.
///
/// # Validation
///
/// - `FromStr::from_str()`: Validates input (rejects empty strings)
/// - `From::from()` and `new()`: No validation (for ids chosen in code)
///
/// # Examples
///
/// ```
/// use live_todo_core::EffectId;
///
/// let id = EffectId::new("todo-subscription");
/// assert_eq!(id.as_str(), "todo-subscription");
///
/// let parsed: EffectId = "todo-subscription".parse().unwrap();
/// assert_eq!(parsed, id);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectId(String);

impl EffectId {
    /// Create a new `EffectId` from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the effect ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EffectId {
    type Err = ParseEffectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseEffectIdError("Effect ID cannot be empty".to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for EffectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EffectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for EffectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_effect_id() {
        let id = EffectId::new("feed");
        assert_eq!(id.as_str(), "feed");
        assert_eq!(format!("{id}"), "feed");
    }

    #[test]
    fn parse_empty_string_fails() {
        assert!("".parse::<EffectId>().is_err());
    }

    #[test]
    fn conversions_agree() {
        assert_eq!(EffectId::from("feed"), EffectId::from("feed".to_string()));
        assert_ne!(EffectId::from("feed"), EffectId::from("other"));
    }
}
