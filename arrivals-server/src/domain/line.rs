//! Line reference type.

use std::fmt;

/// Error returned when parsing an invalid line reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid line reference: {reason}")]
pub struct InvalidLineRef {
    reason: &'static str,
}

/// A bus or light-rail route short name (e.g. `"249"` or `"R1"`).
///
/// This is the grouping key for arrivals within a snapshot. Train
/// itineraries, which have no route short name, group under the fixed
/// [`LineRef::train_route`] key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineRef(String);

/// Grouping key used for train-route departures.
const TRAIN_ROUTE_KEY: &str = "train_route";

impl LineRef {
    /// Parse a line reference from a string.
    ///
    /// The input must be non-empty and contain no whitespace.
    pub fn parse(s: &str) -> Result<Self, InvalidLineRef> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(InvalidLineRef {
                reason: "must not be empty",
            });
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(InvalidLineRef {
                reason: "must not contain whitespace",
            });
        }

        Ok(LineRef(trimmed.to_string()))
    }

    /// The fixed grouping key for train-route departures.
    pub fn train_route() -> Self {
        LineRef(TRAIN_ROUTE_KEY.to_string())
    }

    /// Returns the line reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineRef({})", self.0)
    }
}

impl fmt::Display for LineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
