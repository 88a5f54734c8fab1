//! Stop identifier type.

use std::fmt;

/// Error returned when parsing an invalid stop identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop id: {reason}")]
pub struct InvalidStopId {
    reason: &'static str,
}

/// An opaque BusNearby stop identifier.
///
/// Stop ids are numeric strings assigned by the upstream GTFS feed
/// (e.g. `"24068"`). The stop-times endpoint expects them qualified
/// with a `1:` feed prefix; [`StopId::qualified`] produces that form.
///
/// # Examples
///
/// ```
/// use arrivals_server::domain::StopId;
///
/// let stop = StopId::parse("24068").unwrap();
/// assert_eq!(stop.as_str(), "24068");
/// assert_eq!(stop.qualified(), "1:24068");
///
/// // An already-qualified id is kept as-is
/// let stop = StopId::parse("1:24068").unwrap();
/// assert_eq!(stop.qualified(), "1:24068");
///
/// assert!(StopId::parse("").is_err());
/// assert!(StopId::parse("24 068").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StopId(String);

impl StopId {
    /// Parse a stop id from a string.
    ///
    /// The input must be non-empty and contain no whitespace.
    pub fn parse(s: &str) -> Result<Self, InvalidStopId> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(InvalidStopId {
                reason: "must not be empty",
            });
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(InvalidStopId {
                reason: "must not contain whitespace",
            });
        }

        Ok(StopId(trimmed.to_string()))
    }

    /// Returns the stop id as configured, without the feed prefix.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the feed-qualified form expected by the stop-times
    /// endpoint (`1:{id}`). Idempotent for already-qualified ids.
    pub fn qualified(&self) -> String {
        if self.0.starts_with("1:") {
            self.0.clone()
        } else {
            format!("1:{}", self.0)
        }
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
