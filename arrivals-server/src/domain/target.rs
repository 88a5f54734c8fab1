//! Tracked target configuration.

use std::path::Path;

use serde::Deserialize;

use super::{InvalidLineRef, InvalidStopId, LineRef, StopId};

/// Error returned when building an invalid tracked target.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// Stop identifier failed validation
    #[error(transparent)]
    InvalidStop(#[from] InvalidStopId),

    /// Line reference failed validation
    #[error(transparent)]
    InvalidLine(#[from] InvalidLineRef),

    /// Stop targets must track at least one line
    #[error("stop target must track at least one line")]
    NoLines,
}

/// One configured tracking target: a stop with a set of lines, or a
/// train origin/destination pair.
///
/// Immutable apart from a stop target's tracked line set, which the
/// coordinator may replace in place.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackedTarget {
    /// A bus / light-rail stop with the lines to watch.
    Stop {
        id: StopId,
        name: String,
        lines: Vec<LineRef>,
    },

    /// A train route between two stations.
    Route {
        from: StopId,
        to: StopId,
        from_name: String,
        to_name: String,
    },
}

impl TrackedTarget {
    /// Build a stop target, validating the id and every line.
    pub fn stop(id: &str, name: Option<&str>, lines: &[String]) -> Result<Self, TargetError> {
        let id = StopId::parse(id)?;

        let lines: Vec<LineRef> = lines
            .iter()
            .map(|l| LineRef::parse(l))
            .collect::<Result<_, _>>()?;

        if lines.is_empty() {
            return Err(TargetError::NoLines);
        }

        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("Stop {id}"));

        Ok(TrackedTarget::Stop { id, name, lines })
    }

    /// Build a train-route target, validating both station ids.
    pub fn route(
        from: &str,
        to: &str,
        from_name: Option<&str>,
        to_name: Option<&str>,
    ) -> Result<Self, TargetError> {
        let from = StopId::parse(from)?;
        let to = StopId::parse(to)?;

        let from_name = from_name
            .map(str::to_string)
            .unwrap_or_else(|| format!("Station {from}"));
        let to_name = to_name
            .map(str::to_string)
            .unwrap_or_else(|| format!("Station {to}"));

        Ok(TrackedTarget::Route {
            from,
            to,
            from_name,
            to_name,
        })
    }

    /// Stable registry key for this target.
    pub fn key(&self) -> String {
        match self {
            TrackedTarget::Stop { id, .. } => id.as_str().to_string(),
            TrackedTarget::Route { from, to, .. } => format!("{from}_{to}"),
        }
    }

    /// Human-readable description for logs and the status page.
    pub fn description(&self) -> String {
        match self {
            TrackedTarget::Stop { name, lines, .. } => {
                let lines: Vec<&str> = lines.iter().map(LineRef::as_str).collect();
                format!("{} (lines {})", name, lines.join(", "))
            }
            TrackedTarget::Route {
                from_name, to_name, ..
            } => format!("{from_name} \u{2192} {to_name}"),
        }
    }
}

/// Error returned when loading a targets file.
#[derive(Debug, thiserror::Error)]
pub enum TargetFileError {
    /// File could not be read
    #[error("failed to read targets file: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid JSON
    #[error("failed to parse targets file: {0}")]
    Json(#[from] serde_json::Error),

    /// An entry failed validation
    #[error("invalid target in file: {0}")]
    Target(#[from] TargetError),
}

/// On-disk target entry. Kept separate from [`TrackedTarget`] so that
/// loading goes through the validating constructors.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TargetEntry {
    Stop {
        id: String,
        name: Option<String>,
        lines: Vec<String>,
    },
    Route {
        from: String,
        to: String,
        from_name: Option<String>,
        to_name: Option<String>,
    },
}

/// Load tracked targets from a JSON file.
///
/// The file holds a list of entries tagged with `"kind"`:
///
/// ```json
/// [
///   { "kind": "stop", "id": "24068", "lines": ["249", "40"] },
///   { "kind": "route", "from": "3600", "to": "3700" }
/// ]
/// ```
pub fn load_targets(path: &Path) -> Result<Vec<TrackedTarget>, TargetFileError> {
    let contents = std::fs::read_to_string(path)?;
    let entries: Vec<TargetEntry> = serde_json::from_str(&contents)?;

    entries
        .into_iter()
        .map(|entry| {
            let target = match entry {
                TargetEntry::Stop { id, name, lines } => {
                    TrackedTarget::stop(&id, name.as_deref(), &lines)?
                }
                TargetEntry::Route {
                    from,
                    to,
                    from_name,
                    to_name,
                } => TrackedTarget::route(&from, &to, from_name.as_deref(), to_name.as_deref())?,
            };
            Ok(target)
        })
        .collect()
}
