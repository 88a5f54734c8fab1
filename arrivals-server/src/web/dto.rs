//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::coordinator::{Observation, Phase};
use crate::domain::{Arrival, TrackedTarget};
use crate::sensor::SensorReading;

/// Request to start tracking a target.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CreateTargetRequest {
    /// Track a bus or light-rail stop
    Stop {
        stop_id: String,
        /// Display name; resolved from the upstream when omitted
        name: Option<String>,
        /// Lines to watch at this stop
        lines: Vec<String>,
    },

    /// Track train departures between two stations
    Route {
        from: String,
        to: String,
        from_name: Option<String>,
        to_name: Option<String>,
    },
}

/// Request to replace a stop target's tracked lines.
#[derive(Debug, Deserialize)]
pub struct ReplaceLinesRequest {
    pub lines: Vec<String>,
}

/// Query string for stop search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<usize>,
}

/// One tracked target in list responses.
#[derive(Debug, Serialize)]
pub struct TargetSummary {
    /// Stable key of the target
    pub key: String,

    /// Human-readable description
    pub description: String,

    /// Lifecycle phase
    pub phase: String,

    /// Whether the target currently reports itself unusable
    pub unavailable: bool,

    /// Seconds until the scheduler polls again
    pub interval_secs: u64,

    pub consecutive_failures: u32,
}

/// Full detail for one tracked target.
#[derive(Debug, Serialize)]
pub struct TargetDetail {
    #[serde(flatten)]
    pub summary: TargetSummary,

    /// When the current snapshot was taken, RFC 3339
    pub taken_at: Option<String>,

    pub last_error: Option<String>,

    /// One entry per tracked line
    pub sensors: Vec<SensorDto>,
}

/// One line's sensor reading.
#[derive(Debug, Serialize)]
pub struct SensorDto {
    pub line: String,

    /// Display state: minutes as a number string, or "Arrived",
    /// "No data", "Unavailable"
    pub state: String,

    /// Unit of measurement, where one applies
    pub unit: Option<String>,

    /// Next expected arrival, RFC 3339
    pub next_arrival: Option<String>,

    pub realtime: bool,

    pub destination: Option<String>,

    /// Total journey duration for train runs, minutes
    pub journey_mins: Option<i64>,

    /// Later arrivals on the same line
    pub upcoming: Vec<ArrivalDto>,
}

/// One upcoming arrival.
#[derive(Debug, Serialize)]
pub struct ArrivalDto {
    /// Expected arrival, RFC 3339
    pub expected: String,

    pub realtime: bool,

    pub destination: String,

    pub journey_mins: Option<i64>,
}

/// Response for stop search.
#[derive(Debug, Serialize)]
pub struct StopSearchResponse {
    pub stops: Vec<StopResult>,
}

/// One stop search match.
#[derive(Debug, Serialize)]
pub struct StopResult {
    pub id: Option<String>,
    pub name: String,
    pub city: Option<String>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Display label for a phase.
pub fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "idle",
        Phase::Refreshing => "refreshing",
        Phase::HasData => "has_data",
        Phase::Error => "error",
    }
}

impl TargetSummary {
    /// Build from a target and its latest observation.
    pub fn from_observation(target: &TrackedTarget, obs: &Observation) -> Self {
        Self {
            key: target.key(),
            description: target.description(),
            phase: phase_label(obs.phase).to_string(),
            unavailable: obs.unavailable,
            interval_secs: obs.interval.as_secs(),
            consecutive_failures: obs.consecutive_failures,
        }
    }
}

impl TargetDetail {
    /// Build from a target, its observation and projected readings.
    pub fn from_readings(
        target: &TrackedTarget,
        obs: &Observation,
        readings: &[SensorReading],
    ) -> Self {
        Self {
            summary: TargetSummary::from_observation(target, obs),
            taken_at: obs.snapshot.as_ref().map(|s| s.taken_at().to_rfc3339()),
            last_error: obs.last_error.clone(),
            sensors: readings.iter().map(SensorDto::from_reading).collect(),
        }
    }
}

impl SensorDto {
    /// Build from a projected reading.
    pub fn from_reading(reading: &SensorReading) -> Self {
        Self {
            line: reading.line.as_str().to_string(),
            state: reading.value.label(),
            unit: reading.value.unit().map(str::to_string),
            next_arrival: reading.next_arrival.map(|t| t.to_rfc3339()),
            realtime: reading.realtime,
            destination: reading.destination.clone(),
            journey_mins: reading.journey_mins,
            upcoming: reading.upcoming.iter().map(ArrivalDto::from_arrival).collect(),
        }
    }
}

impl ArrivalDto {
    /// Build from a domain arrival.
    pub fn from_arrival(arrival: &Arrival) -> Self {
        Self {
            expected: arrival.expected.to_rfc3339(),
            realtime: arrival.realtime,
            destination: arrival.destination.clone(),
            journey_mins: arrival.journey_mins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_parses_stop() {
        let json = r#"{
            "kind": "stop",
            "stop_id": "12345",
            "lines": ["18", "63"]
        }"#;

        match serde_json::from_str::<CreateTargetRequest>(json).unwrap() {
            CreateTargetRequest::Stop { stop_id, name, lines } => {
                assert_eq!(stop_id, "12345");
                assert!(name.is_none());
                assert_eq!(lines, vec!["18", "63"]);
            }
            other => panic!("expected stop request, got {other:?}"),
        }
    }

    #[test]
    fn create_request_parses_route() {
        let json = r#"{
            "kind": "route",
            "from": "3600",
            "to": "4900",
            "to_name": "Haifa"
        }"#;

        match serde_json::from_str::<CreateTargetRequest>(json).unwrap() {
            CreateTargetRequest::Route { from, to, to_name, .. } => {
                assert_eq!(from, "3600");
                assert_eq!(to, "4900");
                assert_eq!(to_name.as_deref(), Some("Haifa"));
            }
            other => panic!("expected route request, got {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let json = r#"{ "kind": "tram", "stop_id": "1" }"#;
        assert!(serde_json::from_str::<CreateTargetRequest>(json).is_err());
    }
}
