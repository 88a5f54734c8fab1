//! Sensor projection.
//!
//! Turns a coordinator observation into per-line sensor readings: the
//! value a display would show ("4", "Arrived", "No data",
//! "Unavailable") plus the attributes behind it. A stop target yields
//! one reading per configured line; a train route yields a single
//! reading under the train-route key.

use std::fmt;

use chrono::{DateTime, Local};

use crate::coordinator::Observation;
use crate::domain::{Arrival, LineRef, TrackedTarget};

/// The state a sensor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorValue {
    /// Minutes until the next arrival
    Minutes(i64),
    /// Due now
    Arrived,
    /// No upcoming arrivals known for this line
    NoData,
    /// The target cannot currently be trusted
    Unavailable,
}

impl SensorValue {
    /// The display label for this value.
    pub fn label(&self) -> String {
        match self {
            SensorValue::Minutes(mins) => mins.to_string(),
            SensorValue::Arrived => "Arrived".to_string(),
            SensorValue::NoData => "No data".to_string(),
            SensorValue::Unavailable => "Unavailable".to_string(),
        }
    }

    /// The unit of measurement, where one applies.
    pub fn unit(&self) -> Option<&'static str> {
        match self {
            SensorValue::Minutes(_) => Some("min"),
            _ => None,
        }
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One line's reading, with the attributes a display can expand.
#[derive(Debug, Clone)]
pub struct SensorReading {
    pub line: LineRef,
    pub value: SensorValue,
    /// When the next vehicle is expected
    pub next_arrival: Option<DateTime<Local>>,
    /// Whether that estimate is realtime rather than scheduled
    pub realtime: bool,
    pub destination: Option<String>,
    /// Train journeys carry their total duration
    pub journey_mins: Option<i64>,
    /// Later arrivals on the same line, soonest first
    pub upcoming: Vec<Arrival>,
}

/// Project an observation into readings, one per line the target
/// tracks.
///
/// An unavailable observation still carries the retained attributes,
/// so a display can show the last known board alongside the
/// unavailable state.
pub fn readings(target: &TrackedTarget, obs: &Observation, now: DateTime<Local>) -> Vec<SensorReading> {
    match target {
        TrackedTarget::Stop { lines, .. } => lines
            .iter()
            .map(|line| line_reading(line, obs, now))
            .collect(),
        TrackedTarget::Route { .. } => {
            vec![line_reading(&LineRef::train_route(), obs, now)]
        }
    }
}

fn line_reading(line: &LineRef, obs: &Observation, now: DateTime<Local>) -> SensorReading {
    let arrivals = obs
        .snapshot
        .as_deref()
        .and_then(|s| s.line(line))
        .unwrap_or(&[]);

    let value = if obs.unavailable {
        SensorValue::Unavailable
    } else {
        match arrivals.first() {
            Some(next) => match next.minutes_until(now) {
                0 => SensorValue::Arrived,
                mins => SensorValue::Minutes(mins),
            },
            None => SensorValue::NoData,
        }
    };

    match arrivals.first() {
        Some(next) => SensorReading {
            line: line.clone(),
            value,
            next_arrival: Some(next.expected),
            realtime: next.realtime,
            destination: Some(next.destination.clone()),
            journey_mins: next.journey_mins,
            upcoming: arrivals[1..].to_vec(),
        },
        None => SensorReading {
            line: line.clone(),
            value,
            next_arrival: None,
            realtime: false,
            destination: None,
            journey_mins: None,
            upcoming: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Duration as ChronoDuration;

    use crate::coordinator::Phase;
    use crate::domain::Snapshot;

    fn line(s: &str) -> LineRef {
        LineRef::parse(s).unwrap()
    }

    fn arrival(line_ref: &LineRef, mins: i64, now: DateTime<Local>) -> Arrival {
        Arrival {
            line: line_ref.clone(),
            expected: now + ChronoDuration::minutes(mins),
            realtime: true,
            destination: "Central Station".to_string(),
            journey_mins: None,
        }
    }

    fn observation(snapshot: Option<Snapshot>, phase: Phase, failures: u32, unavailable: bool) -> Observation {
        Observation {
            phase,
            snapshot: snapshot.map(Arc::new),
            consecutive_failures: failures,
            last_error: None,
            interval: Duration::from_secs(30),
            unavailable,
        }
    }

    fn stop_target(lines: &[&str]) -> TrackedTarget {
        let lines: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        TrackedTarget::stop("12345", Some("Test Stop"), &lines).unwrap()
    }

    #[test]
    fn minutes_until_next_arrival() {
        let now = Local::now();
        let l18 = line("18");
        let snapshot = Snapshot::capture(
            vec![arrival(&l18, 4, now), arrival(&l18, 12, now)],
            3,
            now,
        );
        let obs = observation(Some(snapshot), Phase::HasData, 0, false);

        let out = readings(&stop_target(&["18"]), &obs, now);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].value, SensorValue::Minutes(4));
        assert_eq!(out[0].value.label(), "4");
        assert_eq!(out[0].value.unit(), Some("min"));
        assert_eq!(out[0].destination.as_deref(), Some("Central Station"));
        assert!(out[0].realtime);
        assert_eq!(out[0].upcoming.len(), 1);
    }

    #[test]
    fn due_now_reads_arrived() {
        let now = Local::now();
        let l18 = line("18");
        let snapshot = Snapshot::capture(vec![arrival(&l18, 0, now)], 3, now);
        let obs = observation(Some(snapshot), Phase::HasData, 0, false);

        let out = readings(&stop_target(&["18"]), &obs, now);
        assert_eq!(out[0].value, SensorValue::Arrived);
        assert_eq!(out[0].value.label(), "Arrived");
        assert_eq!(out[0].value.unit(), None);
    }

    #[test]
    fn line_with_no_arrivals_reads_no_data() {
        let now = Local::now();
        let l18 = line("18");
        // 63 is tracked but nothing is coming
        let snapshot = Snapshot::capture(vec![arrival(&l18, 4, now)], 3, now);
        let obs = observation(Some(snapshot), Phase::HasData, 0, false);

        let out = readings(&stop_target(&["18", "63"]), &obs, now);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].value, SensorValue::Minutes(4));
        assert_eq!(out[1].value, SensorValue::NoData);
        assert!(out[1].next_arrival.is_none());
    }

    #[test]
    fn no_snapshot_reads_no_data() {
        let now = Local::now();
        let obs = observation(None, Phase::Idle, 0, false);

        let out = readings(&stop_target(&["18"]), &obs, now);
        assert_eq!(out[0].value, SensorValue::NoData);
    }

    #[test]
    fn unavailable_keeps_retained_attributes() {
        let now = Local::now();
        let l18 = line("18");
        let snapshot = Snapshot::capture(vec![arrival(&l18, 4, now)], 3, now);
        let obs = observation(Some(snapshot), Phase::Error, 3, true);

        let out = readings(&stop_target(&["18"]), &obs, now);
        assert_eq!(out[0].value, SensorValue::Unavailable);
        assert_eq!(out[0].value.label(), "Unavailable");
        // The stale board stays visible as attributes
        assert!(out[0].next_arrival.is_some());
        assert_eq!(out[0].destination.as_deref(), Some("Central Station"));
    }

    #[test]
    fn route_target_reads_under_train_key() {
        let now = Local::now();
        let train = LineRef::train_route();
        let run = Arrival {
            line: train.clone(),
            expected: now + ChronoDuration::minutes(25),
            realtime: true,
            destination: "Tel Aviv - Savidor".to_string(),
            journey_mins: Some(42),
        };
        let snapshot = Snapshot::capture(vec![run], 3, now);
        let obs = observation(Some(snapshot), Phase::HasData, 0, false);

        let target = TrackedTarget::route("3600", "4900", None, None).unwrap();
        let out = readings(&target, &obs, now);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].line, train);
        assert_eq!(out[0].value, SensorValue::Minutes(25));
        assert_eq!(out[0].journey_mins, Some(42));
    }
}
