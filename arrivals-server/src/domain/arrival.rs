//! Arrival records.

use chrono::{DateTime, Local};

use super::LineRef;

/// One upcoming departure at a tracked target.
///
/// Recomputed in full on every successful poll; never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrival {
    /// The line this arrival belongs to (or [`LineRef::train_route`]).
    pub line: LineRef,

    /// Expected arrival instant, realtime where available.
    pub expected: DateTime<Local>,

    /// Whether the expected instant comes from realtime data rather
    /// than the published schedule.
    pub realtime: bool,

    /// Headsign / destination text.
    pub destination: String,

    /// End-to-end journey duration in minutes (train routes only).
    pub journey_mins: Option<i64>,
}

impl Arrival {
    /// Whole minutes until this arrival, clamped to zero for
    /// departures that are due or already past.
    pub fn minutes_until(&self, now: DateTime<Local>) -> i64 {
        (self.expected - now).num_minutes().max(0)
    }
}
