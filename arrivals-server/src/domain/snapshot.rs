//! Per-target arrival snapshots.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};

use super::{Arrival, LineRef};

/// The complete set of arrivals for one tracked target as of the last
/// successful poll.
///
/// A snapshot is built in a single step and shared immutably (the
/// coordinator hands out `Arc<Snapshot>`), so observers either see
/// the whole previous poll or the whole new one, never a mix.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Arrivals grouped by line, each list sorted soonest-first and
    /// capped at the configured maximum.
    by_line: BTreeMap<LineRef, Vec<Arrival>>,

    /// When this snapshot was captured.
    taken_at: DateTime<Local>,
}

impl Snapshot {
    /// Build a snapshot from a flat arrival list.
    ///
    /// Groups by line, sorts each group soonest-first, and keeps at
    /// most `max_per_line` entries per line.
    pub fn capture(
        arrivals: Vec<Arrival>,
        max_per_line: usize,
        taken_at: DateTime<Local>,
    ) -> Self {
        let mut by_line: BTreeMap<LineRef, Vec<Arrival>> = BTreeMap::new();

        for arrival in arrivals {
            by_line.entry(arrival.line.clone()).or_default().push(arrival);
        }

        for group in by_line.values_mut() {
            group.sort_by_key(|a| a.expected);
            group.truncate(max_per_line);
        }

        Self { by_line, taken_at }
    }

    /// Arrivals for a specific line, soonest first.
    pub fn line(&self, line: &LineRef) -> Option<&[Arrival]> {
        self.by_line.get(line).map(Vec::as_slice)
    }

    /// The next arrival for a specific line.
    pub fn next_arrival(&self, line: &LineRef) -> Option<&Arrival> {
        self.line(line).and_then(<[Arrival]>::first)
    }

    /// The soonest arrival across all lines.
    pub fn soonest(&self) -> Option<&Arrival> {
        self.by_line
            .values()
            .filter_map(|group| group.first())
            .min_by_key(|a| a.expected)
    }

    /// Lines present in this snapshot, in sorted order.
    pub fn lines(&self) -> impl Iterator<Item = &LineRef> {
        self.by_line.keys()
    }

    /// Total number of arrivals across all lines.
    pub fn total(&self) -> usize {
        self.by_line.values().map(Vec::len).sum()
    }

    /// True when no arrivals are known.
    pub fn is_empty(&self) -> bool {
        self.by_line.values().all(Vec::is_empty)
    }

    /// When this snapshot was captured.
    pub fn taken_at(&self) -> DateTime<Local> {
        self.taken_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn arrival(line: &str, mins: i64, base: DateTime<Local>) -> Arrival {
        Arrival {
            line: LineRef::parse(line).unwrap(),
            expected: base + Duration::minutes(mins),
            realtime: true,
            destination: "Terminal".to_string(),
            journey_mins: None,
        }
    }

    #[test]
    fn groups_and_sorts_per_line() {
        let now = Local::now();
        let snapshot = Snapshot::capture(
            vec![
                arrival("249", 12, now),
                arrival("40", 7, now),
                arrival("249", 4, now),
            ],
            3,
            now,
        );

        let line = LineRef::parse("249").unwrap();
        let arrivals = snapshot.line(&line).unwrap();
        assert_eq!(arrivals.len(), 2);
        assert!(arrivals[0].expected < arrivals[1].expected);
        assert_eq!(snapshot.next_arrival(&line).unwrap().minutes_until(now), 4);
    }

    #[test]
    fn caps_per_line() {
        let now = Local::now();
        let snapshot = Snapshot::capture(
            vec![
                arrival("249", 4, now),
                arrival("249", 8, now),
                arrival("249", 15, now),
                arrival("249", 25, now),
            ],
            2,
            now,
        );

        let line = LineRef::parse("249").unwrap();
        assert_eq!(snapshot.line(&line).unwrap().len(), 2);
        // The kept entries are the soonest ones
        assert_eq!(snapshot.line(&line).unwrap()[1].minutes_until(now), 8);
    }

    #[test]
    fn soonest_spans_lines() {
        let now = Local::now();
        let snapshot = Snapshot::capture(
            vec![arrival("249", 12, now), arrival("40", 7, now)],
            3,
            now,
        );

        let soonest = snapshot.soonest().unwrap();
        assert_eq!(soonest.line.as_str(), "40");
        assert_eq!(soonest.minutes_until(now), 7);
    }

    #[test]
    fn missing_line_is_none() {
        let now = Local::now();
        let snapshot = Snapshot::capture(vec![arrival("249", 4, now)], 3, now);

        let other = LineRef::parse("40").unwrap();
        assert!(snapshot.line(&other).is_none());
        assert!(snapshot.next_arrival(&other).is_none());
    }

    #[test]
    fn empty_snapshot() {
        let now = Local::now();
        let snapshot = Snapshot::capture(vec![], 3, now);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.total(), 0);
        assert!(snapshot.soonest().is_none());
    }
}
