//! Refresh interval selection.
//!
//! Polling speed follows how soon the next vehicle is due and the time
//! of day. Three tiers: an imminent arrival polls fast regardless of
//! hour, night hours or an empty board poll slowly, everything else
//! sits in the middle.

use std::time::Duration;

/// Polling speed tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Next arrival is imminent
    Short,
    /// Normal daytime polling
    Medium,
    /// Night hours, an empty board, or a failed refresh
    Long,
}

/// Tunable parameters for interval selection.
#[derive(Debug, Clone)]
pub struct IntervalPolicy {
    /// Arrivals closer than this many minutes count as imminent
    pub imminent_mins: i64,
    /// Hour (0-23) at which night polling starts
    pub night_start_hour: u32,
    /// Hour (0-23) at which night polling ends
    pub night_end_hour: u32,
    /// Interval for the `Short` tier
    pub short: Duration,
    /// Interval for the `Medium` tier
    pub medium: Duration,
    /// Interval for the `Long` tier
    pub long: Duration,
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        Self {
            imminent_mins: 10,
            night_start_hour: 22,
            night_end_hour: 6,
            short: Duration::from_secs(15),
            medium: Duration::from_secs(30),
            long: Duration::from_secs(300),
        }
    }
}

impl IntervalPolicy {
    /// Pick the tier for the next poll.
    ///
    /// `soonest_mins` is the minutes until the nearest known arrival,
    /// or `None` when the board is empty. Imminent arrivals win over
    /// night hours: a bus due in five minutes at 23:00 still polls
    /// fast.
    pub fn select(&self, soonest_mins: Option<i64>, hour: u32) -> Tier {
        match soonest_mins {
            Some(mins) if mins < self.imminent_mins => Tier::Short,
            Some(_) if self.is_night(hour) => Tier::Long,
            Some(_) => Tier::Medium,
            None => Tier::Long,
        }
    }

    /// Whether `hour` falls inside the night window. The window may
    /// wrap midnight (22..6) or not (0..6).
    pub fn is_night(&self, hour: u32) -> bool {
        if self.night_start_hour <= self.night_end_hour {
            hour >= self.night_start_hour && hour < self.night_end_hour
        } else {
            hour >= self.night_start_hour || hour < self.night_end_hour
        }
    }

    /// The polling interval for a tier.
    pub fn duration(&self, tier: Tier) -> Duration {
        match tier {
            Tier::Short => self.short,
            Tier::Medium => self.medium,
            Tier::Long => self.long,
        }
    }

    /// Convenience: select a tier and return its interval.
    pub fn interval_for(&self, soonest_mins: Option<i64>, hour: u32) -> Duration {
        self.duration(self.select(soonest_mins, hour))
    }

    /// The slow interval, used after a failed refresh.
    pub fn long(&self) -> Duration {
        self.long
    }
}
