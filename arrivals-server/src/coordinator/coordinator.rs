//! Per-target refresh coordinator.
//!
//! One coordinator owns the polling state for one tracked target: the
//! latest snapshot, the failure streak, and the interval the scheduler
//! should sleep before the next poll. Readers always see either the
//! previous complete snapshot or the new one, never a partial board.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Timelike};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::busnearby::{BusNearbyError, TransitApi};
use crate::domain::{LineRef, Snapshot, TrackedTarget};

use super::interval::IntervalPolicy;

/// Coordinator tuning knobs.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Arrivals to keep per line
    pub max_arrivals: usize,
    /// Failure streak after which retained data is declared unusable
    pub stale_after: u32,
    /// Interval selection parameters
    pub policy: IntervalPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_arrivals: 3,
            stale_after: 3,
            policy: IntervalPolicy::default(),
        }
    }
}

/// Lifecycle phase of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Created, never refreshed
    Idle,
    /// A refresh is in flight
    Refreshing,
    /// Last refresh succeeded
    HasData,
    /// Last refresh failed
    Error,
}

/// Why a refresh did not produce fresh data.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("a refresh is already in flight")]
    InFlight,
    #[error(transparent)]
    Api(#[from] BusNearbyError),
}

/// Returned when a line update is applied to a train-route target.
#[derive(Debug, Error)]
#[error("target {0} is a train route and has no line set")]
pub struct NotAStop(pub String);

/// A consistent view of coordinator state at one instant.
#[derive(Debug, Clone)]
pub struct Observation {
    pub phase: Phase,
    pub snapshot: Option<Arc<Snapshot>>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub interval: Duration,
    /// True when the target should report itself unusable: an error
    /// phase with either no data at all or a failure streak long
    /// enough that the retained snapshot is stale.
    pub unavailable: bool,
}

struct CoordinatorState {
    phase: Phase,
    snapshot: Option<Arc<Snapshot>>,
    consecutive_failures: u32,
    last_error: Option<String>,
    interval: Duration,
}

/// Polling state for one tracked target.
pub struct Coordinator {
    api: Arc<dyn TransitApi>,
    config: CoordinatorConfig,
    key: String,
    target: RwLock<TrackedTarget>,
    state: RwLock<CoordinatorState>,
    // Serializes refreshes; try_lock failure means one is in flight
    refresh_gate: Mutex<()>,
}

impl Coordinator {
    /// Create a coordinator for a target. No refresh happens until
    /// [`Coordinator::refresh`] is called.
    pub fn new(api: Arc<dyn TransitApi>, config: CoordinatorConfig, target: TrackedTarget) -> Self {
        let key = target.key();
        let interval = config.policy.long();
        Self {
            api,
            config,
            key,
            target: RwLock::new(target),
            state: RwLock::new(CoordinatorState {
                phase: Phase::Idle,
                snapshot: None,
                consecutive_failures: 0,
                last_error: None,
                interval,
            }),
            refresh_gate: Mutex::new(()),
        }
    }

    /// The registry key of the tracked target.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// A clone of the tracked target as currently configured.
    pub async fn target(&self) -> TrackedTarget {
        self.target.read().await.clone()
    }

    /// Fetch fresh arrivals and publish a new snapshot.
    ///
    /// Concurrent calls do not stack: a refresh that finds another in
    /// flight returns [`RefreshError::InFlight`] without touching
    /// state. On failure the previous snapshot is retained and the
    /// next poll drops to the slow interval.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, RefreshError> {
        let _gate = self
            .refresh_gate
            .try_lock()
            .map_err(|_| RefreshError::InFlight)?;

        {
            let mut state = self.state.write().await;
            state.phase = Phase::Refreshing;
        }

        let target = self.target.read().await.clone();
        let fetched = match &target {
            TrackedTarget::Stop { id, lines, .. } => {
                self.api
                    .stop_arrivals(id, lines, self.config.max_arrivals as u8)
                    .await
            }
            TrackedTarget::Route { from, to, to_name, .. } => {
                self.api
                    .train_runs(from, to, to_name, self.config.max_arrivals as u8)
                    .await
            }
        };

        let now = Local::now();
        let mut state = self.state.write().await;

        match fetched {
            Ok(arrivals) => {
                let snapshot = Arc::new(Snapshot::capture(arrivals, self.config.max_arrivals, now));
                let soonest_mins = snapshot.soonest().map(|a| a.minutes_until(now));
                state.interval = self.config.policy.interval_for(soonest_mins, now.hour());
                state.phase = Phase::HasData;
                state.consecutive_failures = 0;
                state.last_error = None;
                state.snapshot = Some(Arc::clone(&snapshot));

                info!(
                    target = %self.key,
                    arrivals = snapshot.total(),
                    interval_secs = state.interval.as_secs(),
                    "refresh complete"
                );
                Ok(snapshot)
            }
            Err(e) => {
                state.phase = Phase::Error;
                state.consecutive_failures += 1;
                state.last_error = Some(e.to_string());
                state.interval = self.config.policy.long();

                warn!(
                    target = %self.key,
                    failures = state.consecutive_failures,
                    error = %e,
                    "refresh failed, keeping previous snapshot"
                );
                Err(RefreshError::Api(e))
            }
        }
    }

    /// Snapshot the current state.
    pub async fn observe(&self) -> Observation {
        let state = self.state.read().await;
        let unavailable = state.phase == Phase::Error
            && (state.snapshot.is_none()
                || state.consecutive_failures >= self.config.stale_after);

        Observation {
            phase: state.phase,
            snapshot: state.snapshot.clone(),
            consecutive_failures: state.consecutive_failures,
            last_error: state.last_error.clone(),
            interval: state.interval,
            unavailable,
        }
    }

    /// The interval the scheduler should sleep before the next poll.
    pub async fn current_interval(&self) -> Duration {
        self.state.read().await.interval
    }

    /// Replace the tracked line set of a stop target. Takes effect on
    /// the next refresh.
    pub async fn set_lines(&self, lines: Vec<LineRef>) -> Result<(), NotAStop> {
        let mut target = self.target.write().await;
        match &mut *target {
            TrackedTarget::Stop { lines: tracked, .. } => {
                *tracked = lines;
                Ok(())
            }
            TrackedTarget::Route { .. } => Err(NotAStop(self.key.clone())),
        }
    }
}
