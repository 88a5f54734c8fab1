//! Polling coordination.
//!
//! The update path for a tracked target: a [`Coordinator`] holds its
//! snapshot and failure state, [`IntervalPolicy`] decides how fast to
//! poll, a scheduler task drives the loop, and [`TargetRegistry`] owns
//! the lot keyed by target.

mod coordinator;
mod interval;
mod registry;
mod scheduler;

pub use coordinator::{Coordinator, CoordinatorConfig, NotAStop, Observation, Phase, RefreshError};
pub use interval::{IntervalPolicy, Tier};
pub use registry::{RegistryError, TargetRegistry};
pub use scheduler::{ScheduleHandle, spawn_refresh_loop};
