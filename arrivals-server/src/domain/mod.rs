//! Domain types for tracked transit targets and their arrivals.

mod arrival;
mod line;
mod snapshot;
mod stop;
mod target;

pub use arrival::Arrival;
pub use line::{InvalidLineRef, LineRef};
pub use snapshot::Snapshot;
pub use stop::{InvalidStopId, StopId};
pub use target::{TargetError, TargetFileError, TrackedTarget, load_targets};
