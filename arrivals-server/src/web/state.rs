//! Application state for the web layer.

use std::sync::Arc;

use crate::coordinator::TargetRegistry;
use crate::directory::StopDirectory;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Tracked targets and their refresh loops
    pub registry: Arc<TargetRegistry>,

    /// Stop lookup and validation
    pub directory: Arc<StopDirectory>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(registry: Arc<TargetRegistry>, directory: Arc<StopDirectory>) -> Self {
        Self {
            registry,
            directory,
        }
    }
}
