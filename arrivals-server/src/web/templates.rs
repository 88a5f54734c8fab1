//! Askama templates for the arrival board.

use askama::Template;
use chrono::{DateTime, Local};

use crate::coordinator::Coordinator;
use crate::sensor::{SensorReading, readings};

/// Arrival board page listing every tracked target.
#[derive(Template)]
#[template(path = "board.html")]
pub struct BoardTemplate {
    pub targets: Vec<TargetView>,
}

/// One target on the board.
#[derive(Debug, Clone)]
pub struct TargetView {
    pub key: String,
    pub description: String,
    pub unavailable: bool,
    pub last_error: Option<String>,
    pub readings: Vec<ReadingView>,
}

impl TargetView {
    /// Build the view for a coordinator's current state.
    pub async fn build(coordinator: &Coordinator, now: DateTime<Local>) -> Self {
        let target = coordinator.target().await;
        let obs = coordinator.observe().await;
        let projected = readings(&target, &obs, now);

        Self {
            key: target.key(),
            description: target.description(),
            unavailable: obs.unavailable,
            last_error: obs.last_error.clone(),
            readings: projected.iter().map(ReadingView::from_reading).collect(),
        }
    }
}

/// One line's reading on the board.
#[derive(Debug, Clone)]
pub struct ReadingView {
    pub line: String,
    pub state: String,
    pub unit: Option<String>,
    pub destination: Option<String>,
    pub realtime: bool,
}

impl ReadingView {
    /// Build from a projected reading.
    pub fn from_reading(reading: &SensorReading) -> Self {
        Self {
            line: reading.line.as_str().to_string(),
            state: reading.value.label(),
            unit: reading.value.unit().map(str::to_string),
            destination: reading.destination.clone(),
            realtime: reading.realtime,
        }
    }
}
