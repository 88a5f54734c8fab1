//! Web layer for the arrival board.
//!
//! Provides an HTML board page and a JSON API for managing tracked
//! targets and reading their sensors.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
pub use templates::*;
