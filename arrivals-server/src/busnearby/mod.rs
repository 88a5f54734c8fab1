//! BusNearby HTTP client.
//!
//! Client for the BusNearby public-transit API (Israeli bus, light
//! rail and train data). Three endpoints matter here:
//!
//! - `stoptimes` — upcoming departures at one stop, realtime where the
//!   operator publishes it;
//! - `plan` — OTP-style train itineraries between two stations;
//! - `stopSearch` — free-text stop lookup, also used to validate
//!   configured stop ids.
//!
//! Timestamps are epoch-based: stop times carry a `serviceDay` base
//! plus seconds-from-midnight offsets, itineraries carry millisecond
//! epochs.

mod client;
mod convert;
mod error;
mod types;

pub use client::{BusNearbyClient, BusNearbyConfig, TransitApi, backoff_delay};
pub use convert::ConversionError;
pub use error::BusNearbyError;
pub use types::{
    PlanResponse, RawItinerary, RawLeg, RawPlace, RawStopTime, StopSearchResult, StopTimesResponse,
};
