//! Conversion from raw API responses to domain arrivals.

use chrono::{DateTime, Local, TimeZone};

use crate::domain::{Arrival, LineRef};

use super::types::{RawItinerary, RawStopTime};

/// Errors produced while converting raw responses to domain types.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Timestamp arithmetic produced an unrepresentable instant
    #[error("invalid arrival timestamp: {0}")]
    InvalidTimestamp(i64),

    /// Route short name failed line validation
    #[error("invalid route short name: {0:?}")]
    InvalidLine(String),
}

/// Convert stop-times records into domain arrivals.
///
/// The arrival instant is `serviceDay + realtimeArrival`, falling back
/// to the scheduled offset when no realtime estimate exists.
pub fn stop_times_to_arrivals(times: Vec<RawStopTime>) -> Result<Vec<Arrival>, ConversionError> {
    times
        .into_iter()
        .map(|raw| {
            let line = LineRef::parse(&raw.route_short_name)
                .map_err(|_| ConversionError::InvalidLine(raw.route_short_name.clone()))?;

            let offset = raw.realtime_arrival.unwrap_or(raw.scheduled_arrival);
            let epoch = raw.service_day + offset;
            let expected = local_from_epoch(epoch)?;

            let destination = raw
                .headsign
                .or(raw.trip_headsign)
                .unwrap_or_else(|| "Unknown".to_string());

            Ok(Arrival {
                line,
                expected,
                realtime: raw.realtime,
                destination,
                journey_mins: None,
            })
        })
        .collect()
}

/// Convert planned train itineraries into domain arrivals under the
/// [`LineRef::train_route`] grouping key.
///
/// The description is built from the rail legs' destination names;
/// `fallback_destination` is used for itineraries with no rail legs.
pub fn itineraries_to_arrivals(
    itineraries: Vec<RawItinerary>,
    fallback_destination: &str,
) -> Result<Vec<Arrival>, ConversionError> {
    itineraries
        .into_iter()
        .map(|raw| {
            let expected = Local
                .timestamp_millis_opt(raw.start_time)
                .single()
                .ok_or(ConversionError::InvalidTimestamp(raw.start_time))?;

            let stations: Vec<String> = raw
                .legs
                .iter()
                .filter(|leg| leg.mode == "RAIL")
                .filter_map(|leg| leg.to.as_ref().and_then(|place| place.name.clone()))
                .collect();

            let destination = if stations.is_empty() {
                fallback_destination.to_string()
            } else {
                stations.join(" \u{2192} ")
            };

            Ok(Arrival {
                line: LineRef::train_route(),
                expected,
                realtime: raw.realtime,
                destination,
                journey_mins: Some(raw.duration / 60),
            })
        })
        .collect()
}

fn local_from_epoch(secs: i64) -> Result<DateTime<Local>, ConversionError> {
    Local
        .timestamp_opt(secs, 0)
        .single()
        .ok_or(ConversionError::InvalidTimestamp(secs))
}
