//! Raw BusNearby API response types.
//!
//! Deserialization is strict where the coordinator depends on a field:
//! a response missing `times`, `routeShortName` or the timing fields
//! fails wholesale rather than producing partial records.

use serde::Deserialize;

/// Response from the stop-times endpoint.
#[derive(Debug, Deserialize)]
pub struct StopTimesResponse {
    pub times: Vec<RawStopTime>,
}

/// One departure on a stop's board.
///
/// `serviceDay` is the epoch second of the service day's midnight;
/// `scheduledArrival` / `realtimeArrival` are offsets from it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStopTime {
    pub route_short_name: String,
    pub service_day: i64,
    pub scheduled_arrival: i64,
    pub realtime_arrival: Option<i64>,
    #[serde(default)]
    pub realtime: bool,
    pub headsign: Option<String>,
    pub trip_headsign: Option<String>,
}

/// Response from the journey-plan endpoint.
#[derive(Debug, Deserialize)]
pub struct PlanResponse {
    pub plan: RawPlan,
}

#[derive(Debug, Deserialize)]
pub struct RawPlan {
    pub itineraries: Vec<RawItinerary>,
}

/// One planned train itinerary.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItinerary {
    /// Departure instant, epoch milliseconds.
    pub start_time: i64,
    /// Total journey duration, seconds.
    pub duration: i64,
    #[serde(default)]
    pub realtime: bool,
    #[serde(default)]
    pub legs: Vec<RawLeg>,
}

#[derive(Debug, Deserialize)]
pub struct RawLeg {
    pub mode: String,
    pub to: Option<RawPlace>,
}

#[derive(Debug, Deserialize)]
pub struct RawPlace {
    pub name: Option<String>,
}

/// One match from the stop-search endpoint.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopSearchResult {
    #[serde(alias = "id")]
    pub stop_id: Option<String>,
    pub name: String,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_stop_times() {
        let json = r#"{
            "times": [{
                "routeShortName": "249",
                "serviceDay": 1700000000,
                "scheduledArrival": 36000,
                "realtimeArrival": 36120,
                "realtime": true,
                "headsign": "Central Station"
            }]
        }"#;

        let resp: StopTimesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.times.len(), 1);
        assert_eq!(resp.times[0].route_short_name, "249");
        assert_eq!(resp.times[0].realtime_arrival, Some(36120));
        assert!(resp.times[0].realtime);
    }

    #[test]
    fn stop_time_defaults() {
        // realtime flag and headsigns are optional; timing fields are not
        let json = r#"{
            "routeShortName": "40",
            "serviceDay": 1700000000,
            "scheduledArrival": 36000
        }"#;

        let raw: RawStopTime = serde_json::from_str(json).unwrap();
        assert!(!raw.realtime);
        assert!(raw.realtime_arrival.is_none());
        assert!(raw.headsign.is_none());
    }

    #[test]
    fn missing_route_short_name_fails() {
        let json = r#"{ "serviceDay": 1700000000, "scheduledArrival": 36000 }"#;
        assert!(serde_json::from_str::<RawStopTime>(json).is_err());
    }

    #[test]
    fn missing_times_key_fails() {
        assert!(serde_json::from_str::<StopTimesResponse>(r#"{ "stops": [] }"#).is_err());
    }

    #[test]
    fn parse_plan_response() {
        let json = r#"{
            "plan": {
                "itineraries": [{
                    "startTime": 1700000000000,
                    "duration": 3600,
                    "realtime": false,
                    "legs": [
                        { "mode": "WALK", "to": { "name": "Platform 1" } },
                        { "mode": "RAIL", "to": { "name": "Haifa Center" } }
                    ]
                }]
            }
        }"#;

        let resp: PlanResponse = serde_json::from_str(json).unwrap();
        let itinerary = &resp.plan.itineraries[0];
        assert_eq!(itinerary.start_time, 1_700_000_000_000);
        assert_eq!(itinerary.duration, 3600);
        assert_eq!(itinerary.legs.len(), 2);
        assert_eq!(itinerary.legs[1].mode, "RAIL");
    }

    #[test]
    fn parse_stop_search_with_id_alias() {
        let json = r#"[
            { "stopId": "24068", "name": "Herzl / Rothschild", "city": "Rishon" },
            { "id": "24069", "name": "Herzl / Jabotinsky" }
        ]"#;

        let results: Vec<StopSearchResult> = serde_json::from_str(json).unwrap();
        assert_eq!(results[0].stop_id.as_deref(), Some("24068"));
        assert_eq!(results[1].stop_id.as_deref(), Some("24069"));
        assert!(results[1].city.is_none());
    }
}
