//! BusNearby HTTP client.
//!
//! Handles request construction, bounded retry with exponential
//! backoff for transient failures, and conversion to domain types.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::{Arrival, LineRef, StopId};

use super::convert::{itineraries_to_arrivals, stop_times_to_arrivals};
use super::error::BusNearbyError;
use super::types::{PlanResponse, StopSearchResult, StopTimesResponse};

/// Default base URL for departure and plan queries.
const DEFAULT_BASE_URL: &str = "https://api.busnearby.co.il";

/// Default URL for the stop-search endpoint (served from the app host,
/// not the API host).
const DEFAULT_SEARCH_URL: &str = "https://app.busnearby.co.il/stopSearch";

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default retry bound for transient failures.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff.
const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(2);

/// Default lookahead window for stop times, in seconds (24 hours).
const DEFAULT_LOOKAHEAD_SECS: u32 = 86_400;

/// Configuration for the BusNearby client.
#[derive(Debug, Clone)]
pub struct BusNearbyConfig {
    /// Base URL for departure and plan queries
    pub base_url: String,
    /// URL for the stop-search endpoint
    pub search_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum retries for transient failures
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_base_delay: Duration,
    /// Lookahead window for stop times, seconds
    pub lookahead_secs: u32,
    /// Locale passed to the search endpoint
    pub locale: String,
}

impl Default for BusNearbyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            lookahead_secs: DEFAULT_LOOKAHEAD_SECS,
            locale: "he".to_string(),
        }
    }
}

impl BusNearbyConfig {
    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set a custom search URL (for testing).
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry bound.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the backoff base delay.
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }
}

/// Compute the backoff delay before retry number `attempt` (0-based).
///
/// Doubles per attempt: `base`, `2*base`, `4*base`, ... Strictly
/// increasing for any non-zero base.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Seam between the coordinator and the upstream API.
///
/// The real client implements this; tests substitute scripted fakes.
#[async_trait]
pub trait TransitApi: Send + Sync {
    /// Upcoming arrivals at a stop, optionally filtered to a line set
    /// (an empty set means no filter).
    async fn stop_arrivals(
        &self,
        stop: &StopId,
        lines: &[LineRef],
        per_line: u8,
    ) -> Result<Vec<Arrival>, BusNearbyError>;

    /// Upcoming train departures between two stations, grouped under
    /// the train-route key.
    async fn train_runs(
        &self,
        from: &StopId,
        to: &StopId,
        to_name: &str,
        max_results: u8,
    ) -> Result<Vec<Arrival>, BusNearbyError>;
}

/// BusNearby API client.
#[derive(Debug, Clone)]
pub struct BusNearbyClient {
    http: reqwest::Client,
    config: BusNearbyConfig,
}

/// Transient failure kinds eligible for retry.
enum Transient {
    Timeout,
    Connect(String),
}

impl BusNearbyClient {
    /// Create a new client with the given configuration.
    pub fn new(config: BusNearbyConfig) -> Result<Self, BusNearbyError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        // The upstream rejects requests without an app referer
        headers.insert(REFERER, HeaderValue::from_static("https://app.busnearby.co.il"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| BusNearbyError::Connection(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Upcoming departures at a stop.
    ///
    /// # Arguments
    ///
    /// * `stop` - Stop to query
    /// * `lines` - Lines to keep; empty means all
    /// * `per_line` - Departures to request per line
    pub async fn stop_times(
        &self,
        stop: &StopId,
        lines: &[LineRef],
        per_line: u8,
    ) -> Result<Vec<Arrival>, BusNearbyError> {
        let url = format!(
            "{}/directions/index/stops/{}/stoptimes",
            self.config.base_url,
            stop.qualified()
        );

        let params = [
            ("numberOfDepartures", per_line.to_string()),
            ("timeRange", self.config.lookahead_secs.to_string()),
            ("currentTime", Local::now().timestamp().to_string()),
        ];

        debug!(stop = %stop, ?lines, "fetching stop times");

        let response: StopTimesResponse = self
            .get_json(&url, &params)
            .await
            .map_err(|e| not_found_on_404(e, stop))?;

        let mut arrivals = stop_times_to_arrivals(response.times)
            .map_err(|e| BusNearbyError::Malformed {
                message: e.to_string(),
                body: None,
            })?;

        if !lines.is_empty() {
            arrivals.retain(|a| lines.contains(&a.line));
        }

        debug!(stop = %stop, count = arrivals.len(), "retrieved arrivals");
        Ok(arrivals)
    }

    /// Planned train itineraries between two stations.
    pub async fn plan_routes(
        &self,
        from: &StopId,
        to: &StopId,
        to_name: &str,
        max_results: u8,
    ) -> Result<Vec<Arrival>, BusNearbyError> {
        let url = format!("{}/directions/plan", self.config.base_url);

        let params = [
            ("fromPlace", from.qualified()),
            ("toPlace", to.qualified()),
            ("numItineraries", max_results.to_string()),
            ("mode", "RAIL,WALK".to_string()),
        ];

        debug!(from = %from, to = %to, "fetching train routes");

        let response: PlanResponse = self
            .get_json(&url, &params)
            .await
            .map_err(|e| not_found_on_404(e, from))?;

        let runs = itineraries_to_arrivals(response.plan.itineraries, to_name).map_err(|e| {
            BusNearbyError::Malformed {
                message: e.to_string(),
                body: None,
            }
        })?;

        debug!(from = %from, to = %to, count = runs.len(), "retrieved train runs");
        Ok(runs)
    }

    /// Free-text stop search. An empty result list is not an error
    /// here; callers decide whether that means not-found.
    pub async fn search_stops(&self, query: &str) -> Result<Vec<StopSearchResult>, BusNearbyError> {
        let params = [
            ("query", query.to_string()),
            ("locale", self.config.locale.clone()),
        ];

        debug!(query, "searching stops");
        self.get_json(self.config.search_url.as_str(), &params).await
    }

    /// Perform a GET request with bounded retry on transient failures.
    ///
    /// Connection resources are scoped to each attempt; nothing is
    /// held across the backoff sleep.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, BusNearbyError> {
        let mut attempt: u32 = 0;

        loop {
            let transient = match self.http.get(url).query(params).send().await {
                Ok(response) => {
                    let status = response.status();

                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(BusNearbyError::Api {
                            status: status.as_u16(),
                            message: body,
                        });
                    }

                    let body = response
                        .text()
                        .await
                        .map_err(|e| BusNearbyError::Connection(e.to_string()))?;

                    return serde_json::from_str(&body)
                        .map_err(|e| BusNearbyError::malformed(e.to_string(), &body));
                }
                Err(e) if e.is_timeout() => Transient::Timeout,
                Err(e) => Transient::Connect(e.to_string()),
            };

            if attempt >= self.config.max_retries {
                return Err(match transient {
                    Transient::Timeout => BusNearbyError::Timeout {
                        retries: self.config.max_retries,
                    },
                    Transient::Connect(message) => BusNearbyError::Connection(message),
                });
            }

            let delay = backoff_delay(self.config.retry_base_delay, attempt);
            warn!(
                url,
                attempt = attempt + 1,
                max_retries = self.config.max_retries,
                delay_ms = delay.as_millis() as u64,
                "transient request failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Map a 404 API status to the not-found variant for `ident`.
fn not_found_on_404(err: BusNearbyError, ident: &StopId) -> BusNearbyError {
    match err {
        BusNearbyError::Api { status: 404, .. } => BusNearbyError::NotFound(ident.to_string()),
        other => other,
    }
}

#[async_trait]
impl TransitApi for BusNearbyClient {
    async fn stop_arrivals(
        &self,
        stop: &StopId,
        lines: &[LineRef],
        per_line: u8,
    ) -> Result<Vec<Arrival>, BusNearbyError> {
        self.stop_times(stop, lines, per_line).await
    }

    async fn train_runs(
        &self,
        from: &StopId,
        to: &StopId,
        to_name: &str,
        max_results: u8,
    ) -> Result<Vec<Arrival>, BusNearbyError> {
        self.plan_routes(from, to, to_name, max_results).await
    }
}
