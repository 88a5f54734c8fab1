//! Stop lookup and validation.
//!
//! Wraps the free-text stop search with a cache of resolved stop
//! names, so repeated validation of the same configured stop does not
//! hit the upstream each time.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::busnearby::{BusNearbyClient, BusNearbyError, StopSearchResult};
use crate::domain::StopId;

/// Configuration for the directory cache.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// How long a resolved stop name stays cached
    pub ttl: Duration,
    /// Maximum number of cached names
    pub max_capacity: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            // Stop names effectively never change within a day
            ttl: Duration::from_secs(6 * 60 * 60),
            max_capacity: 1024,
        }
    }
}

/// Cached stop lookup over the search endpoint.
pub struct StopDirectory {
    client: Arc<BusNearbyClient>,
    names: Cache<String, String>,
}

impl StopDirectory {
    /// Create a directory backed by the given client.
    pub fn new(client: Arc<BusNearbyClient>, config: DirectoryConfig) -> Self {
        let names = Cache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();
        Self { client, names }
    }

    /// Free-text stop search, uncached.
    pub async fn search(&self, query: &str) -> Result<Vec<StopSearchResult>, BusNearbyError> {
        self.client.search_stops(query).await
    }

    /// Check that a stop id is known to the upstream and return its
    /// display name. Names are cached; a miss queries the search
    /// endpoint with the bare id.
    pub async fn validate(&self, stop: &StopId) -> Result<String, BusNearbyError> {
        if let Some(name) = self.names.get(stop.as_str()).await {
            debug!(stop = %stop, name, "stop name served from cache");
            return Ok(name);
        }

        let results = self.client.search_stops(stop.as_str()).await?;
        let name = results
            .into_iter()
            .next()
            .map(|r| r.name)
            .ok_or_else(|| BusNearbyError::NotFound(stop.to_string()))?;

        debug!(stop = %stop, name, "stop validated against upstream");
        self.names
            .insert(stop.as_str().to_string(), name.clone())
            .await;
        Ok(name)
    }
}
