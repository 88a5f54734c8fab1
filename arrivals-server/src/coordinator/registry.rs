//! Registry of tracked targets.
//!
//! Owns one coordinator plus its refresh loop per target, keyed by the
//! target's stable key. Adding, removing and reconfiguring targets at
//! runtime goes through here.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::busnearby::TransitApi;
use crate::domain::{LineRef, TrackedTarget};

use super::coordinator::{Coordinator, CoordinatorConfig};
use super::scheduler::{ScheduleHandle, spawn_refresh_loop};

/// Registry-level failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("target {0} is already tracked")]
    Duplicate(String),
    #[error("no tracked target with key {0}")]
    Unknown(String),
    #[error("target {0} is a train route and has no line set")]
    NotAStop(String),
}

struct RegistryEntry {
    coordinator: Arc<Coordinator>,
    handle: ScheduleHandle,
}

/// All tracked targets and their refresh loops.
pub struct TargetRegistry {
    api: Arc<dyn TransitApi>,
    config: CoordinatorConfig,
    entries: RwLock<HashMap<String, RegistryEntry>>,
}

impl TargetRegistry {
    /// Create an empty registry.
    pub fn new(api: Arc<dyn TransitApi>, config: CoordinatorConfig) -> Self {
        Self {
            api,
            config,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Start tracking a target. Spawns its refresh loop, which polls
    /// immediately.
    pub async fn create(&self, target: TrackedTarget) -> Result<Arc<Coordinator>, RegistryError> {
        let key = target.key();
        let mut entries = self.entries.write().await;

        if entries.contains_key(&key) {
            return Err(RegistryError::Duplicate(key));
        }

        info!(target = %key, description = %target.description(), "tracking new target");

        let coordinator = Arc::new(Coordinator::new(
            Arc::clone(&self.api),
            self.config.clone(),
            target,
        ));
        let handle = spawn_refresh_loop(Arc::clone(&coordinator));

        entries.insert(
            key,
            RegistryEntry {
                coordinator: Arc::clone(&coordinator),
                handle,
            },
        );
        Ok(coordinator)
    }

    /// Stop tracking a target and wait for its loop to exit.
    pub async fn remove(&self, key: &str) -> Result<(), RegistryError> {
        let entry = self
            .entries
            .write()
            .await
            .remove(key)
            .ok_or_else(|| RegistryError::Unknown(key.to_string()))?;

        info!(target = %key, "target removed");
        entry.handle.stop().await;
        Ok(())
    }

    /// The coordinator for a tracked target.
    pub async fn get(&self, key: &str) -> Result<Arc<Coordinator>, RegistryError> {
        self.entries
            .read()
            .await
            .get(key)
            .map(|e| Arc::clone(&e.coordinator))
            .ok_or_else(|| RegistryError::Unknown(key.to_string()))
    }

    /// All coordinators, sorted by key.
    pub async fn list(&self) -> Vec<Arc<Coordinator>> {
        let entries = self.entries.read().await;
        let mut coordinators: Vec<_> = entries
            .values()
            .map(|e| Arc::clone(&e.coordinator))
            .collect();
        coordinators.sort_by(|a, b| a.key().cmp(b.key()));
        coordinators
    }

    /// Number of tracked targets.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Replace the tracked lines of a stop target.
    pub async fn replace_lines(&self, key: &str, lines: Vec<LineRef>) -> Result<(), RegistryError> {
        let coordinator = self.get(key).await?;
        coordinator
            .set_lines(lines)
            .await
            .map_err(|e| RegistryError::NotAStop(e.0))
    }

    /// Stop every refresh loop. Called on server shutdown.
    pub async fn shutdown(&self) {
        let handles: Vec<ScheduleHandle> = {
            let mut entries = self.entries.write().await;
            entries
                .drain()
                .map(|(_, entry)| entry.handle)
                .collect()
        };

        info!(targets = handles.len(), "stopping refresh loops");
        futures::future::join_all(handles.into_iter().map(ScheduleHandle::stop)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::coordinator::interval::IntervalPolicy;
    use crate::coordinator::testutil::ScriptedApi;

    fn slow_config() -> CoordinatorConfig {
        // Long enough that only the initial poll fires during a test
        CoordinatorConfig {
            policy: IntervalPolicy {
                short: Duration::from_secs(60),
                medium: Duration::from_secs(60),
                long: Duration::from_secs(60),
                ..IntervalPolicy::default()
            },
            ..CoordinatorConfig::default()
        }
    }

    fn stop_target(id: &str) -> TrackedTarget {
        TrackedTarget::stop(id, None, &["18".to_string()]).unwrap()
    }

    #[tokio::test]
    async fn create_and_get() {
        let api = Arc::new(ScriptedApi::repeating_ok(vec![]));
        let registry = TargetRegistry::new(api, slow_config());

        registry.create(stop_target("12345")).await.unwrap();
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.get("12345").await.unwrap().key(), "12345");

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn duplicate_key_is_rejected() {
        let api = Arc::new(ScriptedApi::repeating_ok(vec![]));
        let registry = TargetRegistry::new(api, slow_config());

        registry.create(stop_target("12345")).await.unwrap();
        match registry.create(stop_target("12345")).await {
            Err(RegistryError::Duplicate(key)) => assert_eq!(key, "12345"),
            other => panic!("expected Duplicate, got {:?}", other.map(|c| c.key().to_string())),
        }

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn remove_stops_tracking() {
        let api = Arc::new(ScriptedApi::repeating_ok(vec![]));
        let registry = TargetRegistry::new(api, slow_config());

        registry.create(stop_target("12345")).await.unwrap();
        registry.remove("12345").await.unwrap();

        assert_eq!(registry.len().await, 0);
        assert!(matches!(
            registry.remove("12345").await,
            Err(RegistryError::Unknown(_))
        ));
    }

    #[tokio::test]
    async fn list_is_sorted_by_key() {
        let api = Arc::new(ScriptedApi::repeating_ok(vec![]));
        let registry = TargetRegistry::new(api, slow_config());

        registry.create(stop_target("900")).await.unwrap();
        registry.create(stop_target("100")).await.unwrap();
        registry.create(stop_target("500")).await.unwrap();

        let keys: Vec<String> = registry
            .list()
            .await
            .iter()
            .map(|c| c.key().to_string())
            .collect();
        assert_eq!(keys, vec!["100", "500", "900"]);

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn replace_lines_rejects_route_targets() {
        let api = Arc::new(ScriptedApi::repeating_ok(vec![]));
        let registry = TargetRegistry::new(api, slow_config());

        let route = TrackedTarget::route("3600", "4900", None, None).unwrap();
        registry.create(route).await.unwrap();

        assert!(matches!(
            registry
                .replace_lines("3600_4900", vec![LineRef::parse("18").unwrap()])
                .await,
            Err(RegistryError::NotAStop(_))
        ));

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn targets_refresh_independently() {
        let api = Arc::new(ScriptedApi::repeating_ok(vec![]));
        let registry = TargetRegistry::new(api, slow_config());

        let first = registry.create(stop_target("100")).await.unwrap();
        let second = registry.create(stop_target("200")).await.unwrap();

        // Give both initial polls time to land
        tokio::time::sleep(Duration::from_millis(20)).await;
        let before = second.observe().await;

        first.refresh().await.unwrap();
        let after = second.observe().await;

        // Refreshing one target leaves the other's snapshot untouched
        match (&before.snapshot, &after.snapshot) {
            (Some(a), Some(b)) => assert!(Arc::ptr_eq(a, b)),
            other => panic!("expected snapshots on both observations, got {other:?}"),
        }

        registry.shutdown().await;
    }
}
