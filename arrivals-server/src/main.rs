use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use arrivals_server::busnearby::{BusNearbyClient, BusNearbyConfig, TransitApi};
use arrivals_server::coordinator::{CoordinatorConfig, TargetRegistry};
use arrivals_server::directory::{DirectoryConfig, StopDirectory};
use arrivals_server::domain::load_targets;
use arrivals_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Upstream endpoints are overridable for local mocks
    let mut api_config = BusNearbyConfig::default();
    if let Ok(url) = std::env::var("BUSNEARBY_BASE_URL") {
        api_config = api_config.with_base_url(url);
    }
    if let Ok(url) = std::env::var("BUSNEARBY_SEARCH_URL") {
        api_config = api_config.with_search_url(url);
    }

    let client = Arc::new(
        BusNearbyClient::new(api_config).expect("Failed to create BusNearby client"),
    );

    let api: Arc<dyn TransitApi> = client.clone();
    let registry = Arc::new(TargetRegistry::new(api, CoordinatorConfig::default()));
    let directory = Arc::new(StopDirectory::new(
        Arc::clone(&client),
        DirectoryConfig::default(),
    ));

    // Seed targets from a config file, if one is given
    if let Ok(path) = std::env::var("TARGETS_FILE") {
        match load_targets(Path::new(&path)) {
            Ok(targets) => {
                info!(path, count = targets.len(), "loading configured targets");
                for target in targets {
                    if let Err(e) = registry.create(target).await {
                        warn!(error = %e, "skipping configured target");
                    }
                }
            }
            Err(e) => {
                error!(path, error = %e, "could not load targets file");
                std::process::exit(1);
            }
        }
    }

    let state = AppState::new(Arc::clone(&registry), directory);
    let app = create_router(state);

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
        .parse()
        .expect("BIND_ADDR must be host:port");

    info!(%addr, "arrival board listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    info!("shutting down refresh loops");
    registry.shutdown().await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "could not listen for the shutdown signal");
    }
}
