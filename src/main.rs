// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::application::connectivity::ConnectivityTracker;
use crate::application::event_bus::EventBus;
use crate::application::preset_service::PresetRepository;
use crate::domain::events::ChargerEvent;
use crate::infrastructure::config::load_charger_config;
use crate::infrastructure::http_charger_client::HttpChargerClient;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_charger_config()?;

    // Charger client (infrastructure layer)
    let client = Arc::new(HttpChargerClient::new(&config.host));
    tracing::info!(charger = client.base_url(), "using charger");

    // Services (application layer)
    let bus = EventBus::new(config.event_capacity);
    let tracker = ConnectivityTracker::new(client.clone(), bus.clone(), config.tracker_settings());
    let presets = PresetRepository::new(client, bus.clone());

    let cancel = CancellationToken::new();
    let polling = tokio::spawn(tracker.clone().run(cancel.clone()));
    tokio::spawn(log_events(bus.subscribe()));

    let state = Arc::new(AppState { tracker, presets });
    let router = router(state);

    // Start server
    let addr: SocketAddr = config.listen_addr.parse()?;
    tracing::info!(%addr, "starting charger-link");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    cancel.cancel();
    polling.await?;
    Ok(())
}

/// Stand-in consumer: surface what a UI would toast
async fn log_events(mut rx: tokio::sync::broadcast::Receiver<ChargerEvent>) {
    loop {
        match rx.recv().await {
            Ok(event @ ChargerEvent::ChannelActivity { .. }) => tracing::trace!(%event),
            Ok(event) => tracing::info!(%event),
            Err(RecvError::Lagged(n)) => tracing::debug!(skipped = n, "event log lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
