use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use onos_sync_core::EventBus;
use onos_sync_storage::DynModelStore;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared handles the HTTP handlers work with.
#[derive(Clone)]
pub struct AppState {
    pub store: DynModelStore,
    pub bus: Arc<EventBus>,
}

impl AppState {
    pub fn new(store: DynModelStore, bus: Arc<EventBus>) -> Self {
        Self { store, bus }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/status", get(handlers::status))
        // Event ingest, e.g. POST /events/xos.kubernetes.pod-details
        .route("/events/{topic}", post(handlers::publish_event))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct OnosSyncServer {
    addr: SocketAddr,
    app: Router,
}

impl OnosSyncServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self {
            addr,
            app: build_app(state),
        }
    }

    /// Serves until ctrl-c.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

pub async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
