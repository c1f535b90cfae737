//! Wires the store, event bus, scheduler and HTTP surface into one process.

use std::time::Duration;

use anyhow::Context;
use onos_sync_core::{CallerId, EventBus};
use onos_sync_gateway::OnosClient;
use onos_sync_reconciler::{ConfigPusher, EventInvalidator, LocalConfigWriter, SyncScheduler};
use tokio::sync::watch;
use tracing::info;

use crate::bootstrap::{apply_snapshot, load_snapshot};
use crate::config::AppConfig;
use crate::server::{AppState, OnosSyncServer};

pub struct Daemon {
    state: AppState,
    scheduler: SyncScheduler,
    invalidator: EventInvalidator,
    poll_interval: Duration,
}

impl Daemon {
    /// Builds every component and loads the bootstrap snapshot, if any.
    pub async fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let store = onos_sync_db_memory::create_model_store();

        if let Some(path) = &cfg.bootstrap.snapshot {
            let snapshot = load_snapshot(path).await?;
            let caller = CallerId::new(cfg.bootstrap.caller.trim());
            apply_snapshot(store.as_ref(), snapshot, &caller)
                .await
                .with_context(|| format!("bootstrapping from {}", path.display()))?;
        }

        let client = OnosClient::new(&cfg.gateway_config()).context("building ONOS client")?;
        let files = LocalConfigWriter::new(cfg.files.dir.clone());
        let pusher = ConfigPusher::new(client, files);

        Ok(Self {
            scheduler: SyncScheduler::new(store.clone(), pusher, cfg.retry_policy()),
            invalidator: EventInvalidator::new(store.clone()),
            state: AppState::new(store, EventBus::new_shared()),
            poll_interval: cfg.poll_interval(),
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn scheduler(&self) -> &SyncScheduler {
        &self.scheduler
    }

    /// Serves HTTP on `cfg.addr()` while the scheduler and invalidator run in
    /// the background. Returns after ctrl-c once the scheduler has stopped.
    pub async fn run(self, cfg: &AppConfig) -> anyhow::Result<()> {
        let Self {
            state,
            scheduler,
            invalidator,
            poll_interval,
        } = self;

        let receiver = state.bus.subscribe();
        let invalidator_task = tokio::spawn(async move { invalidator.run(receiver).await });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let scheduler_task =
            tokio::spawn(async move { scheduler.run(poll_interval, shutdown_rx).await });

        info!(
            backend = state.store.backend_name(),
            poll_interval_ms = poll_interval.as_millis() as u64,
            "ONOS synchronizer started"
        );
        let served = OnosSyncServer::new(cfg.addr(), state).run().await;

        let _ = shutdown_tx.send(true);
        invalidator_task.abort();
        if let Err(e) = scheduler_task.await {
            tracing::warn!(error = %e, "Scheduler task ended abnormally");
        }
        served
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onos_sync_storage::AppFilter;

    #[tokio::test]
    async fn test_from_config_loads_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(
            &path,
            r#"{
                "services": [{"name": "onos", "rest_hostname": "127.0.0.1", "rest_port": 1}],
                "apps": [{"name": "olt", "app_id": "org.opencord.olt", "service": "onos"}]
            }"#,
        )
        .unwrap();

        let mut cfg = AppConfig::default();
        cfg.bootstrap.snapshot = Some(path);
        cfg.bootstrap.caller = "ops".into();

        let daemon = Daemon::from_config(&cfg).await.unwrap();
        let apps = daemon
            .state()
            .store
            .filter_apps(&AppFilter::new())
            .await
            .unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].creator, Some(CallerId::new("ops")));
    }

    #[tokio::test]
    async fn test_missing_snapshot_fails_startup() {
        let mut cfg = AppConfig::default();
        cfg.bootstrap.snapshot = Some("/nonexistent/seed.json".into());
        let err = Daemon::from_config(&cfg).await.err().unwrap();
        assert!(err.to_string().contains("seed.json"));
    }
}
