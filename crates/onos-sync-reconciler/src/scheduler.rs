//! Drives the reconcilers over every record that needs work.
//!
//! A pass first tears down deleted records leaf-first (attributes, then
//! apps) and purges them, then syncs due records root-first (services,
//! apps, attributes). Records are handled one at a time, so a record is
//! never reconciled twice concurrently.

use std::time::Duration;

use onos_sync_core::{
    AppRecord, Attribute, BackendCode, BackendStatus, ControllerService, RecordId, RecordKind,
};
use onos_sync_storage::{
    AppFilter, AttributeFilter, DynModelStore, ServiceFilter, StorageError,
};
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::app::AppReconciler;
use crate::config_push::ConfigPusher;
use crate::outcome::{SyncError, SyncOutcome};
use crate::service::ServiceReconciler;
use crate::target::SyncTarget;

/// Exponential backoff after fatal failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(60),
            max: Duration::from_secs(3600),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt once `failures` consecutive failures happened.
    pub fn delay_for(&self, failures: u32) -> Duration {
        let factor = 2u32.checked_pow(failures.saturating_sub(1));
        factor
            .and_then(|f| self.base.checked_mul(f))
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub converged: usize,
    pub deferred: usize,
    pub failed: usize,
    pub purged: usize,
}

impl PassReport {
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }

    fn count(&mut self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Converged => self.converged += 1,
            SyncOutcome::Deferred(_) => self.deferred += 1,
            SyncOutcome::Failed(_) => self.failed += 1,
        }
    }
}

pub struct SyncScheduler {
    store: DynModelStore,
    apps: AppReconciler,
    services: ServiceReconciler,
    retry: RetryPolicy,
}

impl SyncScheduler {
    pub fn new(store: DynModelStore, pusher: ConfigPusher, retry: RetryPolicy) -> Self {
        Self {
            apps: AppReconciler::new(store.clone(), pusher.clone()),
            services: ServiceReconciler::new(store.clone(), pusher),
            store,
            retry,
        }
    }

    pub fn app_reconciler(&self) -> &AppReconciler {
        &self.apps
    }

    pub fn service_reconciler(&self) -> &ServiceReconciler {
        &self.services
    }

    /// Runs passes every `poll_interval` until `shutdown` flips to true.
    pub async fn run(&self, poll_interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(poll_interval);
        info!(interval_ms = poll_interval.as_millis() as u64, "Sync scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_pass().await {
                        Ok(report) if !report.is_idle() => {
                            info!(
                                converged = report.converged,
                                deferred = report.deferred,
                                failed = report.failed,
                                purged = report.purged,
                                "Sync pass finished"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => error!(error = %e, "Sync pass aborted"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Sync scheduler stopping");
                        break;
                    }
                }
            }
        }
    }

    pub async fn run_pass(&self) -> Result<PassReport, StorageError> {
        let mut report = PassReport::default();
        let now = OffsetDateTime::now_utc();
        self.delete_pass(&mut report, now).await?;
        self.sync_pass(&mut report, now).await?;
        Ok(report)
    }

    async fn delete_pass(&self, report: &mut PassReport, now: OffsetDateTime) -> Result<(), StorageError> {
        let attributes = self
            .store
            .filter_attributes(&AttributeFilter::new().with_deleted(true))
            .await?;
        for attribute in attributes.into_iter().filter(|a| teardown_due(&a.status, now)) {
            let outcome = match SyncTarget::for_attribute(self.store.as_ref(), attribute.clone()).await {
                Ok(target) => self.delete_target(&target).await,
                // owner already gone, nothing left to tear down remotely
                Err(e @ SyncError::Precondition { .. }) => {
                    debug!(id = %attribute.id, error = %e, "Attribute owner missing");
                    SyncOutcome::Converged
                }
                Err(e) => SyncOutcome::Failed(e),
            };
            self.finish_delete(RecordKind::Attribute, attribute.id, &outcome, report)
                .await?;
            if let SyncOutcome::Failed(_) = outcome {
                self.write_attribute_status(attribute, &outcome).await?;
            }
        }

        let apps = self
            .store
            .filter_apps(&AppFilter::new().with_deleted(true))
            .await?;
        for app in apps.into_iter().filter(|a| teardown_due(&a.status, now)) {
            let outcome = self.apps.delete_record(&SyncTarget::App(app.clone())).await;
            self.finish_delete(RecordKind::App, app.id, &outcome, report)
                .await?;
            if let SyncOutcome::Failed(_) = outcome {
                self.write_app_status(app, &outcome).await?;
            }
        }
        Ok(())
    }

    async fn delete_target(&self, target: &SyncTarget) -> SyncOutcome {
        match target {
            SyncTarget::Service(_) | SyncTarget::ServiceAttribute { .. } => {
                self.services.delete_record(target).await
            }
            SyncTarget::App(_) | SyncTarget::AppAttribute { .. } => {
                self.apps.delete_record(target).await
            }
        }
    }

    async fn finish_delete(
        &self,
        kind: RecordKind,
        id: RecordId,
        outcome: &SyncOutcome,
        report: &mut PassReport,
    ) -> Result<(), StorageError> {
        log_outcome(kind, id, outcome);
        report.count(outcome);
        if outcome.is_converged() {
            self.store.purge(kind, id).await?;
            report.purged += 1;
        }
        Ok(())
    }

    async fn sync_pass(&self, report: &mut PassReport, now: OffsetDateTime) -> Result<(), StorageError> {
        let services = self
            .store
            .filter_services(&ServiceFilter::new().with_deleted(false))
            .await?;
        for service in services.into_iter().filter(|s| s.status.is_due(now)) {
            let outcome = self
                .services
                .sync_record(&SyncTarget::Service(service.clone()))
                .await;
            log_outcome(RecordKind::Service, service.id, &outcome);
            report.count(&outcome);
            self.write_service_status(service, &outcome).await?;
        }

        let apps = self
            .store
            .filter_apps(&AppFilter::new().with_deleted(false))
            .await?;
        for app in apps.into_iter().filter(|a| a.status.is_due(now)) {
            let outcome = self.apps.sync_record(&SyncTarget::App(app.clone())).await;
            log_outcome(RecordKind::App, app.id, &outcome);
            report.count(&outcome);
            self.write_app_status(app, &outcome).await?;
        }

        let attributes = self
            .store
            .filter_attributes(&AttributeFilter::new().with_deleted(false))
            .await?;
        for attribute in attributes.into_iter().filter(|a| a.status.is_due(now)) {
            let outcome = match SyncTarget::for_attribute(self.store.as_ref(), attribute.clone()).await {
                Ok(target @ SyncTarget::ServiceAttribute { .. }) => {
                    self.services.sync_record(&target).await
                }
                Ok(target) => self.apps.sync_record(&target).await,
                Err(e) => SyncOutcome::Failed(e),
            };
            log_outcome(RecordKind::Attribute, attribute.id, &outcome);
            report.count(&outcome);
            self.write_attribute_status(attribute, &outcome).await?;
        }
        Ok(())
    }

    async fn write_service_status(
        &self,
        service: ControllerService,
        outcome: &SyncOutcome,
    ) -> Result<(), StorageError> {
        self.write_status(RecordKind::Service, service.id, service.status, outcome)
            .await
    }

    async fn write_app_status(&self, app: AppRecord, outcome: &SyncOutcome) -> Result<(), StorageError> {
        self.write_status(RecordKind::App, app.id, app.status, outcome)
            .await
    }

    async fn write_attribute_status(
        &self,
        attribute: Attribute,
        outcome: &SyncOutcome,
    ) -> Result<(), StorageError> {
        self.write_status(RecordKind::Attribute, attribute.id, attribute.status, outcome)
            .await
    }

    /// Folds `outcome` into the status read at the start of the pass. A record
    /// re-dirtied while it was being reconciled keeps its newer status and is
    /// picked up again by the next pass.
    async fn write_status(
        &self,
        kind: RecordKind,
        id: RecordId,
        read: BackendStatus,
        outcome: &SyncOutcome,
    ) -> Result<(), StorageError> {
        let mut status = read.clone();
        apply_outcome(&mut status, outcome, &self.retry);
        if !self.store.swap_status(kind, id, &read, status).await? {
            info!(kind = %kind, id = %id, "Record changed during sync, keeping its newer status");
        }
        Ok(())
    }
}

/// A deleted record keeps whatever status it had; only a failed teardown backs off.
fn teardown_due(status: &BackendStatus, now: OffsetDateTime) -> bool {
    status.code != BackendCode::Error || status.is_due(now)
}

/// Folds one outcome into a record's backend status.
pub fn apply_outcome(status: &mut BackendStatus, outcome: &SyncOutcome, retry: &RetryPolicy) {
    match outcome {
        SyncOutcome::Converged => status.mark_ok(),
        SyncOutcome::Deferred(deferral) => status.mark_deferred(deferral.reason.clone()),
        SyncOutcome::Failed(err) => {
            let delay = retry.delay_for(status.failures.saturating_add(1));
            status.mark_failed(err.to_string(), OffsetDateTime::now_utc() + delay);
        }
    }
}

fn log_outcome(kind: RecordKind, id: RecordId, outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Converged => debug!(kind = %kind, id = %id, "Record converged"),
        SyncOutcome::Deferred(deferral) => {
            info!(kind = %kind, id = %id, reason = %deferral.reason, "Record deferred")
        }
        SyncOutcome::Failed(err) => warn!(
            kind = %kind,
            id = %id,
            error = %err,
            category = %err.category(),
            retryable = err.is_retryable(),
            "Record failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let retry = RetryPolicy {
            base: Duration::from_secs(10),
            max: Duration::from_secs(100),
        };
        assert_eq!(retry.delay_for(1), Duration::from_secs(10));
        assert_eq!(retry.delay_for(2), Duration::from_secs(20));
        assert_eq!(retry.delay_for(4), Duration::from_secs(80));
        assert_eq!(retry.delay_for(5), Duration::from_secs(100));
        assert_eq!(retry.delay_for(64), Duration::from_secs(100));
    }

    #[test]
    fn test_apply_outcome() {
        let retry = RetryPolicy::default();
        let mut status = BackendStatus::default();

        let failed = SyncOutcome::Failed(SyncError::precondition(
            RecordKind::App,
            RecordId(1),
            "no owner",
        ));
        apply_outcome(&mut status, &failed, &retry);
        apply_outcome(&mut status, &failed, &retry);
        assert_eq!(status.code, BackendCode::Error);
        assert_eq!(status.failures, 2);
        assert!(status.next_attempt.is_some());

        apply_outcome(
            &mut status,
            &SyncOutcome::deferred(RecordId(1), "waiting"),
            &retry,
        );
        assert_eq!(status.code, BackendCode::Pending);
        assert_eq!(status.failures, 2);
        assert_eq!(status.message, "waiting");

        apply_outcome(&mut status, &SyncOutcome::Converged, &retry);
        assert!(status.is_ok());
        assert_eq!(status.failures, 0);
    }
}
