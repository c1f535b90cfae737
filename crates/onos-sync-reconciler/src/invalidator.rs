//! Marks records dirty when the pods backing a controller are (re)created.

use onos_sync_core::events::POD_DETAILS_TOPIC;
use onos_sync_core::{AttributeOwner, BusMessage, PodDetails};
use onos_sync_storage::{
    AppField, AppFilter, AttributeField, AttributeFilter, DynModelStore, ServiceField,
    ServiceFilter, StorageError,
};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

pub const RESYNC_MESSAGE: &str = "resynchronize due to kubernetes event";

/// How many records one event dirtied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvalidationReport {
    pub services: usize,
    pub apps: usize,
    pub attributes: usize,
}

impl InvalidationReport {
    pub fn total(&self) -> usize {
        self.services + self.apps + self.attributes
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[derive(Clone)]
pub struct EventInvalidator {
    store: DynModelStore,
}

impl EventInvalidator {
    pub fn new(store: DynModelStore) -> Self {
        Self { store }
    }

    pub async fn process_event(
        &self,
        message: &BusMessage,
    ) -> Result<InvalidationReport, StorageError> {
        if message.topic != POD_DETAILS_TOPIC {
            debug!(topic = %message.topic, "Ignoring event on unrelated topic");
            return Ok(InvalidationReport::default());
        }

        let details: PodDetails = match serde_json::from_str(&message.payload) {
            Ok(details) => details,
            Err(e) => {
                warn!(error = %e, topic = %message.topic, "Dropping malformed pod event");
                return Ok(InvalidationReport::default());
            }
        };
        if !details.is_created() {
            return Ok(InvalidationReport::default());
        }
        let Some(xos_service) = details.xos_service() else {
            info!(labels = ?details.labels, "This pod has no xos_service label");
            return Ok(InvalidationReport::default());
        };

        info!(name = %xos_service, "Looking for ONOSServices");
        self.dirty_service_tree(xos_service).await
    }

    async fn dirty_service_tree(&self, name: &str) -> Result<InvalidationReport, StorageError> {
        let mut report = InvalidationReport::default();
        let services = self
            .store
            .filter_services(&ServiceFilter::new().with_name(name).with_deleted(false))
            .await?;

        for mut service in services {
            info!(service = %service.name, "Dirtying ONOS Service");
            service.status.mark_pending(RESYNC_MESSAGE);
            self.store
                .persist_service(&service, &[ServiceField::Status])
                .await?;
            report.services += 1;

            let apps = self
                .store
                .filter_apps(&AppFilter::new().with_owner(service.id).with_deleted(false))
                .await?;
            for mut app in apps {
                info!(app_id = %app.app_id, "Dirtying ONOS App");
                app.status.mark_pending(RESYNC_MESSAGE);
                self.store.persist_app(&app, &[AppField::Status]).await?;
                report.apps += 1;

                let attributes = self
                    .store
                    .filter_attributes(
                        &AttributeFilter::new()
                            .with_owner(AttributeOwner::App(app.id))
                            .with_deleted(false),
                    )
                    .await?;
                for mut attribute in attributes {
                    debug!(app_id = %app.app_id, attribute = %attribute.name, "Dirtying attribute for App");
                    attribute.status.mark_pending(RESYNC_MESSAGE);
                    self.store
                        .persist_attribute(&attribute, &[AttributeField::Status])
                        .await?;
                    report.attributes += 1;
                }
            }
        }
        Ok(report)
    }

    /// Consumes bus messages until the bus is dropped.
    pub async fn run(&self, mut receiver: broadcast::Receiver<BusMessage>) {
        info!("Event invalidator started");
        loop {
            match receiver.recv().await {
                Ok(message) => match self.process_event(&message).await {
                    Ok(report) if !report.is_empty() => {
                        info!(
                            services = report.services,
                            apps = report.apps,
                            attributes = report.attributes,
                            "Records marked for resync"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => error!(error = %e, "Failed to process event"),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event invalidator lagged behind the bus");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Event bus closed, invalidator stopping");
                    break;
                }
            }
        }
    }
}
