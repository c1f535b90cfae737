use onos_sync_core::{Attribute, AttributeOwner, ControllerService};
use onos_sync_storage::{AttributeFilter, DynModelStore};
use tracing::{debug, info};

use crate::config_push::ConfigPusher;
use crate::outcome::{SyncError, SyncOutcome};
use crate::target::SyncTarget;

/// Reconciler for ONOS services and their own attributes.
#[derive(Clone)]
pub struct ServiceReconciler {
    store: DynModelStore,
    pusher: ConfigPusher,
}

impl ServiceReconciler {
    pub fn new(store: DynModelStore, pusher: ConfigPusher) -> Self {
        Self { store, pusher }
    }

    pub async fn sync_record(&self, target: &SyncTarget) -> SyncOutcome {
        match target {
            SyncTarget::Service(service) => self.sync_service(service).await.into(),
            SyncTarget::ServiceAttribute { attribute, service } => self
                .pusher
                .push(self.store.as_ref(), service, &service.name, attribute)
                .await
                .into(),
            other => {
                debug!(target = %other.describe(), "Not a service target, nothing to do");
                SyncOutcome::Converged
            }
        }
    }

    /// Only attributes have a remote footprint to remove. Retiring the
    /// controller itself belongs to whoever runs it.
    pub async fn delete_record(&self, target: &SyncTarget) -> SyncOutcome {
        match target {
            SyncTarget::ServiceAttribute { attribute, service } => self
                .pusher
                .remove(service, &service.name, attribute)
                .await
                .into(),
            other => {
                debug!(target = %other.describe(), "No remote teardown for this target");
                SyncOutcome::Converged
            }
        }
    }

    async fn sync_service(&self, service: &ControllerService) -> Result<(), SyncError> {
        if service.externally_managed {
            info!(service = %service.name, "Externally managed, nothing to reconcile");
            return Ok(());
        }

        self.pusher.files().write_node_key(service).await?;

        for attribute in self.attributes_of(service).await? {
            self.pusher
                .push(self.store.as_ref(), service, &service.name, &attribute)
                .await?;
        }
        info!(service = %service.name, "ONOSService configured");
        Ok(())
    }

    async fn attributes_of(&self, service: &ControllerService) -> Result<Vec<Attribute>, SyncError> {
        let filter = AttributeFilter::new()
            .with_owner(AttributeOwner::Service(service.id))
            .with_deleted(false);
        Ok(self.store.filter_attributes(&filter).await?)
    }
}
