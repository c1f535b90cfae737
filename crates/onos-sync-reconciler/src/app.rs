//! Reconciler for ONOS applications and the attributes attached to them.
//!
//! Per app record:
//!
//! 1. dependencies must be installed and, for apps whose network config is
//!    auto-generated, that config must exist. Otherwise the attempt is
//!    deferred before any remote call;
//! 2. a bundled app (no source url) is activated and its version read back;
//! 3. a remote-sourced app is looked up first. A matching version means
//!    nothing to do, a different version is uninstalled, then the app is
//!    installed and the installed version confirmed.

use onos_sync_core::{AppRecord, Attribute, AttributeOwner, RecordKind};
use onos_sync_gateway::{Endpoint, GatewayError, OnosClient};
use onos_sync_storage::{AppField, DynModelStore};
use tracing::{debug, info, warn};

use crate::config_push::ConfigPusher;
use crate::dependencies::dependencies_satisfied;
use crate::outcome::{SyncError, SyncOutcome};
use crate::target::{SyncTarget, owning_service};

const AUTOGENERATE_ATTRIBUTE: &str = "autogenerate";
const AUTOGENERATED_NETWORK_CONFIG: &str = "vtn-network-cfg";
const NETWORK_CONFIG_ATTRIBUTE: &str = "rest_onos/v1/network/configuration/";

#[derive(Clone)]
pub struct AppReconciler {
    store: DynModelStore,
    pusher: ConfigPusher,
}

impl AppReconciler {
    pub fn new(store: DynModelStore, pusher: ConfigPusher) -> Self {
        Self { store, pusher }
    }

    fn client(&self) -> &OnosClient {
        self.pusher.client()
    }

    pub async fn sync_record(&self, target: &SyncTarget) -> SyncOutcome {
        match target {
            SyncTarget::App(app) => match self.sync_app(app).await {
                Ok(outcome) => outcome,
                Err(err) => SyncOutcome::Failed(err),
            },
            SyncTarget::AppAttribute { attribute, app } => {
                self.add_config(attribute, app).await.into()
            }
            other => {
                debug!(target = %other.describe(), "Not an app target, nothing to do");
                SyncOutcome::Converged
            }
        }
    }

    pub async fn delete_record(&self, target: &SyncTarget) -> SyncOutcome {
        match target {
            SyncTarget::App(app) => self.teardown_app(app).await.into(),
            // the app's own attributes go away with it through the store cascade
            SyncTarget::AppAttribute { attribute, app } => {
                self.delete_config(attribute, app).await.into()
            }
            other => {
                debug!(target = %other.describe(), "Not an app target, nothing to delete");
                SyncOutcome::Converged
            }
        }
    }

    /// Pushes one attribute of `app` to the app's controller.
    pub async fn add_config(&self, attribute: &Attribute, app: &AppRecord) -> Result<(), SyncError> {
        let service = owning_service(self.store.as_ref(), app).await?;
        self.pusher
            .push(self.store.as_ref(), &service, &app.name, attribute)
            .await
    }

    pub async fn delete_config(
        &self,
        attribute: &Attribute,
        app: &AppRecord,
    ) -> Result<(), SyncError> {
        let service = owning_service(self.store.as_ref(), app).await?;
        self.pusher.remove(&service, &app.name, attribute).await
    }

    async fn sync_app(&self, app: &AppRecord) -> Result<SyncOutcome, SyncError> {
        info!(app_id = %app.app_id, id = %app.id, "Sync'ing ONOSApp");

        if !dependencies_satisfied(self.store.as_ref(), app.owner, &app.dependency_ids()).await? {
            return Ok(SyncOutcome::deferred(
                app.id,
                format!(
                    "Deferring installation of ONOSApp with id {} as dependencies are not met",
                    app.id
                ),
            ));
        }

        if self.awaiting_network_config(app).await? {
            return Ok(SyncOutcome::deferred(
                app.id,
                "Network configuration is not populated yet",
            ));
        }

        let service = owning_service(self.store.as_ref(), app).await?;
        let endpoint = Endpoint::for_service(&service);

        let version = match app.source_url() {
            None => self.activate(app, &endpoint).await?,
            Some(url) => self.install(app, url, &endpoint).await?,
        };

        if app.version.as_deref() != Some(version.as_str()) {
            let mut updated = app.clone();
            updated.version = Some(version);
            self.store
                .persist_app(&updated, &[AppField::Version])
                .await?;
        }
        Ok(SyncOutcome::Converged)
    }

    /// True while the app waits for an auto-generated network config that
    /// nobody has written yet.
    async fn awaiting_network_config(&self, app: &AppRecord) -> Result<bool, SyncError> {
        let attrs = self
            .store
            .attribute_dict(AttributeOwner::App(app.id))
            .await?;
        if attrs.get(AUTOGENERATE_ATTRIBUTE).map(String::as_str)
            != Some(AUTOGENERATED_NETWORK_CONFIG)
        {
            return Ok(false);
        }
        Ok(attrs
            .get(NETWORK_CONFIG_ATTRIBUTE)
            .is_none_or(|cfg| cfg.trim().is_empty()))
    }

    async fn activate(&self, app: &AppRecord, endpoint: &Endpoint) -> Result<String, SyncError> {
        info!(app_id = %app.app_id, "Activating app");
        let version = self
            .client()
            .activate_application(endpoint, &app.app_id)
            .await
            .map_err(|e| SyncError::remote(RecordKind::App, app.id, e))?;
        info!(app_id = %app.app_id, version = %version, "App activated");
        Ok(version)
    }

    async fn install(
        &self,
        app: &AppRecord,
        url: &str,
        endpoint: &Endpoint,
    ) -> Result<String, SyncError> {
        let requested = app.desired_version().ok_or_else(|| {
            SyncError::validation(
                RecordKind::App,
                app.id,
                format!(
                    "If you specify a url, you also need to specify a version. ONOSApp: {}",
                    app.name
                ),
            )
        })?;
        let remote = |e: GatewayError| SyncError::remote(RecordKind::App, app.id, e);

        info!(app_id = %app.app_id, url = %url, version = %requested, "Installing app from url");
        match self
            .client()
            .get_application(endpoint, &app.app_id)
            .await
            .map_err(remote)?
        {
            Some(installed) if installed.version == requested => {
                info!(app_id = %app.app_id, "App is installed, skipping install");
                return Ok(installed.version);
            }
            Some(installed) => {
                info!(
                    app_id = %app.app_id,
                    installed = %installed.version,
                    requested = %requested,
                    "Installed version differs, uninstalling app"
                );
                self.client()
                    .uninstall_application(endpoint, &app.app_id)
                    .await
                    .map_err(remote)?;
            }
            None => debug!(app_id = %app.app_id, "App is not installed"),
        }

        self.client()
            .install_application(endpoint, url)
            .await
            .map_err(remote)?;

        let confirmed = self
            .client()
            .read_application(endpoint, &app.app_id)
            .await
            .map_err(remote)?;
        if confirmed.version != requested {
            warn!(
                app_id = %app.app_id,
                installed = %confirmed.version,
                requested = %requested,
                "Controller installed a different version"
            );
            return Err(SyncError::VersionMismatch {
                record: app.id,
                app_id: app.app_id.clone(),
                installed: confirmed.version,
                requested: requested.to_string(),
            });
        }
        info!(app_id = %app.app_id, version = %confirmed.version, "App installed");
        Ok(confirmed.version)
    }

    async fn teardown_app(&self, app: &AppRecord) -> Result<(), SyncError> {
        let service = owning_service(self.store.as_ref(), app).await?;
        let endpoint = Endpoint::for_service(&service);

        let result = match app.source_url() {
            None => {
                info!(app_id = %app.app_id, "Deactivating app");
                self.client()
                    .deactivate_application(&endpoint, &app.app_id)
                    .await
            }
            Some(_) => {
                info!(app_id = %app.app_id, "Uninstalling app");
                self.client()
                    .uninstall_application(&endpoint, &app.app_id)
                    .await
            }
        };
        result.map_err(|e| SyncError::remote(RecordKind::App, app.id, e))
    }
}
