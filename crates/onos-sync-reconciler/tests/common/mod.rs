#![allow(dead_code)]

use std::sync::Arc;

use onos_sync_core::{AppRecord, Attribute, CallerId, ControllerService};
use onos_sync_db_memory::InMemoryModelStore;
use onos_sync_gateway::{GatewayConfig, OnosClient};
use onos_sync_reconciler::{
    AppReconciler, ConfigPusher, LocalConfigWriter, RetryPolicy, ServiceReconciler, SyncScheduler,
};
use onos_sync_storage::{ModelStore, ServiceField};
use tempfile::TempDir;
use wiremock::MockServer;

pub const VROUTER: &str = "org.onosproject.vrouter";
pub const VROUTER_URL: &str = "http://onf.org/maven/vrouter-1.13.1.oar";

pub fn caller() -> CallerId {
    CallerId::new("admin@opencord.org")
}

/// A mock controller, an in-memory store holding one service pointing at
/// it, and a scratch directory for local config files.
pub struct Harness {
    pub server: MockServer,
    pub store: Arc<InMemoryModelStore>,
    pub service: ControllerService,
    pub files: TempDir,
}

impl Harness {
    pub async fn start() -> Self {
        Self::start_with(|svc| svc).await
    }

    pub async fn start_with(customize: impl FnOnce(ControllerService) -> ControllerService) -> Self {
        let server = MockServer::start().await;
        let address = server.address();
        let store = Arc::new(InMemoryModelStore::new());
        let service = customize(
            ControllerService::new("onos", address.ip().to_string())
                .with_port(address.port())
                .with_credentials("karaf", "karaf"),
        );
        let service = store.create_service(service, Some(&caller())).await.unwrap();
        let files = TempDir::new().unwrap();
        Self {
            server,
            store,
            service,
            files,
        }
    }

    pub fn pusher(&self) -> ConfigPusher {
        let client = OnosClient::new(&GatewayConfig::default()).unwrap();
        ConfigPusher::new(
            client,
            LocalConfigWriter::new(Some(self.files.path().to_path_buf())),
        )
    }

    pub fn apps(&self) -> AppReconciler {
        AppReconciler::new(self.store.clone(), self.pusher())
    }

    pub fn services(&self) -> ServiceReconciler {
        ServiceReconciler::new(self.store.clone(), self.pusher())
    }

    pub fn scheduler(&self) -> SyncScheduler {
        SyncScheduler::new(self.store.clone(), self.pusher(), RetryPolicy::default())
    }

    pub async fn add_app(&self, app: AppRecord) -> AppRecord {
        self.store.create_app(app, Some(&caller())).await.unwrap()
    }

    pub async fn add_attribute(&self, attribute: Attribute) -> Attribute {
        self.store
            .create_attribute(attribute, Some(&caller()))
            .await
            .unwrap()
    }

    /// Marks the harness service converged so a pass only touches what a test set up.
    pub async fn service_ok(&self) {
        let mut service = self.service.clone();
        service.status.mark_ok();
        self.store
            .persist_service(&service, &[ServiceField::Status])
            .await
            .unwrap();
    }

    /// `(method, path)` of every request the mock controller saw, in order.
    pub async fn calls(&self) -> Vec<(String, String)> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|req| (req.method.as_str().to_string(), req.url.path().to_string()))
            .collect()
    }
}

pub fn call(method: &str, path: &str) -> (String, String) {
    (method.to_string(), path.to_string())
}
