//! Startup snapshot loading.
//!
//! A snapshot declares the services, apps and attributes the daemon should
//! keep in sync. Apps and attributes name their owners instead of carrying
//! record ids, which are only assigned once the store creates the owner:
//!
//! ```json
//! {
//!   "services": [{"name": "onos-fabric", "rest_hostname": "onos-fabric-ui"}],
//!   "apps": [{"name": "segmentrouting", "app_id": "org.onosproject.segmentrouting", "service": "onos-fabric"}],
//!   "attributes": [{"name": "/onos/v1/network/configuration/", "value": {"apps": {}}, "service": "onos-fabric"}]
//! }
//! ```
//!
//! Files ending in `.toml` are read as TOML, anything else as JSON.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use onos_sync_core::{AppRecord, Attribute, AttributeOwner, CallerId, ControllerService, RecordId};
use onos_sync_storage::{ModelStore, StorageError};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse snapshot {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{kind} '{name}' refers to unknown {owner} '{owner_name}'")]
    UnknownOwner {
        kind: &'static str,
        name: String,
        owner: &'static str,
        owner_name: String,
    },

    #[error("attribute '{0}' must name exactly one of service or app")]
    AmbiguousOwner(String),

    #[error("app name '{0}' is declared more than once")]
    DuplicateApp(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub services: Vec<ServiceSeed>,
    #[serde(default)]
    pub apps: Vec<AppSeed>,
    #[serde(default)]
    pub attributes: Vec<AttributeSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSeed {
    pub name: String,
    pub rest_hostname: String,
    #[serde(default)]
    pub rest_port: Option<u16>,
    #[serde(default)]
    pub rest_username: Option<String>,
    #[serde(default)]
    pub rest_password: Option<String>,
    #[serde(default)]
    pub externally_managed: bool,
    #[serde(default)]
    pub node_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSeed {
    pub name: String,
    pub app_id: String,
    /// Name of the owning service.
    pub service: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: String,
    #[serde(default)]
    pub install_dependencies: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributeSeed {
    pub name: String,
    /// Strings are stored as-is, any other JSON value is stored serialized.
    pub value: Value,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub app: Option<String>,
}

impl AttributeSeed {
    fn value_string(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Counts of records created from a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub services: usize,
    pub apps: usize,
    pub attributes: usize,
}

pub async fn load_snapshot(path: &Path) -> Result<Snapshot, BootstrapError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| BootstrapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_snapshot(path, &raw)
}

pub fn parse_snapshot(path: &Path, raw: &str) -> Result<Snapshot, BootstrapError> {
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let parsed = if is_toml {
        toml::from_str(raw).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(raw).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| BootstrapError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Creates every record of the snapshot in dependency order.
///
/// Records start out pending, so the first sync pass pushes all of them.
pub async fn apply_snapshot(
    store: &dyn ModelStore,
    snapshot: Snapshot,
    caller: &CallerId,
) -> Result<BootstrapReport, BootstrapError> {
    let mut report = BootstrapReport::default();
    let mut services: HashMap<String, RecordId> = HashMap::new();
    let mut apps: HashMap<String, RecordId> = HashMap::new();

    for seed in snapshot.services {
        let mut service = ControllerService::new(seed.name, seed.rest_hostname)
            .externally_managed(seed.externally_managed);
        if let Some(port) = seed.rest_port {
            service = service.with_port(port);
        }
        service.rest_username = seed.rest_username;
        service.rest_password = seed.rest_password;
        service.node_key = seed.node_key;

        let created = store.create_service(service, Some(caller)).await?;
        debug!(id = %created.id, name = %created.name, "Bootstrapped ONOSService");
        services.insert(created.name.to_ascii_lowercase(), created.id);
        report.services += 1;
    }

    for seed in snapshot.apps {
        if apps.contains_key(&seed.name) {
            return Err(BootstrapError::DuplicateApp(seed.name));
        }
        let owner = lookup_service(&services, "app", &seed.name, &seed.service)?;
        let mut app = AppRecord::new(seed.name, seed.app_id, owner);
        app.url = seed.url;
        app.version = seed.version;
        app.dependencies = seed.dependencies;
        app.install_dependencies = seed.install_dependencies;

        let created = store.create_app(app, Some(caller)).await?;
        debug!(id = %created.id, app_id = %created.app_id, "Bootstrapped ONOSApp");
        apps.insert(created.name.clone(), created.id);
        report.apps += 1;
    }

    for seed in snapshot.attributes {
        let owner = match (&seed.service, &seed.app) {
            (Some(service), None) => AttributeOwner::Service(lookup_service(
                &services,
                "attribute",
                &seed.name,
                service,
            )?),
            (None, Some(app)) => {
                let id = apps.get(app).copied().ok_or_else(|| BootstrapError::UnknownOwner {
                    kind: "attribute",
                    name: seed.name.clone(),
                    owner: "app",
                    owner_name: app.clone(),
                })?;
                AttributeOwner::App(id)
            }
            _ => return Err(BootstrapError::AmbiguousOwner(seed.name)),
        };
        let value = seed.value_string();
        store
            .create_attribute(Attribute::new(owner, seed.name, value), Some(caller))
            .await?;
        report.attributes += 1;
    }

    info!(
        services = report.services,
        apps = report.apps,
        attributes = report.attributes,
        caller = %caller,
        "Snapshot loaded"
    );
    Ok(report)
}

fn lookup_service(
    services: &HashMap<String, RecordId>,
    kind: &'static str,
    name: &str,
    service: &str,
) -> Result<RecordId, BootstrapError> {
    services
        .get(&service.to_ascii_lowercase())
        .copied()
        .ok_or_else(|| BootstrapError::UnknownOwner {
            kind,
            name: name.to_string(),
            owner: "service",
            owner_name: service.to_string(),
        })
}
