use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::id::{CallerId, RecordId};
use crate::status::BackendStatus;

pub const DEFAULT_REST_PORT: u16 = 8181;

/// Kinds of records the synchronizer observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    #[serde(rename = "ONOSService")]
    Service,
    #[serde(rename = "ONOSApp")]
    App,
    #[serde(rename = "Attribute")]
    Attribute,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service => write!(f, "ONOSService"),
            Self::App => write!(f, "ONOSApp"),
            Self::Attribute => write!(f, "Attribute"),
        }
    }
}

/// One running ONOS controller instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerService {
    pub id: RecordId,
    pub name: String,
    pub rest_hostname: String,
    #[serde(default = "default_rest_port")]
    pub rest_port: u16,
    #[serde(default)]
    pub rest_username: Option<String>,
    #[serde(default)]
    pub rest_password: Option<String>,
    /// No container or VM to provision; the controller runs elsewhere.
    #[serde(default)]
    pub externally_managed: bool,
    /// Cluster bootstrap key.
    #[serde(default)]
    pub node_key: Option<String>,
    #[serde(default)]
    pub status: BackendStatus,
    #[serde(default)]
    pub deleted: bool,
}

fn default_rest_port() -> u16 {
    DEFAULT_REST_PORT
}

impl ControllerService {
    pub fn new(name: impl Into<String>, rest_hostname: impl Into<String>) -> Self {
        Self {
            id: RecordId::default(),
            name: name.into(),
            rest_hostname: rest_hostname.into(),
            rest_port: DEFAULT_REST_PORT,
            rest_username: None,
            rest_password: None,
            externally_managed: false,
            node_key: None,
            status: BackendStatus::default(),
            deleted: false,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.rest_port = port;
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.rest_username = Some(username.into());
        self.rest_password = Some(password.into());
        self
    }

    pub fn externally_managed(mut self, value: bool) -> Self {
        self.externally_managed = value;
        self
    }

    /// REST base address, `http://` assumed when the hostname has no scheme.
    pub fn rest_base_url(&self) -> String {
        let host = self.rest_hostname.trim_end_matches('/');
        if host.contains("://") {
            format!("{host}:{}", self.rest_port)
        } else {
            format!("http://{host}:{}", self.rest_port)
        }
    }
}

/// An application deployed onto a [`ControllerService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    pub id: RecordId,
    pub name: String,
    /// ONOS application identifier, e.g. `org.onosproject.vrouter`.
    pub app_id: String,
    /// Remote source to install from. Bundled apps leave it empty.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Comma separated app ids that must be installed first.
    #[serde(default)]
    pub dependencies: String,
    /// Comma separated, informational only.
    #[serde(default)]
    pub install_dependencies: String,
    pub owner: RecordId,
    #[serde(default)]
    pub creator: Option<CallerId>,
    #[serde(default)]
    pub status: BackendStatus,
    #[serde(default)]
    pub deleted: bool,
}

impl AppRecord {
    pub fn new(name: impl Into<String>, app_id: impl Into<String>, owner: RecordId) -> Self {
        Self {
            id: RecordId::default(),
            name: name.into(),
            app_id: app_id.into(),
            url: None,
            version: None,
            dependencies: String::new(),
            install_dependencies: String::new(),
            owner,
            creator: None,
            status: BackendStatus::default(),
            deleted: false,
        }
    }

    pub fn with_source(mut self, url: impl Into<String>, version: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self.version = Some(version.into());
        self
    }

    pub fn with_dependencies(mut self, dependencies: impl Into<String>) -> Self {
        self.dependencies = dependencies.into();
        self
    }

    /// Remote source url, treating an empty string as absent.
    pub fn source_url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    pub fn desired_version(&self) -> Option<&str> {
        self.version.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Parsed dependency app ids.
    pub fn dependency_ids(&self) -> Vec<&str> {
        parse_name_list(&self.dependencies)
    }

    pub fn install_dependency_ids(&self) -> Vec<&str> {
        parse_name_list(&self.install_dependencies)
    }

    /// Persistence-time invariant: a remote source needs a version.
    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            return Err(CoreError::invalid_record(format!(
                "ONOSApp '{}' has no app_id",
                self.name
            )));
        }
        if self.source_url().is_some() && self.desired_version().is_none() {
            return Err(CoreError::missing_version(&self.name));
        }
        Ok(())
    }
}

/// Splits a comma separated list, trimming and dropping empty tokens.
pub fn parse_name_list(list: &str) -> Vec<&str> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Record an [`Attribute`] hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum AttributeOwner {
    Service(RecordId),
    App(RecordId),
}

impl AttributeOwner {
    pub fn id(&self) -> RecordId {
        match self {
            Self::Service(id) | Self::App(id) => *id,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Service(_) => RecordKind::Service,
            Self::App(_) => RecordKind::App,
        }
    }
}

/// Key/value configuration unit attached to a service or an app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: RecordId,
    pub owner: AttributeOwner,
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub status: BackendStatus,
    #[serde(default)]
    pub deleted: bool,
}

impl Attribute {
    pub fn new(owner: AttributeOwner, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: RecordId::default(),
            owner,
            name: name.into(),
            value: value.into(),
            status: BackendStatus::default(),
            deleted: false,
        }
    }
}
