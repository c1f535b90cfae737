//! Query criteria and changed-field sets for the model store.

use onos_sync_core::{AppRecord, Attribute, AttributeOwner, ControllerService, RecordId};

/// Criteria for listing services. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceFilter {
    /// Case-insensitive exact match on the service name.
    pub name: Option<String>,
    pub deleted: Option<bool>,
}

impl ServiceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = Some(deleted);
        self
    }

    pub fn matches(&self, service: &ControllerService) -> bool {
        self.name
            .as_deref()
            .is_none_or(|name| service.name.eq_ignore_ascii_case(name))
            && self.deleted.is_none_or(|d| service.deleted == d)
    }
}

/// Criteria for listing apps. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppFilter {
    /// Exact match on the ONOS application id.
    pub app_id: Option<String>,
    pub owner: Option<RecordId>,
    pub deleted: Option<bool>,
}

impl AppFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn with_owner(mut self, owner: RecordId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = Some(deleted);
        self
    }

    pub fn matches(&self, app: &AppRecord) -> bool {
        self.app_id.as_deref().is_none_or(|id| app.app_id == id)
            && self.owner.is_none_or(|owner| app.owner == owner)
            && self.deleted.is_none_or(|d| app.deleted == d)
    }
}

/// Criteria for listing attributes. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeFilter {
    pub owner: Option<AttributeOwner>,
    pub deleted: Option<bool>,
}

impl AttributeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owner(mut self, owner: AttributeOwner) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = Some(deleted);
        self
    }

    pub fn matches(&self, attribute: &Attribute) -> bool {
        self.owner.is_none_or(|owner| attribute.owner == owner)
            && self.deleted.is_none_or(|d| attribute.deleted == d)
    }
}

/// Service fields that can be written by a partial persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceField {
    Name,
    /// Hostname, port and credentials.
    RestEndpoint,
    ExternallyManaged,
    NodeKey,
    Status,
    Deleted,
}

/// App fields that can be written by a partial persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppField {
    Name,
    Url,
    Version,
    Dependencies,
    Status,
    Deleted,
}

/// Attribute fields that can be written by a partial persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeField {
    Value,
    Status,
    Deleted,
}

impl ServiceField {
    /// Copies the listed field from `src` into `dst`.
    pub fn apply(self, dst: &mut ControllerService, src: &ControllerService) {
        match self {
            Self::Name => dst.name = src.name.clone(),
            Self::RestEndpoint => {
                dst.rest_hostname = src.rest_hostname.clone();
                dst.rest_port = src.rest_port;
                dst.rest_username = src.rest_username.clone();
                dst.rest_password = src.rest_password.clone();
            }
            Self::ExternallyManaged => dst.externally_managed = src.externally_managed,
            Self::NodeKey => dst.node_key = src.node_key.clone(),
            Self::Status => dst.status = src.status.clone(),
            Self::Deleted => dst.deleted = src.deleted,
        }
    }
}

impl AppField {
    /// Copies the listed field from `src` into `dst`.
    pub fn apply(self, dst: &mut AppRecord, src: &AppRecord) {
        match self {
            Self::Name => dst.name = src.name.clone(),
            Self::Url => dst.url = src.url.clone(),
            Self::Version => dst.version = src.version.clone(),
            Self::Dependencies => {
                dst.dependencies = src.dependencies.clone();
                dst.install_dependencies = src.install_dependencies.clone();
            }
            Self::Status => dst.status = src.status.clone(),
            Self::Deleted => dst.deleted = src.deleted,
        }
    }
}

impl AttributeField {
    /// Copies the listed field from `src` into `dst`.
    pub fn apply(self, dst: &mut Attribute, src: &Attribute) {
        match self {
            Self::Value => dst.value = src.value.clone(),
            Self::Status => dst.status = src.status.clone(),
            Self::Deleted => dst.deleted = src.deleted,
        }
    }
}
