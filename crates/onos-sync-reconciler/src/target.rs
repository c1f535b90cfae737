use onos_sync_core::{
    AppRecord, Attribute, AttributeOwner, ControllerService, RecordId, RecordKind,
};
use onos_sync_storage::ModelStore;

use crate::outcome::SyncError;

/// What a reconciler is asked to act on, with its owner already resolved.
#[derive(Debug, Clone)]
pub enum SyncTarget {
    Service(ControllerService),
    App(AppRecord),
    ServiceAttribute {
        attribute: Attribute,
        service: ControllerService,
    },
    AppAttribute {
        attribute: Attribute,
        app: AppRecord,
    },
}

impl SyncTarget {
    /// Loads the owner of `attribute` and tags the target accordingly.
    pub async fn for_attribute(
        store: &dyn ModelStore,
        attribute: Attribute,
    ) -> Result<Self, SyncError> {
        match attribute.owner {
            AttributeOwner::Service(id) => match store.get_service(id).await? {
                Some(service) => Ok(Self::ServiceAttribute { attribute, service }),
                None => Err(missing_owner(&attribute)),
            },
            AttributeOwner::App(id) => match store.get_app(id).await? {
                Some(app) => Ok(Self::AppAttribute { attribute, app }),
                None => Err(missing_owner(&attribute)),
            },
        }
    }

    pub fn record_id(&self) -> RecordId {
        match self {
            Self::Service(service) => service.id,
            Self::App(app) => app.id,
            Self::ServiceAttribute { attribute, .. } | Self::AppAttribute { attribute, .. } => {
                attribute.id
            }
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Service(_) => RecordKind::Service,
            Self::App(_) => RecordKind::App,
            Self::ServiceAttribute { .. } | Self::AppAttribute { .. } => RecordKind::Attribute,
        }
    }

    /// Short human label for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Service(service) => format!("ONOSService '{}'", service.name),
            Self::App(app) => format!("ONOSApp '{}'", app.app_id),
            Self::ServiceAttribute { attribute, service } => {
                format!("Attribute '{}' of ONOSService '{}'", attribute.name, service.name)
            }
            Self::AppAttribute { attribute, app } => {
                format!("Attribute '{}' of ONOSApp '{}'", attribute.name, app.app_id)
            }
        }
    }
}

fn missing_owner(attribute: &Attribute) -> SyncError {
    SyncError::precondition(
        RecordKind::Attribute,
        attribute.id,
        format!(
            "owner {} {} of attribute '{}' does not exist",
            attribute.owner.kind(),
            attribute.owner.id(),
            attribute.name
        ),
    )
}

/// Owning service of an app, or a precondition failure.
pub(crate) async fn owning_service(
    store: &dyn ModelStore,
    app: &AppRecord,
) -> Result<ControllerService, SyncError> {
    store.get_service(app.owner).await?.ok_or_else(|| {
        SyncError::precondition(
            RecordKind::App,
            app.id,
            format!(
                "ONOSApp '{}' has no resolvable owning ONOSService ({})",
                app.app_id, app.owner
            ),
        )
    })
}
