//! Model store capability consumed by the reconcilers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use onos_sync_core::{
    AppRecord, Attribute, AttributeOwner, BackendStatus, CallerId, ControllerService, RecordId,
    RecordKind,
};

use crate::error::StorageError;
use crate::types::{
    AppField, AppFilter, AttributeField, AttributeFilter, ServiceField, ServiceFilter,
};

/// Typed record store the synchronizer reads desired state from and writes
/// status back into.
///
/// Implementations must be thread-safe (`Send + Sync`). Every `create_*`
/// requires an explicit caller and fails with
/// [`StorageError::Precondition`] without one. `persist_*` writes only the
/// listed fields and re-validates the merged record. Concurrent partial
/// persists of different fields on one record must not lose each other.
#[async_trait]
pub trait ModelStore: Send + Sync {
    // ==================== Services ====================

    async fn create_service(
        &self,
        service: ControllerService,
        caller: Option<&CallerId>,
    ) -> Result<ControllerService, StorageError>;

    async fn get_service(&self, id: RecordId) -> Result<Option<ControllerService>, StorageError>;

    async fn filter_services(
        &self,
        filter: &ServiceFilter,
    ) -> Result<Vec<ControllerService>, StorageError>;

    async fn persist_service(
        &self,
        service: &ControllerService,
        fields: &[ServiceField],
    ) -> Result<(), StorageError>;

    // ==================== Apps ====================

    /// Creates an app. The caller becomes the app's `creator`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Precondition` without a caller or when the
    /// owning service does not exist, `StorageError::Validation` when a
    /// url is set without a version.
    async fn create_app(
        &self,
        app: AppRecord,
        caller: Option<&CallerId>,
    ) -> Result<AppRecord, StorageError>;

    async fn get_app(&self, id: RecordId) -> Result<Option<AppRecord>, StorageError>;

    async fn filter_apps(&self, filter: &AppFilter) -> Result<Vec<AppRecord>, StorageError>;

    async fn persist_app(&self, app: &AppRecord, fields: &[AppField]) -> Result<(), StorageError>;

    // ==================== Attributes ====================

    async fn create_attribute(
        &self,
        attribute: Attribute,
        caller: Option<&CallerId>,
    ) -> Result<Attribute, StorageError>;

    async fn get_attribute(&self, id: RecordId) -> Result<Option<Attribute>, StorageError>;

    async fn filter_attributes(
        &self,
        filter: &AttributeFilter,
    ) -> Result<Vec<Attribute>, StorageError>;

    async fn persist_attribute(
        &self,
        attribute: &Attribute,
        fields: &[AttributeField],
    ) -> Result<(), StorageError>;

    /// Name to value dictionary of the attributes owning `owner`.
    ///
    /// For an app this is the owning service's dictionary overlaid by the
    /// app's own attributes. Deleted attributes are left out.
    async fn attribute_dict(
        &self,
        owner: AttributeOwner,
    ) -> Result<BTreeMap<String, String>, StorageError>;

    // ==================== Status ====================

    /// Replaces a record's status only while the stored status still equals
    /// `expected`, as one atomic step.
    ///
    /// Returns `false` without writing when the status moved on meanwhile
    /// (the record was marked dirty again) or the record is gone.
    async fn swap_status(
        &self,
        kind: RecordKind,
        id: RecordId,
        expected: &BackendStatus,
        status: BackendStatus,
    ) -> Result<bool, StorageError>;

    // ==================== Removal ====================

    /// Removes a record for good. Purging an app cascades to its attributes.
    async fn purge(&self, kind: RecordKind, id: RecordId) -> Result<(), StorageError>;

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
