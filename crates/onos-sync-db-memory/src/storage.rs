use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use onos_sync_core::{
    AppRecord, Attribute, AttributeOwner, BackendStatus, CallerId, ControllerService, CoreError,
    RecordId, RecordKind,
};
use onos_sync_storage::{
    AppField, AppFilter, AttributeField, AttributeFilter, ModelStore, ServiceField, ServiceFilter,
    StorageError, StorageResult,
};
use papaya::{Compute, HashMap as PapayaHashMap, Operation};
use tracing::debug;

/// In-memory model store using papaya lock-free HashMaps.
///
/// This store provides:
/// - Lock-free concurrent reads via papaya::HashMap
/// - Natural key uniqueness (service name, app id per service, attribute name per owner)
/// - Partial-field persistence with re-validation
/// - Cascading purge of an app's attributes
#[derive(Debug)]
pub struct InMemoryModelStore {
    services: Arc<PapayaHashMap<RecordId, ControllerService>>,
    apps: Arc<PapayaHashMap<RecordId, AppRecord>>,
    attributes: Arc<PapayaHashMap<RecordId, Attribute>>,
    /// Atomic counter for generating record ids
    id_counter: AtomicU64,
    /// Serializes creations so the uniqueness check and insert stay atomic.
    create_lock: std::sync::Mutex<()>,
}

impl InMemoryModelStore {
    pub fn new() -> Self {
        Self {
            services: Arc::new(PapayaHashMap::new()),
            apps: Arc::new(PapayaHashMap::new()),
            attributes: Arc::new(PapayaHashMap::new()),
            id_counter: AtomicU64::new(1),
            create_lock: std::sync::Mutex::new(()),
        }
    }

    fn next_id(&self) -> RecordId {
        RecordId(self.id_counter.fetch_add(1, Ordering::SeqCst))
    }

    /// Total number of records of all kinds.
    pub fn count(&self) -> usize {
        self.services.pin().len() + self.apps.pin().len() + self.attributes.pin().len()
    }

    fn require_caller<'a>(
        caller: Option<&'a CallerId>,
        kind: RecordKind,
        name: &str,
    ) -> StorageResult<&'a CallerId> {
        caller.ok_or_else(|| CoreError::missing_caller(kind.to_string(), name).into())
    }

    fn insert_service(
        &self,
        mut service: ControllerService,
        caller: Option<&CallerId>,
    ) -> StorageResult<ControllerService> {
        let caller = Self::require_caller(caller, RecordKind::Service, &service.name)?;
        if service.name.trim().is_empty() {
            return Err(StorageError::validation("ONOSService needs a name"));
        }

        let _lock = self.lock_creates()?;
        let clash = self
            .services
            .pin()
            .values()
            .any(|s| !s.deleted && s.name.eq_ignore_ascii_case(&service.name));
        if clash {
            return Err(StorageError::already_exists(RecordKind::Service, &service.name));
        }

        service.id = self.next_id();
        self.services.pin().insert(service.id, service.clone());
        debug!(id = %service.id, name = %service.name, caller = %caller, "Service created");
        Ok(service)
    }

    fn insert_app(&self, mut app: AppRecord, caller: Option<&CallerId>) -> StorageResult<AppRecord> {
        let caller = Self::require_caller(caller, RecordKind::App, &app.name)?;
        app.validate()?;

        let _lock = self.lock_creates()?;
        if self.services.pin().get(&app.owner).is_none() {
            return Err(StorageError::precondition(format!(
                "ONOSApp '{}' references missing ONOSService {}",
                app.name, app.owner
            )));
        }
        let clash = self
            .apps
            .pin()
            .values()
            .any(|a| !a.deleted && a.owner == app.owner && a.app_id == app.app_id);
        if clash {
            return Err(StorageError::already_exists(RecordKind::App, &app.app_id));
        }

        app.id = self.next_id();
        app.creator = Some(caller.clone());
        self.apps.pin().insert(app.id, app.clone());
        debug!(id = %app.id, app_id = %app.app_id, caller = %caller, "App created");
        Ok(app)
    }

    fn insert_attribute(
        &self,
        mut attribute: Attribute,
        caller: Option<&CallerId>,
    ) -> StorageResult<Attribute> {
        let caller = Self::require_caller(caller, RecordKind::Attribute, &attribute.name)?;
        if attribute.name.trim().is_empty() {
            return Err(StorageError::validation("Attribute needs a name"));
        }

        let _lock = self.lock_creates()?;
        let owner_exists = match attribute.owner {
            AttributeOwner::Service(id) => self.services.pin().get(&id).is_some(),
            AttributeOwner::App(id) => self.apps.pin().get(&id).is_some(),
        };
        if !owner_exists {
            return Err(StorageError::precondition(format!(
                "Attribute '{}' references missing {} {}",
                attribute.name,
                attribute.owner.kind(),
                attribute.owner.id()
            )));
        }
        let clash = self
            .attributes
            .pin()
            .values()
            .any(|a| !a.deleted && a.owner == attribute.owner && a.name == attribute.name);
        if clash {
            return Err(StorageError::already_exists(
                RecordKind::Attribute,
                &attribute.name,
            ));
        }

        attribute.id = self.next_id();
        self.attributes.pin().insert(attribute.id, attribute.clone());
        debug!(id = %attribute.id, name = %attribute.name, caller = %caller, "Attribute created");
        Ok(attribute)
    }

    fn lock_creates(&self) -> StorageResult<std::sync::MutexGuard<'_, ()>> {
        self.create_lock
            .lock()
            .map_err(|_| StorageError::internal("create lock poisoned"))
    }

    fn update_service(
        &self,
        service: &ControllerService,
        fields: &[ServiceField],
    ) -> StorageResult<()> {
        let guard = self.services.pin();
        let result = guard.compute(service.id, |entry| match entry {
            Some((_, current)) => {
                let mut next = current.clone();
                for field in fields {
                    field.apply(&mut next, service);
                }
                Operation::Insert(next)
            }
            None => Operation::Abort(StorageError::not_found(RecordKind::Service, service.id)),
        });
        finish_compute(result)
    }

    fn update_app(&self, app: &AppRecord, fields: &[AppField]) -> StorageResult<()> {
        let guard = self.apps.pin();
        let result = guard.compute(app.id, |entry| match entry {
            Some((_, current)) => {
                let mut next = current.clone();
                for field in fields {
                    field.apply(&mut next, app);
                }
                match next.validate() {
                    Ok(()) => Operation::Insert(next),
                    Err(e) => Operation::Abort(e.into()),
                }
            }
            None => Operation::Abort(StorageError::not_found(RecordKind::App, app.id)),
        });
        finish_compute(result)
    }

    fn update_attribute(&self, attribute: &Attribute, fields: &[AttributeField]) -> StorageResult<()> {
        let guard = self.attributes.pin();
        let result = guard.compute(attribute.id, |entry| match entry {
            Some((_, current)) => {
                let mut next = current.clone();
                for field in fields {
                    field.apply(&mut next, attribute);
                }
                Operation::Insert(next)
            }
            None => Operation::Abort(StorageError::not_found(RecordKind::Attribute, attribute.id)),
        });
        finish_compute(result)
    }

    fn owned_attributes(&self, owner: AttributeOwner) -> Vec<Attribute> {
        let mut found: Vec<Attribute> = self
            .attributes
            .pin()
            .values()
            .filter(|a| a.owner == owner && !a.deleted)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.id);
        found
    }

    fn dict_for(&self, owner: AttributeOwner) -> StorageResult<BTreeMap<String, String>> {
        let mut dict = BTreeMap::new();
        if let AttributeOwner::App(app_id) = owner {
            let service_id = self
                .apps
                .pin()
                .get(&app_id)
                .map(|app| app.owner)
                .ok_or_else(|| StorageError::not_found(RecordKind::App, app_id))?;
            for attr in self.owned_attributes(AttributeOwner::Service(service_id)) {
                dict.insert(attr.name, attr.value);
            }
        }
        // app attributes override the service ones
        for attr in self.owned_attributes(owner) {
            dict.insert(attr.name, attr.value);
        }
        Ok(dict)
    }

    fn remove(&self, kind: RecordKind, id: RecordId) -> StorageResult<()> {
        match kind {
            RecordKind::Attribute => {
                self.attributes
                    .pin()
                    .remove(&id)
                    .ok_or_else(|| StorageError::not_found(kind, id))?;
            }
            RecordKind::App => {
                self.apps
                    .pin()
                    .remove(&id)
                    .ok_or_else(|| StorageError::not_found(kind, id))?;
                self.remove_attributes_of(AttributeOwner::App(id));
            }
            RecordKind::Service => {
                self.services
                    .pin()
                    .remove(&id)
                    .ok_or_else(|| StorageError::not_found(kind, id))?;
                let owned: Vec<RecordId> = self
                    .apps
                    .pin()
                    .values()
                    .filter(|a| a.owner == id)
                    .map(|a| a.id)
                    .collect();
                for app_id in owned {
                    self.apps.pin().remove(&app_id);
                    self.remove_attributes_of(AttributeOwner::App(app_id));
                }
                self.remove_attributes_of(AttributeOwner::Service(id));
            }
        }
        debug!(kind = %kind, id = %id, "Record purged");
        Ok(())
    }

    fn remove_attributes_of(&self, owner: AttributeOwner) {
        let guard = self.attributes.pin();
        let ids: Vec<RecordId> = guard
            .values()
            .filter(|a| a.owner == owner)
            .map(|a| a.id)
            .collect();
        for id in ids {
            guard.remove(&id);
        }
    }
}

impl Default for InMemoryModelStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a read-modify-write done through [`papaya::HashMapRef::compute`].
fn finish_compute<V>(result: Compute<'_, RecordId, V, StorageError>) -> StorageResult<()> {
    match result {
        Compute::Aborted(err) => Err(err),
        _ => Ok(()),
    }
}

/// Compare-and-set on the status embedded in a record.
fn swap_status_in<V, F>(
    map: &PapayaHashMap<RecordId, V>,
    id: RecordId,
    expected: &BackendStatus,
    status: &BackendStatus,
    status_mut: F,
) -> bool
where
    V: Clone,
    F: Fn(&mut V) -> &mut BackendStatus,
{
    let guard = map.pin();
    let result = guard.compute(id, |entry| match entry {
        Some((_, current)) => {
            let mut next = current.clone();
            let slot = status_mut(&mut next);
            if *slot != *expected {
                return Operation::Abort(());
            }
            *slot = status.clone();
            Operation::Insert(next)
        }
        None => Operation::Abort(()),
    });
    matches!(result, Compute::Updated { .. })
}

fn sorted<T, F: Fn(&T) -> RecordId>(mut records: Vec<T>, key: F) -> Vec<T> {
    records.sort_by_key(|r| key(r));
    records
}

#[async_trait]
impl ModelStore for InMemoryModelStore {
    async fn create_service(
        &self,
        service: ControllerService,
        caller: Option<&CallerId>,
    ) -> StorageResult<ControllerService> {
        self.insert_service(service, caller)
    }

    async fn get_service(&self, id: RecordId) -> StorageResult<Option<ControllerService>> {
        Ok(self.services.pin().get(&id).cloned())
    }

    async fn filter_services(&self, filter: &ServiceFilter) -> StorageResult<Vec<ControllerService>> {
        let found = self
            .services
            .pin()
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        Ok(sorted(found, |s: &ControllerService| s.id))
    }

    async fn persist_service(
        &self,
        service: &ControllerService,
        fields: &[ServiceField],
    ) -> StorageResult<()> {
        self.update_service(service, fields)
    }

    async fn create_app(&self, app: AppRecord, caller: Option<&CallerId>) -> StorageResult<AppRecord> {
        self.insert_app(app, caller)
    }

    async fn get_app(&self, id: RecordId) -> StorageResult<Option<AppRecord>> {
        Ok(self.apps.pin().get(&id).cloned())
    }

    async fn filter_apps(&self, filter: &AppFilter) -> StorageResult<Vec<AppRecord>> {
        let found = self
            .apps
            .pin()
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        Ok(sorted(found, |a: &AppRecord| a.id))
    }

    async fn persist_app(&self, app: &AppRecord, fields: &[AppField]) -> StorageResult<()> {
        self.update_app(app, fields)
    }

    async fn create_attribute(
        &self,
        attribute: Attribute,
        caller: Option<&CallerId>,
    ) -> StorageResult<Attribute> {
        self.insert_attribute(attribute, caller)
    }

    async fn get_attribute(&self, id: RecordId) -> StorageResult<Option<Attribute>> {
        Ok(self.attributes.pin().get(&id).cloned())
    }

    async fn filter_attributes(&self, filter: &AttributeFilter) -> StorageResult<Vec<Attribute>> {
        let found = self
            .attributes
            .pin()
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        Ok(sorted(found, |a: &Attribute| a.id))
    }

    async fn persist_attribute(
        &self,
        attribute: &Attribute,
        fields: &[AttributeField],
    ) -> StorageResult<()> {
        self.update_attribute(attribute, fields)
    }

    async fn attribute_dict(&self, owner: AttributeOwner) -> StorageResult<BTreeMap<String, String>> {
        self.dict_for(owner)
    }

    async fn swap_status(
        &self,
        kind: RecordKind,
        id: RecordId,
        expected: &BackendStatus,
        status: BackendStatus,
    ) -> StorageResult<bool> {
        let swapped = match kind {
            RecordKind::Service => {
                swap_status_in(&self.services, id, expected, &status, |s| &mut s.status)
            }
            RecordKind::App => swap_status_in(&self.apps, id, expected, &status, |a| &mut a.status),
            RecordKind::Attribute => {
                swap_status_in(&self.attributes, id, expected, &status, |a| &mut a.status)
            }
        };
        if !swapped {
            debug!(kind = %kind, id = %id, "Status changed concurrently, not overwritten");
        }
        Ok(swapped)
    }

    async fn purge(&self, kind: RecordKind, id: RecordId) -> StorageResult<()> {
        self.remove(kind, id)
    }

    fn backend_name(&self) -> &'static str {
        "memory-papaya"
    }
}
