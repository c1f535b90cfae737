//! In-memory model store backend for the ONOS synchronizer.
//!
//! This crate provides an implementation of the `ModelStore` trait from
//! `onos-sync-storage`, using papaya lock-free HashMaps for concurrent access.
//!
//! # Example
//!
//! ```ignore
//! use onos_sync_core::{CallerId, ControllerService};
//! use onos_sync_db_memory::InMemoryModelStore;
//! use onos_sync_storage::ModelStore;
//!
//! let store = InMemoryModelStore::new();
//! let caller = CallerId::new("admin");
//! let onos = store
//!     .create_service(ControllerService::new("onos-fabric", "onos-fabric-ui"), Some(&caller))
//!     .await?;
//! ```

pub mod storage;

pub use onos_sync_storage::{ModelStore, StorageError};
pub use storage::InMemoryModelStore;

/// Creates a new shareable in-memory store.
pub fn create_model_store() -> onos_sync_storage::DynModelStore {
    std::sync::Arc::new(InMemoryModelStore::new())
}
