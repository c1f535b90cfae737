//! # onos-sync-storage
//!
//! Model store abstraction for the ONOS synchronizer.
//!
//! This crate defines the capability the reconcilers consume: typed
//! lookups, criteria filters, partial-field persistence and the combined
//! attribute dictionary. Implementations live in separate crates.
//!
//! ## Example
//!
//! ```ignore
//! use onos_sync_storage::{AppFilter, ModelStore, StorageError};
//!
//! async fn installed(store: &dyn ModelStore, app_id: &str) -> Result<bool, StorageError> {
//!     let apps = store.filter_apps(&AppFilter::new().with_app_id(app_id)).await?;
//!     Ok(apps.iter().any(|app| app.status.is_ok()))
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::ModelStore;
pub use types::{
    AppField, AppFilter, AttributeField, AttributeFilter, ServiceField, ServiceFilter,
};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared store trait object.
pub type DynModelStore = std::sync::Arc<dyn ModelStore>;
