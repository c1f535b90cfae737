//! # onos-sync-reconciler
//!
//! Keeps ONOS controllers consistent with the records held in a
//! [`ModelStore`](onos_sync_storage::ModelStore).
//!
//! - [`AppReconciler`] installs, activates, upgrades and removes applications
//!   and pushes their configuration attributes.
//! - [`ServiceReconciler`] pushes a controller's own configuration.
//! - [`EventInvalidator`] marks records dirty when their pods are recreated.
//! - [`SyncScheduler`] walks dirty and deleted records and writes the
//!   [`SyncOutcome`] of every attempt back into the record status.

pub mod app;
pub mod config_push;
pub mod dependencies;
pub mod invalidator;
pub mod local_files;
pub mod outcome;
pub mod scheduler;
pub mod service;
pub mod target;

pub use app::AppReconciler;
pub use config_push::ConfigPusher;
pub use dependencies::dependencies_satisfied;
pub use invalidator::{EventInvalidator, InvalidationReport, RESYNC_MESSAGE};
pub use local_files::LocalConfigWriter;
pub use outcome::{Deferral, ErrorCategory, SyncError, SyncOutcome};
pub use scheduler::{PassReport, RetryPolicy, SyncScheduler, apply_outcome};
pub use service::ServiceReconciler;
pub use target::SyncTarget;
