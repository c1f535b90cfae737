pub mod bootstrap;
pub mod config;
pub mod daemon;
pub mod handlers;
pub mod observability;
pub mod server;

pub use daemon::Daemon;
pub use server::{AppState, OnosSyncServer, build_app, shutdown_signal};
