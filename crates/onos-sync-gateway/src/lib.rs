//! Thin HTTP client for the ONOS REST API.
//!
//! Every call is stateless: the caller passes an [`Endpoint`] (base url and
//! basic auth credentials) and the client performs exactly one request, or
//! two for activation which reads the version back. Nothing about remote
//! state is cached here.
//!
//! Status handling follows the controller's conventions:
//!
//! | Call | Success |
//! |------|---------|
//! | install | 200, or 409 (already installed) |
//! | activate | 200, then GET 200 |
//! | deactivate / uninstall | 204 |
//! | config push / delete | 200 / 204 |

pub mod client;
pub mod error;

pub use client::{
    APPLICATIONS_PATH, ApplicationInfo, COMPONENT_CONFIG_PATH, Credentials, Endpoint,
    GatewayConfig, OnosClient,
};
pub use error::{ErrorCategory, GatewayError};

pub type GatewayResult<T> = Result<T, GatewayError>;
