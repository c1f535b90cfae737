//! In-process event bus for lifecycle notifications.
//!
//! External systems (Kubernetes watchers, Kafka bridges, the daemon's HTTP
//! ingest route) publish [`BusMessage`]s on named topics. Consumers such as
//! the invalidator subscribe and filter by topic.
//!
//! ```text
//!  publisher ──► EventBus (tokio broadcast) ──► invalidator
//!                                          └──► other subscribers
//! ```

pub mod bus;
pub mod types;

pub use bus::EventBus;
pub use types::{BusMessage, PodDetails, POD_CREATED, POD_DETAILS_TOPIC, XOS_SERVICE_LABEL};
