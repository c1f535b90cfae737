use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Topic carrying Kubernetes pod lifecycle details.
pub const POD_DETAILS_TOPIC: &str = "xos.kubernetes.pod-details";

/// Label naming the service a pod belongs to.
pub const XOS_SERVICE_LABEL: &str = "xos_service";

pub const POD_CREATED: &str = "created";

/// Raw message as delivered on a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusMessage {
    pub topic: String,
    pub payload: String,
    #[serde(with = "time::serde::rfc3339")]
    pub received_at: OffsetDateTime,
}

impl BusMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Payload of a [`POD_DETAILS_TOPIC`] message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodDetails {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub labels: Option<HashMap<String, String>>,
}

impl PodDetails {
    pub fn is_created(&self) -> bool {
        self.status.as_deref() == Some(POD_CREATED)
    }

    /// Non-empty `xos_service` label, if any.
    pub fn xos_service(&self) -> Option<&str> {
        self.labels
            .as_ref()?
            .get(XOS_SERVICE_LABEL)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}
