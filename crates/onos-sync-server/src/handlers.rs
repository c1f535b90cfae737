use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use onos_sync_core::{BackendCode, BackendStatus, BusMessage};
use onos_sync_storage::{AppFilter, AttributeFilter, ServiceFilter, StorageError};
use serde::Serialize;
use serde_json::json;

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub topic: String,
    pub subscribers: usize,
}

/// Publishes the raw request body on the event bus under `topic`.
pub async fn publish_event(
    State(state): State<AppState>,
    Path(topic): Path<String>,
    body: String,
) -> impl IntoResponse {
    let subscribers = state.bus.publish(BusMessage::new(topic.clone(), body));
    tracing::debug!(topic = %topic, subscribers, "Event published");
    (
        StatusCode::ACCEPTED,
        Json(PublishResponse { topic, subscribers }),
    )
}

/// Record counts by backend code.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct CodeCounts {
    pub pending: usize,
    pub ok: usize,
    pub error: usize,
    pub deleted: usize,
}

impl CodeCounts {
    fn add(&mut self, status: &BackendStatus, deleted: bool) {
        if deleted {
            self.deleted += 1;
        }
        match status.code {
            BackendCode::Pending => self.pending += 1,
            BackendCode::Ok => self.ok += 1,
            BackendCode::Error => self.error += 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub backend: &'static str,
    pub services: CodeCounts,
    pub apps: CodeCounts,
    pub attributes: CodeCounts,
}

pub async fn status(State(state): State<AppState>) -> Response {
    match summarize(&state).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to summarize record status");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn summarize(state: &AppState) -> Result<StatusResponse, StorageError> {
    let store = state.store.as_ref();
    let mut summary = StatusResponse {
        backend: store.backend_name(),
        services: CodeCounts::default(),
        apps: CodeCounts::default(),
        attributes: CodeCounts::default(),
    };
    for service in store.filter_services(&ServiceFilter::new()).await? {
        summary.services.add(&service.status, service.deleted);
    }
    for app in store.filter_apps(&AppFilter::new()).await? {
        summary.apps.add(&app.status, app.deleted);
    }
    for attribute in store.filter_attributes(&AttributeFilter::new()).await? {
        summary.attributes.add(&attribute.status, attribute.deleted);
    }
    Ok(summary)
}
