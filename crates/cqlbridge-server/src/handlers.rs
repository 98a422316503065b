use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::operations::{OperationEnvelope, OperationError};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Entry point for app operations forwarded by the FHIR server.
///
/// - known operation: 200 with the `Parameters` document
/// - unknown operation id: 200 with `Operation <id> not found in App`
/// - any failure: 500 with the error and its `Caused by:` chain as text
///
/// Failures never escape as panics. Both text bodies are plain text, so the
/// status code is what separates a failure from an unknown-operation notice.
pub async fn app_operation(State(state): State<AppState>, body: String) -> Response {
    match dispatch(&state, &body).await {
        Ok(Dispatched::Document(document)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            document,
        )
            .into_response(),
        Ok(Dispatched::Unknown(id)) => {
            tracing::warn!(operation = %id, "Unknown operation");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                format!("Operation {id} not found in App"),
            )
                .into_response()
        }
        Err(err) => {
            let description = describe(err);
            tracing::error!(error = %description, "Operation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                description,
            )
                .into_response()
        }
    }
}

enum Dispatched {
    Document(String),
    Unknown(String),
}

async fn dispatch(state: &AppState, body: &str) -> Result<Dispatched, OperationError> {
    let envelope = OperationEnvelope::parse(body)?;
    let id = envelope.operation_id();

    let Some(handler) = state.operations.get(&id) else {
        return Ok(Dispatched::Unknown(id));
    };

    tracing::debug!(operation = %id, "Dispatching operation");
    let document = handler.handle(state, &envelope).await?;
    Ok(Dispatched::Document(document))
}

/// Error message followed by its `Caused by:` chain.
fn describe(err: OperationError) -> String {
    format!("{:?}", anyhow::Error::new(err))
}
