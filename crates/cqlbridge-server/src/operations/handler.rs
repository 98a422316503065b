//! Operation handler trait and error types.
//!
//! Each app operation the FHIR server forwards is served by one handler,
//! looked up by the operation id carried in the request envelope.

use async_trait::async_trait;
use cqlbridge_service::CqlError;
use std::sync::Arc;

use super::envelope::OperationEnvelope;
use crate::server::AppState;

/// Error type for app operation failures.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// The request body is not a valid operation envelope
    #[error("Invalid operation request: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    /// Library evaluation or projection failed
    #[error("CQL library evaluation failed")]
    Evaluation(#[from] CqlError),
}

/// Trait for implementing app operations.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// Returns the operation id this handler serves.
    fn id(&self) -> &str;

    /// Executes the operation and returns the response body.
    async fn handle(
        &self,
        state: &AppState,
        request: &OperationEnvelope,
    ) -> Result<String, OperationError>;
}

/// Type alias for a shared operation handler.
pub type DynOperationHandler = Arc<dyn OperationHandler>;
