//! `cql-library-evaluate` operation.
//!
//! Evaluates every expression of the library named by the
//! `libraryName` route parameter.

use async_trait::async_trait;

use super::envelope::OperationEnvelope;
use super::{OperationError, OperationHandler};
use crate::server::AppState;

pub const LIBRARY_EVALUATE: &str = "cql-library-evaluate";

pub struct LibraryEvaluateOperation;

impl LibraryEvaluateOperation {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LibraryEvaluateOperation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperationHandler for LibraryEvaluateOperation {
    fn id(&self) -> &str {
        LIBRARY_EVALUATE
    }

    async fn handle(
        &self,
        state: &AppState,
        request: &OperationEnvelope,
    ) -> Result<String, OperationError> {
        let library_name = request.route_param("libraryName");
        Ok(state.cql.evaluate(&library_name, None).await?)
    }
}
