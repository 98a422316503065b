//! `cql-expression-evaluate` operation.
//!
//! Evaluates one expression: `library` and `expressionName` route parameters.
//! An empty `expressionName` evaluates the whole library.

use async_trait::async_trait;

use super::envelope::OperationEnvelope;
use super::{OperationError, OperationHandler};
use crate::server::AppState;

pub const EXPRESSION_EVALUATE: &str = "cql-expression-evaluate";

pub struct ExpressionEvaluateOperation;

impl ExpressionEvaluateOperation {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExpressionEvaluateOperation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperationHandler for ExpressionEvaluateOperation {
    fn id(&self) -> &str {
        EXPRESSION_EVALUATE
    }

    async fn handle(
        &self,
        state: &AppState,
        request: &OperationEnvelope,
    ) -> Result<String, OperationError> {
        let library = request.route_param("library");
        let expression = request.route_param("expressionName");
        Ok(state.cql.evaluate(&library, Some(&expression)).await?)
    }
}
