//! Registry of app operation handlers keyed by operation id.

use std::collections::HashMap;
use std::sync::Arc;

use super::expression_evaluate::ExpressionEvaluateOperation;
use super::handler::DynOperationHandler;
use super::library_evaluate::LibraryEvaluateOperation;

#[derive(Default)]
pub struct OperationRegistry {
    by_id: HashMap<String, DynOperationHandler>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in CQL operations.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LibraryEvaluateOperation::new()));
        registry.register(Arc::new(ExpressionEvaluateOperation::new()));
        registry
    }

    /// Registers a handler, replacing any handler with the same id.
    pub fn register(&mut self, handler: DynOperationHandler) {
        self.by_id.insert(handler.id().to_string(), handler);
    }

    pub fn get(&self, id: &str) -> Option<DynOperationHandler> {
        self.by_id.get(id).cloned()
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.by_id.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
