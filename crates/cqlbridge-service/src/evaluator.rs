//! Evaluator boundary between the service and a CQL engine.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cqlbridge_core::EvaluationResults;

use crate::error::{CqlError, CqlResult};
use crate::library_source::LibrarySource;

/// Executes a CQL library and returns its named expression results.
///
/// Implementations must return results in the order the engine produced them.
/// When `expression` is set, only that expression needs to be evaluated.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        library: &LibrarySource,
        expression: Option<&str>,
    ) -> CqlResult<EvaluationResults>;
}

pub type DynEvaluator = Arc<dyn Evaluator>;

/// Evaluator that serves preloaded results per library id.
#[derive(Debug, Clone, Default)]
pub struct StaticEvaluator {
    libraries: HashMap<String, EvaluationResults>,
}

impl StaticEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(mut self, id: impl Into<String>, results: EvaluationResults) -> Self {
        self.libraries.insert(id.into(), results);
        self
    }
}

#[async_trait]
impl Evaluator for StaticEvaluator {
    async fn evaluate(
        &self,
        library: &LibrarySource,
        expression: Option<&str>,
    ) -> CqlResult<EvaluationResults> {
        let results = self.libraries.get(&library.id).ok_or_else(|| {
            CqlError::EvaluationError(format!("No results registered for {}", library.id))
        })?;

        match expression {
            None => Ok(results.clone()),
            Some(name) => {
                let result = results.get(name).ok_or_else(|| {
                    CqlError::EvaluationError(format!(
                        "Expression {name} not found in library {}",
                        library.id
                    ))
                })?;
                Ok(EvaluationResults::from([(name.to_string(), result.clone())]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cqlbridge_core::{ExpressionResult, ExpressionValue};

    fn evaluator() -> StaticEvaluator {
        let mut results = EvaluationResults::new();
        results.insert(
            "IsAdult".into(),
            ExpressionResult::single(ExpressionValue::primitive("boolean", "true")),
        );
        results.insert(
            "Age".into(),
            ExpressionResult::single(ExpressionValue::primitive("integer", "34")),
        );
        StaticEvaluator::new().with_library("AgeCheck", results)
    }

    #[tokio::test]
    async fn test_whole_library() {
        let library = LibrarySource::new("AgeCheck", "library AgeCheck", "memory");
        let results = evaluator().evaluate(&library, None).await.unwrap();
        let names: Vec<&str> = results.keys().map(String::as_str).collect();
        assert_eq!(names, ["IsAdult", "Age"]);
    }

    #[tokio::test]
    async fn test_single_expression() {
        let library = LibrarySource::new("AgeCheck", "library AgeCheck", "memory");
        let results = evaluator().evaluate(&library, Some("Age")).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results.contains_key("Age"));
    }

    #[tokio::test]
    async fn test_unknown_expression() {
        let library = LibrarySource::new("AgeCheck", "library AgeCheck", "memory");
        let result = evaluator().evaluate(&library, Some("Missing")).await;
        assert!(matches!(result, Err(CqlError::EvaluationError(_))));
    }
}
