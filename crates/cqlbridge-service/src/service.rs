//! CQL evaluation service

use crate::config::CqlConfig;
use crate::error::{CqlError, CqlResult};
use crate::evaluator::DynEvaluator;
use crate::library_cache::{CacheStats, LibraryCache};
use crate::library_source::LibrarySourceLoader;
use cqlbridge_core::{
    EvaluationResults, JsonOracle, JsonResourceSerializer, LenientJsonOracle, ResourceSerializer,
    ResultProjector,
};
use std::sync::Arc;
use std::time::Duration;

/// Loads a library, evaluates it and projects the results into a
/// Parameters document.
pub struct CqlEvaluateService<S = JsonResourceSerializer, O = LenientJsonOracle> {
    evaluator: DynEvaluator,
    loader: LibrarySourceLoader,
    library_cache: Arc<LibraryCache>,
    projector: Arc<ResultProjector<S, O>>,
    config: CqlConfig,
}

impl<S, O> CqlEvaluateService<S, O>
where
    S: ResourceSerializer,
    O: JsonOracle,
{
    pub fn new(
        evaluator: DynEvaluator,
        loader: LibrarySourceLoader,
        library_cache: Arc<LibraryCache>,
        projector: Arc<ResultProjector<S, O>>,
        config: CqlConfig,
    ) -> Self {
        Self {
            evaluator,
            loader,
            library_cache,
            projector,
            config,
        }
    }

    /// Evaluate `library_name` and return the projected document as JSON text.
    ///
    /// With `expression` set, only that expression appears in the document.
    pub async fn evaluate(
        &self,
        library_name: &str,
        expression: Option<&str>,
    ) -> CqlResult<String> {
        let results = self.evaluate_results(library_name, expression).await?;
        let document = self.projector.project_to_string(&results)?;
        Ok(document)
    }

    /// Evaluate without projecting.
    pub async fn evaluate_results(
        &self,
        library_name: &str,
        expression: Option<&str>,
    ) -> CqlResult<EvaluationResults> {
        let expression = expression.filter(|e| !e.is_empty());
        tracing::info!(library = library_name, expression = ?expression, "Evaluating CQL library");

        let library = self
            .library_cache
            .get_or_load(library_name, &self.loader)
            .await?;

        let mut results = tokio::time::timeout(
            Duration::from_millis(self.config.evaluation_timeout_ms),
            self.evaluator.evaluate(&library, expression),
        )
        .await
        .map_err(|_| {
            CqlError::Timeout(format!(
                "Library evaluation timed out after {}ms",
                self.config.evaluation_timeout_ms
            ))
        })??;

        // Evaluators may ignore the filter; enforce it here
        if let Some(name) = expression {
            results.retain(|k, _| k == name);
            if results.is_empty() {
                return Err(CqlError::EvaluationError(format!(
                    "Expression {name} not found in library {library_name}"
                )));
            }
        }

        tracing::debug!(
            library = library_name,
            expressions = results.len(),
            "CQL library evaluated"
        );

        Ok(results)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.library_cache.stats()
    }

    pub fn clear_cache(&self) {
        self.library_cache.clear();
    }
}

#[cfg(test)]
mod tests;
