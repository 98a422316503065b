//! Unit tests for the CQL evaluate service
//!
//! Libraries are read from a temporary directory and evaluated by a
//! [`StaticEvaluator`] or a deliberately slow evaluator.

use super::*;
use crate::evaluator::{Evaluator, StaticEvaluator};
use crate::library_source::LibrarySource;
use async_trait::async_trait;
use cqlbridge_core::{ExpressionResult, ExpressionValue};
use serde_json::{Value, json};
use tempfile::TempDir;

fn library_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("AgeCheck.cql"),
        "library AgeCheck version '1.0.0'\n\ndefine IsAdult: true\n",
    )
    .unwrap();
    dir
}

fn age_check_results() -> EvaluationResults {
    let mut results = EvaluationResults::new();
    results.insert(
        "IsAdult".into(),
        ExpressionResult::single(ExpressionValue::primitive("boolean", "true")),
    );
    results.insert(
        "PatientRecord".into(),
        ExpressionResult::single(ExpressionValue::resource(
            "Patient",
            json!({"resourceType": "Patient", "id": "p1"}),
        )),
    );
    results.insert("Empty".into(), ExpressionResult::new(vec![ExpressionValue::Null]));
    results
}

fn create_test_service(
    dir: &TempDir,
    evaluator: DynEvaluator,
    config: CqlConfig,
) -> CqlEvaluateService {
    CqlEvaluateService::new(
        evaluator,
        LibrarySourceLoader::new().with_directories([dir.path()]),
        Arc::new(LibraryCache::new(config.cache_capacity)),
        Arc::new(ResultProjector::json()),
        config,
    )
}

fn static_service(dir: &TempDir) -> CqlEvaluateService {
    let evaluator = StaticEvaluator::new().with_library("AgeCheck", age_check_results());
    create_test_service(dir, Arc::new(evaluator), CqlConfig::default())
}

#[tokio::test]
async fn test_evaluate_library() {
    let dir = library_dir();
    let service = static_service(&dir);

    let text = service.evaluate("AgeCheck", None).await.unwrap();
    let document: Value = serde_json::from_str(&text).unwrap();

    assert_eq!(
        document,
        json!({
            "resourceType": "Parameters",
            "parameters": [
                {"name": "IsAdult", "valueBoolean": true},
                {"name": "PatientRecord", "resource": {"resourceType": "Patient", "id": "p1"}}
            ]
        })
    );
}

#[tokio::test]
async fn test_evaluate_single_expression() {
    let dir = library_dir();
    let service = static_service(&dir);

    let text = service.evaluate("AgeCheck", Some("IsAdult")).await.unwrap();
    let document: Value = serde_json::from_str(&text).unwrap();

    assert_eq!(document["parameters"].as_array().unwrap().len(), 1);
    assert_eq!(document["parameters"][0]["name"], "IsAdult");
}

#[tokio::test]
async fn test_empty_expression_means_whole_library() {
    let dir = library_dir();
    let service = static_service(&dir);

    let results = service.evaluate_results("AgeCheck", Some("")).await.unwrap();
    assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn test_empty_library_name_fails() {
    let dir = library_dir();
    let service = static_service(&dir);

    let result = service.evaluate("", None).await;
    match result {
        Err(CqlError::InvalidParameter(_)) => (),
        _ => panic!("Expected InvalidParameter error, got: {:?}", result),
    }
}

#[tokio::test]
async fn test_missing_library_fails() {
    let dir = library_dir();
    let service = static_service(&dir);

    let result = service.evaluate("Unknown", None).await;
    assert!(matches!(result, Err(CqlError::LibraryNotFound(_))));
}

#[tokio::test]
async fn test_projection_error_propagates() {
    let dir = library_dir();
    let mut results = EvaluationResults::new();
    results.insert(
        "Broken".into(),
        ExpressionResult::single(ExpressionValue::primitive("", "1")),
    );
    let evaluator = StaticEvaluator::new().with_library("AgeCheck", results);
    let service = create_test_service(&dir, Arc::new(evaluator), CqlConfig::default());

    let result = service.evaluate("AgeCheck", None).await;
    assert!(matches!(result, Err(CqlError::Projection(_))));
}

struct SlowEvaluator;

#[async_trait]
impl Evaluator for SlowEvaluator {
    async fn evaluate(
        &self,
        _library: &LibrarySource,
        _expression: Option<&str>,
    ) -> CqlResult<EvaluationResults> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(EvaluationResults::new())
    }
}

#[tokio::test]
async fn test_evaluation_timeout() {
    let dir = library_dir();
    let config = CqlConfig {
        evaluation_timeout_ms: 20,
        ..CqlConfig::default()
    };
    let service = create_test_service(&dir, Arc::new(SlowEvaluator), config);

    let result = service.evaluate("AgeCheck", None).await;
    assert!(matches!(result, Err(CqlError::Timeout(_))));
}

#[tokio::test]
async fn test_library_source_is_cached() {
    let dir = library_dir();
    let service = static_service(&dir);

    service.evaluate("AgeCheck", None).await.unwrap();
    service.evaluate("AgeCheck", Some("IsAdult")).await.unwrap();

    let stats = service.cache_stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.capacity, 100);

    service.clear_cache();
    assert_eq!(service.cache_stats().size, 0);
}
