//! Evaluator backed by a FHIR server's `Library/$evaluate` operation.
//!
//! The library source is sent inline as a `Library` resource with base64
//! encoded `text/cql` content. The server answers with a Parameters resource
//! that is decoded back into typed expression values.

use async_trait::async_trait;
use base64::Engine;
use cqlbridge_core::value::is_fhir_primitive;
use cqlbridge_core::{EvaluationResults, ExpressionValue};
use serde_json::{Value, json};

use crate::connection::FhirConnection;
use crate::error::{CqlError, CqlResult};
use crate::evaluator::Evaluator;
use crate::library_source::LibrarySource;

const EVALUATE_PATH: &str = "Library/$evaluate";

pub struct RemoteEvaluator {
    connection: FhirConnection,
}

impl RemoteEvaluator {
    pub fn new(connection: FhirConnection) -> Self {
        Self { connection }
    }

    fn build_request(library: &LibrarySource, expression: Option<&str>) -> Value {
        let data = base64::engine::general_purpose::STANDARD.encode(library.cql.as_bytes());

        let mut inline = json!({
            "resourceType": "Library",
            "name": library.id,
            "status": "active",
            "type": {
                "coding": [{
                    "system": "http://terminology.hl7.org/CodeSystem/library-type",
                    "code": "logic-library"
                }]
            },
            "content": [{ "contentType": "text/cql", "data": data }]
        });
        if let Some(version) = &library.version {
            inline["version"] = Value::String(version.clone());
        }

        let mut parameter = vec![json!({ "name": "library", "resource": inline })];
        if let Some(expr) = expression {
            parameter.push(json!({ "name": "expression", "valueString": expr }));
        }

        json!({ "resourceType": "Parameters", "parameter": parameter })
    }
}

#[async_trait]
impl Evaluator for RemoteEvaluator {
    async fn evaluate(
        &self,
        library: &LibrarySource,
        expression: Option<&str>,
    ) -> CqlResult<EvaluationResults> {
        tracing::debug!(
            library = %library.id,
            server = %self.connection.base_url(),
            "Sending library to $evaluate"
        );

        let request = Self::build_request(library, expression);
        let response = self.connection.post(EVALUATE_PATH, &request).await?;
        decode_parameters(&response)
    }
}

/// Decode a Parameters resource into expression results, keeping entry order.
///
/// Accepts both the FHIR `parameter` array and the `parameters` spelling.
pub fn decode_parameters(response: &Value) -> CqlResult<EvaluationResults> {
    if response.get("resourceType").and_then(|v| v.as_str()) != Some("Parameters") {
        return Err(CqlError::EvaluationError(format!(
            "Expected a Parameters resource, got {}",
            response
                .get("resourceType")
                .and_then(|v| v.as_str())
                .unwrap_or("no resourceType")
        )));
    }

    let entries = response
        .get("parameter")
        .or_else(|| response.get("parameters"))
        .and_then(|p| p.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut results = EvaluationResults::new();
    for entry in entries {
        let name = entry
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or_else(|| CqlError::EvaluationError("Parameter without name".to_string()))?;
        let value = decode_value(entry);
        results.entry(name.to_string()).or_default().values.push(value);
    }

    Ok(results)
}

fn decode_value(entry: &Value) -> ExpressionValue {
    let Some(fields) = entry.as_object() else {
        return ExpressionValue::Null;
    };

    if let Some(resource) = fields.get("resource") {
        let fhir_type = resource
            .get("resourceType")
            .and_then(|v| v.as_str())
            .unwrap_or("Resource");
        return ExpressionValue::resource(fhir_type, resource.clone());
    }

    let Some((key, value)) = fields
        .iter()
        .find(|(k, _)| k.len() > "value".len() && k.starts_with("value"))
    else {
        return ExpressionValue::Null;
    };

    let type_name = &key["value".len()..];
    let primitive_tag = lower_first(type_name);

    if is_fhir_primitive(&primitive_tag) {
        // Numbers pass through f64, so `valueDecimal: 1.50` reads back as "1.5"
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        ExpressionValue::primitive(primitive_tag, text)
    } else {
        ExpressionValue::complex(type_name, value.clone())
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
