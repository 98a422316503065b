//! Projection of expression results into a FHIR `Parameters` document.
//!
//! # Output Shape
//!
//! ```json
//! {
//!   "resourceType": "Parameters",
//!   "parameters": [
//!     { "name": "IsAdult", "valueBoolean": true },
//!     { "name": "PatientRecord", "resource": { "resourceType": "Patient" } }
//!   ]
//! }
//! ```
//!
//! Every non-null value produces exactly one parameter, in evaluation order.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use serde_json::Value;

use crate::capability::{JsonOracle, JsonResourceSerializer, ResourceSerializer, LenientJsonOracle};
use crate::error::{ProjectionError, ProjectionResult};
use crate::value::{EvaluationResults, ExpressionValue, type_suffix};

const RESOURCE_KEY: &str = "resource";

/// The projected document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParametersDocument {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,
    pub parameters: Vec<Parameter>,
}

impl ParametersDocument {
    pub fn new() -> Self {
        Self {
            resource_type: "Parameters",
            parameters: Vec::new(),
        }
    }
}

impl Default for ParametersDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// One output entry: `{"name": .., <key>: <value>}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub key: String,
    pub value: Value,
}

impl Serialize for Parameter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry(&self.key, &self.value)?;
        map.end()
    }
}

/// Builds `Parameters` documents from evaluation results.
///
/// The projector owns no mutable state; share it behind an `Arc` when it is
/// used from concurrent handlers.
#[derive(Debug, Clone, Default)]
pub struct ResultProjector<S = JsonResourceSerializer, O = LenientJsonOracle> {
    serializer: S,
    oracle: O,
}

impl ResultProjector {
    /// Projector with the JSON-tree serializer and the strict JSON oracle
    pub fn json() -> Self {
        Self::default()
    }
}

impl<S, O> ResultProjector<S, O>
where
    S: ResourceSerializer,
    O: JsonOracle,
{
    pub fn new(serializer: S, oracle: O) -> Self {
        Self { serializer, oracle }
    }

    /// Project `results` into a document.
    ///
    /// Resources are always keyed `resource`, but their type tag must still
    /// be usable: an empty or non-alphabetic tag fails with
    /// [`ProjectionError::MalformedTypeTag`] like any other value.
    ///
    /// Fails on the first value that cannot be encoded; nothing is returned
    /// for the values that were already projected.
    pub fn project(&self, results: &EvaluationResults) -> ProjectionResult<ParametersDocument> {
        let mut document = ParametersDocument::new();

        for (expression, result) in results {
            for value in &result.values {
                if let Some(parameter) = self.project_value(expression, value)? {
                    document.parameters.push(parameter);
                }
            }
        }

        tracing::debug!(
            expressions = results.len(),
            parameters = document.parameters.len(),
            "Projected expression results"
        );

        Ok(document)
    }

    /// Project `results` and render the document as indented JSON text.
    pub fn project_to_string(&self, results: &EvaluationResults) -> ProjectionResult<String> {
        let document = self.project(results)?;
        serde_json::to_string_pretty(&document)
            .map_err(|e| ProjectionError::serialization("Parameters", e.to_string()))
    }

    fn project_value(
        &self,
        expression: &str,
        value: &ExpressionValue,
    ) -> ProjectionResult<Option<Parameter>> {
        let (key, json) = match value {
            ExpressionValue::Null => return Ok(None),
            ExpressionValue::Resource(resource) => {
                // Tag still has to be usable even though the key is fixed
                value_key(expression, &resource.fhir_type)?;
                let json = self
                    .serializer
                    .encode_resource(resource)
                    .map_err(|e| ProjectionError::serialization(expression, e))?;
                (RESOURCE_KEY.to_string(), json)
            }
            ExpressionValue::Primitive(primitive) => {
                let key = value_key(expression, &primitive.fhir_type)?;
                let json = self
                    .oracle
                    .parse(&primitive.value)
                    .unwrap_or_else(|| Value::String(primitive.value.clone()));
                (key, json)
            }
            ExpressionValue::Complex(complex) => {
                let key = value_key(expression, &complex.fhir_type)?;
                let json = self
                    .serializer
                    .encode_complex(complex)
                    .map_err(|e| ProjectionError::serialization(expression, e))?;
                (key, json)
            }
        };

        Ok(Some(Parameter {
            name: expression.to_string(),
            key,
            value: json,
        }))
    }
}

fn value_key(expression: &str, tag: &str) -> ProjectionResult<String> {
    type_suffix(tag)
        .map(|suffix| format!("value{suffix}"))
        .ok_or_else(|| ProjectionError::malformed_tag(expression, tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ExpressionResult;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    fn results(entries: Vec<(&str, Vec<ExpressionValue>)>) -> EvaluationResults {
        entries
            .into_iter()
            .map(|(name, values)| (name.to_string(), ExpressionResult::new(values)))
            .collect()
    }

    fn project(input: &EvaluationResults) -> Value {
        let text = ResultProjector::json().project_to_string(input).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_empty_results() {
        let output = project(&EvaluationResults::new());
        assert_json_eq!(output, json!({"resourceType": "Parameters", "parameters": []}));
    }

    #[test]
    fn test_null_values_produce_nothing() {
        let input = results(vec![
            ("A", vec![ExpressionValue::Null, ExpressionValue::Null]),
            ("B", vec![ExpressionValue::Null]),
        ]);
        let document = ResultProjector::json().project(&input).unwrap();
        assert!(document.parameters.is_empty());
    }

    #[test]
    fn test_parameter_count_matches_non_null_values() {
        let input = results(vec![
            (
                "A",
                vec![
                    ExpressionValue::primitive("integer", "1"),
                    ExpressionValue::Null,
                    ExpressionValue::primitive("integer", "2"),
                ],
            ),
            ("B", vec![ExpressionValue::complex("Quantity", json!({"value": 5}))]),
            ("C", vec![]),
        ]);
        let expected: usize = input.values().map(ExpressionResult::non_null_count).sum();
        let document = ResultProjector::json().project(&input).unwrap();
        assert_eq!(document.parameters.len(), expected);
        assert_eq!(expected, 3);
    }

    #[test]
    fn test_boolean_primitive_is_embedded_as_json() {
        let input = results(vec![(
            "IsAdult",
            vec![ExpressionValue::primitive("boolean", "true")],
        )]);
        assert_json_eq!(
            project(&input),
            json!({
                "resourceType": "Parameters",
                "parameters": [{"name": "IsAdult", "valueBoolean": true}]
            })
        );
    }

    #[test]
    fn test_plain_text_primitive_is_quoted() {
        let input = results(vec![(
            "Greeting",
            vec![ExpressionValue::primitive("string", "hello")],
        )]);
        let output = project(&input);
        assert_eq!(output["parameters"][0]["valueString"], json!("hello"));
    }

    #[test]
    fn test_json_looking_string_is_embedded_as_number() {
        let input = results(vec![("Code", vec![ExpressionValue::primitive("string", "42")])]);
        let output = project(&input);
        assert_eq!(output["parameters"][0]["valueString"], json!(42));
    }

    #[test]
    fn test_leading_json_value_is_embedded() {
        let input = results(vec![
            ("Count", vec![ExpressionValue::primitive("string", "42 apples")]),
            ("Flag", vec![ExpressionValue::primitive("string", "true story")]),
            ("Day", vec![ExpressionValue::primitive("string", "2020-01-01")]),
        ]);
        let output = project(&input);
        assert_json_eq!(
            output["parameters"],
            json!([
                {"name": "Count", "valueString": 42},
                {"name": "Flag", "valueString": true},
                {"name": "Day", "valueString": "2020-01-01"}
            ])
        );
    }

    #[test]
    fn test_date_time_primitive_key() {
        let input = results(vec![(
            "Measured",
            vec![ExpressionValue::primitive("dateTime", "2024-03-01T10:00:00Z")],
        )]);
        let output = project(&input);
        assert_eq!(
            output["parameters"][0]["valueDateTime"],
            json!("2024-03-01T10:00:00Z")
        );
    }

    #[test]
    fn test_resource_uses_resource_key() {
        let patient = json!({"resourceType": "Patient", "id": "p1", "gender": "male"});
        let input = results(vec![(
            "PatientRecord",
            vec![ExpressionValue::resource("Patient", patient.clone())],
        )]);
        let output = project(&input);
        assert_json_eq!(
            output["parameters"],
            json!([{"name": "PatientRecord", "resource": patient}])
        );
        assert!(output["parameters"][0].get("valuePatient").is_none());
    }

    #[test]
    fn test_complex_value_uses_typed_key() {
        let input = results(vec![(
            "Weight",
            vec![ExpressionValue::complex(
                "Quantity",
                json!({"value": 72.5, "unit": "kg"}),
            )],
        )]);
        let output = project(&input);
        assert_json_eq!(
            output["parameters"][0],
            json!({"name": "Weight", "valueQuantity": {"value": 72.5, "unit": "kg"}})
        );
    }

    #[test]
    fn test_order_follows_evaluation_order() {
        let input = results(vec![
            (
                "First",
                vec![
                    ExpressionValue::primitive("integer", "1"),
                    ExpressionValue::primitive("integer", "2"),
                ],
            ),
            ("Second", vec![]),
        ]);
        let output = project(&input);
        assert_json_eq!(
            output["parameters"],
            json!([
                {"name": "First", "valueInteger": 1},
                {"name": "First", "valueInteger": 2}
            ])
        );
    }

    #[test]
    fn test_output_is_deterministic() {
        let input = results(vec![
            ("Z", vec![ExpressionValue::primitive("string", "last")]),
            (
                "A",
                vec![ExpressionValue::resource(
                    "Patient",
                    json!({"resourceType": "Patient", "name": [{"family": "Doe"}], "active": true}),
                )],
            ),
        ]);
        let projector = ResultProjector::json();
        let first = projector.project_to_string(&input).unwrap();
        let second = projector.project_to_string(&input).unwrap();
        assert_eq!(first, second);
        assert!(first.find("\"Z\"").unwrap() < first.find("\"A\"").unwrap());
    }

    #[test]
    fn test_document_field_order() {
        let input = results(vec![("X", vec![ExpressionValue::primitive("boolean", "false")])]);
        let text = ResultProjector::json().project_to_string(&input).unwrap();
        assert!(text.find("resourceType").unwrap() < text.find("parameters").unwrap());
        assert!(text.find("\"name\"").unwrap() < text.find("valueBoolean").unwrap());
        assert!(text.contains("\n  \"parameters\""));
    }

    #[test]
    fn test_empty_type_tag_is_rejected() {
        let input = results(vec![("Broken", vec![ExpressionValue::primitive("", "1")])]);
        let err = ResultProjector::json().project(&input).unwrap_err();
        assert!(matches!(err, ProjectionError::MalformedTypeTag { .. }));
        assert_eq!(err.expression(), "Broken");
    }

    #[test]
    fn test_empty_resource_tag_is_rejected() {
        let input = results(vec![(
            "Broken",
            vec![ExpressionValue::resource("", json!({"id": "1"}))],
        )]);
        let err = ResultProjector::json().project(&input).unwrap_err();
        assert!(matches!(err, ProjectionError::MalformedTypeTag { .. }));
    }

    #[test]
    fn test_serialization_failure_yields_no_document() {
        let input = results(vec![
            ("Ok", vec![ExpressionValue::primitive("boolean", "true")]),
            (
                "Bad",
                vec![ExpressionValue::resource(
                    "Patient",
                    json!({"resourceType": "Observation"}),
                )],
            ),
        ]);
        let err = ResultProjector::json().project_to_string(&input).unwrap_err();
        match err {
            ProjectionError::SerializationFailure { expression, .. } => {
                assert_eq!(expression, "Bad")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    struct UppercaseOracle;

    impl JsonOracle for UppercaseOracle {
        fn parse(&self, text: &str) -> Option<Value> {
            Some(Value::String(text.to_uppercase()))
        }
    }

    #[test]
    fn test_injected_oracle_is_used() {
        let projector = ResultProjector::new(JsonResourceSerializer, UppercaseOracle);
        let input = results(vec![("Code", vec![ExpressionValue::primitive("code", "abc")])]);
        let document = projector.project(&input).unwrap();
        assert_eq!(document.parameters[0].key, "valueCode");
        assert_eq!(document.parameters[0].value, json!("ABC"));
    }
}
