//! Operation request envelope sent by the FHIR server to an app endpoint.
//!
//! ```json
//! {
//!   "type": "operation",
//!   "operation": { "id": "cql-library-evaluate" },
//!   "request": { "route-params": { "libraryName": "AgeCheck" } }
//! }
//! ```
//!
//! Every part is optional; absent values read as empty strings.

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationEnvelope {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub operation: OperationRef,
    #[serde(default)]
    pub request: OperationRequest,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationRef {
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationRequest {
    #[serde(default, rename = "route-params")]
    pub route_params: Map<String, Value>,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl OperationEnvelope {
    pub fn parse(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    /// Operation id as text, empty when absent
    pub fn operation_id(&self) -> String {
        as_text(Some(&self.operation.id))
    }

    /// Route parameter as text, empty when absent
    pub fn route_param(&self, name: &str) -> String {
        as_text(self.request.route_params.get(name))
    }
}

/// Text form of a scalar JSON node; containers and null read as empty.
fn as_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_envelope() {
        let envelope = OperationEnvelope::parse(
            r#"{
                "type": "operation",
                "operation": {"id": "cql-library-evaluate"},
                "request": {"route-params": {"libraryName": "AgeCheck"}, "params": {}}
            }"#,
        )
        .unwrap();
        assert_eq!(envelope.kind.as_deref(), Some("operation"));
        assert_eq!(envelope.operation_id(), "cql-library-evaluate");
        assert_eq!(envelope.route_param("libraryName"), "AgeCheck");
    }

    #[test]
    fn test_missing_parts_read_as_empty() {
        let envelope = OperationEnvelope::parse("{}").unwrap();
        assert_eq!(envelope.operation_id(), "");
        assert_eq!(envelope.route_param("libraryName"), "");
    }

    #[test]
    fn test_scalar_route_params() {
        let envelope =
            OperationEnvelope::parse(r#"{"request": {"route-params": {"n": 7, "o": {"x": 1}}}}"#)
                .unwrap();
        assert_eq!(envelope.route_param("n"), "7");
        assert_eq!(envelope.route_param("o"), "");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(OperationEnvelope::parse("not json").is_err());
    }
}
