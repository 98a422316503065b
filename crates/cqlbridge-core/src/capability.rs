//! Capabilities the projector is constructed with.
//!
//! Both traits require `Send + Sync` so a single projector can be shared
//! across concurrent requests. The default implementations hold no state.

use serde_json::{Map, Value};

use crate::value::{ComplexValue, ResourceValue};

/// Encodes structured values into JSON.
pub trait ResourceSerializer: Send + Sync {
    /// Encode a FHIR resource. Errors carry a human readable reason.
    fn encode_resource(&self, resource: &ResourceValue) -> Result<Value, String>;

    /// Encode a non-resource, non-primitive typed value.
    fn encode_complex(&self, value: &ComplexValue) -> Result<Value, String>;
}

/// Decides whether a primitive's string form is itself JSON.
pub trait JsonOracle: Send + Sync {
    /// Returns the parsed value when `text` is valid JSON.
    fn parse(&self, text: &str) -> Option<Value>;
}

/// Serializer for values whose bodies are already JSON trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResourceSerializer;

impl ResourceSerializer for JsonResourceSerializer {
    fn encode_resource(&self, resource: &ResourceValue) -> Result<Value, String> {
        let Value::Object(body) = &resource.body else {
            return Err(format!(
                "{} resource body must be a JSON object",
                resource.fhir_type
            ));
        };

        match body.get("resourceType") {
            Some(Value::String(rt)) if rt == &resource.fhir_type => {
                Ok(Value::Object(body.clone()))
            }
            Some(Value::String(rt)) => Err(format!(
                "resourceType '{}' does not match declared type '{}'",
                rt, resource.fhir_type
            )),
            Some(other) => Err(format!("resourceType must be a string, got {other}")),
            None => {
                // resourceType leads, the remaining members keep their order
                let mut encoded = Map::with_capacity(body.len() + 1);
                encoded.insert(
                    "resourceType".to_string(),
                    Value::String(resource.fhir_type.clone()),
                );
                for (k, v) in body {
                    encoded.insert(k.clone(), v.clone());
                }
                Ok(Value::Object(encoded))
            }
        }
    }

    fn encode_complex(&self, value: &ComplexValue) -> Result<Value, String> {
        if value.body.is_null() {
            return Err(format!("{} value has no body", value.fhir_type));
        }
        Ok(value.body.clone())
    }
}

/// Oracle that reads the leading JSON value and ignores what follows it.
///
/// A scalar (number, boolean, null) counts only when it ends the input or is
/// followed by whitespace, so `"42 apples"` reads as `42` while `"2020-01-01"`
/// is not JSON. Strings, arrays and objects are self-delimiting and always count.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientJsonOracle;

impl JsonOracle for LenientJsonOracle {
    fn parse(&self, text: &str) -> Option<Value> {
        let mut stream = serde_json::Deserializer::from_str(text).into_iter::<Value>();
        let value = stream.next()?.ok()?;
        let rest = text.as_bytes().get(stream.byte_offset()..)?;

        let accepted = match (rest.first(), &value) {
            (None, _) => true,
            (Some(_), Value::String(_) | Value::Array(_) | Value::Object(_)) => true,
            (Some(next), _) => next.is_ascii_whitespace(),
        };
        accepted.then_some(value)
    }
}
