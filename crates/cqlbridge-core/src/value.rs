//! Typed values produced by a CQL evaluation.

use indexmap::IndexMap;
use serde_json::Value;

/// Named expression results in the order the evaluator produced them.
pub type EvaluationResults = IndexMap<String, ExpressionResult>;

/// FHIR primitive data types (R4), by their lower-camel type name.
const FHIR_PRIMITIVE_TYPES: &[&str] = &[
    "base64Binary",
    "boolean",
    "canonical",
    "code",
    "date",
    "dateTime",
    "decimal",
    "id",
    "instant",
    "integer",
    "integer64",
    "markdown",
    "oid",
    "positiveInt",
    "string",
    "time",
    "unsignedInt",
    "uri",
    "url",
    "uuid",
    "xhtml",
];

/// Returns true if `type_name` names a FHIR primitive type.
pub fn is_fhir_primitive(type_name: &str) -> bool {
    FHIR_PRIMITIVE_TYPES.contains(&type_name)
}

/// A single value of an expression result.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionValue {
    /// No value. Skipped by the projector.
    Null,
    /// FHIR primitive with its canonical string form
    Primitive(PrimitiveValue),
    /// A full FHIR resource
    Resource(ResourceValue),
    /// Any other typed value (Quantity, Period, Coding, ...)
    Complex(ComplexValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveValue {
    pub fhir_type: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceValue {
    pub fhir_type: String,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexValue {
    pub fhir_type: String,
    pub body: Value,
}

impl ExpressionValue {
    pub fn primitive(fhir_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Primitive(PrimitiveValue {
            fhir_type: fhir_type.into(),
            value: value.into(),
        })
    }

    pub fn resource(fhir_type: impl Into<String>, body: Value) -> Self {
        Self::Resource(ResourceValue {
            fhir_type: fhir_type.into(),
            body,
        })
    }

    pub fn complex(fhir_type: impl Into<String>, body: Value) -> Self {
        Self::Complex(ComplexValue {
            fhir_type: fhir_type.into(),
            body,
        })
    }

    /// Declared type tag, `None` for [`ExpressionValue::Null`].
    pub fn fhir_type(&self) -> Option<&str> {
        match self {
            Self::Null => None,
            Self::Primitive(p) => Some(&p.fhir_type),
            Self::Resource(r) => Some(&r.fhir_type),
            Self::Complex(c) => Some(&c.fhir_type),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Ordered values produced by evaluating one named expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionResult {
    pub values: Vec<ExpressionValue>,
}

impl ExpressionResult {
    pub fn new(values: Vec<ExpressionValue>) -> Self {
        Self { values }
    }

    pub fn single(value: ExpressionValue) -> Self {
        Self {
            values: vec![value],
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of values that will appear in a projected document
    pub fn non_null_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_null()).count()
    }
}

impl FromIterator<ExpressionValue> for ExpressionResult {
    fn from_iter<I: IntoIterator<Item = ExpressionValue>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Capitalizes the first character of a type tag (`"dateTime"` -> `"DateTime"`).
///
/// Returns `None` for tags that are empty or do not start with a letter.
pub fn type_suffix(tag: &str) -> Option<String> {
    let mut chars = tag.chars();
    let first = chars.next()?;
    if !first.is_alphabetic() {
        return None;
    }
    Some(first.to_uppercase().chain(chars).collect())
}
