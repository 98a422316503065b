//! Core types for cqlbridge.
//!
//! This crate turns the named results of a CQL library evaluation into a
//! FHIR-shaped `Parameters` document:
//! - [`ExpressionValue`] models the typed values an engine hands back
//! - [`ResultProjector`] walks the results in evaluation order and builds the document
//! - [`ResourceSerializer`] and [`JsonOracle`] are the capabilities the projector
//!   is constructed with

pub mod capability;
pub mod error;
pub mod projector;
pub mod value;

pub use capability::{JsonOracle, JsonResourceSerializer, ResourceSerializer, LenientJsonOracle};
pub use error::{ProjectionError, ProjectionResult};
pub use projector::{Parameter, ParametersDocument, ResultProjector};
pub use value::{
    ComplexValue, EvaluationResults, ExpressionResult, ExpressionValue, PrimitiveValue,
    ResourceValue,
};
