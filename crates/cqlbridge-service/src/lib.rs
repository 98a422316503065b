//! CQL evaluation service for cqlbridge
//!
//! This crate connects a CQL engine to the result projector:
//! - Library source resolution from search directories or the FHIR server
//! - Source caching
//! - Evaluation through a pluggable [`Evaluator`]
//! - Projection of the results into a FHIR Parameters document

pub mod config;
pub mod connection;
pub mod error;
pub mod evaluator;
pub mod library_cache;
pub mod library_source;
pub mod remote;
pub mod service;

pub use config::{CqlConfig, FhirServerConfig};
pub use connection::FhirConnection;
pub use error::{CqlError, CqlResult};
pub use evaluator::{DynEvaluator, Evaluator, StaticEvaluator};
pub use library_cache::LibraryCache;
pub use library_source::{
    DirectoryLibraryProvider, FhirLibraryProvider, LibraryProvider, LibrarySource,
    LibrarySourceLoader,
};
pub use remote::RemoteEvaluator;
pub use service::CqlEvaluateService;
