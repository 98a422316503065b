//! CQL service configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the CQL evaluation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CqlConfig {
    /// Directories searched for `<library>.cql`, in order
    #[serde(default = "default_library_paths")]
    pub library_paths: Vec<PathBuf>,

    /// Fall back to `Library` resources on the FHIR server
    #[serde(default = "default_server_libraries")]
    pub server_libraries: bool,

    /// Library source cache capacity
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Library evaluation timeout (ms)
    #[serde(default = "default_evaluation_timeout")]
    pub evaluation_timeout_ms: u64,
}

impl Default for CqlConfig {
    fn default() -> Self {
        Self {
            library_paths: default_library_paths(),
            server_libraries: default_server_libraries(),
            cache_capacity: default_cache_capacity(),
            evaluation_timeout_ms: default_evaluation_timeout(),
        }
    }
}

fn default_library_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("cql")]
}

fn default_server_libraries() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    100
}

fn default_evaluation_timeout() -> u64 {
    30_000
}

/// Connection settings for the FHIR server that holds the data and runs `$evaluate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FhirServerConfig {
    /// FHIR base URL, e.g. `http://localhost:8080/fhir`
    #[serde(default = "default_fhir_url")]
    pub url: String,

    /// Basic auth client name
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth client secret
    #[serde(default)]
    pub password: Option<String>,

    /// Per-request timeout (ms)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

impl Default for FhirServerConfig {
    fn default() -> Self {
        Self {
            url: default_fhir_url(),
            username: None,
            password: None,
            request_timeout_ms: default_request_timeout(),
        }
    }
}

fn default_fhir_url() -> String {
    "http://localhost:8080/fhir".into()
}

fn default_request_timeout() -> u64 {
    15_000
}
