//! CQL library source resolution.
//!
//! A library is requested by its identifier (e.g. `AgeCheck`). Providers are
//! asked in registration order and the first one that has the library wins:
//! - [`DirectoryLibraryProvider`] reads `<id>.cql` from a directory
//! - [`FhirLibraryProvider`] looks up a `Library` resource by name on the FHIR server

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use serde_json::Value;

use crate::connection::FhirConnection;
use crate::error::{CqlError, CqlResult};

/// Source text of one CQL library
#[derive(Debug, Clone, PartialEq)]
pub struct LibrarySource {
    pub id: String,
    pub version: Option<String>,
    pub cql: String,
    /// Where the source was loaded from (file path or resource URL)
    pub origin: String,
}

impl LibrarySource {
    pub fn new(id: impl Into<String>, cql: impl Into<String>, origin: impl Into<String>) -> Self {
        let cql = cql.into();
        let version = declared_version(&cql);
        Self {
            id: id.into(),
            version,
            cql,
            origin: origin.into(),
        }
    }
}

/// Reads the version from a `library Name version '1.0.0'` header.
fn declared_version(cql: &str) -> Option<String> {
    let header = cql
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("library "))?;
    let rest = header.split_once(" version ")?.1.trim();
    let version = rest.strip_prefix('\'')?.split('\'').next()?;
    (!version.is_empty()).then(|| version.to_string())
}

#[async_trait]
pub trait LibraryProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Load the library, `Ok(None)` when this provider does not have it.
    async fn load(&self, id: &str) -> CqlResult<Option<LibrarySource>>;
}

/// Loads `<id>.cql` from a single directory.
pub struct DirectoryLibraryProvider {
    root: PathBuf,
}

impl DirectoryLibraryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl LibraryProvider for DirectoryLibraryProvider {
    fn name(&self) -> &str {
        "directory"
    }

    async fn load(&self, id: &str) -> CqlResult<Option<LibrarySource>> {
        let path = self.root.join(format!("{id}.cql"));
        match tokio::fs::read_to_string(&path).await {
            Ok(cql) => Ok(Some(LibrarySource::new(
                id,
                cql,
                path.display().to_string(),
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Loads `Library` resources from the FHIR server by name.
pub struct FhirLibraryProvider {
    connection: FhirConnection,
}

impl FhirLibraryProvider {
    pub fn new(connection: FhirConnection) -> Self {
        Self { connection }
    }

    /// Extract CQL source code from a Library resource
    pub(crate) fn extract_cql_content(library_resource: &Value) -> CqlResult<String> {
        // FHIR Library.content[].data contains base64-encoded CQL source
        let content_array = library_resource
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| {
                CqlError::InvalidLibrary("Library resource missing content field".to_string())
            })?;

        for content in content_array {
            let content_type = content
                .get("contentType")
                .and_then(|ct| ct.as_str())
                .unwrap_or("");

            if content_type == "text/cql" || content_type == "text/cql-expression" {
                let data_base64 = content.get("data").and_then(|d| d.as_str()).ok_or_else(|| {
                    CqlError::InvalidLibrary("CQL content missing data field".to_string())
                })?;

                let data_bytes = base64::engine::general_purpose::STANDARD
                    .decode(data_base64)
                    .map_err(|e| {
                        CqlError::InvalidLibrary(format!(
                            "Failed to decode base64 CQL content: {}",
                            e
                        ))
                    })?;

                return String::from_utf8(data_bytes).map_err(|e| {
                    CqlError::InvalidLibrary(format!("Failed to decode UTF-8 CQL content: {}", e))
                });
            }
        }

        Err(CqlError::InvalidLibrary(
            "No CQL content found in Library resource".to_string(),
        ))
    }
}

#[async_trait]
impl LibraryProvider for FhirLibraryProvider {
    fn name(&self) -> &str {
        "fhir-server"
    }

    async fn load(&self, id: &str) -> CqlResult<Option<LibrarySource>> {
        let bundle = self
            .connection
            .get("Library", &[("name", id), ("_count", "1")])
            .await?;

        let Some(resource) = bundle
            .get("entry")
            .and_then(|e| e.as_array())
            .and_then(|entries| entries.first())
            .and_then(|entry| entry.get("resource"))
        else {
            return Ok(None);
        };

        let cql = Self::extract_cql_content(resource)?;
        let origin = match resource.get("id").and_then(|v| v.as_str()) {
            Some(rid) => self.connection.url(&format!("Library/{rid}")),
            None => self.connection.url("Library"),
        };
        let mut source = LibrarySource::new(id, cql, origin);
        if let Some(version) = resource.get("version").and_then(|v| v.as_str()) {
            source.version = Some(version.to_string());
        }
        Ok(Some(source))
    }
}

/// Ordered chain of library providers.
#[derive(Clone, Default)]
pub struct LibrarySourceLoader {
    providers: Vec<Arc<dyn LibraryProvider>>,
}

impl LibrarySourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Arc<dyn LibraryProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// One directory provider per search path, in order
    pub fn with_directories<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            self.providers
                .push(Arc::new(DirectoryLibraryProvider::new(path)));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub async fn load(&self, id: &str) -> CqlResult<LibrarySource> {
        validate_library_id(id)?;

        for provider in &self.providers {
            if let Some(source) = provider.load(id).await? {
                tracing::debug!(
                    library = id,
                    provider = provider.name(),
                    origin = %source.origin,
                    "Library source loaded"
                );
                return Ok(source);
            }
        }

        Err(CqlError::LibraryNotFound(id.to_string()))
    }
}

/// Library identifiers become file names, so keep them to a single path segment.
fn validate_library_id(id: &str) -> CqlResult<()> {
    if id.is_empty() {
        return Err(CqlError::InvalidParameter(
            "Library name cannot be empty".to_string(),
        ));
    }
    if id.contains(['/', '\\']) || id == "." || id == ".." {
        return Err(CqlError::InvalidParameter(format!(
            "Invalid library name: {id}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_declared_version() {
        assert_eq!(
            declared_version("library AgeCheck version '1.2.0'\n\nusing FHIR version '4.0.1'")
                .as_deref(),
            Some("1.2.0")
        );
        assert_eq!(declared_version("library AgeCheck\n"), None);
        assert_eq!(declared_version("define X: 1"), None);
    }

    #[test]
    fn test_extract_cql_content() {
        let library = json!({
            "resourceType": "Library",
            "url": "http://example.org/Library/test",
            "version": "1.0.0",
            "content": [{
                "contentType": "text/cql",
                "data": base64::engine::general_purpose::STANDARD
                    .encode("library TestLibrary version '1.0.0'")
            }]
        });

        let result = FhirLibraryProvider::extract_cql_content(&library).unwrap();
        assert_eq!(result, "library TestLibrary version '1.0.0'");
    }

    #[test]
    fn test_extract_cql_content_missing() {
        let library = json!({
            "resourceType": "Library",
            "url": "http://example.org/Library/test"
        });

        let result = FhirLibraryProvider::extract_cql_content(&library);
        assert!(matches!(result, Err(CqlError::InvalidLibrary(_))));
    }

    #[test]
    fn test_validate_library_id() {
        assert!(validate_library_id("AgeCheck").is_ok());
        assert!(validate_library_id("").is_err());
        assert!(validate_library_id("../secret").is_err());
        assert!(validate_library_id("..").is_err());
    }

    #[tokio::test]
    async fn test_second_directory_is_searched() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(
            second.path().join("AgeCheck.cql"),
            "library AgeCheck version '1.0.0'\ndefine IsAdult: true\n",
        )
        .unwrap();

        let loader = LibrarySourceLoader::new().with_directories([first.path(), second.path()]);
        let source = loader.load("AgeCheck").await.unwrap();

        assert_eq!(source.id, "AgeCheck");
        assert_eq!(source.version.as_deref(), Some("1.0.0"));
        assert!(source.cql.contains("define IsAdult"));
        assert!(source.origin.ends_with("AgeCheck.cql"));
    }

    #[tokio::test]
    async fn test_missing_library() {
        let dir = tempfile::tempdir().unwrap();
        let loader = LibrarySourceLoader::new().with_directories([dir.path()]);
        let err = loader.load("Nope").await.unwrap_err();
        assert!(matches!(err, CqlError::LibraryNotFound(ref id) if id == "Nope"));
    }
}
