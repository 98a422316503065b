//! Authenticated HTTP access to the FHIR server.

use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::config::FhirServerConfig;
use crate::error::{CqlError, CqlResult};

/// Shared HTTP client bound to one FHIR base URL.
#[derive(Debug, Clone)]
pub struct FhirConnection {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl FhirConnection {
    pub fn new(base_url: &str, credentials: Option<(String, String)>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn from_config(config: &FhirServerConfig) -> CqlResult<Self> {
        let parsed = Url::parse(&config.url).map_err(|e| {
            CqlError::InvalidParameter(format!("FHIR server URL '{}': {e}", config.url))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CqlError::InvalidParameter(format!(
                "FHIR server URL '{}' must use http or https",
                config.url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            (Some(user), None) => Some((user.clone(), String::new())),
            _ => None,
        };
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, self.url(path));
        if let Some((username, password)) = &self.credentials {
            req = req.basic_auth(username, Some(password));
        }
        req.header("Accept", "application/fhir+json")
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> CqlResult<Value> {
        let resp = self
            .request(reqwest::Method::GET, path)
            .query(query)
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> CqlResult<Value> {
        let resp = self
            .request(reqwest::Method::POST, path)
            .header("Content-Type", "application/fhir+json")
            .json(body)
            .send()
            .await?;
        read_json(resp).await
    }
}

async fn read_json(resp: reqwest::Response) -> CqlResult<Value> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        let detail = operation_outcome_diagnostics(&body).unwrap_or(body);
        return Err(CqlError::EvaluationError(format!("HTTP {status}: {detail}")));
    }

    if body.is_empty() {
        return Ok(Value::Null);
    }

    Ok(serde_json::from_str(&body)?)
}

/// Joins `issue[].diagnostics` of an OperationOutcome body, if it is one.
fn operation_outcome_diagnostics(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    if json.get("resourceType").and_then(|v| v.as_str()) != Some("OperationOutcome") {
        return None;
    }
    let msgs: Vec<&str> = json
        .get("issue")?
        .as_array()?
        .iter()
        .filter_map(|i| i.get("diagnostics").and_then(|d| d.as_str()))
        .collect();
    if msgs.is_empty() {
        None
    } else {
        Some(msgs.join("; "))
    }
}
