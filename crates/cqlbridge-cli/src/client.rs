use anyhow::{Context, Result};
use serde_json::Value;
use url::Url;

/// Response of a create interaction.
pub struct Created {
    pub status: u16,
    pub id: Option<String>,
    pub resource: Value,
}

impl Created {
    pub fn is_created(&self) -> bool {
        self.status == 201
    }
}

pub struct FhirClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl FhirClient {
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self> {
        let parsed =
            Url::parse(base_url).with_context(|| format!("Invalid server URL: {base_url}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Unsupported URL scheme \"{}\"", parsed.scheme());
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn fhir_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/fhir+json")
    }

    pub async fn read(&self, resource_type: &str, id: &str) -> Result<Value> {
        let url = self.fhir_url(&format!("{resource_type}/{id}"));
        let resp = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .context("Failed to connect to server")?;
        let (_, body) = handle_response(resp).await?;
        Ok(body)
    }

    pub async fn create(&self, resource_type: &str, body: &Value) -> Result<Created> {
        let url = self.fhir_url(resource_type);
        let resp = self
            .request(reqwest::Method::POST, &url)
            .header("Content-Type", "application/fhir+json")
            .json(body)
            .send()
            .await
            .context("Failed to connect to server")?;

        let location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let (status, resource) = handle_response(resp).await?;

        let id = resource
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| location.as_deref().and_then(|l| id_from_location(l, resource_type)));

        Ok(Created {
            status,
            id,
            resource,
        })
    }
}

/// Logical id from a `Location` header such as `.../Patient/123/_history/1`.
fn id_from_location(location: &str, resource_type: &str) -> Option<String> {
    let mut segments = location.trim_end_matches('/').split('/');
    segments.by_ref().find(|s| *s == resource_type)?;
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

async fn handle_response(resp: reqwest::Response) -> Result<(u16, Value)> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        if let Ok(json) = serde_json::from_str::<Value>(&body)
            && json.get("resourceType").and_then(|v| v.as_str()) == Some("OperationOutcome")
            && let Some(issues) = json.get("issue").and_then(|v| v.as_array())
        {
            let msgs: Vec<&str> = issues
                .iter()
                .filter_map(|i| i.get("diagnostics").and_then(|d| d.as_str()))
                .collect();
            if !msgs.is_empty() {
                anyhow::bail!("HTTP {status}: {}", msgs.join("; "));
            }
        }
        anyhow::bail!("HTTP {status}: {body}");
    }

    if body.is_empty() {
        return Ok((status.as_u16(), Value::Null));
    }

    let value = serde_json::from_str(&body).context("Failed to parse response JSON")?;
    Ok((status.as_u16(), value))
}
