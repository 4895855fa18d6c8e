//! API client for the SABRES network service
//!
//! Every route answers with the `{success, data, message}` envelope; the
//! helpers here unwrap it and turn failures into readable errors.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Response envelope shared by all service routes
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopologyView {
    pub exists: bool,
    #[serde(default)]
    pub dotviz: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slice {
    pub name: String,
    pub uuid: String,
    #[serde(default)]
    pub devices: Vec<Value>,
    #[serde(default)]
    pub edges: Vec<Value>,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SliceConfiguration {
    pub path: Vec<String>,
    #[serde(default)]
    pub management: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct GraphJson {
    graph: String,
}

#[derive(Debug, Deserialize)]
struct SolveAnswer {
    response: String,
}

#[derive(Debug, Deserialize)]
struct CreatedSlice {
    uuid: String,
}

#[derive(Debug, Deserialize)]
struct SliceList {
    slices: Vec<Slice>,
}

#[derive(Debug, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub version: String,
}

/// API client for the network service
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let resp = request
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        decode_envelope(status, &text)
    }

    async fn call_data<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        match self.call(method, path, body).await? {
            Some(data) => Ok(data),
            None => bail!("Server response for {} carried no data", path),
        }
    }

    // ============ Health ============

    pub async fn health(&self) -> Result<Health> {
        let url = format!("{}/health", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;
        if !resp.status().is_success() {
            bail!("Health check failed: {}", resp.status());
        }
        Ok(resp.json().await?)
    }

    // ============ Topology ============

    pub async fn create_graph(&self) -> Result<()> {
        self.call::<Value>(Method::POST, "/api/network/graph", None)
            .await
            .map(|_| ())
    }

    pub async fn delete_graph(&self) -> Result<()> {
        self.call::<Value>(Method::DELETE, "/api/network/graph", None)
            .await
            .map(|_| ())
    }

    pub async fn show_graph(&self) -> Result<TopologyView> {
        self.call_data(Method::GET, "/api/network/graph", None).await
    }

    pub async fn graph_json(&self) -> Result<String> {
        let data: GraphJson = self
            .call_data(Method::GET, "/api/network/graph/json", None)
            .await?;
        Ok(data.graph)
    }

    // ============ Solver ============

    pub async fn set_solver(&self, host: &str, port: &str) -> Result<()> {
        let body = serde_json::json!({ "host": host, "port": port });
        self.call::<Value>(Method::PUT, "/api/network/cbs", Some(body))
            .await
            .map(|_| ())
    }

    pub async fn solve(&self, constraints: Vec<Value>) -> Result<String> {
        let body = serde_json::json!({ "constraints": constraints });
        let data: SolveAnswer = self
            .call_data(Method::POST, "/api/network/solve", Some(body))
            .await?;
        Ok(data.response)
    }

    // ============ Slices ============

    pub async fn create_slice(
        &self,
        constraints: Vec<Value>,
        cbs_addr: Option<&str>,
    ) -> Result<String> {
        let body = serde_json::json!({ "constraints": constraints, "cbs_addr": cbs_addr });
        let data: CreatedSlice = self
            .call_data(Method::POST, "/api/slices", Some(body))
            .await?;
        Ok(data.uuid)
    }

    pub async fn list_slices(&self) -> Result<Vec<Slice>> {
        let data: SliceList = self.call_data(Method::GET, "/api/slices", None).await?;
        Ok(data.slices)
    }

    pub async fn get_slice(&self, uuid: &str) -> Result<Slice> {
        self.call_data(Method::GET, &format!("/api/slices/{}", uuid), None)
            .await
    }

    pub async fn delete_slice(&self, uuid: &str) -> Result<()> {
        self.call::<Value>(Method::DELETE, &format!("/api/slices/{}", uuid), None)
            .await
            .map(|_| ())
    }

    pub async fn configure_slice(&self, uuid: &str) -> Result<SliceConfiguration> {
        self.call_data(Method::POST, &format!("/api/slices/{}/configure", uuid), None)
            .await
    }
}

/// Unwrap a service envelope, turning `success: false` into an error
pub fn decode_envelope<T: DeserializeOwned>(status: StatusCode, text: &str) -> Result<Option<T>> {
    let envelope: Envelope<T> = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(err) if status.is_success() => {
            return Err(err).context("Failed to parse server response");
        }
        Err(_) => bail!("Request failed: {} - {}", status, text.trim()),
    };

    if !envelope.success {
        let message = envelope
            .message
            .unwrap_or_else(|| "no message from server".to_string());
        bail!("Request failed ({}): {}", status, message);
    }

    Ok(envelope.data)
}
