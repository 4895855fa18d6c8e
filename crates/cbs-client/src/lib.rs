//! CBS Client - HTTP client for the constraint-based solver
//!
//! The solver accepts a topology graph plus a batch of placement/routing
//! constraints on `POST /cbs` and answers with a candidate slice. This
//! client does not interpret the answer: the body is returned verbatim so
//! the caller decides how to decode it (see [`CbsOutput`]).

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

pub mod types;
pub use types::*;

/// Content type the solver expects on requests
pub const CBS_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Error types for solver client operations
#[derive(Debug, thiserror::Error)]
pub enum CbsClientError {
    #[error("failed to encode solver request: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("solver not reachable at {addr}: {source}")]
    NotReachable {
        addr: String,
        source: reqwest::Error,
    },
    #[error("failed to read solver response: {0}")]
    ReadBody(reqwest::Error),
}

/// Client for the solver API
///
/// The solver address is supplied per call because the orchestrator lets
/// operators move the solver at runtime.
#[derive(Clone, Default)]
pub struct CbsClient {
    client: Client,
}

impl CbsClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Endpoint for a `host:port` solver address
    pub fn endpoint(address: &str) -> String {
        format!("http://{}/cbs", address)
    }

    /// Post a request body to the solver and return the raw response body
    ///
    /// No retry is attempted. A non-success status is logged but the body is
    /// still handed back unchanged.
    pub async fn solve<T: Serialize + ?Sized>(
        &self,
        address: &str,
        request: &T,
    ) -> Result<String, CbsClientError> {
        let body = serde_json::to_vec(request)?;
        let url = Self::endpoint(address);
        debug!("posting {} bytes to solver at {}", body.len(), url);

        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, CBS_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| CbsClientError::NotReachable {
                addr: address.to_string(),
                source: e,
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(CbsClientError::ReadBody)?;
        if !status.is_success() {
            warn!("solver at {} answered {}: {}", address, status, text);
        }

        Ok(text)
    }
}
