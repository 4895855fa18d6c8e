//! Inventory Client - Interface to the inventory service
//!
//! This crate provides a typed HTTP client for the inventory service. The
//! network orchestrator uses it to:
//! - **List inventory items** when rebuilding the fabric topology
//! - **Fetch a single resource** when a link references a device that was
//!   not part of the listing
//!
//! # Architecture
//!
//! ```text
//! Orchestrator  -->  InventoryClient  -->  Inventory service (localhost:15005)
//!                    (this crate)
//! ```

mod types;

pub use types::*;

use std::time::Duration;

use tracing::debug;

/// Default inventory service URL
pub const DEFAULT_INVENTORY_URL: &str = "http://localhost:15005";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Error types for inventory client operations
#[derive(Debug, thiserror::Error)]
pub enum InventoryClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(reqwest::Error),

    #[error("inventory service not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        source: reqwest::Error,
    },

    #[error("inventory service returned error {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("resource not found in inventory: {0}")]
    NotFound(String),

    #[error("failed to parse inventory response: {0}")]
    ParseError(#[from] reqwest::Error),
}

/// Client for communicating with the inventory service
#[derive(Debug, Clone)]
pub struct InventoryClient {
    base_url: String,
    client: reqwest::Client,
}

impl InventoryClient {
    /// Create a client for the given base URL with the default timeout
    pub fn new(url: &str) -> Result<Self, InventoryClientError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit request timeout
    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self, InventoryClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(InventoryClientError::Build)?;

        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List every inventory item
    pub async fn list_inventory_items(&self) -> Result<Vec<InventoryItem>, InventoryClientError> {
        let resp = self
            .client
            .get(format!("{}/api/inventory/items", self.base_url))
            .send()
            .await
            .map_err(|e| InventoryClientError::NotReachable {
                url: self.base_url.clone(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(InventoryClientError::ApiError { status, body });
        }

        let list: ListInventoryItemsResponse = resp.json().await?;
        debug!("inventory listed {} items", list.items.len());
        Ok(list.items)
    }

    /// Fetch the inventory item holding the resource with this uuid
    pub async fn get_resource_item(
        &self,
        uuid: &str,
    ) -> Result<InventoryItem, InventoryClientError> {
        let resp = self
            .client
            .get(format!(
                "{}/api/inventory/resources/{}",
                self.base_url,
                urlencoding::encode(uuid)
            ))
            .send()
            .await
            .map_err(|e| InventoryClientError::NotReachable {
                url: self.base_url.clone(),
                source: e,
            })?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(InventoryClientError::NotFound(uuid.to_string()));
        }

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(InventoryClientError::ApiError { status, body });
        }

        let found: GetResourceItemResponse = resp.json().await?;
        found
            .item
            .ok_or_else(|| InventoryClientError::NotFound(uuid.to_string()))
    }
}
