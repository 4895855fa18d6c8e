//! Response types for the solver API

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A solved slice as the solver reports it
///
/// Devices are passed through as opaque JSON. Each edge is a flat string map
/// that carries at least `src` and `dst`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CbsOutput {
    #[serde(default, alias = "Nodes")]
    pub nodes: Vec<serde_json::Value>,
    #[serde(default, alias = "Edges")]
    pub edges: Vec<IndexMap<String, String>>,
}

impl CbsOutput {
    /// Decode a raw solver response body
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}
