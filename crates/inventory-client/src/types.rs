//! Type definitions for inventory service responses
//!
//! These mirror the inventory records the orchestrator consumes: an
//! inventory item wraps a resource, and a resource is either a device
//! (physical and/or virtual capacity) or a network (an adjacency list of
//! links between devices).

use serde::{Deserialize, Serialize};

/// Top-level inventory record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub uuid: String,
    #[serde(default)]
    pub resource: Option<ResourceItem>,
    #[serde(default)]
    pub entity: Option<Entity>,
    #[serde(default)]
    pub version: i64,
}

/// Entity type of a management IP address
pub const ENTITY_IP: &str = "IP";

/// Management identity of an inventory item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub idtype: String,
    pub identification: String,
}

/// A resource: a device, or a network when `network` is set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceItem {
    pub uuid: String,
    /// Owning tenant or logical network. Becomes the edge selector.
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub phy: Option<Capacity>,
    #[serde(default)]
    pub virt: Option<Capacity>,
    #[serde(default)]
    pub network: Option<Network>,
    #[serde(default)]
    pub version: i64,
}

/// Compute capacity of a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    #[serde(default)]
    pub cores: u64,
    #[serde(default)]
    pub memory: u64,
    #[serde(default)]
    pub storage: u64,
}

/// A network and its links
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    #[serde(default)]
    pub adjlist: Vec<Link>,
}

/// A physical or logical link between two resources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub uuid: String,
    pub src_resource: String,
    pub dst_resource: String,
    #[serde(default)]
    pub bandwidth: u64,
    #[serde(default)]
    pub latency: u64,
    #[serde(default)]
    pub jitter: u64,
}

/// Response of the item listing endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListInventoryItemsResponse {
    #[serde(default)]
    pub items: Vec<InventoryItem>,
}

/// Response of the single resource endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetResourceItemResponse {
    #[serde(default)]
    pub item: Option<InventoryItem>,
}
