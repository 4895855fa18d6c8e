//! Builds the fabric topology from inventory records
//!
//! Devices become vertices carrying their compute capacity. Networks
//! contribute one edge per link in their adjacency list, tagged with the
//! network's parent as `selector` so tenants can be pruned apart later.
//!
//! The build is best effort: a record that cannot be placed in the graph is
//! logged and skipped. Only failing to list the inventory aborts it.

use async_trait::async_trait;
use inventory_client::{InventoryClient, InventoryClientError, InventoryItem, Link, ResourceItem};
use tracing::{debug, error, info, warn};

use crate::graph::{Graph, GraphError, Properties, Vertex, PROP_SELECTOR, PROP_UUID};

/// Where the builder reads resources from
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn list_inventory_items(&self) -> Result<Vec<InventoryItem>, InventoryClientError>;

    async fn get_resource_item(&self, uuid: &str) -> Result<InventoryItem, InventoryClientError>;
}

#[async_trait]
impl InventorySource for InventoryClient {
    async fn list_inventory_items(&self) -> Result<Vec<InventoryItem>, InventoryClientError> {
        InventoryClient::list_inventory_items(self).await
    }

    async fn get_resource_item(&self, uuid: &str) -> Result<InventoryItem, InventoryClientError> {
        InventoryClient::get_resource_item(self, uuid).await
    }
}

/// `cpu`/`mem`/`disk` of a device. Physical capacity wins over virtual.
pub fn capacity_properties(resource: &ResourceItem) -> Properties {
    let mut props = Properties::new();
    if let Some(cap) = resource.phy.as_ref().or(resource.virt.as_ref()) {
        props.insert("cpu".to_string(), cap.cores.to_string());
        props.insert("mem".to_string(), cap.memory.to_string());
        props.insert("disk".to_string(), cap.storage.to_string());
    }
    props
}

/// Edge properties for one link of the network `name` owned by `parent`
pub fn link_properties(link: &Link, name: &str, parent: &str) -> Properties {
    let mut props = Properties::new();
    props.insert("bw".to_string(), link.bandwidth.to_string());
    props.insert("lat".to_string(), link.latency.to_string());
    props.insert("jit".to_string(), link.jitter.to_string());
    props.insert(PROP_UUID.to_string(), link.uuid.clone());
    props.insert("name".to_string(), name.to_string());
    props.insert(PROP_SELECTOR.to_string(), parent.to_string());
    props
}

fn add_device(graph: &mut Graph, resource: &ResourceItem) -> Result<(), GraphError> {
    info!("adding vertex: {}", resource.uuid);
    graph.add_vertex(&resource.uuid, "", Some(capacity_properties(resource)))?;
    Ok(())
}

/// Make sure `uuid` is a vertex, fetching it from inventory when needed.
/// Returns false when the link using it has to be skipped.
async fn ensure_endpoint(graph: &mut Graph, source: &dyn InventorySource, uuid: &str) -> bool {
    if graph.find_vertex(uuid).is_some() {
        return true;
    }

    let item = match source.get_resource_item(uuid).await {
        Ok(item) => item,
        Err(err) => {
            error!("link endpoint not found in inventory: {}: {}", uuid, err);
            return false;
        }
    };

    let Some(resource) = item.resource else {
        warn!("inventory item {} has no resource, skipping link", uuid);
        return false;
    };

    // the edge insertion creates a bare vertex if this fails
    if let Err(err) = add_device(graph, &resource) {
        error!("unable to add missing link endpoint {}: {}", uuid, err);
    }
    true
}

/// Build a fresh topology from everything `source` lists.
pub async fn build_topology(source: &dyn InventorySource) -> Result<Graph, InventoryClientError> {
    let items = source.list_inventory_items().await?;
    info!("items: {}", items.len());

    let mut graph = Graph::default();

    for item in &items {
        let Some(resource) = &item.resource else {
            continue;
        };

        let Some(network) = &resource.network else {
            if let Err(err) = add_device(&mut graph, resource) {
                error!("could not add {} to graph: {}", resource.uuid, err);
            }
            continue;
        };

        for link in &network.adjlist {
            if !ensure_endpoint(&mut graph, source, &link.src_resource).await {
                continue;
            }
            if !ensure_endpoint(&mut graph, source, &link.dst_resource).await {
                continue;
            }

            let props = link_properties(link, &network.name, &resource.parent);
            if let Err(err) = graph.add_edge(
                Vertex::new(&link.src_resource),
                Vertex::new(&link.dst_resource),
                Some(props),
            ) {
                error!(
                    "could not add edge {}:{} to graph: {}",
                    link.src_resource, link.dst_resource, err
                );
                continue;
            }
            debug!("added link {} of network {}", link.uuid, network.name);
        }
    }

    info!(
        "topology built with {} vertices and {} edges",
        graph.vertex_count(),
        graph.edge_count()
    );
    Ok(graph)
}
