//! Slices: persisted solver answers
//!
//! A slice is created by asking the orchestrator for a solution and storing
//! the devices and edges the solver picked. Configuring a slice looks up the
//! management address of every device on it and walks its edges into the
//! order the hops have to be set up in.

use std::sync::Arc;

use cbs_client::CbsOutput;
use db::{list_objects, read_object, write_object, ObjectStore, StoredObject};
use indexmap::IndexMap;
use inventory_client::ENTITY_IP;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::builder::InventorySource;
use crate::orchestrator::{Constraint, SliceOrchestrator};
use crate::path::{resolve_path, EdgeDescriptor};
use crate::TopologyError;

/// Key prefix of every stored slice
pub const SLICE_PREFIX: &str = "/slice/";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    pub name: String,
    pub uuid: String,
    #[serde(default)]
    pub devices: Vec<serde_json::Value>,
    #[serde(default)]
    pub edges: Vec<IndexMap<String, String>>,
    #[serde(default)]
    pub version: i64,
}

impl StoredObject for Slice {
    fn key(&self) -> String {
        format!("{}{}", SLICE_PREFIX, self.uuid)
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

/// What configuring a slice resolves
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceConfiguration {
    /// Device order along the slice
    pub path: Vec<String>,
    /// Management IP per device
    pub management: IndexMap<String, String>,
}

pub struct SliceManager {
    orchestrator: Arc<SliceOrchestrator>,
    store: Arc<dyn ObjectStore>,
    inventory: Arc<dyn InventorySource>,
}

impl SliceManager {
    pub fn new(
        orchestrator: Arc<SliceOrchestrator>,
        store: Arc<dyn ObjectStore>,
        inventory: Arc<dyn InventorySource>,
    ) -> Self {
        Self {
            orchestrator,
            store,
            inventory,
        }
    }

    /// Solve `constraints` and store the answer as a new slice.
    ///
    /// `solver`, a `host:port` pair, repoints the orchestrator first.
    pub async fn create_slice(
        &self,
        constraints: Vec<Constraint>,
        solver: Option<&str>,
    ) -> Result<Slice, TopologyError> {
        if let Some(address) = solver {
            let (host, port) =
                address
                    .split_once(':')
                    .ok_or_else(|| TopologyError::InvalidSolverAddress {
                        host: address.to_string(),
                        port: String::new(),
                    })?;
            self.orchestrator.set_solver_address(host, port).await?;
        }

        info!("constraints: {:?}", constraints);
        let body = self.orchestrator.request_solution(constraints).await?;
        let solution = CbsOutput::from_body(&body).map_err(TopologyError::SolverResponse)?;

        let id = Uuid::new_v4().to_string();
        let mut slice = Slice {
            name: id.clone(),
            uuid: id,
            devices: solution.nodes,
            edges: solution.edges,
            version: 0,
        };
        write_object(self.store.as_ref(), &mut slice).await?;

        info!("uuid for solution: {}", slice.uuid);
        Ok(slice)
    }

    pub async fn list_slices(&self) -> Result<Vec<Slice>, TopologyError> {
        let slices: Vec<Slice> = list_objects(self.store.as_ref(), SLICE_PREFIX).await?;
        info!("slices found: {}", slices.len());
        Ok(slices)
    }

    pub async fn get_slice(&self, id: &str) -> Result<Slice, TopologyError> {
        let key = slice_key(id)?;
        read_object(self.store.as_ref(), &key)
            .await?
            .ok_or_else(|| TopologyError::SliceNotFound(id.to_string()))
    }

    pub async fn delete_slice(&self, id: &str) -> Result<(), TopologyError> {
        let key = slice_key(id)?;
        if !self.store.delete(&key).await? {
            return Err(TopologyError::SliceNotFound(id.to_string()));
        }
        info!("slice {} deleted", id);
        Ok(())
    }

    /// Resolve management addresses and the hop order of a stored slice
    pub async fn configure_slice(&self, id: &str) -> Result<SliceConfiguration, TopologyError> {
        let slice = self.get_slice(id).await?;

        if slice.devices.is_empty() {
            error!("there are no devices in slice {}", id);
            return Err(TopologyError::EmptySlice {
                uuid: id.to_string(),
                missing: "devices",
            });
        }
        if slice.edges.is_empty() {
            error!("there are no edges in slice {}", id);
            return Err(TopologyError::EmptySlice {
                uuid: id.to_string(),
                missing: "edges",
            });
        }

        let mut management = IndexMap::new();
        for edge in &slice.edges {
            for end in ["src", "dst"] {
                let Some(device) = edge.get(end) else {
                    continue;
                };
                if !management.contains_key(device) {
                    let address = self.management_address(device).await?;
                    management.insert(device.clone(), address);
                }
            }
        }
        info!("edge management ips found: {:?}", management);

        let descriptors: Vec<EdgeDescriptor> =
            slice.edges.iter().map(EdgeDescriptor::from_map).collect();
        let path = resolve_path(&descriptors).map_err(|err| {
            error!("create path failure: {}", err);
            err
        })?;
        info!("path through slice: {:?}", path);

        Ok(SliceConfiguration { path, management })
    }

    async fn management_address(&self, device: &str) -> Result<String, TopologyError> {
        let item = self.inventory.get_resource_item(device).await?;
        let entity = item.entity.ok_or_else(|| TopologyError::ManagementAddress {
            device: device.to_string(),
            reason: "inventory object has no entity".to_string(),
        })?;

        if entity.idtype != ENTITY_IP {
            return Err(TopologyError::ManagementAddress {
                device: device.to_string(),
                reason: format!("unknown entity type {}", entity.idtype),
            });
        }
        Ok(entity.identification)
    }
}

fn slice_key(id: &str) -> Result<String, TopologyError> {
    Uuid::parse_str(id).map_err(|_| TopologyError::InvalidSliceId(id.to_string()))?;
    Ok(format!("{}{}", SLICE_PREFIX, id))
}

#[cfg(test)]
mod tests {
    use db::MemoryStore;
    use inventory_client::{Entity, InventoryItem};

    use super::*;
    use crate::builder::tests::{device, FakeInventory};
    use crate::orchestrator::tests::{fabric, FakeSolver};
    use crate::orchestrator::CPU_OBJECT;

    fn dev(n: u32) -> String {
        format!("00000000-0000-0000-0000-00000000000{}", n)
    }

    fn chain_answer() -> String {
        let hops = [(2, 7), (3, 1), (5, 4), (6, 5), (7, 6), (4, 3)];
        let edges: Vec<serde_json::Value> = hops
            .iter()
            .map(|(a, b)| serde_json::json!({"src": dev(*a), "dst": dev(*b), "bw": "10"}))
            .collect();
        let nodes: Vec<serde_json::Value> = (1..=7)
            .map(|n| serde_json::json!({"name": dev(n)}))
            .collect();
        serde_json::json!({"Nodes": nodes, "Edges": edges}).to_string()
    }

    fn managed_inventory() -> FakeInventory {
        let mut inventory = fabric();
        for n in 1..=7 {
            let mut item = device(&dev(n), Some(1), None);
            item.entity = Some(Entity {
                idtype: ENTITY_IP.to_string(),
                identification: format!("192.168.0.{}", n),
            });
            inventory.resources.insert(dev(n), item);
        }
        inventory
    }

    async fn manager(answer: &str) -> (SliceManager, Arc<FakeSolver>, Arc<MemoryStore>) {
        let inventory = Arc::new(managed_inventory());
        let solver = Arc::new(FakeSolver::answering(answer));
        let orchestrator = Arc::new(SliceOrchestrator::new(inventory.clone(), solver.clone()));
        orchestrator.create_topology().await.unwrap();

        let store = Arc::new(MemoryStore::new());
        let manager = SliceManager::new(orchestrator, store.clone(), inventory);
        (manager, solver, store)
    }

    fn pin(vertex: &str) -> Vec<Constraint> {
        vec![Constraint::new(CPU_OBJECT, vec![vertex.to_string()])]
    }

    #[tokio::test]
    async fn test_create_and_configure_slice() {
        let (manager, solver, store) = manager(&chain_answer()).await;

        let slice = manager.create_slice(pin("a"), Some("localhost:15000")).await.unwrap();
        assert_eq!(slice.name, slice.uuid);
        assert_eq!(slice.version, 1);
        assert_eq!(slice.devices.len(), 7);
        assert_eq!(slice.edges.len(), 6);
        assert_eq!(store.len(), 1);
        assert_eq!(solver.calls.lock().unwrap()[0].0, "localhost:15000");

        let config = manager.configure_slice(&slice.uuid).await.unwrap();
        let expected: Vec<String> = [2, 7, 6, 5, 4, 3, 1].into_iter().map(dev).collect();
        let mut reversed = expected.clone();
        reversed.reverse();
        assert!(config.path == expected || config.path == reversed);

        assert_eq!(config.management.len(), 7);
        assert_eq!(config.management.get(&dev(4)).map(String::as_str), Some("192.168.0.4"));
    }

    #[tokio::test]
    async fn test_list_get_delete() {
        let (manager, _, _) = manager(&chain_answer()).await;
        manager.orchestrator.set_solver_address("h", "1").await.unwrap();

        let first = manager.create_slice(pin("a"), None).await.unwrap();
        let second = manager.create_slice(pin("b"), None).await.unwrap();

        let listed = manager.list_slices().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|s| s.uuid == first.uuid));

        let fetched = manager.get_slice(&second.uuid).await.unwrap();
        assert_eq!(fetched, second);

        manager.delete_slice(&first.uuid).await.unwrap();
        assert!(matches!(
            manager.get_slice(&first.uuid).await,
            Err(TopologyError::SliceNotFound(_))
        ));
        assert!(matches!(
            manager.delete_slice(&first.uuid).await,
            Err(TopologyError::SliceNotFound(_))
        ));
        assert_eq!(manager.list_slices().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_slice_ids_must_be_uuids() {
        let (manager, _, _) = manager("{}").await;
        assert!(matches!(
            manager.get_slice("not-a-uuid").await,
            Err(TopologyError::InvalidSliceId(_))
        ));
        assert!(matches!(
            manager.configure_slice("../etc").await,
            Err(TopologyError::InvalidSliceId(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_solver_address_or_answer() {
        let (manager, solver, store) = manager("not json").await;

        assert!(matches!(
            manager.create_slice(pin("a"), Some("no-port")).await,
            Err(TopologyError::InvalidSolverAddress { .. })
        ));
        assert_eq!(solver.call_count(), 0);

        assert!(matches!(
            manager.create_slice(pin("a"), Some("h:1")).await,
            Err(TopologyError::SolverResponse(_))
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_configure_requires_devices_and_edges() {
        let (manager, _, _) = manager(r#"{"nodes":[{"name":"x"}],"edges":[]}"#).await;
        let slice = manager.create_slice(pin("a"), Some("h:1")).await.unwrap();

        assert!(matches!(
            manager.configure_slice(&slice.uuid).await,
            Err(TopologyError::EmptySlice { missing: "edges", .. })
        ));
    }

    #[tokio::test]
    async fn test_configure_needs_ip_management_entity() {
        let answer = r#"{"nodes":[{"name":"a"}],"edges":[{"src":"a","dst":"b"}]}"#;
        let inventory = {
            let mut inv = managed_inventory();
            let mut a = device("a", Some(1), None);
            a.entity = Some(Entity {
                idtype: "MAC".to_string(),
                identification: "aa:bb".to_string(),
            });
            inv.resources.insert("a".to_string(), a);
            inv.resources.insert(
                "b".to_string(),
                InventoryItem {
                    uuid: "b".to_string(),
                    ..Default::default()
                },
            );
            Arc::new(inv)
        };
        let orchestrator = Arc::new(SliceOrchestrator::new(
            inventory.clone(),
            Arc::new(FakeSolver::answering(answer)),
        ));
        orchestrator.create_topology().await.unwrap();
        let manager = SliceManager::new(orchestrator, Arc::new(MemoryStore::new()), inventory);

        let slice = manager.create_slice(pin("a"), Some("h:1")).await.unwrap();
        match manager.configure_slice(&slice.uuid).await {
            Err(TopologyError::ManagementAddress { device, reason }) => {
                assert_eq!(device, "a");
                assert!(reason.contains("MAC"));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
