//! Slice orchestration over the shared fabric topology
//!
//! The orchestrator owns the one topology snapshot the service works from
//! and the address of the external solver. Both sit behind a single async
//! mutex; every operation takes it for its whole duration, including the
//! solver round trip, so solves are serialized.

use std::sync::Arc;

use async_trait::async_trait;
use cbs_client::{CbsClient, CbsClientError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::builder::{build_topology, InventorySource};
use crate::dot;
use crate::graph::{null_as_default, Graph, PROP_ENDPOINT};
use crate::TopologyError;

/// Constraint object that pins a device into the slice
pub const CPU_OBJECT: &str = "cpu";

/// A placement/routing constraint handed to the solver
///
/// Only `object`, `vertices` and `selector` are interpreted here. Any other
/// solver field rides along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub object: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub vertices: Vec<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub selector: String,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Constraint {
    pub fn new(object: impl Into<String>, vertices: Vec<String>) -> Self {
        Self {
            object: object.into(),
            vertices,
            ..Default::default()
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }
}

/// Body posted to the solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverRequest {
    #[serde(rename = "Constraints")]
    pub constraints: Vec<Constraint>,
    #[serde(rename = "Graph")]
    pub graph: Graph,
}

/// The external constraint solver
#[async_trait]
pub trait Solver: Send + Sync {
    /// Submit `request` to the solver at `address` and return its raw answer
    async fn solve(&self, address: &str, request: &SolverRequest) -> Result<String, CbsClientError>;
}

#[async_trait]
impl Solver for CbsClient {
    async fn solve(
        &self,
        address: &str,
        request: &SolverRequest,
    ) -> Result<String, CbsClientError> {
        CbsClient::solve(self, address, request).await
    }
}

/// Result of a show request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyView {
    pub exists: bool,
    #[serde(default)]
    pub dotviz: String,
}

/// Turn a topology snapshot and a constraint batch into a solver request.
///
/// `cpu` constraints mark their first vertex as an endpoint. If a selector
/// is present the graph is pruned to it. Nothing here touches `topology`.
pub fn prepare_request(
    topology: &Graph,
    constraints: Vec<Constraint>,
) -> Result<SolverRequest, TopologyError> {
    let mut graph = topology.deep_copy();

    for constraint in constraints.iter().filter(|c| c.object == CPU_OBJECT) {
        let Some(name) = constraint.vertices.first() else {
            return Err(TopologyError::MalformedConstraint(
                "cpu constraint without vertices".to_string(),
            ));
        };
        let vertex = graph
            .find_vertex_mut(name)
            .ok_or_else(|| TopologyError::VertexNotFound(name.clone()))?;
        vertex.set_property(PROP_ENDPOINT, "yes");
        info!("updating vertex info: {} {:?}", vertex.name, vertex.properties);
    }

    let mut selector: Option<&str> = None;
    for constraint in constraints.iter().filter(|c| !c.selector.is_empty()) {
        match selector {
            Some(current) if current != constraint.selector => {
                return Err(TopologyError::MultipleSelectors(
                    current.to_string(),
                    constraint.selector.clone(),
                ));
            }
            _ => selector = Some(constraint.selector.as_str()),
        }
    }

    info!("selector for solving: {}", selector.unwrap_or_default());
    debug!("global graph:\n{}", graph);

    let graph = match selector {
        Some(selector) => {
            let pruned = graph.prune(selector);
            debug!("after prune graph:\n{}", pruned);
            pruned
        }
        None => {
            info!("selector not set, using primary graph");
            graph
        }
    };

    Ok(SolverRequest { constraints, graph })
}

#[derive(Debug, Default)]
struct State {
    topology: Option<Graph>,
    solver_address: Option<String>,
}

/// Holds the shared topology and drives solves against it
pub struct SliceOrchestrator {
    inventory: Arc<dyn InventorySource>,
    solver: Arc<dyn Solver>,
    state: Mutex<State>,
}

impl SliceOrchestrator {
    pub fn new(inventory: Arc<dyn InventorySource>, solver: Arc<dyn Solver>) -> Self {
        Self {
            inventory,
            solver,
            state: Mutex::new(State::default()),
        }
    }

    /// Start with a known solver `host:port`
    pub fn with_solver_address(self, address: impl Into<String>) -> Self {
        let address = address.into();
        let state = State {
            solver_address: (!address.is_empty()).then_some(address),
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
            ..self
        }
    }

    /// Rebuild the topology from inventory and replace the current one
    pub async fn create_topology(&self) -> Result<(), TopologyError> {
        // the build does inventory I/O, so it runs before taking the lock
        let graph = build_topology(self.inventory.as_ref()).await?;

        let mut state = self.state.lock().await;
        info!(
            "replacing topology ({} vertices, {} edges)",
            graph.vertex_count(),
            graph.edge_count()
        );
        state.topology = Some(graph);
        Ok(())
    }

    pub async fn delete_topology(&self) {
        let mut state = self.state.lock().await;
        if state.topology.take().is_some() {
            info!("topology deleted");
        }
    }

    pub async fn show_topology(&self) -> Result<TopologyView, TopologyError> {
        let state = self.state.lock().await;
        let Some(graph) = &state.topology else {
            return Ok(TopologyView::default());
        };
        Ok(TopologyView {
            exists: true,
            dotviz: dot::render(graph)?,
        })
    }

    pub async fn get_topology_json(&self) -> Result<String, TopologyError> {
        let state = self.state.lock().await;
        let graph = state.topology.as_ref().ok_or(TopologyError::TopologyMissing)?;
        Ok(graph.to_json()?)
    }

    /// Point solves at `host:port`
    pub async fn set_solver_address(
        &self,
        host: &str,
        port: &str,
    ) -> Result<String, TopologyError> {
        if host.is_empty() || port.is_empty() {
            return Err(TopologyError::InvalidSolverAddress {
                host: host.to_string(),
                port: port.to_string(),
            });
        }

        let address = format!("{}:{}", host, port);
        let mut state = self.state.lock().await;
        info!("solver location set to {}", address);
        state.solver_address = Some(address.clone());
        Ok(address)
    }

    pub async fn solver_address(&self) -> Option<String> {
        self.state.lock().await.solver_address.clone()
    }

    /// Validate `constraints`, send them with the topology to the solver and
    /// return the solver's answer unmodified.
    pub async fn request_solution(
        &self,
        constraints: Vec<Constraint>,
    ) -> Result<String, TopologyError> {
        if constraints.is_empty() {
            return Err(TopologyError::EmptyConstraints);
        }

        let state = self.state.lock().await;
        let address = state
            .solver_address
            .as_deref()
            .ok_or(TopologyError::SolverNotSet)?;
        let topology = state.topology.as_ref().ok_or(TopologyError::TopologyMissing)?;

        let request = prepare_request(topology, constraints)?;

        info!(
            "sending {} constraint(s) and {} edge(s) to solver at {}",
            request.constraints.len(),
            request.graph.edge_count(),
            address
        );
        let body = self.solver.solve(address, &request).await?;
        debug!("resp from solver: {}", body);

        Ok(body)
    }
}
