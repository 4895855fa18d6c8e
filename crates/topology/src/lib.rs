//! # Topology - fabric graph and slice orchestration
//!
//! Builds a multigraph of devices and links out of the inventory, carves
//! tenant views out of it by selector, hands constraint batches to the
//! external solver and turns the solver's edge list back into a device
//! order.
//!
//! ## Pieces
//!
//! - [`graph`]: the vertex/edge store and its identity rules
//! - [`path`]: chain walking over a solved edge list
//! - [`builder`]: inventory records to graph
//! - [`orchestrator`]: the shared topology and the solve pipeline
//! - [`slices`]: persisted solver answers
//! - [`dot`]: Graphviz output

pub mod builder;
pub mod dot;
pub mod graph;
pub mod orchestrator;
pub mod path;
pub mod slices;

pub use builder::{build_topology, InventorySource};
pub use graph::{Edge, Graph, GraphError, Properties, Vertex};
pub use orchestrator::{Constraint, SliceOrchestrator, Solver, SolverRequest, TopologyView};
pub use path::{resolve_path, walk, EdgeDescriptor, PathError};
pub use slices::{Slice, SliceConfiguration, SliceManager};

use cbs_client::CbsClientError;
use db::StoreError;
use inventory_client::InventoryClientError;

/// Errors surfaced by orchestrator and slice operations
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryClientError),

    #[error("solver error: {0}")]
    Solver(#[from] CbsClientError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("constraints not given")]
    EmptyConstraints,

    #[error("solver location has not been set yet, set it first")]
    SolverNotSet,

    #[error("graph not found, must be created first")]
    TopologyMissing,

    #[error("either host or port was not set: [{host}:{port}]")]
    InvalidSolverAddress { host: String, port: String },

    #[error("constraint not formatted correctly: {0}")]
    MalformedConstraint(String),

    #[error("couldn't find constraint vertex in graph: {0}")]
    VertexNotFound(String),

    #[error("too many edge selectors given: {0}, {1}. Can only use 1")]
    MultipleSelectors(String, String),

    #[error("solver response could not be decoded: {0}")]
    SolverResponse(serde_json::Error),

    #[error("invalid slice id: {0}")]
    InvalidSliceId(String),

    #[error("slice not found: {0}")]
    SliceNotFound(String),

    #[error("there are no {missing} in slice {uuid}")]
    EmptySlice { uuid: String, missing: &'static str },

    #[error("no management address for {device}: {reason}")]
    ManagementAddress { device: String, reason: String },
}

pub type Result<T> = std::result::Result<T, TopologyError>;
