//! Chain path resolution
//!
//! The solver answers with an unordered list of `{src, dst}` edges. When the
//! slice is a simple chain those edges can be walked end to end to get the
//! order in which devices have to be configured.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::graph::{Edge, Graph, GraphError, Vertex};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("source not in graph: {0}")]
    SourceNotInGraph(String),

    #[error("target not in graph: {0}")]
    TargetNotInGraph(String),

    #[error("edge {0} has less than 2 vertices")]
    MalformedEdge(String),

    #[error("walk toward {target} went past {limit} vertices: {path:?}")]
    InfiniteLoopGuard {
        target: String,
        limit: usize,
        path: Vec<String>,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// One undirected hop as reported by the solver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDescriptor {
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub dst: String,
}

impl EdgeDescriptor {
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
        }
    }

    /// Read `src`/`dst` out of a solver edge map. Missing keys become empty
    /// names, which the graph rejects.
    pub fn from_map(map: &IndexMap<String, String>) -> Self {
        Self {
            src: map.get("src").cloned().unwrap_or_default(),
            dst: map.get("dst").cloned().unwrap_or_default(),
        }
    }
}

/// Order the devices of a chain described by `edges`.
///
/// The first degree-1 vertex seen is the source and the last one the target.
/// Either traversal direction may come back.
pub fn resolve_path(edges: &[EdgeDescriptor]) -> Result<Vec<String>, PathError> {
    let mut graph = Graph::new("path-select");
    let mut degree: IndexMap<String, usize> = IndexMap::new();

    for descriptor in edges {
        let edge = Edge::new(
            Vertex::new(&descriptor.src),
            Vertex::new(&descriptor.dst),
            None,
        )?;
        graph.add_edge_obj(&edge).map_err(|err| {
            error!("failed to add path edge {}: {}", edge.name, err);
            err
        })?;

        *degree.entry(descriptor.src.clone()).or_default() += 1;
        *degree.entry(descriptor.dst.clone()).or_default() += 1;
    }

    let mut ends = degree
        .iter()
        .filter(|(_, count)| **count == 1)
        .map(|(name, _)| name.as_str());
    let source = ends.next().unwrap_or_default().to_string();
    let target = ends.last().unwrap_or_default().to_string();

    info!("found: {} <--> {}", source, target);

    walk(&source, &target, &graph)
}

/// Walk `graph` from `source` until `target` or a dead end is reached.
pub fn walk(source: &str, target: &str, graph: &Graph) -> Result<Vec<String>, PathError> {
    if graph.find_vertex(source).is_none() {
        return Err(PathError::SourceNotInGraph(source.to_string()));
    }
    if graph.find_vertex(target).is_none() {
        return Err(PathError::TargetNotInGraph(target.to_string()));
    }

    if source == target {
        return Ok(vec![source.to_string()]);
    }

    let limit = graph.vertex_count();
    let mut path = vec![source.to_string()];
    let mut prev: Option<String> = None;
    let mut current = source.to_string();

    loop {
        let Some(next) = next_hop(prev.as_deref(), &current, graph)? else {
            debug!("dead end at {}", current);
            return Ok(path);
        };

        path.push(next.clone());
        prev = Some(std::mem::replace(&mut current, next));

        if current == target {
            return Ok(path);
        }

        debug!("path: {:?}", path);

        // a chain never has more hops than vertices
        if path.len() >= limit {
            error!("walk toward {} is going infinite: {:?}", target, path);
            return Err(PathError::InfiniteLoopGuard {
                target: target.to_string(),
                limit,
                path,
            });
        }
    }
}

/// First neighbor of `current` across an edge that does not lead back to
/// `prev`. Without a `prev` any incident edge qualifies.
fn next_hop(prev: Option<&str>, current: &str, graph: &Graph) -> Result<Option<String>, PathError> {
    for edge in &graph.edges {
        let (x, y) = edge
            .endpoints()
            .map_err(|_| PathError::MalformedEdge(edge.name.clone()))?;

        let other = if x == current {
            y
        } else if y == current {
            x
        } else {
            continue;
        };

        if prev != Some(other) {
            return Ok(Some(other.to_string()));
        }
    }
    Ok(None)
}
