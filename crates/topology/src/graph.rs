//! Graph store for the fabric topology
//!
//! A small multigraph kept as flat vectors. Vertices are identified by name.
//! Edges are identified by the *set* of their two vertex names plus an
//! optional `uuid` property: re-adding the same physical link is rejected,
//! while a second link with a different `uuid` between the same two devices
//! is accepted as a parallel edge.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

/// String properties attached to vertices and edges
pub type Properties = IndexMap<String, String>;

/// Physical link identity
pub const PROP_UUID: &str = "uuid";
/// Tenant / logical network tag
pub const PROP_SELECTOR: &str = "selector";
/// Marks a vertex the solver must anchor the slice on
pub const PROP_ENDPOINT: &str = "endpoint";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("vertex already exists: {0}")]
    DuplicateVertex(String),

    #[error("edge already exists: {0}")]
    DuplicateEdge(String),

    #[error("vertex missing name field")]
    MissingName,

    #[error("vertex not found in graph: {0}")]
    VertexNotFound(String),

    #[error("vertices share the same name: {0}")]
    SelfLoop(String),

    #[error("edge {name} has {count} vertices, expected 2")]
    MalformedEdge { name: String, count: usize },

    #[error("edge {0} needs a selector property to be deleted")]
    MissingSelector(String),

    #[error("delete edge called on graph without edges")]
    NoEdges,

    #[error("graph serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Serialization(err.to_string())
    }
}

/// A device or resource in the topology
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub properties: Option<Properties>,
    #[serde(default)]
    pub weight: i64,
}

impl Vertex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.as_ref()?.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties
            .get_or_insert_with(Properties::new)
            .insert(key.into(), value.into());
    }
}

/// A link between two vertices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vertices: Vec<Vertex>,
    #[serde(default)]
    pub properties: Option<Properties>,
    #[serde(default)]
    pub weight: i64,
}

impl Edge {
    /// Build a standalone edge. The name is derived from the vertex names.
    pub fn new(v1: Vertex, v2: Vertex, properties: Option<Properties>) -> Result<Self, GraphError> {
        if v1.name.is_empty() || v2.name.is_empty() {
            return Err(GraphError::MissingName);
        }

        if v1.name == v2.name {
            return Err(GraphError::SelfLoop(v1.name));
        }

        Ok(Self {
            name: format!("{}-{}", v1.name, v2.name),
            vertices: vec![v1, v2],
            properties,
            weight: 0,
        })
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.as_ref()?.get(key).map(String::as_str)
    }

    /// The two vertex names, in insertion order
    pub fn endpoints(&self) -> Result<(&str, &str), GraphError> {
        match self.vertices.as_slice() {
            [a, b, ..] => Ok((a.name.as_str(), b.name.as_str())),
            _ => Err(GraphError::MalformedEdge {
                name: self.name.clone(),
                count: self.vertices.len(),
            }),
        }
    }

    fn vertex_names(&self) -> BTreeSet<&str> {
        self.vertices.iter().map(|v| v.name.as_str()).collect()
    }
}

/// The topology graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vertices: Vec<Vertex>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn find_vertex(&self, name: &str) -> Option<&Vertex> {
        self.vertices.iter().find(|v| v.name == name)
    }

    pub fn find_vertex_mut(&mut self, name: &str) -> Option<&mut Vertex> {
        self.vertices.iter_mut().find(|v| v.name == name)
    }

    pub fn add_vertex(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        properties: Option<Properties>,
    ) -> Result<&Vertex, GraphError> {
        self.add_vertex_obj(Vertex {
            name: name.into(),
            value: value.into(),
            properties,
            weight: 0,
        })
    }

    pub fn add_vertex_obj(&mut self, vertex: Vertex) -> Result<&Vertex, GraphError> {
        if vertex.name.is_empty() {
            return Err(GraphError::MissingName);
        }

        if self.find_vertex(&vertex.name).is_some() {
            return Err(GraphError::DuplicateVertex(vertex.name));
        }

        let idx = self.vertices.len();
        self.vertices.push(vertex);
        Ok(&self.vertices[idx])
    }

    /// Every stored edge whose vertex-name set equals that of `edge`
    pub fn find_edges(&self, edge: &Edge) -> Vec<&Edge> {
        let wanted = edge.vertex_names();
        self.edges
            .iter()
            .filter(|e| e.vertex_names() == wanted)
            .collect()
    }

    /// Add an edge between `v1` and `v2`, inserting either vertex if absent.
    pub fn add_edge(
        &mut self,
        v1: Vertex,
        v2: Vertex,
        properties: Option<Properties>,
    ) -> Result<&Edge, GraphError> {
        let edge = Edge::new(v1, v2, properties)?;

        for v in &edge.vertices {
            if self.find_vertex(&v.name).is_none() {
                debug!("adding vertex {} for edge {}", v.name, edge.name);
                self.add_vertex_obj(v.clone())?;
            }
        }

        let matches = self.find_edges(&edge);
        if !matches.is_empty() {
            let Some(uuid) = edge.property(PROP_UUID) else {
                return Err(GraphError::DuplicateEdge(edge.name));
            };
            if matches.iter().any(|e| e.property(PROP_UUID) == Some(uuid)) {
                return Err(GraphError::DuplicateEdge(edge.name));
            }
            debug!("parallel edge {} with uuid {}", edge.name, uuid);
        } else {
            debug!("adding edge {}", edge.name);
        }

        let idx = self.edges.len();
        self.edges.push(edge);
        Ok(&self.edges[idx])
    }

    /// Add a prebuilt edge. It must carry exactly two vertices.
    pub fn add_edge_obj(&mut self, edge: &Edge) -> Result<&Edge, GraphError> {
        match edge.vertices.as_slice() {
            [v1, v2] => self.add_edge(v1.clone(), v2.clone(), edge.properties.clone()),
            _ => Err(GraphError::MalformedEdge {
                name: edge.name.clone(),
                count: edge.vertices.len(),
            }),
        }
    }

    /// A fully independent copy: nothing is shared with `self`.
    pub fn deep_copy(&self) -> Graph {
        self.clone()
    }

    /// Remove the edges named like `target` that carry the same selector.
    ///
    /// Same-named edges without any properties are removed as well.
    /// Returns how many edges were removed.
    pub fn delete_edge(&mut self, target: &Edge) -> Result<usize, GraphError> {
        if self.edges.is_empty() {
            return Err(GraphError::NoEdges);
        }

        let selector = target
            .property(PROP_SELECTOR)
            .ok_or_else(|| GraphError::MissingSelector(target.name.clone()))?;

        let before = self.edges.len();
        self.edges.retain(|e| {
            if e.name != target.name {
                return true;
            }
            match &e.properties {
                None => {
                    debug!("deleted edge {} without properties", e.name);
                    false
                }
                Some(props) => {
                    let theirs = props.get(PROP_SELECTOR).map(String::as_str).unwrap_or("");
                    theirs != selector
                }
            }
        });

        let removed = before - self.edges.len();
        if removed > 0 {
            info!("deleted {} edge(s) named {} with selector {}", removed, target.name, selector);
        }
        Ok(removed)
    }

    /// Copy of the graph restricted to the edges tagged with `selector`.
    ///
    /// Vertices are kept even when pruning leaves them without edges.
    pub fn prune(&self, selector: &str) -> Graph {
        if selector.is_empty() {
            warn!("prune called without selector value");
            return self.deep_copy();
        }

        if self.edges.is_empty() {
            warn!("prune called with graph with no edges");
            return self.deep_copy();
        }

        info!("prune called with selector: {}", selector);

        let mut pruned = self.deep_copy();
        pruned.edges.retain(|e| {
            let keep = e.property(PROP_SELECTOR) == Some(selector);
            if !keep {
                debug!("pruning edge {} (selector {:?})", e.name, e.property(PROP_SELECTOR));
            }
            keep
        });
        pruned
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Graph, GraphError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Graph: {}", self.name)?;
        if self.vertices.is_empty() {
            return writeln!(f, "is empty");
        }

        writeln!(f, "Vertices:")?;
        for v in &self.vertices {
            writeln!(f, "\t{}: {:?}", v.name, v.properties)?;
        }

        if self.edges.is_empty() {
            return writeln!(f, "No Edges.");
        }

        writeln!(f, "Edges:")?;
        for e in &self.edges {
            if let Ok((a, b)) = e.endpoints() {
                writeln!(f, "\t{}->{}: {:?}", a, b, e.properties)?;
            }
        }
        Ok(())
    }
}

/// Peers may send `null` for an empty list.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
