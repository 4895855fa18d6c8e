//! Graphviz rendering of the topology

use indexmap::{map::Entry, IndexMap};
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::graph::{Graph, GraphError, PROP_UUID};

/// Render `graph` as DOT text.
///
/// Parallel edges share a name and are drawn once, with their labels
/// joined by `||`.
pub fn render(graph: &Graph) -> Result<String, GraphError> {
    let mut drawing: DiGraph<&str, String> = DiGraph::new();
    let nodes: IndexMap<&str, NodeIndex> = graph
        .vertices
        .iter()
        .map(|v| (v.name.as_str(), drawing.add_node(v.name.as_str())))
        .collect();

    let mut edges: IndexMap<&str, (NodeIndex, NodeIndex, String)> = IndexMap::new();
    for edge in &graph.edges {
        // edges that do not join two vertices are not drawn
        let Ok((a, b)) = edge.endpoints() else {
            continue;
        };
        let lookup = |name: &str| {
            nodes
                .get(name)
                .copied()
                .ok_or_else(|| GraphError::VertexNotFound(name.to_string()))
        };
        let (from, to) = (lookup(a)?, lookup(b)?);

        let label = match (edge.property("bw"), edge.property(PROP_UUID)) {
            (Some(bw), Some(uuid)) => format!("network: {} | bandwidth: {}", uuid, bw),
            _ => edge.name.clone(),
        };

        match edges.entry(edge.name.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert((from, to, label));
            }
            Entry::Occupied(mut slot) => {
                let existing = &mut slot.get_mut().2;
                if *existing != label {
                    existing.push_str(" || ");
                    existing.push_str(&label);
                }
            }
        }
    }

    for (from, to, label) in edges.into_values() {
        drawing.add_edge(from, to, label);
    }

    Ok(Dot::with_config(&drawing, &[]).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Properties, Vertex};

    fn link(uuid: &str, bw: &str) -> Option<Properties> {
        Some(
            [("uuid", uuid), ("bw", bw)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_render_simple_graph() {
        let mut g = Graph::new("fabric");
        g.add_edge(Vertex::new("a"), Vertex::new("b"), None).unwrap();

        let out = render(&g).unwrap();
        assert!(out.starts_with("digraph {"));
        assert!(out.contains("0 [ label = \"a\" ]"));
        assert!(out.contains("1 [ label = \"b\" ]"));
        assert!(out.contains("0 -> 1 [ label = \"a-b\" ]"));
    }

    #[test]
    fn test_parallel_edges_share_one_label() {
        let mut g = Graph::new("multi");
        g.add_edge(Vertex::new("a"), Vertex::new("b"), link("n1", "10"))
            .unwrap();
        g.add_edge(Vertex::new("a"), Vertex::new("b"), link("n2", "40"))
            .unwrap();

        let out = render(&g).unwrap();
        assert_eq!(out.matches("->").count(), 1);
        assert!(out.contains("network: n1 | bandwidth: 10 || network: n2 | bandwidth: 40"));
    }

    #[test]
    fn test_edge_to_unknown_vertex_fails() {
        let mut g = Graph::new("broken");
        g.add_vertex("a", "", None).unwrap();
        g.edges
            .push(Edge::new(Vertex::new("a"), Vertex::new("ghost"), None).unwrap());

        assert_eq!(
            render(&g).unwrap_err(),
            GraphError::VertexNotFound("ghost".to_string())
        );
    }

    #[test]
    fn test_quotes_in_names_are_escaped() {
        let mut g = Graph::new("quoted");
        g.add_vertex(r#"a"b"#, "", None).unwrap();

        let out = render(&g).unwrap();
        assert!(out.contains(r#"label = "a\"b""#));
    }
}
