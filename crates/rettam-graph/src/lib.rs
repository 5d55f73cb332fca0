//! rettam Graph - Metadata graph construction
//!
//! Builds a directed graph from an extraction result: a single origin node
//! linked to every entity, plus dependency edges between tokens. Nodes are
//! identified by their surface text, so repeated spans share one node.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rettam_core::ExtractionResult;
use serde::Serialize;

pub mod render;

pub use render::{EdgeView, GraphView, NodeView};

/// Identity of the origin node every entity hangs off
pub const ROOT_NODE: &str = "USERINPUT";

/// Role a node was last added under
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Origin,
    Entity,
    Token,
}

impl NodeKind {
    /// Display color, matching the exploration page
    pub fn color(&self) -> &'static str {
        match self {
            Self::Origin => "green",
            Self::Entity => "lightblue",
            Self::Token => "orange",
        }
    }
}

/// Graph node keyed by surface text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    /// Hover text: the entity category for entities, the text otherwise
    pub title: String,
}

impl std::fmt::Display for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Directed graph derived from one extraction result
#[derive(Debug, Clone)]
pub struct MetadataGraph {
    graph: DiGraph<GraphNode, String>,
    index: HashMap<String, NodeIndex>,
    root: NodeIndex,
}

impl MetadataGraph {
    fn with_root() -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(GraphNode {
            id: ROOT_NODE.to_string(),
            kind: NodeKind::Origin,
            title: ROOT_NODE.to_string(),
        });
        let index = HashMap::from([(ROOT_NODE.to_string(), root)]);
        Self { graph, index, root }
    }

    /// Insert or re-tag the node for `id`. The root keeps its kind.
    fn upsert_node(&mut self, id: &str, kind: NodeKind, title: Option<&str>) -> NodeIndex {
        if let Some(&existing) = self.index.get(id) {
            let node = &mut self.graph[existing];
            if existing != self.root {
                node.kind = kind;
            }
            if let Some(title) = title {
                node.title = title.to_string();
            }
            return existing;
        }

        let idx = self.graph.add_node(GraphNode {
            id: id.to_string(),
            kind,
            title: title.unwrap_or(id).to_string(),
        });
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Add an edge, replacing the label of an existing one between the pair
    fn link(&mut self, source: NodeIndex, target: NodeIndex, label: &str) {
        self.graph.update_edge(source, target, label.to_string());
    }

    pub fn root(&self) -> &GraphNode {
        &self.graph[self.root]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// `(source, target, label)` triples in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.graph.edge_references().map(move |edge| {
            (
                self.graph[edge.source()].id.as_str(),
                self.graph[edge.target()].id.as_str(),
                edge.weight().as_str(),
            )
        })
    }

    /// Label of the edge `source -> target`, if any
    pub fn edge_label(&self, source: &str, target: &str) -> Option<&str> {
        let a = *self.index.get(source)?;
        let b = *self.index.get(target)?;
        self.graph
            .find_edge(a, b)
            .map(|edge| self.graph[edge].as_str())
    }

    /// Underlying petgraph graph for algorithms and export
    pub fn inner(&self) -> &DiGraph<GraphNode, String> {
        &self.graph
    }
}

/// Build the display graph for `metadata`.
///
/// The origin node is always present. Entities are linked from it with
/// their category as edge label; dependencies link head to dependent with
/// the grammatical relation as label.
pub fn build_graph(
    metadata: &ExtractionResult,
    show_entities: bool,
    show_dependencies: bool,
) -> MetadataGraph {
    let mut graph = MetadataGraph::with_root();
    let root = graph.root;

    if show_entities {
        for entity in &metadata.entities {
            let node = graph.upsert_node(&entity.text, NodeKind::Entity, Some(&entity.label));
            graph.link(root, node, &entity.label);
        }
    }

    if show_dependencies {
        for dep in &metadata.dependencies {
            let source = graph.upsert_node(&dep.source_token, NodeKind::Token, None);
            let target = graph.upsert_node(&dep.target_token, NodeKind::Token, None);
            graph.link(source, target, &dep.relation);
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use rettam_core::{Dependency, Entity};
    use std::collections::BTreeSet;

    fn entity(text: &str, label: &str) -> Entity {
        Entity {
            text: text.to_string(),
            label: label.to_string(),
            start_offset: 0,
            end_offset: text.len(),
        }
    }

    fn dep(source: &str, target: &str, relation: &str) -> Dependency {
        Dependency {
            source_token: source.to_string(),
            target_token: target.to_string(),
            relation: relation.to_string(),
        }
    }

    fn sample() -> ExtractionResult {
        ExtractionResult {
            entities: vec![
                entity("Anna", "PERSON"),
                entity("Berlin", "GPE"),
                entity("Anna", "PERSON"),
            ],
            dependencies: vec![
                dep("lives", "Anna", "nsubj"),
                dep("lives", "in", "prep"),
                dep("in", "Berlin", "pobj"),
            ],
            ..Default::default()
        }
    }

    fn node_set(graph: &MetadataGraph) -> BTreeSet<(String, NodeKind)> {
        graph.nodes().map(|n| (n.id.clone(), n.kind)).collect()
    }

    fn edge_set(graph: &MetadataGraph) -> BTreeSet<(String, String, String)> {
        graph
            .edges()
            .map(|(s, t, l)| (s.to_string(), t.to_string(), l.to_string()))
            .collect()
    }

    #[test]
    fn test_root_always_present() {
        let graph = build_graph(&sample(), false, false);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.root().id, ROOT_NODE);
        assert_eq!(graph.root().kind, NodeKind::Origin);
    }

    #[test]
    fn test_entities_only() {
        let graph = build_graph(&sample(), true, false);

        // Two distinct entity texts plus the root
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.edge_label(ROOT_NODE, "Berlin"), Some("GPE"));
        let anna = graph.node("Anna").unwrap();
        assert_eq!(anna.kind, NodeKind::Entity);
        assert_eq!(anna.title, "PERSON");
    }

    #[test]
    fn test_dependencies_only() {
        let graph = build_graph(&sample(), false, true);

        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.edge_label("in", "Berlin"), Some("pobj"));
        assert!(graph.edge_label(ROOT_NODE, "Anna").is_none());
    }

    #[test]
    fn test_shared_text_collapses_into_one_node() {
        let graph = build_graph(&sample(), true, true);

        // USERINPUT, Anna, Berlin, lives, in
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 5);
        // Re-added as a token, the entity keeps its category as hover text
        let anna = graph.node("Anna").unwrap();
        assert_eq!(anna.kind, NodeKind::Token);
        assert_eq!(anna.title, "PERSON");
    }

    #[test]
    fn test_repeated_pair_keeps_last_label() {
        let metadata = ExtractionResult {
            dependencies: vec![dep("saw", "dog", "dobj"), dep("saw", "dog", "nsubj")],
            ..Default::default()
        };
        let graph = build_graph(&metadata, true, true);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_label("saw", "dog"), Some("nsubj"));
    }

    #[test]
    fn test_entity_named_like_root_keeps_origin() {
        let metadata = ExtractionResult {
            entities: vec![entity(ROOT_NODE, "ORG")],
            ..Default::default()
        };
        let graph = build_graph(&metadata, true, true);

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.root().kind, NodeKind::Origin);
        assert_eq!(graph.edge_label(ROOT_NODE, ROOT_NODE), Some("ORG"));
    }

    #[test]
    fn test_build_is_idempotent() {
        let metadata = sample();
        for (entities, deps) in [(true, true), (true, false), (false, true), (false, false)] {
            let first = build_graph(&metadata, entities, deps);
            let second = build_graph(&metadata, entities, deps);
            assert_eq!(node_set(&first), node_set(&second));
            assert_eq!(edge_set(&first), edge_set(&second));
        }
    }
}
