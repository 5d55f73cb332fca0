//! Graph rendering: vis-network HTML, Graphviz DOT and a JSON view

use petgraph::dot::{Config, Dot};
use serde::Serialize;

use crate::{MetadataGraph, NodeKind};

/// Serializable node for front-ends
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: String,
    pub label: String,
    pub title: String,
    pub color: &'static str,
    pub kind: NodeKind,
}

/// Serializable edge; `title` doubles as the hover text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeView {
    pub from: String,
    pub to: String,
    pub label: String,
    pub title: String,
    pub arrows: &'static str,
}

/// Node and edge lists in the shape vis-network consumes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphView {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>__TITLE__</title>
<script src="https://unpkg.com/vis-network@9.1.9/standalone/umd/vis-network.min.js"></script>
<style>
  body { margin: 0; font-family: sans-serif; }
  h1 { font-size: 1.1em; margin: 8px 12px; }
  #graph { width: 100%; height: __HEIGHT__px; border: 1px solid lightgray; }
</style>
</head>
<body>
<h1>__TITLE__</h1>
<div id="graph"></div>
<script>
  const nodes = new vis.DataSet(__NODES__);
  const edges = new vis.DataSet(__EDGES__);
  const options = {
    edges: { arrows: { to: { enabled: true } }, font: { align: "middle" } },
    physics: { stabilization: true }
  };
  new vis.Network(document.getElementById("graph"), { nodes, edges }, options);
</script>
</body>
</html>
"#;

const DEFAULT_HEIGHT_PX: u32 = 750;

impl MetadataGraph {
    pub fn view(&self) -> GraphView {
        let nodes = self
            .nodes()
            .map(|node| NodeView {
                id: node.id.clone(),
                label: node.id.clone(),
                title: node.title.clone(),
                color: node.kind.color(),
                kind: node.kind,
            })
            .collect();

        let edges = self
            .edges()
            .map(|(from, to, label)| EdgeView {
                from: from.to_string(),
                to: to.to_string(),
                label: label.to_string(),
                title: label.to_string(),
                arrows: "to",
            })
            .collect();

        GraphView { nodes, edges }
    }

    /// Standalone interactive page rendering the graph with vis-network
    pub fn to_html(&self, title: &str) -> serde_json::Result<String> {
        let view = self.view();
        let nodes = script_safe(&serde_json::to_string(&view.nodes)?);
        let edges = script_safe(&serde_json::to_string(&view.edges)?);

        let title = escape_html(title);
        let height = DEFAULT_HEIGHT_PX.to_string();

        Ok(fill_template(
            HTML_TEMPLATE,
            &[
                ("__TITLE__", title.as_str()),
                ("__HEIGHT__", height.as_str()),
                ("__NODES__", nodes.as_str()),
                ("__EDGES__", edges.as_str()),
            ],
        ))
    }

    /// Graphviz DOT with node colors and edge labels
    pub fn to_dot(&self) -> String {
        let dot = Dot::with_attr_getters(
            self.inner(),
            &[Config::EdgeNoLabel, Config::NodeNoLabel],
            &|_, edge| format!("label = {:?}", edge.weight()),
            &|_, (_, node)| {
                format!(
                    "label = {:?}, tooltip = {:?}, color = {:?}",
                    node.id,
                    node.title,
                    node.kind.color()
                )
            },
        );
        format!("{dot}")
    }
}

/// Substitute markers in a single pass over `template`; substituted values
/// are never scanned for markers themselves
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = values
            .iter()
            .filter_map(|(marker, value)| rest.find(marker).map(|at| (at, *marker, *value)))
            .min_by_key(|(at, _, _)| *at);
        match next {
            Some((at, marker, value)) => {
                out.push_str(&rest[..at]);
                out.push_str(value);
                rest = &rest[at + marker.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// Keep embedded JSON from closing the surrounding script element
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
