//! Depth-bounded dumps of nested JSON for diagnostics.
//!
//! Only used by inspection commands; request handlers never call this.

use serde_json::Value;

/// One leaf (or truncated subtree) of a flattened value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticLine {
    pub path: String,
    pub rendered: String,
    pub kind: &'static str,
}

impl std::fmt::Display for DiagnosticLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.path, self.rendered, self.kind)
    }
}

/// Flatten `value` into `path: value (type)` lines.
///
/// Containers nested deeper than `max_depth` are reported as a single `...`
/// line carrying their element count instead of being expanded.
pub fn flatten(value: &Value, max_depth: usize) -> Vec<DiagnosticLine> {
    let mut lines = Vec::new();
    walk(value, String::new(), 0, max_depth, &mut lines);
    lines
}

fn walk(value: &Value, path: String, depth: usize, max_depth: usize, out: &mut Vec<DiagnosticLine>) {
    match value {
        Value::Object(map) if depth < max_depth => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                walk(child, child_path, depth + 1, max_depth, out);
            }
        }
        Value::Array(items) if depth < max_depth => {
            for (index, child) in items.iter().enumerate() {
                walk(child, format!("{path}[{index}]"), depth + 1, max_depth, out);
            }
        }
        Value::Object(map) => out.push(truncated(path, map.len(), "object")),
        Value::Array(items) => out.push(truncated(path, items.len(), "array")),
        leaf => out.push(DiagnosticLine {
            path,
            rendered: leaf.to_string(),
            kind: kind_of(leaf),
        }),
    }
}

fn truncated(path: String, len: usize, kind: &'static str) -> DiagnosticLine {
    DiagnosticLine {
        path,
        rendered: format!("... ({len} entries)"),
        kind,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_paths() {
        let value = json!({
            "sentiment": [{"label": "POSITIVE", "score": 0.75}],
            "human_tags": []
        });

        let lines: Vec<String> = flatten(&value, 8).iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "sentiment[0].label: \"POSITIVE\" (string)",
                "sentiment[0].score: 0.75 (float)",
            ]
        );
    }

    #[test]
    fn test_flatten_stops_at_depth() {
        let value = json!({"a": {"b": {"c": 1}}, "n": 2});
        let lines = flatten(&value, 1);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].path, "a");
        assert_eq!(lines[0].rendered, "... (1 entries)");
        assert_eq!(lines[1].kind, "integer");
    }
}
