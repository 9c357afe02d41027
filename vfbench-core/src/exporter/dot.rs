//! Graphviz DOT exporter.
//!
//! Nodes are drawn as filled light-blue circles showing the node id and its
//! label; edge labels are drawn in red.

use crate::graph::VfGraph;
use crate::types::NodeData;

/// Export a graph to Graphviz DOT syntax.
pub fn export(graph: &VfGraph) -> String {
    let mut output = String::new();

    output.push_str("digraph G {\n");
    output.push_str("    node [shape=circle, style=filled, fillcolor=lightblue, fontsize=12];\n");
    output.push_str("    edge [fontcolor=red, fontsize=10];\n\n");

    for id in graph.node_ids() {
        let label = graph.node(id).map(NodeData::label_str).unwrap_or("");
        let text = if label.is_empty() {
            id.to_string()
        } else {
            format!("{}\\n{}", id, escape(label))
        };
        output.push_str(&format!("    n{} [label=\"{}\"];\n", id, text));
    }

    output.push('\n');

    for src in graph.node_ids() {
        for (dst, data) in graph.out_edges(src) {
            if data.label_str().is_empty() {
                output.push_str(&format!("    n{} -> n{};\n", src, dst));
            } else {
                output.push_str(&format!(
                    "    n{} -> n{} [label=\"{}\"];\n",
                    src,
                    dst,
                    escape(data.label_str())
                ));
            }
        }
    }

    output.push_str("}\n");
    output
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_file::parse;

    #[test]
    fn test_export_dot() {
        let g = parse("3\n0 a\n1 b\n2 c\n1\n0 1 x\n1\n1 2\n0\n").unwrap();
        let dot = export(&g);

        assert!(dot.starts_with("digraph G {"));
        assert!(dot.contains("n0 [label=\"0\\na\"];"));
        assert!(dot.contains("n0 -> n1 [label=\"x\"];"));
        assert!(dot.contains("n1 -> n2;"));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn test_export_escapes_quotes() {
        let g = parse("1\n0 say\"hi\"\n1\n0 0 back\\slash\n").unwrap();
        let dot = export(&g);
        assert!(dot.contains("say\\\"hi\\\""));
        assert!(dot.contains("back\\\\slash"));
    }
}
