//! Canonical VF writer.

use std::io::{self, Write};

use crate::graph::VfGraph;
use crate::types::NodeData;

/// Serialize a graph in VF format.
///
/// Nodes are written in ascending identifier order, then for each node its
/// outgoing edge count followed by its edges sorted by destination. Empty
/// labels are omitted, so the output is byte-identical for equal graphs.
pub fn write_to<W: Write>(graph: &VfGraph, out: &mut W) -> io::Result<()> {
    let ids = graph.node_ids();

    writeln!(out, "{}", graph.node_count())?;
    for &id in &ids {
        let label = graph.node(id).map(NodeData::label_str).unwrap_or("");
        write_record(out, &id.to_string(), label)?;
    }

    for &src in &ids {
        let edges = graph.out_edges(src);
        writeln!(out, "{}", edges.len())?;
        for (dst, data) in edges {
            write_record(out, &format!("{} {}", src, dst), data.label_str())?;
        }
    }

    Ok(())
}

/// Serialize a graph in VF format into a string.
pub fn to_vf_string(graph: &VfGraph) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_to(graph, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

fn write_record<W: Write>(out: &mut W, head: &str, label: &str) -> io::Result<()> {
    if label.is_empty() {
        writeln!(out, "{}", head)
    } else {
        writeln!(out, "{} {}", head, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_file::parse;
    use crate::types::EdgeData;

    const EXAMPLE: &str = "3\n0 a\n1 b\n2 c\n1\n0 1 x\n1\n1 2\n0\n";

    #[test]
    fn test_example_is_reproduced_exactly() {
        let g = parse(EXAMPLE).unwrap();
        assert_eq!(to_vf_string(&g), EXAMPLE);
    }

    #[test]
    fn test_write_is_deterministic() {
        let mut g1 = VfGraph::new();
        for label in ["p", "q", "r", "s"] {
            g1.add_node(NodeData::labeled(label));
        }
        g1.add_edge(0, 3, EdgeData::labeled("e"));
        g1.add_edge(0, 1, EdgeData::default());
        g1.add_edge(2, 0, EdgeData::labeled("f"));
        g1.add_edge(0, 2, EdgeData::default());

        // Same graph, edges inserted in a different order
        let mut g2 = VfGraph::new();
        for label in ["p", "q", "r", "s"] {
            g2.add_node(NodeData::labeled(label));
        }
        g2.add_edge(2, 0, EdgeData::labeled("f"));
        g2.add_edge(0, 2, EdgeData::default());
        g2.add_edge(0, 1, EdgeData::default());
        g2.add_edge(0, 3, EdgeData::labeled("e"));

        let first = to_vf_string(&g1);
        assert_eq!(first, to_vf_string(&g1));
        assert_eq!(first, to_vf_string(&g2));
        assert_eq!(first, "4\n0 p\n1 q\n2 r\n3 s\n3\n0 1\n0 2\n0 3 e\n0\n1\n2 0 f\n0\n");
    }

    #[test]
    fn test_round_trip_mixed_labels() {
        let mut g = VfGraph::new();
        g.add_node(NodeData::labeled("a"));
        g.add_node(NodeData::default());
        g.add_node(NodeData::labeled("c"));
        g.add_edge(1, 0, EdgeData::labeled("back"));
        g.add_edge(1, 2, EdgeData::default());
        g.add_edge(2, 2, EdgeData::labeled("self"));

        let text = to_vf_string(&g);
        assert_eq!(parse(&text).unwrap(), g);
    }

    #[test]
    fn test_empty_graph() {
        let g = VfGraph::new();
        assert_eq!(to_vf_string(&g), "0\n");
        assert_eq!(parse("0\n").unwrap(), g);
    }
}
