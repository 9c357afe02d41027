//! Permissive VF reader.

use std::str::FromStr;

use super::GraphFileError;
use crate::graph::VfGraph;
use crate::types::{EdgeData, NodeData, NodeId};

/// Parse VF text into a graph.
///
/// Node records are addressed by position; the index token at the start of
/// each node line is not used. Edge-section lines are classified purely by
/// token count, so edges pointing at undeclared nodes are accepted.
pub fn parse(text: &str) -> Result<VfGraph, GraphFileError> {
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.starts_with('#'))
        .collect();

    let (count_line, count_text) = lines.first().ok_or(GraphFileError::MissingNodeCount)?;
    let node_count: usize = parse_int(*count_line, count_text.trim())?;

    let node_end = node_count.saturating_add(1).min(lines.len());
    let mut graph = VfGraph::new();

    for &(line, text) in &lines[1..node_end] {
        let mut tokens = text.split_whitespace();
        if tokens.next().is_none() {
            return Err(GraphFileError::EmptyNodeRecord { line });
        }
        graph.add_node(NodeData::new(tokens.next().map(str::to_string)));
    }

    for &(line, text) in &lines[node_end..] {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        match tokens.as_slice() {
            [src, dst] => {
                graph.add_edge(
                    parse_int::<NodeId>(line, src)?,
                    parse_int::<NodeId>(line, dst)?,
                    EdgeData::default(),
                );
            }
            [src, dst, label] => {
                graph.add_edge(
                    parse_int::<NodeId>(line, src)?,
                    parse_int::<NodeId>(line, dst)?,
                    EdgeData::labeled(*label),
                );
            }
            // Edge-count headers, blank lines and anything unrecognized
            _ => {}
        }
    }

    Ok(graph)
}

fn parse_int<T: FromStr>(line: usize, token: &str) -> Result<T, GraphFileError> {
    token.parse().map_err(|_| GraphFileError::InvalidInteger {
        line,
        token: token.to_string(),
    })
}
