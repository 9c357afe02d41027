//! Strict structural check of VF files.
//!
//! Walks the file the same way the matcher's own text loader does: node
//! count, one record per node, then for every node in order an edge-count
//! header followed by exactly that many edges leaving that node. Problems are
//! collected into a report rather than aborting at the first one.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use super::GraphFileError;
use crate::types::NodeId;

/// Kind of structural problem found in a VF file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    /// The file ended inside the node section.
    MissingNodeRecords { expected: usize, found: usize },
    /// A node record's index token disagrees with its position.
    NodeIndexMismatch { expected: usize, found: String },
    /// The file ended before the edge-count header of this node.
    MissingEdgeHeader { node: usize },
    /// The edge-count header is not a single integer.
    MalformedEdgeHeader { node: usize },
    /// Fewer edge records than the header announced.
    EdgeCountMismatch {
        node: usize,
        declared: usize,
        found: usize,
    },
    /// An edge record is not `<src> <dst> [<label>]`.
    MalformedEdge,
    /// An edge listed under one node starts at another.
    WrongEdgeSource { node: usize, source: NodeId },
    /// An edge endpoint is not a declared node.
    NodeOutOfRange { node: NodeId },
    /// The same `src -> dst` pair appears twice.
    DuplicateEdge { source: NodeId, target: NodeId },
    /// Lines remain after the last node's edges.
    TrailingData { lines: usize },
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::MissingNodeRecords { expected, found } => {
                write!(f, "expected {} node records, found {}", expected, found)
            }
            IssueKind::NodeIndexMismatch { expected, found } => {
                write!(f, "node record {} has index '{}'", expected, found)
            }
            IssueKind::MissingEdgeHeader { node } => {
                write!(f, "missing edge count for node {}", node)
            }
            IssueKind::MalformedEdgeHeader { node } => {
                write!(f, "malformed edge count for node {}", node)
            }
            IssueKind::EdgeCountMismatch {
                node,
                declared,
                found,
            } => write!(
                f,
                "node {} declares {} edges, found {}",
                node, declared, found
            ),
            IssueKind::MalformedEdge => write!(f, "malformed edge record"),
            IssueKind::WrongEdgeSource { node, source } => {
                write!(f, "edge from {} listed under node {}", source, node)
            }
            IssueKind::NodeOutOfRange { node } => write!(f, "node {} is out of range", node),
            IssueKind::DuplicateEdge { source, target } => {
                write!(f, "duplicate edge {} -> {}", source, target)
            }
            IssueKind::TrailingData { lines } => write!(f, "{} trailing line(s)", lines),
        }
    }
}

/// A single problem, with the 1-based line where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub line: Option<usize>,
    #[serde(flatten)]
    pub kind: IssueKind,
}

/// Outcome of a strict check.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub node_count: usize,
    pub edge_count: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    fn push(&mut self, line: Option<usize>, kind: IssueKind) {
        self.issues.push(ValidationIssue { line, kind });
    }
}

/// Check VF text against the strict format.
///
/// Only an unreadable node count is fatal; everything else is reported.
pub fn validate(text: &str) -> Result<ValidationReport, GraphFileError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.starts_with('#') && !line.trim().is_empty());

    let (count_line, count_text) = lines.next().ok_or(GraphFileError::MissingNodeCount)?;
    let node_count: usize =
        count_text
            .trim()
            .parse()
            .map_err(|_| GraphFileError::InvalidInteger {
                line: count_line,
                token: count_text.trim().to_string(),
            })?;

    let mut report = ValidationReport {
        node_count,
        ..Default::default()
    };

    for expected in 0..node_count {
        let Some((line, text)) = lines.next() else {
            report.push(
                None,
                IssueKind::MissingNodeRecords {
                    expected: node_count,
                    found: expected,
                },
            );
            return Ok(report);
        };
        let index = text.split_whitespace().next().unwrap_or("");
        if index.parse::<usize>().ok() != Some(expected) {
            report.push(
                Some(line),
                IssueKind::NodeIndexMismatch {
                    expected,
                    found: index.to_string(),
                },
            );
        }
    }

    let mut seen: HashSet<(NodeId, NodeId)> = HashSet::new();
    for node in 0..node_count {
        let Some((header_line, header)) = lines.next() else {
            report.push(None, IssueKind::MissingEdgeHeader { node });
            return Ok(report);
        };
        let declared = match header.split_whitespace().collect::<Vec<_>>().as_slice() {
            [count] => count.parse::<usize>().ok(),
            _ => None,
        };
        let Some(declared) = declared else {
            report.push(Some(header_line), IssueKind::MalformedEdgeHeader { node });
            return Ok(report);
        };

        for found in 0..declared {
            let Some((line, text)) = lines.next() else {
                report.push(
                    None,
                    IssueKind::EdgeCountMismatch {
                        node,
                        declared,
                        found,
                    },
                );
                return Ok(report);
            };
            let Some((source, target)) = parse_edge(text) else {
                report.push(Some(line), IssueKind::MalformedEdge);
                continue;
            };
            report.edge_count += 1;

            if source as usize != node {
                report.push(Some(line), IssueKind::WrongEdgeSource { node, source });
            }
            for endpoint in [source, target] {
                if endpoint as usize >= node_count {
                    report.push(Some(line), IssueKind::NodeOutOfRange { node: endpoint });
                }
            }
            if !seen.insert((source, target)) {
                report.push(Some(line), IssueKind::DuplicateEdge { source, target });
            }
        }
    }

    let trailing: Vec<usize> = lines.map(|(line, _)| line).collect();
    if let Some(&first) = trailing.first() {
        report.push(
            Some(first),
            IssueKind::TrailingData {
                lines: trailing.len(),
            },
        );
    }

    Ok(report)
}

fn parse_edge(text: &str) -> Option<(NodeId, NodeId)> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        [src, dst] | [src, dst, _] => Some((src.parse().ok()?, dst.parse().ok()?)),
        _ => None,
    }
}
