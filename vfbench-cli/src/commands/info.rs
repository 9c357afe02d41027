//! Info command - summarize a VF graph file

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;

use vfbench_core::{NodeId, VfGraph};

use crate::output::{Output, OutputFormat, TableDisplay, TableOutput};

/// Statistics about one graph file.
#[derive(Debug, Serialize)]
pub struct GraphInfo {
    pub path: String,
    pub node_count: usize,
    pub edge_count: usize,
    /// Node label -> count. Unlabeled nodes are counted under "".
    pub node_labels: BTreeMap<String, usize>,
    pub edge_labels: BTreeMap<String, usize>,
    /// Nodes referenced by an edge but missing from the node section.
    pub undeclared_nodes: Vec<NodeId>,
}

impl GraphInfo {
    pub fn from_graph(path: &str, graph: &VfGraph) -> Self {
        Self {
            path: path.to_string(),
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            node_labels: graph.node_label_counts(),
            edge_labels: graph.edge_label_counts(),
            undeclared_nodes: graph.undeclared_nodes(),
        }
    }
}

impl TableDisplay for GraphInfo {
    fn to_table(&self) -> String {
        let mut output = format!("{} {}\n", "Graph:".cyan().bold(), self.path);
        output.push_str(&TableOutput::format_key_value(&[
            ("Nodes", self.node_count.to_string()),
            ("Edges", self.edge_count.to_string()),
            ("Node labels", self.node_labels.len().to_string()),
            ("Edge labels", self.edge_labels.len().to_string()),
        ]));

        if !self.node_labels.is_empty() {
            let rows: Vec<Vec<String>> = self
                .node_labels
                .iter()
                .map(|(label, count)| vec![display_label(label), count.to_string()])
                .collect();
            output.push('\n');
            output.push_str(&TableOutput::from_rows(&["Node label", "Count"], &rows));
        }

        if !self.undeclared_nodes.is_empty() {
            let ids: Vec<String> = self.undeclared_nodes.iter().map(|id| id.to_string()).collect();
            output.push_str(&format!(
                "\n{} edges reference undeclared nodes: {}",
                "WARNING:".yellow().bold(),
                ids.join(", ")
            ));
        }
        output
    }
}

fn display_label(label: &str) -> String {
    if label.is_empty() {
        "(none)".to_string()
    } else {
        label.to_string()
    }
}

pub fn run(path: &str, format: OutputFormat) -> Result<()> {
    let graph = VfGraph::load(path).with_context(|| format!("Failed to load graph {}", path))?;
    Output::new(GraphInfo::from_graph(path, &graph), format).render()
}
