//! Normalize command - rewrite a graph in canonical VF form

use anyhow::{Context, Result};
use std::path::Path;

use vfbench_core::{graph_file, VfGraph};

use crate::output::{Output, OutputFormat, SuccessMessage};

pub fn run(input: &str, output: Option<&str>, format: OutputFormat) -> Result<()> {
    let graph = VfGraph::load(input).with_context(|| format!("Failed to load graph {}", input))?;

    let undeclared = graph.undeclared_nodes();
    if !undeclared.is_empty() {
        tracing::warn!(
            "{} references {} undeclared node(s); they are written unlabeled",
            input,
            undeclared.len()
        );
    }

    match output {
        Some(path) => {
            graph
                .write(Path::new(path))
                .with_context(|| format!("Failed to write {}", path))?;
            Output::new(
                SuccessMessage::new(format!(
                    "Wrote {} ({} nodes, {} edges)",
                    path,
                    graph.node_count(),
                    graph.edge_count()
                )),
                format,
            )
            .render()
        }
        None => {
            print!("{}", graph_file::to_vf_string(&graph));
            Ok(())
        }
    }
}
