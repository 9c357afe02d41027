//! Reading and writing graphs in the VF text format.
//!
//! # Format
//!
//! ```text
//! <node_count>
//! <idx> <label>          (node_count lines)
//! <edge_count_for_node_0>
//! <src> <dst> [<label>]  (edge_count lines)
//! ...                    (repeated per source node)
//! ```
//!
//! Lines starting with `#` are comments.
//!
//! The reader is deliberately permissive: after the node section every line
//! with exactly two tokens is an unlabeled edge, every line with exactly three
//! tokens is a labeled edge, and everything else (including the per-node edge
//! count headers) is skipped. Use [`validate`] when the exact VF structure
//! matters.
//!
//! # Example
//!
//! ```
//! use vfbench_core::graph_file;
//!
//! let graph = graph_file::parse("2\n0 a\n1 b\n1\n0 1\n0\n").unwrap();
//! assert_eq!(graph.edge_count(), 1);
//! assert_eq!(graph_file::to_vf_string(&graph), "2\n0 a\n1 b\n1\n0 1\n0\n");
//! ```

mod reader;
mod validate;
mod writer;

pub use reader::parse;
pub use validate::{validate, IssueKind, ValidationIssue, ValidationReport};
pub use writer::{to_vf_string, write_to};

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::graph::VfGraph;

/// Errors raised while loading or writing a VF file.
#[derive(Debug, Error)]
pub enum GraphFileError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("missing node count line")]
    MissingNodeCount,

    #[error("line {line}: invalid integer '{token}'")]
    InvalidInteger { line: usize, token: String },

    #[error("line {line}: empty node record")]
    EmptyNodeRecord { line: usize },
}

impl GraphFileError {
    fn io(path: &Path, source: io::Error) -> Self {
        GraphFileError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Load a graph from a VF file.
pub fn load(path: impl AsRef<Path>) -> Result<VfGraph, GraphFileError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| GraphFileError::io(path, e))?;
    let graph = parse(&text)?;
    tracing::debug!(
        "Loaded {} ({} nodes, {} edges)",
        path.display(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Write a graph to a VF file, replacing any existing content.
pub fn write(graph: &VfGraph, path: impl AsRef<Path>) -> Result<(), GraphFileError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| GraphFileError::io(path, e))?;
    let mut out = BufWriter::new(file);
    write_to(graph, &mut out)
        .and_then(|_| out.flush())
        .map_err(|e| GraphFileError::io(path, e))
}

impl VfGraph {
    /// Load a graph from a VF file. See [`load`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GraphFileError> {
        load(path)
    }

    /// Write this graph to a VF file. See [`write`].
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), GraphFileError> {
        write(self, path)
    }
}

impl std::str::FromStr for VfGraph {
    type Err = GraphFileError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse(text)
    }
}
