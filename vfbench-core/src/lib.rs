//! vfbench core - VF graph files and a subgraph-isomorphism benchmark engine.
//!
//! This crate provides the library half of `vfbench`:
//!
//! # Features
//!
//! - **VF graph files**: permissive loader, deterministic writer and a strict
//!   structural validator for the line-oriented VF format
//! - **Graph model**: labeled directed graphs backed by petgraph
//! - **DOT export**: Graphviz rendering for visual inspection
//! - **Benchmark engine**: runs an external matcher per query with a
//!   wall-clock bound, kills runaway process trees and checkpoints every
//!   outcome to JSON so sweeps can be resumed
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use vfbench_core::bench::{Driver, ProcessMatcher, ResultStore, SweepConfig};
//!
//! let config = SweepConfig {
//!     label_schemes: vec!["label_16".into(), "label_8".into()],
//!     query_sizes: vec![8],
//!     cascade_timeouts: true,
//!     timeout: Duration::from_secs(600),
//!     ..SweepConfig::new("enron", "datasets")
//! };
//! let mut store = ResultStore::open("results/enron_vf3.json", true)?;
//! let mut matcher = ProcessMatcher::new(
//!     "bin/vf3",
//!     vec!["-u".into()],
//!     "results/logs/enron_vf3.stdout",
//!     "results/logs/enron_vf3.stderr",
//! );
//! let summary = Driver::new(config).sweep(&mut store, &mut matcher, |_| {})?;
//! println!("{} runs", summary.executed);
//! # Ok::<(), vfbench_core::bench::BenchError>(())
//! ```

pub mod bench;
pub mod exporter;
pub mod graph;
pub mod graph_file;
pub mod types;

pub use bench::{BenchError, Outcome, ResultStore, RunKey};
pub use graph::VfGraph;
pub use graph_file::GraphFileError;
pub use types::{EdgeData, NodeData, NodeId};
