//! Benchmark engine for an external subgraph-isomorphism matcher.
//!
//! The matcher is an opaque executable invoked once per query file. Every
//! run is classified into an [`Outcome`] and recorded in a [`ResultStore`],
//! which rewrites its JSON checkpoint after every record so an interrupted
//! sweep can be resumed.
//!
//! # Architecture
//!
//! ```text
//! discovery (query files) -> Driver (skip / cascade / run) -> Matcher (process)
//!                                   |
//!                                   v
//!                             ResultStore (checkpoint JSON)
//! ```

pub mod discovery;
pub mod driver;
pub mod matcher;
pub mod outcome;
pub mod process;
pub mod store;

pub use discovery::{DatasetLayout, QueryFile};
pub use driver::{Driver, PlannedRun, RunEvent, SweepConfig, SweepSummary, DEFAULT_TIMEOUT};
pub use matcher::{MatchRequest, Matcher, ProcessMatcher};
pub use outcome::{Outcome, TIMEOUT_MARKER};
pub use store::{ResultStore, ResultTable, RunKey};

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that stop a sweep. Individual matcher failures are outcomes, not errors.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid checkpoint {path}: {source}")]
    Checkpoint {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("directory not found: {0}")]
    MissingDirectory(PathBuf),
}

impl BenchError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        BenchError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
