//! Checkpointed result table.
//!
//! Results are kept in a three-level table
//! `query_size -> query_index -> label_scheme -> outcome` and persisted as a
//! single JSON object:
//!
//! ```json
//! {
//!   "8": {
//!     "0": {
//!       "label_16": { "success": 1, "num_sol": 3, "first_solution_time": 0.1, "running_time": 0.2 },
//!       "label_8": { "success": 0, "error_info": "Timeout" }
//!     }
//!   }
//! }
//! ```
//!
//! # Durability
//!
//! Every successful [`ResultStore::record`] rewrites the whole checkpoint
//! before returning. The file is written to a sibling temporary path and then
//! renamed over the checkpoint, so a crash leaves either the old or the new
//! table on disk.
//!
//! Entries are write-once: recording a key that already has an outcome is a
//! no-op, which is what makes re-running a sweep against the same checkpoint
//! idempotent.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{BenchError, Outcome};

/// `query_size -> query_index -> label_scheme -> outcome`.
pub type ResultTable = BTreeMap<u32, BTreeMap<u32, BTreeMap<String, Outcome>>>;

/// Address of one cell in the result table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RunKey {
    pub query_size: u32,
    pub query_index: u32,
    pub label_scheme: String,
}

impl RunKey {
    pub fn new(query_size: u32, query_index: u32, label_scheme: impl Into<String>) -> Self {
        Self {
            query_size,
            query_index,
            label_scheme: label_scheme.into(),
        }
    }
}

impl std::fmt::Display for RunKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "size={} query={} labels={}",
            self.query_size, self.query_index, self.label_scheme
        )
    }
}

/// Result table bound to its checkpoint file.
#[derive(Debug)]
pub struct ResultStore {
    path: PathBuf,
    table: ResultTable,
}

impl ResultStore {
    /// Create an empty store. Nothing is written until the first record.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: ResultTable::new(),
        }
    }

    /// Load a store from its checkpoint.
    ///
    /// A missing file yields an empty store; an unreadable or invalid file is
    /// an error so that existing results are never silently discarded.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, BenchError> {
        let path = path.into();
        if !path.exists() {
            tracing::info!("No checkpoint at {}, starting empty", path.display());
            return Ok(Self::new(path));
        }

        let content = fs::read_to_string(&path).map_err(|e| BenchError::io(&path, e))?;
        let table: ResultTable =
            serde_json::from_str(&content).map_err(|source| BenchError::Checkpoint {
                path: path.clone(),
                source,
            })?;

        let store = Self { path, table };
        tracing::debug!(
            "Loaded checkpoint {} with {} outcomes",
            store.path.display(),
            store.len()
        );
        Ok(store)
    }

    /// Load when resuming, otherwise start empty.
    pub fn open(path: impl Into<PathBuf>, resume: bool) -> Result<Self, BenchError> {
        if resume {
            Self::load(path)
        } else {
            Ok(Self::new(path))
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &ResultTable {
        &self.table
    }

    pub fn get(&self, key: &RunKey) -> Option<&Outcome> {
        self.table
            .get(&key.query_size)
            .and_then(|queries| queries.get(&key.query_index))
            .and_then(|schemes| schemes.get(&key.label_scheme))
    }

    pub fn contains(&self, key: &RunKey) -> bool {
        self.get(key).is_some()
    }

    /// Record an outcome and persist the table.
    ///
    /// Returns `Ok(false)` without touching the table or the file when the key
    /// already has an outcome.
    pub fn record(&mut self, key: RunKey, outcome: Outcome) -> Result<bool, BenchError> {
        let schemes = self
            .table
            .entry(key.query_size)
            .or_default()
            .entry(key.query_index)
            .or_default();
        if schemes.contains_key(&key.label_scheme) {
            tracing::debug!("Keeping existing outcome for {}", key);
            return Ok(false);
        }
        schemes.insert(key.label_scheme, outcome);
        self.persist()?;
        Ok(true)
    }

    /// Rewrite the whole checkpoint file.
    pub fn persist(&self) -> Result<(), BenchError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| BenchError::io(parent, e))?;
            }
        }

        let content = serde_json::to_string_pretty(&self.table).map_err(|source| {
            BenchError::Checkpoint {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp = tmp_path(&self.path);
        fs::write(&tmp, content).map_err(|e| BenchError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| BenchError::io(&self.path, e))?;
        Ok(())
    }

    /// Iterate over every recorded outcome in key order.
    pub fn iter(&self) -> impl Iterator<Item = (RunKey, &Outcome)> + '_ {
        self.table.iter().flat_map(|(&size, queries)| {
            queries.iter().flat_map(move |(&index, schemes)| {
                schemes
                    .iter()
                    .map(move |(scheme, outcome)| (RunKey::new(size, index, scheme.clone()), outcome))
            })
        })
    }

    /// Number of recorded outcomes.
    pub fn len(&self) -> usize {
        self.table
            .values()
            .flat_map(|queries| queries.values())
            .map(|schemes| schemes.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
