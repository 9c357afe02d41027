//! Query and dataset discovery on disk.
//!
//! Expected layout below the database folder:
//!
//! ```text
//! <database>/<dataset>/<label_scheme>/data_graph/<dataset><suffix>
//! <database>/<dataset>/<label_scheme>/query_graph/<query_size>/*<suffix>
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use super::BenchError;

/// Last run of ASCII digits in a file stem.
static INDEX_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)[^0-9]*$").unwrap());

const DATA_GRAPH_DIR: &str = "data_graph";
const QUERY_GRAPH_DIR: &str = "query_graph";

/// A query file with the numeric index embedded in its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFile {
    pub index: u32,
    pub path: PathBuf,
}

/// Paths of one dataset inside the database folder.
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    root: PathBuf,
    dataset: String,
    suffix: String,
}

impl DatasetLayout {
    pub fn new(database: &Path, dataset: &str, suffix: &str) -> Self {
        Self {
            root: database.join(dataset),
            dataset: dataset.to_string(),
            suffix: suffix.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scheme_dir(&self, label_scheme: &str) -> PathBuf {
        self.root.join(label_scheme)
    }

    /// Target (database) graph matched by every query of a label scheme.
    pub fn target_file(&self, label_scheme: &str) -> PathBuf {
        self.scheme_dir(label_scheme)
            .join(DATA_GRAPH_DIR)
            .join(format!("{}{}", self.dataset, self.suffix))
    }

    pub fn query_root(&self, label_scheme: &str) -> PathBuf {
        self.scheme_dir(label_scheme).join(QUERY_GRAPH_DIR)
    }

    pub fn query_dir(&self, label_scheme: &str, query_size: u32) -> PathBuf {
        self.query_root(label_scheme).join(query_size.to_string())
    }

    /// Label schemes present on disk, ordered by their embedded number.
    pub fn discover_label_schemes(&self) -> Result<Vec<String>, BenchError> {
        let mut schemes: Vec<String> = list_dir(&self.root)?
            .into_iter()
            .filter(|path| path.is_dir())
            .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
            .collect();
        schemes.sort_by_key(|name| (embedded_index(name), name.clone()));
        Ok(schemes)
    }

    /// Query sizes available for a label scheme, ascending.
    pub fn discover_query_sizes(&self, label_scheme: &str) -> Result<Vec<u32>, BenchError> {
        let mut sizes: Vec<u32> = list_dir(&self.query_root(label_scheme))?
            .into_iter()
            .filter(|path| path.is_dir())
            .filter_map(|path| path.file_name()?.to_str()?.parse().ok())
            .collect();
        sizes.sort_unstable();
        Ok(sizes)
    }

    /// Query files for a label scheme and size, ascending by index.
    pub fn discover_queries(
        &self,
        label_scheme: &str,
        query_size: u32,
    ) -> Result<Vec<QueryFile>, BenchError> {
        discover_queries(&self.query_dir(label_scheme, query_size), &self.suffix)
    }
}

/// List files in `dir` ending with `suffix`, sorted by their embedded index.
///
/// Files without a number in their stem are skipped with a warning.
pub fn discover_queries(dir: &Path, suffix: &str) -> Result<Vec<QueryFile>, BenchError> {
    let mut queries = Vec::new();
    for path in list_dir(dir)? {
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(stem) = name.strip_suffix(suffix) else {
            continue;
        };
        let Some(digits) = index_digits(stem) else {
            tracing::warn!("Skipping query without numeric index: {}", path.display());
            continue;
        };
        match digits.parse() {
            Ok(index) => queries.push(QueryFile {
                index,
                path: path.clone(),
            }),
            Err(_) => tracing::warn!(
                "Skipping query with index {} out of range: {}",
                digits,
                path.display()
            ),
        }
    }

    queries.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.path.cmp(&b.path)));
    for pair in queries.windows(2) {
        if pair[0].index == pair[1].index {
            tracing::warn!(
                "Duplicate query index {}: {} and {}",
                pair[0].index,
                pair[0].path.display(),
                pair[1].path.display()
            );
        }
    }
    Ok(queries)
}

/// Numeric index embedded in a name: the last run of ASCII digits.
pub fn embedded_index(name: &str) -> Option<u32> {
    index_digits(name)?.parse().ok()
}

fn index_digits(name: &str) -> Option<&str> {
    INDEX_PATTERN
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, BenchError> {
    if !dir.is_dir() {
        return Err(BenchError::MissingDirectory(dir.to_path_buf()));
    }
    let entries = fs::read_dir(dir).map_err(|e| BenchError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BenchError::io(dir, e))?;
        paths.push(entry.path());
    }
    Ok(paths)
}
