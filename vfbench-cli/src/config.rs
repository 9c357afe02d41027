//! vfbench configuration loading from `.vfbench.toml`.
//!
//! Configuration is optional. Every setting has a built-in default, and
//! command-line flags override whatever the file says.
//!
//! # Example Configuration
//!
//! ```toml
//! [paths]
//! result_folder = "results"
//! database_folder = "/data/EGSM_datasets_and_querysets"
//! executable_dir = "/opt/vf3/bin"
//!
//! [run]
//! timeout_secs = 600
//! executable = "vf3"
//! light_executable = "vf3l"
//!
//! [datasets.enron]
//! label_schemes = ["label_16", "label_8", "label_4"]
//! cascade_timeouts = true
//!
//! [output]
//! format = "table"
//! color = true
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".vfbench.toml";

/// Root configuration structure loaded from `.vfbench.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct VfBenchConfig {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Matcher invocation settings.
    #[serde(default)]
    pub run: RunConfig,

    /// Per-dataset label scheme ordering and cascade policy.
    #[serde(default)]
    pub datasets: BTreeMap<String, DatasetConfig>,

    /// Output formatting preferences.
    #[serde(default)]
    pub output: OutputSettings,
}

/// Filesystem locations. Unset entries fall back to the CLI defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PathsConfig {
    /// Where checkpoints and captured matcher output are written.
    #[serde(default)]
    pub result_folder: Option<PathBuf>,

    /// Root holding `<dataset>/<label_scheme>/{data_graph,query_graph}`.
    #[serde(default)]
    pub database_folder: Option<PathBuf>,

    /// Directory containing the matcher executables.
    #[serde(default)]
    pub executable_dir: Option<PathBuf>,
}

/// How the external matcher is invoked.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Wall-clock bound per matcher run, in seconds.
    pub timeout_secs: u64,

    /// Matcher executable name, resolved against `executable_dir`.
    pub executable: String,

    /// Executable used with `--light`.
    pub light_executable: String,

    /// Flag appended for edge-induced matching.
    pub edge_induced_flag: String,

    /// Flag appended for undirected matching.
    pub undirected_flag: String,

    /// File suffix of query and target graphs.
    pub query_suffix: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 3600,
            executable: "vf3".to_string(),
            light_executable: "vf3l".to_string(),
            edge_induced_flag: "-e".to_string(),
            undirected_flag: "-u".to_string(),
            query_suffix: ".graph".to_string(),
        }
    }
}

/// Settings for one dataset.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DatasetConfig {
    /// Label schemes in sweep order. Empty means the directories on disk.
    #[serde(default)]
    pub label_schemes: Vec<String>,

    /// Record a timeout without running when the previous scheme timed out
    /// on the same query.
    #[serde(default)]
    pub cascade_timeouts: bool,
}

/// Output formatting preferences.
///
/// Command-line flags (e.g., `--format json`) override these settings.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Default output format: `table` or `json`.
    #[serde(default)]
    pub format: Option<String>,

    /// Whether to use colored output.
    #[serde(default)]
    pub color: Option<bool>,
}

impl VfBenchConfig {
    /// Load `.vfbench.toml` from the given directory.
    ///
    /// If the file doesn't exist or can't be parsed, returns defaults.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load_file(&config_path)
        } else {
            Self::default()
        }
    }

    /// Load an explicitly named configuration file.
    ///
    /// Read and parse errors are logged as warnings and yield defaults.
    pub fn load_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
            }
        }
        Self::default()
    }

    /// Settings for a dataset, or defaults when it is not configured.
    pub fn dataset(&self, name: &str) -> DatasetConfig {
        self.datasets.get(name).cloned().unwrap_or_default()
    }

    /// Get the default output format, if configured.
    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    /// Returns the configured color preference, or `None` to auto-detect.
    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = VfBenchConfig::default();
        assert_eq!(config.run.timeout_secs, 3600);
        assert_eq!(config.run.executable, "vf3");
        assert_eq!(config.run.light_executable, "vf3l");
        assert_eq!(config.run.edge_induced_flag, "-e");
        assert_eq!(config.run.undirected_flag, "-u");
        assert_eq!(config.run.query_suffix, ".graph");
        assert!(config.paths.result_folder.is_none());
        assert!(config.datasets.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[paths]
result_folder = "out"
database_folder = "/data/db"
executable_dir = "/opt/vf3/bin"

[run]
timeout_secs = 60
executable = "vf3p"

[datasets.enron]
label_schemes = ["label_16", "label_8"]
cascade_timeouts = true

[datasets.dblp]
label_schemes = ["label_4"]

[output]
format = "json"
color = false
"#;
        let config: VfBenchConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.paths.result_folder, Some(PathBuf::from("out")));
        assert_eq!(config.paths.database_folder, Some(PathBuf::from("/data/db")));

        assert_eq!(config.run.timeout_secs, 60);
        assert_eq!(config.run.executable, "vf3p");
        // Unset fields keep their defaults
        assert_eq!(config.run.light_executable, "vf3l");

        let enron = config.dataset("enron");
        assert_eq!(enron.label_schemes, vec!["label_16", "label_8"]);
        assert!(enron.cascade_timeouts);
        assert!(!config.dataset("dblp").cascade_timeouts);

        assert_eq!(config.default_format(), Some("json"));
        assert_eq!(config.use_color(), Some(false));
    }

    #[test]
    fn test_unknown_dataset_uses_defaults() {
        let config = VfBenchConfig::default();
        let dataset = config.dataset("youtube");
        assert!(dataset.label_schemes.is_empty());
        assert!(!dataset.cascade_timeouts);
    }

    #[test]
    fn test_load_invalid_file_falls_back() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[run\ntimeout_secs = ").unwrap();
        let config = VfBenchConfig::load(dir.path());
        assert_eq!(config.run.timeout_secs, 3600);
    }

    #[test]
    fn test_load_from_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[run]\ntimeout_secs = 5\n",
        )
        .unwrap();
        assert_eq!(VfBenchConfig::load(dir.path()).run.timeout_secs, 5);
        assert_eq!(
            VfBenchConfig::load(&dir.path().join("missing")).run.timeout_secs,
            3600
        );
    }
}
