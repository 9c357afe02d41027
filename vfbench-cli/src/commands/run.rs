//! Run command - sweep a dataset with the external matcher
//!
//! Resolves settings (flags > `.vfbench.toml` > defaults), opens the
//! checkpoint, and drives one matcher process per query with a progress bar.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use vfbench_core::bench::process::forward_interrupts;
use vfbench_core::bench::{Driver, ProcessMatcher, ResultStore, RunEvent, SweepConfig, SweepSummary};

use crate::config::VfBenchConfig;
use crate::output::{format_seconds, Output, OutputFormat, TableDisplay};

const DEFAULT_RESULT_FOLDER: &str = "results";
const DEFAULT_DATABASE_FOLDER: &str = "Database";
const DEFAULT_EXECUTABLE_DIR: &str = "bin";
const LOG_DIR: &str = "logs";

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Dataset name (directory under the database folder)
    #[arg(short, long)]
    pub dataset: String,

    /// Query sizes to run, comma separated (default: all on disk)
    #[arg(short = 's', long = "query-size", value_delimiter = ',')]
    pub query_sizes: Vec<u32>,

    /// Label schemes in sweep order, comma separated (overrides config)
    #[arg(short = 'l', long = "label-schemes", value_delimiter = ',')]
    pub label_schemes: Vec<String>,

    /// Folder for checkpoints and captured matcher output
    #[arg(long)]
    pub result_folder: Option<PathBuf>,

    /// Folder holding the datasets
    #[arg(long)]
    pub database_folder: Option<PathBuf>,

    /// Folder holding the matcher executables
    #[arg(long = "exe-dir")]
    pub exe_dir: Option<PathBuf>,

    /// Edge-induced matching (default: node-induced)
    #[arg(short, long)]
    pub edge_induced: bool,

    /// Treat graphs as undirected
    #[arg(short, long)]
    pub undirected: bool,

    /// Use the light-weight matcher variant
    #[arg(long)]
    pub light: bool,

    /// Continue from the existing checkpoint
    #[arg(short, long)]
    pub resume: bool,

    /// Checkpoint path (default: derived from dataset and options)
    #[arg(long)]
    pub resume_file: Option<PathBuf>,

    /// Timeout per matcher run in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Never copy a predecessor's timeout forward
    #[arg(long)]
    pub no_cascade: bool,
}

/// Everything needed to execute a sweep, after resolving flags and config.
#[derive(Debug)]
pub struct ResolvedRun {
    pub sweep: SweepConfig,
    pub executable: PathBuf,
    pub matcher_args: Vec<String>,
    pub checkpoint: PathBuf,
    pub stdout_log: PathBuf,
    pub stderr_log: PathBuf,
}

impl ResolvedRun {
    pub fn resolve(args: &RunArgs, config: &VfBenchConfig) -> Self {
        let result_folder = args
            .result_folder
            .clone()
            .or_else(|| config.paths.result_folder.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULT_FOLDER));
        let database_folder = args
            .database_folder
            .clone()
            .or_else(|| config.paths.database_folder.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FOLDER));
        let exe_dir = args
            .exe_dir
            .clone()
            .or_else(|| config.paths.executable_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXECUTABLE_DIR));

        let exe_name = if args.light {
            &config.run.light_executable
        } else {
            &config.run.executable
        };
        let executable = exe_dir.join(exe_name);
        let algorithm = algorithm_name(exe_name);

        let mut matcher_args = Vec::new();
        if args.edge_induced {
            matcher_args.push(config.run.edge_induced_flag.clone());
        }
        if args.undirected {
            matcher_args.push(config.run.undirected_flag.clone());
        }

        let checkpoint = args.resume_file.clone().unwrap_or_else(|| {
            result_folder.join(checkpoint_name(
                &args.dataset,
                &algorithm,
                args.edge_induced,
                args.undirected,
            ))
        });
        let stem = checkpoint
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| args.dataset.clone());
        let log_dir = result_folder.join(LOG_DIR);

        let dataset = config.dataset(&args.dataset);
        let label_schemes = if args.label_schemes.is_empty() {
            dataset.label_schemes
        } else {
            args.label_schemes.clone()
        };

        let sweep = SweepConfig {
            label_schemes,
            query_sizes: args.query_sizes.clone(),
            query_suffix: config.run.query_suffix.clone(),
            cascade_timeouts: dataset.cascade_timeouts && !args.no_cascade,
            timeout: Duration::from_secs(args.timeout.unwrap_or(config.run.timeout_secs)),
            ..SweepConfig::new(args.dataset.as_str(), database_folder)
        };

        Self {
            sweep,
            executable,
            matcher_args,
            checkpoint,
            stdout_log: log_dir.join(format!("{}.stdout", stem)),
            stderr_log: log_dir.join(format!("{}.stderr", stem)),
        }
    }
}

/// `<dataset>_<algorithm>[_edge][_undirected].json`
pub fn checkpoint_name(dataset: &str, algorithm: &str, edge_induced: bool, undirected: bool) -> String {
    let mut name = format!("{}_{}", dataset, algorithm);
    if edge_induced {
        name.push_str("_edge");
    }
    if undirected {
        name.push_str("_undirected");
    }
    name.push_str(".json");
    name
}

fn algorithm_name(executable: &str) -> String {
    Path::new(executable)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| executable.to_string())
}

/// Result of a finished sweep.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub dataset: String,
    pub executable: String,
    pub checkpoint: String,
    pub started_at: String,
    pub elapsed_secs: f64,
    pub recorded: usize,
    #[serde(flatten)]
    pub summary: SweepSummary,
}

impl TableDisplay for RunReport {
    fn to_table(&self) -> String {
        let s = &self.summary;
        let mut lines = vec![format!(
            "{} Sweep of {} finished",
            "SUCCESS:".green().bold(),
            self.dataset
        )];
        lines.push(format!("  {}: {}", "Executable".cyan(), self.executable));
        lines.push(format!(
            "  {}: {} ({} outcomes)",
            "Checkpoint".cyan(),
            self.checkpoint,
            self.recorded
        ));
        lines.push(format!(
            "  {}: {} ({} ok, {} failed, {} timeout)",
            "Executed".cyan(),
            s.executed,
            s.succeeded.to_string().green(),
            s.failed.to_string().red(),
            s.timed_out.to_string().yellow()
        ));
        lines.push(format!(
            "  {}: {} already recorded, {} cascaded",
            "Skipped".cyan(),
            s.skipped_done,
            s.cascaded
        ));
        lines.push(format!(
            "\n{}",
            format!("(started {}, {})", self.started_at, format_seconds(self.elapsed_secs)).dimmed()
        ));
        lines.join("\n")
    }
}

pub fn run(args: &RunArgs, config: &VfBenchConfig, format: OutputFormat, quiet: bool) -> Result<()> {
    let resolved = ResolvedRun::resolve(args, config);
    tracing::debug!("Resolved run settings: {:?}", resolved);

    if !resolved.executable.is_file() {
        tracing::warn!(
            "Matcher executable {} not found, every run will fail",
            resolved.executable.display()
        );
    }
    if !args.resume && resolved.checkpoint.exists() {
        tracing::warn!(
            "{} exists and will be replaced (pass --resume to continue it)",
            resolved.checkpoint.display()
        );
    }

    let mut store = ResultStore::open(&resolved.checkpoint, args.resume)
        .with_context(|| format!("Failed to open checkpoint {}", resolved.checkpoint.display()))?;
    let driver = Driver::new(resolved.sweep.clone());
    let plan = driver
        .plan()
        .with_context(|| format!("Failed to discover queries for {}", args.dataset))?;

    // Matchers run in their own process group, out of reach of the terminal's Ctrl-C
    forward_interrupts();
    let mut matcher = ProcessMatcher::new(
        &resolved.executable,
        resolved.matcher_args.clone(),
        &resolved.stdout_log,
        &resolved.stderr_log,
    );

    let progress = if quiet || format == OutputFormat::Json {
        ProgressBar::hidden()
    } else {
        create_progress_bar(plan.len() as u64)
    };

    let started_at = Utc::now();
    let start = Instant::now();
    let summary = driver
        .execute(&plan, &mut store, &mut matcher, |event| match event {
            RunEvent::Started { key, .. } => progress.set_message(key.to_string()),
            RunEvent::Finished { key, outcome } => {
                if outcome.is_timeout() {
                    progress.println(format!("{} {}", "TIMEOUT".yellow(), key));
                } else if let Some(error) = outcome.error_info() {
                    let first = error.lines().next().unwrap_or("");
                    progress.println(format!("{} {}: {}", "FAILED".red(), key, first));
                }
                progress.inc(1);
            }
            RunEvent::AlreadyRecorded { .. } | RunEvent::CascadeSkipped { .. } => progress.inc(1),
        })
        .context("Sweep aborted")?;
    progress.finish_and_clear();

    let report = RunReport {
        dataset: args.dataset.clone(),
        executable: resolved.executable.display().to_string(),
        checkpoint: resolved.checkpoint.display().to_string(),
        started_at: started_at.to_rfc3339(),
        elapsed_secs: start.elapsed().as_secs_f64(),
        recorded: store.len(),
        summary,
    };
    Output::new(report, format).render()
}

fn create_progress_bar(len: u64) -> ProgressBar {
    let progress = ProgressBar::new(len);
    progress.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        run: RunArgs,
    }

    fn parse(args: &[&str]) -> RunArgs {
        let mut argv = vec!["vfbench"];
        argv.extend_from_slice(args);
        TestCli::parse_from(argv).run
    }

    #[test]
    fn test_checkpoint_name() {
        assert_eq!(checkpoint_name("enron", "vf3", false, false), "enron_vf3.json");
        assert_eq!(checkpoint_name("enron", "vf3l", true, false), "enron_vf3l_edge.json");
        assert_eq!(
            checkpoint_name("dblp", "vf3", true, true),
            "dblp_vf3_edge_undirected.json"
        );
    }

    #[test]
    fn test_resolve_defaults() {
        let resolved = ResolvedRun::resolve(&parse(&["-d", "enron"]), &VfBenchConfig::default());

        assert_eq!(resolved.executable, Path::new("bin").join("vf3"));
        assert!(resolved.matcher_args.is_empty());
        assert_eq!(resolved.checkpoint, Path::new("results").join("enron_vf3.json"));
        assert_eq!(
            resolved.stdout_log,
            Path::new("results").join("logs").join("enron_vf3.stdout")
        );
        assert_eq!(resolved.sweep.timeout, Duration::from_secs(3600));
        assert_eq!(resolved.sweep.database_folder, Path::new("Database"));
        assert!(resolved.sweep.query_sizes.is_empty());
        assert!(!resolved.sweep.cascade_timeouts);
    }

    #[test]
    fn test_resolve_flags_override_config() {
        let config: VfBenchConfig = toml::from_str(
            r#"
[paths]
result_folder = "out"
executable_dir = "/opt/vf3"

[run]
timeout_secs = 60

[datasets.enron]
label_schemes = ["label_16", "label_8"]
cascade_timeouts = true
"#,
        )
        .unwrap();

        let resolved = ResolvedRun::resolve(
            &parse(&[
                "-d", "enron", "-s", "8,16", "--light", "-e", "-u", "--timeout", "5",
                "--exe-dir", "/usr/local/bin",
            ]),
            &config,
        );

        assert_eq!(resolved.executable, Path::new("/usr/local/bin/vf3l"));
        assert_eq!(resolved.matcher_args, vec!["-e", "-u"]);
        assert_eq!(
            resolved.checkpoint,
            Path::new("out").join("enron_vf3l_edge_undirected.json")
        );
        assert_eq!(resolved.sweep.query_sizes, vec![8, 16]);
        assert_eq!(resolved.sweep.label_schemes, vec!["label_16", "label_8"]);
        assert_eq!(resolved.sweep.timeout, Duration::from_secs(5));
        assert!(resolved.sweep.cascade_timeouts);
    }

    #[test]
    fn test_no_cascade_and_resume_file() {
        let config: VfBenchConfig =
            toml::from_str("[datasets.enron]\ncascade_timeouts = true\n").unwrap();
        let resolved = ResolvedRun::resolve(
            &parse(&["-d", "enron", "--no-cascade", "--resume-file", "/tmp/ckpt.json"]),
            &config,
        );
        assert!(!resolved.sweep.cascade_timeouts);
        assert_eq!(resolved.checkpoint, Path::new("/tmp/ckpt.json"));
        assert!(resolved.stderr_log.ends_with("logs/ckpt.stderr"));
    }
}
