//! Results command - summarize a checkpoint file

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use vfbench_core::bench::{Outcome, ResultStore, RunKey};

use crate::output::{format_seconds, Output, OutputFormat, TableDisplay, TableOutput};

/// Aggregated outcomes for one (query size, label scheme) pair.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GroupSummary {
    pub query_size: u32,
    pub label_scheme: String,
    pub runs: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    /// Mean running time of successful runs, in seconds.
    pub mean_running_time: Option<f64>,
    pub total_solutions: u64,
}

/// A failed run, listed with `--failures`.
#[derive(Debug, Clone, Serialize)]
pub struct FailureEntry {
    #[serde(flatten)]
    pub key: RunKey,
    pub error_info: String,
}

#[derive(Debug, Serialize)]
pub struct ResultsReport {
    pub checkpoint: String,
    pub total: usize,
    pub groups: Vec<GroupSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureEntry>,
}

impl TableDisplay for ResultsReport {
    fn to_table(&self) -> String {
        let mut output = format!(
            "{} {} ({} outcomes)\n",
            "Checkpoint:".cyan().bold(),
            self.checkpoint,
            self.total
        );

        let rows: Vec<Vec<String>> = self
            .groups
            .iter()
            .map(|g| {
                vec![
                    g.query_size.to_string(),
                    g.label_scheme.clone(),
                    g.runs.to_string(),
                    g.succeeded.to_string(),
                    g.failed.to_string(),
                    g.timed_out.to_string(),
                    g.mean_running_time
                        .map(format_seconds)
                        .unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect();
        output.push_str(&TableOutput::from_rows(
            &["Size", "Labels", "Runs", "OK", "Failed", "Timeout", "Mean time"],
            &rows,
        ));

        if !self.failures.is_empty() {
            output.push_str(&format!("\n\n{}\n", "Failures:".red().bold()));
            for failure in &self.failures {
                let first = failure.error_info.lines().next().unwrap_or("");
                output.push_str(&format!("  {}: {}\n", failure.key, first.dimmed()));
            }
        }
        output
    }
}

/// Group every outcome of a store by (query size, label scheme).
pub fn summarize(store: &ResultStore) -> Vec<GroupSummary> {
    let mut groups: BTreeMap<(u32, String), (GroupSummary, f64)> = BTreeMap::new();

    for (key, outcome) in store.iter() {
        let (group, time_sum) = groups
            .entry((key.query_size, key.label_scheme.clone()))
            .or_insert_with(|| {
                (
                    GroupSummary {
                        query_size: key.query_size,
                        label_scheme: key.label_scheme.clone(),
                        ..Default::default()
                    },
                    0.0,
                )
            });
        group.runs += 1;
        match outcome {
            Outcome::Success {
                num_sol,
                running_time,
                ..
            } => {
                group.succeeded += 1;
                group.total_solutions += num_sol;
                *time_sum += running_time;
            }
            failure if failure.is_timeout() => group.timed_out += 1,
            Outcome::Failure { .. } => group.failed += 1,
        }
    }

    groups
        .into_values()
        .map(|(mut group, time_sum)| {
            if group.succeeded > 0 {
                group.mean_running_time = Some(time_sum / group.succeeded as f64);
            }
            group
        })
        .collect()
}

pub fn run(checkpoint: &str, failures: bool, format: OutputFormat) -> Result<()> {
    let path = Path::new(checkpoint);
    if !path.is_file() {
        bail!("Checkpoint not found: {}", path.display());
    }
    let store = ResultStore::load(path)
        .with_context(|| format!("Failed to load checkpoint {}", path.display()))?;

    let failures = if failures {
        store
            .iter()
            .filter_map(|(key, outcome)| {
                outcome.error_info().map(|error| FailureEntry {
                    key,
                    error_info: error.to_string(),
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    let report = ResultsReport {
        checkpoint: path.display().to_string(),
        total: store.len(),
        groups: summarize(&store),
        failures,
    };
    Output::new(report, format).render()
}
