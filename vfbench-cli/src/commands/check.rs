//! Check command - strict structural validation of a VF file

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde::Serialize;

use vfbench_core::graph_file::{self, ValidationReport};

use crate::output::{Output, OutputFormat, TableDisplay, TableOutput};

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub path: String,
    pub valid: bool,
    #[serde(flatten)]
    pub report: ValidationReport,
}

impl TableDisplay for CheckReport {
    fn to_table(&self) -> String {
        if self.valid {
            return format!(
                "{} {} ({} nodes, {} edges)",
                "VALID:".green().bold(),
                self.path,
                self.report.node_count,
                self.report.edge_count
            );
        }

        let rows: Vec<Vec<String>> = self
            .report
            .issues
            .iter()
            .map(|issue| {
                vec![
                    issue
                        .line
                        .map(|l| l.to_string())
                        .unwrap_or_else(|| "EOF".to_string()),
                    issue.kind.to_string(),
                ]
            })
            .collect();
        format!(
            "{} {} ({} issues)\n{}",
            "INVALID:".red().bold(),
            self.path,
            self.report.issues.len(),
            TableOutput::from_rows(&["Line", "Issue"], &rows)
        )
    }
}

pub fn check_text(path: &str, text: &str) -> Result<CheckReport> {
    let report = graph_file::validate(text).with_context(|| format!("Cannot check {}", path))?;
    Ok(CheckReport {
        path: path.to_string(),
        valid: report.is_valid(),
        report,
    })
}

pub fn run(path: &str, format: OutputFormat) -> Result<()> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let report = check_text(path, &text)?;
    let issues = report.report.issues.len();
    Output::new(report, format).render()?;

    if issues > 0 {
        bail!("{} is not a strict VF file ({} issues)", path, issues);
    }
    Ok(())
}
