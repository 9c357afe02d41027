//! vfbench CLI - benchmark driver for VF-format subgraph matchers
//!
//! Runs an external subgraph-isomorphism executable over every query of a
//! dataset, checkpointing each outcome so interrupted sweeps can resume, and
//! provides small utilities for inspecting VF graph files.

use clap::{CommandFactory, Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::*;
use config::VfBenchConfig;
use output::OutputFormat;

/// Benchmark harness for subgraph-isomorphism matchers.
#[derive(Parser)]
#[command(name = "vfbench")]
#[command(author, version)]
#[command(about = "Benchmark harness for VF-format subgraph-isomorphism matchers")]
#[command(propagate_version = true)]
#[command(after_help = "Examples:
  vfbench run -d enron -s 8,16          Sweep two query sizes of enron
  vfbench run -d enron --resume         Continue an interrupted sweep
  vfbench results results/enron_vf3.json
  vfbench check query.graph             Strict VF format check")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Configuration file (default: ./.vfbench.toml)
    #[arg(long, global = true, env = "VFBENCH_CONFIG")]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the matcher over every query of a dataset
    Run(run::RunArgs),

    /// Summarize a checkpoint file
    #[command(visible_alias = "res")]
    Results {
        /// Checkpoint JSON written by `vfbench run`
        checkpoint: String,

        /// List every failed run
        #[arg(long)]
        failures: bool,
    },

    /// Show node, edge and label statistics of a graph file
    Info {
        /// VF graph file
        path: String,
    },

    /// Validate a graph file against the strict VF format
    Check {
        /// VF graph file
        path: String,
    },

    /// Rewrite a graph file in canonical VF form
    Normalize {
        /// VF graph file to read
        input: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Render a graph file with Graphviz
    Plot {
        /// VF graph file
        input: String,

        /// Output file; .dot/.gv are written as DOT, anything else is rendered (default: DOT on stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Graphviz executable used for rendering
        #[arg(long, env = "VFBENCH_DOT", default_value = "dot")]
        dot_binary: String,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => VfBenchConfig::load_file(Path::new(path)),
        None => VfBenchConfig::load(Path::new(".")),
    };

    // Resolve output format: CLI flag > config default > Table
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or(OutputFormat::Table)
    });

    if let Some(use_color) = config.use_color() {
        colored::control::set_override(use_color);
    }

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            let _ = Cli::command().print_help();
            println!();
            return Ok(());
        }
    };

    match command {
        Commands::Run(args) => run::run(&args, &config, format, cli.quiet),
        Commands::Results {
            checkpoint,
            failures,
        } => results::run(&checkpoint, failures, format),
        Commands::Info { path } => info::run(&path, format),
        Commands::Check { path } => check::run(&path, format),
        Commands::Normalize { input, output } => {
            normalize::run(&input, output.as_deref(), format)
        }
        Commands::Plot {
            input,
            output,
            dot_binary,
        } => plot::run(&input, output.as_deref(), &dot_binary, format),
    }
}
