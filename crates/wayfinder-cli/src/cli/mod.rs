//! CLI command definitions for the `wayfinder` binary.
//!
//! Uses clap derive macros for argument parsing. Running without a
//! subcommand starts the interactive wizard.

pub mod answers;
pub mod docs;
pub mod prompt;
pub mod reporter;
pub mod run;
pub mod validate;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Walk through a configuration wizard and generate its artifacts.
#[derive(Parser)]
#[command(name = "wayfinder", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: ./wayfinder.toml, then the user config dir).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL or directory holding the flow, manifest and template.
    #[arg(long, global = true, env = "WAYFINDER_SOURCE")]
    pub source: Option<String>,

    /// Directory generated artifacts are written to.
    #[arg(long, global = true, value_name = "DIR", env = "WAYFINDER_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Suppress all output except prompts and errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit log lines as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the wizard and generate the configuration and install guide (default).
    Run(RunArgs),

    /// Check the flow definition and manifest for structural problems.
    Validate {
        /// Print the issues as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Walk the flow and print the install guide without delivering anything.
    Docs {
        /// Answer the questions from a JSON or YAML file instead of prompting.
        #[arg(long, value_name = "FILE")]
        answers: Option<PathBuf>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Answer the questions from a JSON or YAML file instead of prompting.
    #[arg(long, value_name = "FILE")]
    pub answers: Option<PathBuf>,

    /// Derive the payload but save it instead of delivering it.
    #[arg(long)]
    pub dry_run: bool,

    /// Also write the final answers to state.json.
    #[arg(long)]
    pub save_state: bool,
}
