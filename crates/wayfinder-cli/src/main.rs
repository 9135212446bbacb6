//! Wayfinder CLI entry point.
//!
//! Binary name: `wayfinder`
//!
//! Parses CLI arguments, sets up tracing, resolves the configuration and
//! dispatches to the command handler.

mod cli;
mod state;

use std::process::ExitCode;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands, RunArgs};
use state::AppState;
use wayfinder_observe::tracing_setup::{
    LogFormat, TracingOptions, filter_for_verbosity, init_tracing, shutdown_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or config
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "wayfinder", &mut std::io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    init_tracing(&TracingOptions {
        default_filter: filter_for_verbosity(cli.verbose, cli.quiet),
        format: if cli.log_json {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        },
        enable_otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = dispatch(&cli).await;
    shutdown_tracing();
    result
}

async fn dispatch(cli: &Cli) -> anyhow::Result<ExitCode> {
    let state = AppState::init(cli).await?;

    match &cli.command {
        None => cli::run::run_wizard(&state, &RunArgs::default(), cli.quiet).await,
        Some(Commands::Run(args)) => cli::run::run_wizard(&state, args, cli.quiet).await,
        Some(Commands::Validate { json }) => cli::validate::validate(&state, *json).await,
        Some(Commands::Docs { answers }) => {
            cli::docs::preview_docs(&state, answers.as_deref()).await
        }
        Some(Commands::Completions { .. }) => Ok(ExitCode::SUCCESS),
    }
}
