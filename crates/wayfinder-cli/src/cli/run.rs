//! `wayfinder run`: walk the flow and generate the artifacts.

use std::process::ExitCode;

use anyhow::{Context, Result};
use console::style;
use tracing::Instrument;
use uuid::Uuid;

use wayfinder_core::pipeline::{PhaseOutcome, ReviewReport, Sinks};
use wayfinder_core::ports::{Phase, Prompter, Reporter, SilentReporter, SourceFragments};
use wayfinder_core::session::{Session, SessionOutcome};

use crate::cli::RunArgs;
use crate::cli::answers::load_answers;
use crate::cli::prompt::DialoguerPrompter;
use crate::cli::reporter::TerminalReporter;
use crate::state::AppState;

/// Run the wizard end to end.
///
/// Exits non-zero only when the session could not run or the config template
/// failed. Cancelling is a normal exit.
pub async fn run_wizard(state: &AppState, args: &RunArgs, quiet: bool) -> Result<ExitCode> {
    let reporter: Box<dyn Reporter> = if quiet {
        Box::new(SilentReporter)
    } else {
        Box::new(TerminalReporter::new())
    };

    let session = load_session(state, reporter.as_ref()).await?;
    let mut prompter = prompter_for(args.answers.as_deref()).await?;

    let fragments = SourceFragments::new(&state.source, state.config.docs_dir.as_str());
    let delivery = state.delivery()?;
    let store = state.store();
    let sinks = Sinks {
        fragments: &fragments,
        delivery: &delivery,
        store: &store,
        reporter: reporter.as_ref(),
    };

    let span = tracing::info_span!("session", id = %Uuid::now_v7(), source = %state.source.describe());
    let outcome = session
        .run(
            prompter.as_mut(),
            sinks,
            state.pipeline_options(args.dry_run, args.save_state),
        )
        .instrument(span)
        .await?;

    Ok(match outcome {
        SessionOutcome::Reviewed { report, .. } => finish(&report, quiet),
        SessionOutcome::Ended { .. } => {
            if !quiet {
                println!();
                println!(
                    "  {} The wizard ended without a review step; nothing was generated.",
                    style("•").dim()
                );
            }
            ExitCode::SUCCESS
        }
        SessionOutcome::Cancelled { step } => {
            tracing::debug!(%step, "Cancelled by user");
            println!();
            println!("  {}", style("Cancelled").yellow());
            ExitCode::SUCCESS
        }
    })
}

/// Fetch and parse the definitions, reporting it as the loading phase.
pub async fn load_session(state: &AppState, reporter: &dyn Reporter) -> Result<Session> {
    reporter.phase_started(Phase::Loading);
    match Session::load(&state.source, &state.source_paths()).await {
        Ok(session) => {
            reporter.phase_succeeded(Phase::Loading, &state.source.describe());
            Ok(session)
        }
        Err(e) => {
            reporter.phase_failed(Phase::Loading, &e.to_string());
            Err(e).context("could not start the wizard")
        }
    }
}

/// Scripted answers when a file is given, the terminal otherwise.
pub async fn prompter_for(answers: Option<&std::path::Path>) -> Result<Box<dyn Prompter>> {
    Ok(match answers {
        Some(path) => Box::new(load_answers(path).await?),
        None => Box::new(DialoguerPrompter::new()),
    })
}

fn finish(report: &ReviewReport, quiet: bool) -> ExitCode {
    if report.has_fatal_failure() {
        if let PhaseOutcome::Failed(e) = &report.configuration {
            eprintln!();
            eprintln!("  {} Configuration was not generated: {e}", style("✗").red().bold());
        }
        return ExitCode::FAILURE;
    }

    if !quiet {
        println!();
        println!("  {} Done.", style("✓").green().bold());
    }
    ExitCode::SUCCESS
}
