//! `wayfinder docs`: preview the install guide on stdout.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use console::style;

use wayfinder_core::document::assemble;
use wayfinder_core::ports::{SilentReporter, SourceFragments};
use wayfinder_core::walker::WalkState;

use crate::cli::run::{load_session, prompter_for};
use crate::state::AppState;

/// Walk the flow, then print the assembled document instead of saving it.
///
/// Nothing is delivered or written. A cancelled walk prints nothing.
pub async fn preview_docs(state: &AppState, answers: Option<&Path>) -> Result<ExitCode> {
    let session = load_session(state, &SilentReporter).await?;
    let mut prompter = prompter_for(answers).await?;

    let outcome = session.walk(prompter.as_mut())?;
    if let WalkState::Cancelled(_) = outcome.end {
        eprintln!("  {}", style("Cancelled").yellow());
        return Ok(ExitCode::SUCCESS);
    }

    let fragments = SourceFragments::new(&state.source, state.config.docs_dir.as_str());
    let document = assemble(
        &session.definitions().manifest.documentation,
        &outcome.state,
        session.evaluator(),
        &fragments,
    )
    .await;

    println!("{document}");
    Ok(ExitCode::SUCCESS)
}
