//! `wayfinder validate`: report structural problems in the definitions.

use std::process::ExitCode;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use wayfinder_core::flow::{FlowIssue, Severity, validate_flow};
use wayfinder_core::ports::DefinitionSource;
use wayfinder_types::docs::DocsManifest;
use wayfinder_types::flow::FlowDefinition;

use crate::state::AppState;

/// Validate the flow (and check the manifest parses and the template exists).
///
/// Exits non-zero when any error-level issue is found.
pub async fn validate(state: &AppState, json: bool) -> Result<ExitCode> {
    let paths = state.source_paths();

    let flow_value = state.source.fetch_structured(&paths.flow).await?;
    let flow: FlowDefinition = serde_json::from_value(flow_value)
        .with_context(|| format!("{} is not a valid flow definition", paths.flow))?;
    let mut issues = validate_flow(&flow);

    match state.source.fetch_structured(&paths.docs_manifest).await {
        Ok(value) => {
            if let Err(e) = serde_json::from_value::<DocsManifest>(value) {
                issues.push(definition_issue(format!("{}: {e}", paths.docs_manifest)));
            }
        }
        Err(e) => issues.push(definition_issue(e.to_string())),
    }
    if let Err(e) = state.source.fetch_text(&paths.template).await {
        issues.push(definition_issue(e.to_string()));
    }

    let failed = issues.iter().any(FlowIssue::is_error);

    if json {
        println!("{}", serde_json::to_string_pretty(&issues)?);
    } else if issues.is_empty() {
        println!();
        println!(
            "  {} {} steps, no issues found",
            style("✓").green().bold(),
            flow.steps.len()
        );
        println!();
    } else {
        println!();
        println!("{}", issues_table(&issues));
        println!();
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn definition_issue(message: String) -> FlowIssue {
    FlowIssue {
        severity: Severity::Error,
        step: None,
        message,
    }
}

fn issues_table(issues: &[FlowIssue]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Severity").fg(Color::Cyan),
            Cell::new("Step"),
            Cell::new("Issue"),
        ]);

    for issue in issues {
        let severity = match issue.severity {
            Severity::Error => Cell::new("error").fg(Color::Red),
            Severity::Warning => Cell::new("warning").fg(Color::Yellow),
        };
        table.add_row(vec![
            severity,
            Cell::new(issue.step.as_deref().unwrap_or("-")),
            Cell::new(&issue.message),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shows_severity_and_step() {
        let issues = vec![
            FlowIssue {
                severity: Severity::Warning,
                step: Some("wifi".to_string()),
                message: "transition targets unknown step 'ghost'".to_string(),
            },
            definition_issue("template.jexl missing".to_string()),
        ];
        let rendered = issues_table(&issues).to_string();
        assert!(rendered.contains("warning"));
        assert!(rendered.contains("wifi"));
        assert!(rendered.contains("template.jexl missing"));
    }
}
