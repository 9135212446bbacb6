//! Terminal progress reporting: answer summary table and phase spinners.

use std::sync::Mutex;
use std::time::Duration;

use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use wayfinder_core::ports::{Phase, Reporter};
use wayfinder_types::history::HistoryEntry;

/// Prints the summary and shows a spinner while each phase runs.
#[derive(Default)]
pub struct TerminalReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn stop_spinner(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(spinner) = slot.take() {
                spinner.finish_and_clear();
            }
        }
    }
}

impl Reporter for TerminalReporter {
    fn summary(&self, history: &[HistoryEntry]) {
        println!();
        println!("  {}", style("Review your answers").bold());
        println!();
        println!("{}", summary_table(history));
        println!();
    }

    fn phase_started(&self, phase: Phase) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("{}...", capitalize(&phase.to_string())));
        spinner.enable_steady_tick(Duration::from_millis(80));

        self.stop_spinner();
        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(spinner);
        }
    }

    fn phase_succeeded(&self, phase: Phase, detail: &str) {
        self.stop_spinner();
        println!(
            "  {} {} {}",
            style("✓").green().bold(),
            capitalize(&phase.to_string()),
            style(detail).dim()
        );
    }

    fn phase_failed(&self, phase: Phase, error: &str) {
        self.stop_spinner();
        eprintln!(
            "  {} {} failed: {}",
            style("✗").red().bold(),
            capitalize(&phase.to_string()),
            error
        );
    }
}

pub fn summary_table(history: &[HistoryEntry]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Question").fg(Color::Cyan),
            Cell::new("Answer"),
        ]);

    for entry in history {
        table.add_row(vec![Cell::new(&entry.question), Cell::new(&entry.answer)]);
    }
    table
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize_first_letter() {
        assert_eq!(capitalize("generating configuration"), "Generating configuration");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_summary_table_lists_every_answer() {
        let table = summary_table(&[
            HistoryEntry::new("Which board?", "ESP32 DevKit"),
            HistoryEntry::new("Enable Wi-Fi?", "Yes"),
        ]);
        let rendered = table.to_string();
        assert!(rendered.contains("Question"));
        assert!(rendered.contains("ESP32 DevKit"));
        assert!(rendered.contains("Enable Wi-Fi?"));
    }

    #[test]
    fn test_spinner_lifecycle_does_not_leak() {
        let reporter = TerminalReporter::new();
        reporter.phase_started(Phase::Documentation);
        assert!(reporter.spinner.lock().unwrap().is_some());
        reporter.phase_succeeded(Phase::Documentation, "INSTALL.md");
        assert!(reporter.spinner.lock().unwrap().is_none());
    }
}
