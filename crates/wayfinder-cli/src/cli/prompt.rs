//! Interactive terminal prompter built on dialoguer.

use std::io;

use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use serde_json::Value;

use wayfinder_core::input::{parse_number, recommended_index};
use wayfinder_core::ports::{Answer, Prompter};
use wayfinder_types::error::PromptError;
use wayfinder_types::flow::{InputSpec, QuestionStep, SelectOption};

/// Asks each question on the terminal.
///
/// Esc on a select or toggle, or Ctrl+C anywhere, cancels the wizard.
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
}

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    fn select(&self, title: &str, options: &[SelectOption]) -> Result<Answer, PromptError> {
        let items: Vec<String> = options.iter().map(option_label).collect();

        let picked = Select::with_theme(&self.theme)
            .with_prompt(title)
            .items(&items)
            .default(recommended_index(options))
            .interact_opt();

        match picked {
            Ok(Some(index)) => Ok(Answer::Value(options[index].value.clone())),
            Ok(None) => Ok(Answer::Cancelled),
            Err(e) => interrupted(e),
        }
    }

    fn toggle(&self, title: &str, default: bool) -> Result<Answer, PromptError> {
        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt(title)
            .default(default)
            .interact_opt();

        match confirmed {
            Ok(Some(value)) => Ok(Answer::Value(Value::Bool(value))),
            Ok(None) => Ok(Answer::Cancelled),
            Err(e) => interrupted(e),
        }
    }

    fn number(
        &self,
        title: &str,
        min: Option<i64>,
        max: Option<i64>,
        default: Option<i64>,
        placeholder: Option<&str>,
    ) -> Result<Answer, PromptError> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(with_hint(title, placeholder.or(range_hint(min, max).as_deref())))
            .validate_with(move |raw: &String| -> Result<(), String> {
                parse_number(raw, min, max)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            });
        if let Some(default) = default {
            input = input.default(default.to_string());
        }

        match input.interact_text() {
            Ok(raw) => parse_number(&raw, min, max)
                .map(|n| Answer::Value(Value::from(n)))
                .map_err(|e| PromptError::InvalidAnswer {
                    key: title.to_string(),
                    reason: e.to_string(),
                }),
            Err(e) => interrupted(e),
        }
    }

    fn text(
        &self,
        title: &str,
        default: Option<&str>,
        placeholder: Option<&str>,
    ) -> Result<Answer, PromptError> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(with_hint(title, placeholder))
            .allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }

        match input.interact_text() {
            Ok(text) => Ok(Answer::Value(Value::String(text))),
            Err(e) => interrupted(e),
        }
    }
}

impl Default for DialoguerPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for DialoguerPrompter {
    fn ask(&mut self, step: &QuestionStep, input: &InputSpec) -> Result<Answer, PromptError> {
        let title = step.title.as_str();
        match input {
            InputSpec::Select { options } => self.select(title, options),
            InputSpec::Toggle { default } => self.toggle(title, *default),
            InputSpec::Number {
                min,
                max,
                default,
                placeholder,
            } => self.number(title, *min, *max, *default, placeholder.as_deref()),
            InputSpec::Text {
                default,
                placeholder,
            } => self.text(title, default.as_deref(), placeholder.as_deref()),
        }
    }
}

/// Ctrl+C surfaces as an interrupted read; anything else is a terminal failure.
fn interrupted(err: dialoguer::Error) -> Result<Answer, PromptError> {
    match err {
        dialoguer::Error::IO(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Answer::Cancelled),
        other => Err(PromptError::Io(other.to_string())),
    }
}

fn option_label(option: &SelectOption) -> String {
    let mut label = option.label.clone();
    if option.recommended {
        label.push_str(&format!(" {}", style("(recommended)").green()));
    }
    if let Some(description) = &option.description {
        label.push_str(&format!(" {}", style(format!("- {description}")).dim()));
    }
    label
}

fn range_hint(min: Option<i64>, max: Option<i64>) -> Option<String> {
    match (min, max) {
        (Some(min), Some(max)) => Some(format!("{min}-{max}")),
        (Some(min), None) => Some(format!(">= {min}")),
        (None, Some(max)) => Some(format!("<= {max}")),
        (None, None) => None,
    }
}

fn with_hint(title: &str, hint: Option<&str>) -> String {
    match hint {
        Some(hint) if !hint.is_empty() => format!("{title} {}", style(format!("({hint})")).dim()),
        _ => title.to_string(),
    }
}
