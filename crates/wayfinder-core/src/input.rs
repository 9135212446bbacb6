//! Input-kind helpers shared by every prompter.
//!
//! - [`parse_number`] is the validation rule for `number` inputs.
//! - [`display_answer`] formats an answer for the history summary.
//! - [`auto_answer`] resolves single-option selects without asking.
//! - [`ScriptedPrompter`] answers from a pre-recorded map (non-interactive runs).

use std::collections::HashMap;

use serde_json::Value;

use wayfinder_types::error::PromptError;
use wayfinder_types::flow::{InputSpec, QuestionStep, SelectOption};

use crate::ports::{Answer, Prompter};

// ---------------------------------------------------------------------------
// Number validation
// ---------------------------------------------------------------------------

/// Why a `number` entry was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumberInputError {
    #[error("please enter a whole number")]
    NotANumber,

    #[error("must be at least {0}")]
    BelowMin(i64),

    #[error("must be at most {0}")]
    AboveMax(i64),
}

/// Parse a `number` entry and check it against the optional inclusive range.
pub fn parse_number(raw: &str, min: Option<i64>, max: Option<i64>) -> Result<i64, NumberInputError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| NumberInputError::NotANumber)?;

    if let Some(min) = min.filter(|min| value < *min) {
        return Err(NumberInputError::BelowMin(min));
    }
    if let Some(max) = max.filter(|max| value > *max) {
        return Err(NumberInputError::AboveMax(max));
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Answer helpers
// ---------------------------------------------------------------------------

/// Value of a select that has exactly one option.
pub fn auto_answer(input: &InputSpec) -> Option<Value> {
    match input {
        InputSpec::Select { options } if options.len() == 1 => Some(options[0].value.clone()),
        _ => None,
    }
}

/// The value an input settles on when nobody answers it.
pub fn default_answer(input: &InputSpec) -> Option<Value> {
    match input {
        InputSpec::Select { options } => options
            .iter()
            .find(|o| o.recommended)
            .or_else(|| options.first())
            .map(|o| o.value.clone()),
        InputSpec::Toggle { default } => Some(Value::Bool(*default)),
        InputSpec::Number { default, .. } => default.map(Value::from),
        InputSpec::Text { default, .. } => default.clone().map(Value::String),
    }
}

/// Index of the option to pre-select: the recommended one, else the first.
pub fn recommended_index(options: &[SelectOption]) -> usize {
    options.iter().position(|o| o.recommended).unwrap_or(0)
}

/// Human-readable form of an answer for the history summary.
///
/// Selects show the matching option label (falling back to the raw value),
/// toggles show "Yes"/"No", everything else its plain string form.
pub fn display_answer(input: Option<&InputSpec>, value: &Value) -> String {
    match input {
        Some(InputSpec::Select { options }) => options
            .iter()
            .find(|o| &o.value == value)
            .map(|o| o.label.clone())
            .unwrap_or_else(|| plain(value)),
        Some(InputSpec::Toggle { .. }) => {
            if value.as_bool().unwrap_or(false) {
                "Yes".to_string()
            } else {
                "No".to_string()
            }
        }
        _ => plain(value),
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// ScriptedPrompter
// ---------------------------------------------------------------------------

/// Prompter that answers from a map keyed by state key (or step id for steps
/// that do not persist their answer).
///
/// Steps without a recorded answer fall back to the input's default; a step
/// with neither is a [`PromptError::MissingAnswer`]. Recorded answers are
/// validated the way an interactive prompt would validate them.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    answers: HashMap<String, Value>,
}

impl ScriptedPrompter {
    pub fn new(answers: HashMap<String, Value>) -> Self {
        Self { answers }
    }

    /// Build from a JSON object. Nested objects are flattened into dotted
    /// keys, so `{"wifi": {"ssid": "home"}}` answers `wifi.ssid`.
    pub fn from_value(value: Value) -> Result<Self, PromptError> {
        let Value::Object(map) = value else {
            return Err(PromptError::InvalidAnswer {
                key: "<answers>".to_string(),
                reason: "answers must be an object".to_string(),
            });
        };

        let mut answers = HashMap::new();
        flatten_into(&mut answers, None, map);
        Ok(Self { answers })
    }

    fn validate(key: &str, input: &InputSpec, value: Value) -> Result<Value, PromptError> {
        let invalid = |reason: String| PromptError::InvalidAnswer {
            key: key.to_string(),
            reason,
        };

        match input {
            InputSpec::Select { options } => {
                if options.iter().any(|o| o.value == value) {
                    Ok(value)
                } else {
                    Err(invalid(format!("{value} is not one of the options")))
                }
            }
            InputSpec::Toggle { .. } => match value {
                Value::Bool(_) => Ok(value),
                other => Err(invalid(format!("expected true or false, got {other}"))),
            },
            InputSpec::Number { min, max, .. } => {
                let raw = plain(&value);
                parse_number(&raw, *min, *max)
                    .map(Value::from)
                    .map_err(|e| invalid(e.to_string()))
            }
            InputSpec::Text { .. } => Ok(Value::String(plain(&value))),
        }
    }
}

fn flatten_into(
    answers: &mut HashMap<String, Value>,
    prefix: Option<&str>,
    map: serde_json::Map<String, Value>,
) {
    for (key, value) in map {
        let full = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key,
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(answers, Some(&full), inner),
            other => {
                answers.insert(full, other);
            }
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, step: &QuestionStep, input: &InputSpec) -> Result<Answer, PromptError> {
        let key = step
            .state_key
            .as_ref()
            .map(|k| k.as_str().to_string())
            .unwrap_or_else(|| step.id.clone());

        match self.answers.get(&key).cloned() {
            Some(value) => Self::validate(&key, input, value).map(Answer::Value),
            None => default_answer(input)
                .map(Answer::Value)
                .ok_or(PromptError::MissingAnswer(key)),
        }
    }
}
