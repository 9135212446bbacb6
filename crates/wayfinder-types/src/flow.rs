//! Flow definition domain types.
//!
//! A flow is a start step id plus a map of steps. Steps are either questions
//! (which collect one value and branch through ordered transitions) or the
//! terminal review step. The wire format keeps the step kind in an optional
//! `type` field, so deserialization goes through raw mirror structs and
//! `TryFrom` to land on the tagged union.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FlowError;

/// Identifier of a step within a flow.
pub type StepId = String;

// ---------------------------------------------------------------------------
// Flow definition
// ---------------------------------------------------------------------------

/// The immutable, externally supplied description of a wizard.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawFlowDefinition")]
pub struct FlowDefinition {
    /// Step the walk begins at.
    pub start: StepId,
    /// All steps keyed by id. Each step's `id` equals its key.
    pub steps: BTreeMap<StepId, Step>,
}

impl FlowDefinition {
    /// Look up a step by id.
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.get(id)
    }
}

#[derive(Deserialize)]
struct RawFlowDefinition {
    start: StepId,
    #[serde(default)]
    steps: BTreeMap<StepId, Step>,
}

impl TryFrom<RawFlowDefinition> for FlowDefinition {
    type Error = FlowError;

    fn try_from(raw: RawFlowDefinition) -> Result<Self, Self::Error> {
        let steps = raw
            .steps
            .into_iter()
            .map(|(id, mut step)| {
                step.set_id(id.clone());
                (id, step)
            })
            .collect();

        Ok(Self {
            start: raw.start,
            steps,
        })
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// One node of the flow.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawStep")]
pub enum Step {
    /// Collects a value (or just branches) and moves on.
    Question(QuestionStep),
    /// Terminal step that triggers artifact generation.
    Review(ReviewStep),
}

impl Step {
    pub fn id(&self) -> &str {
        match self {
            Self::Question(q) => &q.id,
            Self::Review(r) => &r.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Question(q) => &q.title,
            Self::Review(r) => &r.title,
        }
    }

    fn set_id(&mut self, id: StepId) {
        match self {
            Self::Question(q) => q.id = id,
            Self::Review(r) => r.id = id,
        }
    }
}

/// A step that asks for a value.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionStep {
    pub id: StepId,
    pub title: String,
    /// How to obtain the value. A step without input only branches.
    pub input: Option<InputSpec>,
    /// Where the value is written. A step without one does not persist its answer.
    pub state_key: Option<StateKey>,
    /// Ordered guarded edges; the first satisfied one wins.
    pub transitions: Vec<Transition>,
}

/// The terminal review step.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewStep {
    pub id: StepId,
    pub title: String,
}

#[derive(Deserialize)]
struct RawStep {
    #[serde(default)]
    id: Option<StepId>,
    #[serde(default)]
    title: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    input: Option<InputSpec>,
    #[serde(default)]
    state_key: Option<StateKey>,
    #[serde(default)]
    transitions: Vec<Transition>,
}

impl TryFrom<RawStep> for Step {
    type Error = FlowError;

    fn try_from(raw: RawStep) -> Result<Self, Self::Error> {
        let id = raw.id.unwrap_or_default();
        match raw.kind.as_deref() {
            None | Some("question") => Ok(Self::Question(QuestionStep {
                id,
                title: raw.title,
                input: raw.input,
                state_key: raw.state_key,
                transitions: raw.transitions,
            })),
            Some("review") => Ok(Self::Review(ReviewStep {
                id,
                title: raw.title,
            })),
            Some(other) => Err(FlowError::UnknownStepType(other.to_string())),
        }
    }
}

/// A guarded edge to the next step.
///
/// An absent `when` always holds. An absent `next` on the selected transition
/// ends the walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<StepId>,
}

// ---------------------------------------------------------------------------
// Input specifications
// ---------------------------------------------------------------------------

/// How a question step obtains its value.
///
/// Internally tagged by `type`:
/// ```json
/// { "type": "number", "min": 1, "max": 10 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputSpec {
    /// Pick one of a list of options.
    Select {
        #[serde(default)]
        options: Vec<SelectOption>,
    },
    /// Yes/no.
    Toggle {
        #[serde(default)]
        default: bool,
    },
    /// Integer entry with an optional inclusive range.
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    /// Free text.
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
}

impl InputSpec {
    /// Short lowercase name of the input kind, as written in flow files.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Select { .. } => "select",
            Self::Toggle { .. } => "toggle",
            Self::Number { .. } => "number",
            Self::Text { .. } => "text",
        }
    }
}

/// One choice of a `select` input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Value written into state when chosen.
    pub value: Value,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Pre-selected when the options are presented.
    #[serde(default)]
    pub recommended: bool,
}

// ---------------------------------------------------------------------------
// State keys
// ---------------------------------------------------------------------------

/// A dotted path into the state tree, e.g. `board.flash.size`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateKey(String);

impl StateKey {
    pub fn parse(raw: &str) -> Result<Self, FlowError> {
        if raw.is_empty() || raw.split('.').any(str::is_empty) {
            return Err(FlowError::InvalidStateKey(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path segments, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Whether `other` lives strictly underneath this key
    /// (`a.b` is a prefix of `a.b.c`, but not of `a.bc`).
    pub fn is_strict_prefix_of(&self, other: &StateKey) -> bool {
        other
            .0
            .strip_prefix(&self.0)
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

impl FromStr for StateKey {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StateKey {
    type Error = FlowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StateKey> for String {
    fn from(key: StateKey) -> Self {
        key.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
