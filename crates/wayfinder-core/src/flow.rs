//! Flow loading and structural validation.
//!
//! Flows are external data, so they are checked once after parsing. Issues
//! come in two severities: errors make the flow unusable and abort loading,
//! warnings are reported and the walk proceeds.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use wayfinder_types::error::FlowError;
use wayfinder_types::flow::{FlowDefinition, InputSpec, StateKey, Step, StepId};

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// One finding of [`validate_flow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowIssue {
    pub severity: Severity,
    /// Step the issue is about, if any.
    pub step: Option<StepId>,
    pub message: String,
}

impl FlowIssue {
    fn error(step: &str, message: String) -> Self {
        Self {
            severity: Severity::Error,
            step: Some(step.to_string()),
            message,
        }
    }

    fn warning(step: Option<&str>, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            step: step.map(str::to_string),
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for FlowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.step {
            Some(step) => write!(f, "{}: step '{}': {}", self.severity, step, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse a fetched flow document and reject it when validation finds errors.
///
/// Warnings are logged and otherwise ignored.
pub fn load_flow(value: Value) -> Result<FlowDefinition, FlowError> {
    let flow: FlowDefinition =
        serde_json::from_value(value).map_err(|e| FlowError::Parse(e.to_string()))?;

    let issues = validate_flow(&flow);
    let errors: Vec<String> = issues
        .iter()
        .filter(|issue| issue.is_error())
        .map(ToString::to_string)
        .collect();
    if !errors.is_empty() {
        return Err(FlowError::Invalid(errors.join("; ")));
    }

    for issue in &issues {
        warn!(step = ?issue.step, "{}", issue.message);
    }
    Ok(flow)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check structural constraints on a flow.
///
/// Errors:
/// - one step's `state_key` is a strict prefix of another's (the second write
///   would have to go through a scalar)
/// - a `select` input without options
///
/// Warnings:
/// - the start step does not exist
/// - a transition targets an unknown step
/// - a `number` input with `min > max`
/// - more than one `recommended` option
/// - steps that cannot be reached from the start step
pub fn validate_flow(flow: &FlowDefinition) -> Vec<FlowIssue> {
    let mut issues = Vec::new();

    if flow.step(&flow.start).is_none() {
        issues.push(FlowIssue::warning(
            None,
            format!("start step '{}' does not exist", flow.start),
        ));
    }

    let mut keys: Vec<(&StateKey, &str)> = Vec::new();
    for (id, step) in &flow.steps {
        let Step::Question(question) = step else {
            continue;
        };

        for transition in &question.transitions {
            if let Some(next) = &transition.next {
                if flow.step(next).is_none() {
                    issues.push(FlowIssue::warning(
                        Some(id.as_str()),
                        format!("transition targets unknown step '{next}'"),
                    ));
                }
            }
        }

        match &question.input {
            Some(InputSpec::Select { options }) if options.is_empty() => {
                issues.push(FlowIssue::error(id, "select input has no options".to_string()));
            }
            Some(InputSpec::Select { options }) => {
                let recommended = options.iter().filter(|o| o.recommended).count();
                if recommended > 1 {
                    issues.push(FlowIssue::warning(
                        Some(id.as_str()),
                        format!("{recommended} options are marked recommended; the first is used"),
                    ));
                }
            }
            Some(InputSpec::Number {
                min: Some(min),
                max: Some(max),
                ..
            }) if min > max => {
                issues.push(FlowIssue::warning(
                    Some(id.as_str()),
                    format!("number input has min {min} greater than max {max}"),
                ));
            }
            _ => {}
        }

        if let Some(key) = &question.state_key {
            keys.push((key, id.as_str()));
        }
    }

    for (outer, outer_step) in &keys {
        for (inner, inner_step) in &keys {
            if outer.is_strict_prefix_of(inner) {
                issues.push(FlowIssue::error(
                    inner_step,
                    format!(
                        "state key '{inner}' lies under '{outer}' written by step '{outer_step}'"
                    ),
                ));
            }
        }
    }

    if flow.step(&flow.start).is_some() {
        let reachable = reachable_steps(flow);
        for id in flow.steps.keys() {
            if !reachable.contains(id.as_str()) {
                issues.push(FlowIssue::warning(
                    Some(id.as_str()),
                    "step is unreachable from the start step".to_string(),
                ));
            }
        }
    }

    issues
}

/// Step graph with one edge per transition target, conditions ignored.
/// Targets that are not defined get no edge.
fn step_graph(flow: &FlowDefinition) -> (DiGraph<&str, ()>, HashMap<&str, NodeIndex>) {
    let mut graph = DiGraph::<&str, ()>::new();
    let node_indices: HashMap<&str, _> = flow
        .steps
        .keys()
        .map(|id| (id.as_str(), graph.add_node(id.as_str())))
        .collect();

    for (id, step) in &flow.steps {
        let Step::Question(question) = step else {
            continue;
        };
        for next in question.transitions.iter().filter_map(|t| t.next.as_deref()) {
            if let Some(to) = node_indices.get(next) {
                graph.add_edge(node_indices[id.as_str()], *to, ());
            }
        }
    }

    (graph, node_indices)
}

/// Ids of every step reachable from the start step, the start included.
fn reachable_steps(flow: &FlowDefinition) -> BTreeSet<&str> {
    let (graph, node_indices) = step_graph(flow);
    let Some(start) = node_indices.get(flow.start.as_str()) else {
        return BTreeSet::new();
    };

    let mut reachable = BTreeSet::new();
    let mut bfs = Bfs::new(&graph, *start);
    while let Some(node) = bfs.next(&graph) {
        reachable.insert(graph[node]);
    }
    reachable
}
