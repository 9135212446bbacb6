//! The flow-walking state machine.
//!
//! `FlowWalker` owns the session's single mutable [`State`] and history. Each
//! [`FlowWalker::advance`] call runs exactly one step:
//!
//! 1. resolve the current step id (unknown id => [`WalkError::UnknownStep`]);
//! 2. a review step ends the walk at [`WalkState::Review`];
//! 3. otherwise obtain a value (single-option selects resolve without asking;
//!    cancellation ends the walk at [`WalkState::Cancelled`]);
//! 4. write the value at the step's state key and record a history entry;
//! 5. pick the next step, or end at [`WalkState::Ended`] when there is none.
//!
//! There is no cycle detection: a cyclic flow keeps walking.

use serde_json::Value;
use tracing::{debug, info};

use wayfinder_types::error::{PromptError, StateError};
use wayfinder_types::flow::{FlowDefinition, QuestionStep, Step, StepId};
use wayfinder_types::history::HistoryEntry;

use crate::expression::ExpressionEvaluator;
use crate::input::{auto_answer, display_answer};
use crate::ports::{Answer, Prompter};
use crate::state::State;
use crate::transition::next_step;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Failures that halt the walk. No artifacts are produced after one.
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error("step '{id}' is not defined in the flow")]
    UnknownStep { id: StepId },

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

// ---------------------------------------------------------------------------
// Walk state
// ---------------------------------------------------------------------------

/// Where the walker stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkState {
    /// About to run this step.
    Running(StepId),
    /// Reached the review step; artifacts should be generated.
    Review(StepId),
    /// A question step had no next step (implicit end, no review).
    Ended,
    /// The user cancelled the prompt of this step.
    Cancelled(StepId),
}

impl WalkState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }
}

/// Everything a finished walk leaves behind.
#[derive(Debug, Clone)]
pub struct WalkOutcome {
    pub end: WalkState,
    pub state: State,
    pub history: Vec<HistoryEntry>,
    /// Step ids in the order they were run.
    pub path: Vec<StepId>,
}

// ---------------------------------------------------------------------------
// FlowWalker
// ---------------------------------------------------------------------------

pub struct FlowWalker<'a> {
    flow: &'a FlowDefinition,
    evaluator: &'a ExpressionEvaluator,
    state: State,
    history: Vec<HistoryEntry>,
    path: Vec<StepId>,
    position: WalkState,
}

impl<'a> FlowWalker<'a> {
    /// A walker positioned at the flow's start step with empty state.
    pub fn new(flow: &'a FlowDefinition, evaluator: &'a ExpressionEvaluator) -> Self {
        Self {
            flow,
            evaluator,
            state: State::new(),
            history: Vec::new(),
            path: Vec::new(),
            position: WalkState::Running(flow.start.clone()),
        }
    }

    pub fn position(&self) -> &WalkState {
        &self.position
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Run the current step and move to the next position.
    ///
    /// Calling this once the walk is over is a no-op.
    pub fn advance<P: Prompter + ?Sized>(
        &mut self,
        prompter: &mut P,
    ) -> Result<&WalkState, WalkError> {
        let WalkState::Running(current) = &self.position else {
            return Ok(&self.position);
        };

        let step = self
            .flow
            .step(current)
            .ok_or_else(|| WalkError::UnknownStep {
                id: current.clone(),
            })?;
        self.path.push(current.clone());

        self.position = match step {
            Step::Review(review) => {
                info!(step = %review.id, answers = self.history.len(), "Reached review step");
                WalkState::Review(review.id.clone())
            }
            Step::Question(question) => self.run_question(question, prompter)?,
        };

        Ok(&self.position)
    }

    /// Advance until the walk ends, cancels or fails.
    pub fn walk<P: Prompter + ?Sized>(mut self, prompter: &mut P) -> Result<WalkOutcome, WalkError> {
        while self.position.is_running() {
            self.advance(prompter)?;
        }

        Ok(WalkOutcome {
            end: self.position,
            state: self.state,
            history: self.history,
            path: self.path,
        })
    }

    fn run_question<P: Prompter + ?Sized>(
        &mut self,
        step: &QuestionStep,
        prompter: &mut P,
    ) -> Result<WalkState, WalkError> {
        if let Some(input) = &step.input {
            let value = match auto_answer(input) {
                Some(value) => {
                    debug!(step = %step.id, "Single option, selected without prompting");
                    value
                }
                None => match prompter.ask(step, input)? {
                    Answer::Value(value) => value,
                    Answer::Cancelled => {
                        info!(step = %step.id, "Walk cancelled");
                        return Ok(WalkState::Cancelled(step.id.clone()));
                    }
                },
            };
            self.record(step, value)?;
        }

        Ok(match next_step(step, &self.state, self.evaluator) {
            Some(next) => WalkState::Running(next),
            None => WalkState::Ended,
        })
    }

    fn record(&mut self, step: &QuestionStep, value: Value) -> Result<(), WalkError> {
        let Some(key) = &step.state_key else {
            return Ok(());
        };

        let answer = display_answer(step.input.as_ref(), &value);
        self.state.set(key, value)?;
        self.history.push(HistoryEntry::new(step.title.clone(), answer));
        Ok(())
    }
}
