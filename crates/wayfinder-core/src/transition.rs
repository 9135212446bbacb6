//! Picks the next step from a question step's ordered transitions.

use tracing::debug;

use wayfinder_types::flow::{QuestionStep, StepId};

use crate::expression::ExpressionEvaluator;
use crate::state::State;

/// Return the `next` of the first transition whose `when` holds.
///
/// A transition without `when` always holds. The first satisfied transition
/// wins even when it has no `next` (an explicit end of the walk). When no
/// transition is satisfied the walk ends as well.
pub fn next_step(
    step: &QuestionStep,
    state: &State,
    evaluator: &ExpressionEvaluator,
) -> Option<StepId> {
    let selected = step
        .transitions
        .iter()
        .position(|t| evaluator.condition(t.when.as_deref(), state.as_value()));

    let next = selected.and_then(|index| step.transitions[index].next.clone());
    debug!(step = %step.id, transition = ?selected, next = ?next, "Resolved transition");
    next
}
