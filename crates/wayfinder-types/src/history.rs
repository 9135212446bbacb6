//! Display-oriented audit trail of answered questions.

use serde::{Deserialize, Serialize};

/// One answered question, in traversal order.
///
/// The `answer` is already formatted for humans (option label, "Yes"/"No",
/// or the plain value), so it is not a faithful copy of what went into state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub question: String,
    pub answer: String,
}

impl HistoryEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}
