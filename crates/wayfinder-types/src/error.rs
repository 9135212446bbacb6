use thiserror::Error;

/// Errors from fetching flow definitions, manifests, templates or fragments.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetching '{path}' returned status {status}")]
    Status { path: String, status: u16 },

    #[error("fetching '{path}' failed: {message}")]
    Transport { path: String, message: String },

    #[error("reading '{path}' failed: {message}")]
    Io { path: String, message: String },

    #[error("'{path}' is not valid structured data: {message}")]
    Parse { path: String, message: String },
}

impl FetchError {
    /// The logical path the failed fetch was addressed to.
    pub fn path(&self) -> &str {
        match self {
            Self::Status { path, .. }
            | Self::Transport { path, .. }
            | Self::Io { path, .. }
            | Self::Parse { path, .. } => path,
        }
    }
}

/// Errors raised while interpreting a flow definition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("invalid state key '{0}': segments must be non-empty")]
    InvalidStateKey(String),

    #[error("unknown step type '{0}'")]
    UnknownStepType(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("flow definition is invalid: {0}")]
    Invalid(String),
}

/// Errors from writing into the accumulated state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("cannot write '{key}': '{segment}' already holds a non-object value")]
    PathConflict { key: String, segment: String },
}

/// Errors from obtaining an answer for a step.
///
/// Cancellation is not an error; prompters report it as a distinct answer.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("terminal interaction failed: {0}")]
    Io(String),

    #[error("no answer provided for '{0}' and the input has no default")]
    MissingAnswer(String),

    #[error("answer for '{key}' is invalid: {reason}")]
    InvalidAnswer { key: String, reason: String },
}

/// Errors from handing the derived config payload to its target.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery to '{url}' returned status {status}")]
    Status { url: String, status: u16 },

    #[error("delivery to '{url}' failed: {message}")]
    Transport { url: String, message: String },
}

/// Errors from writing a generated artifact to durable storage.
#[derive(Debug, Error)]
#[error("failed to save '{name}': {message}")]
pub struct PersistenceError {
    pub name: String,
    pub message: String,
}
