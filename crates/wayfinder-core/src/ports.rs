//! Collaborator traits the engines are written against.
//!
//! Everything that touches the terminal, the network or the filesystem sits
//! behind one of these traits. Implementations live in `wayfinder-infra`
//! (HTTP, filesystem) and `wayfinder-cli` (dialoguer prompts, spinners).
//!
//! Async traits use RPITIT (return position `impl Trait` in traits), no
//! async_trait macro.

use std::future::Future;
use std::path::PathBuf;

use serde_json::Value;

use wayfinder_types::error::{DeliveryError, FetchError, PersistenceError, PromptError};
use wayfinder_types::flow::{InputSpec, QuestionStep};
use wayfinder_types::history::HistoryEntry;
use wayfinder_types::payload::ConfigPayload;

// ---------------------------------------------------------------------------
// Definitions and fragments
// ---------------------------------------------------------------------------

/// Fetches flow definitions, manifests, templates and fragments by logical path.
pub trait DefinitionSource: Send + Sync {
    /// Fetch raw text. Non-success responses and missing files are errors.
    fn fetch_text(&self, path: &str) -> impl Future<Output = Result<String, FetchError>> + Send;

    /// Fetch and parse a structured document (JSON, or YAML for `.yaml`/`.yml`).
    fn fetch_structured(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Value, FetchError>> + Send {
        async move {
            let text = self.fetch_text(path).await?;
            parse_structured(path, &text)
        }
    }
}

/// Parse fetched text as JSON, or as YAML when the path says so.
pub fn parse_structured(path: &str, text: &str) -> Result<Value, FetchError> {
    let lower = path.to_ascii_lowercase();
    let parsed = if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        serde_yaml_ng::from_str(text).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(text).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| FetchError::Parse {
        path: path.to_string(),
        message,
    })
}

/// Fetches documentation fragments. Never fails.
pub trait FragmentSource: Send + Sync {
    /// Fragment text, or a Markdown placeholder naming `path` when it cannot
    /// be fetched for any reason.
    fn fetch_fragment(&self, path: &str) -> impl Future<Output = String> + Send;
}

/// Placeholder rendered in place of a fragment that could not be fetched.
pub fn missing_fragment_placeholder(path: &str) -> String {
    format!("*Documentation file not found: {path}*")
}

/// Serves fragments from a [`DefinitionSource`], relative to a docs directory.
pub struct SourceFragments<'a, S> {
    source: &'a S,
    docs_dir: String,
}

impl<'a, S: DefinitionSource> SourceFragments<'a, S> {
    pub fn new(source: &'a S, docs_dir: impl Into<String>) -> Self {
        Self {
            source,
            docs_dir: docs_dir.into(),
        }
    }

    fn resolve(&self, path: &str) -> String {
        let dir = self.docs_dir.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if dir.is_empty() || dir == "." {
            path.to_string()
        } else {
            format!("{dir}/{path}")
        }
    }
}

impl<S: DefinitionSource> FragmentSource for SourceFragments<'_, S> {
    async fn fetch_fragment(&self, path: &str) -> String {
        match self.source.fetch_text(&self.resolve(path)).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path, error = %e, "Documentation fragment unavailable");
                missing_fragment_placeholder(path)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Prompting
// ---------------------------------------------------------------------------

/// What a prompter obtained for a step.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Value(Value),
    /// The user aborted. Ends the walk without further writes.
    Cancelled,
}

/// Asks the user for a value matching an input specification.
///
/// Expected behavior per input kind:
/// - `select`: present every option, pre-selecting the `recommended` one
/// - `toggle`: yes/no defaulting to `input.default`
/// - `number`: re-prompt until [`crate::input::parse_number`] accepts the entry
/// - `text`: free text with the optional default and placeholder hint
///
/// Single-option selects never reach the prompter; the walker resolves them.
pub trait Prompter {
    fn ask(&mut self, step: &QuestionStep, input: &InputSpec) -> Result<Answer, PromptError>;
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn ask(&mut self, step: &QuestionStep, input: &InputSpec) -> Result<Answer, PromptError> {
        (**self).ask(step, input)
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Phases of a session reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Configuration,
    Documentation,
    StateExport,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Loading => "loading wizard definitions",
            Self::Configuration => "generating configuration",
            Self::Documentation => "generating installation guide",
            Self::StateExport => "exporting answers",
        };
        f.write_str(label)
    }
}

/// Receives the summary and phase progress (spinners, log lines).
///
/// Every method defaults to doing nothing.
pub trait Reporter: Send + Sync {
    fn summary(&self, _history: &[HistoryEntry]) {}

    fn phase_started(&self, _phase: Phase) {}

    fn phase_succeeded(&self, _phase: Phase, _detail: &str) {}

    fn phase_failed(&self, _phase: Phase, _error: &str) {}
}

/// Reporter that discards everything.
pub struct SilentReporter;

impl Reporter for SilentReporter {}

// ---------------------------------------------------------------------------
// Artifact sinks
// ---------------------------------------------------------------------------

/// Hands the derived config payload to its target and returns the artifact
/// the target produced.
pub trait DeliveryClient: Send + Sync {
    fn deliver(
        &self,
        payload: &ConfigPayload,
    ) -> impl Future<Output = Result<Vec<u8>, DeliveryError>> + Send;
}

/// Writes named artifacts to durable storage.
pub trait ArtifactStore: Send + Sync {
    /// Save `content` under `name`, returning where it landed.
    fn save(
        &self,
        name: &str,
        content: &[u8],
    ) -> impl Future<Output = Result<PathBuf, PersistenceError>> + Send;
}
