//! One wizard session: load the definitions, walk the flow, run the review.

use futures_util::future::try_join3;
use tracing::info;

use wayfinder_types::config::WizardConfig;
use wayfinder_types::docs::DocsManifest;
use wayfinder_types::error::{FetchError, FlowError};
use wayfinder_types::flow::{FlowDefinition, StepId};
use wayfinder_types::history::HistoryEntry;

use crate::expression::ExpressionEvaluator;
use crate::flow::load_flow;
use crate::pipeline::{ArtifactPipeline, PipelineOptions, ReviewReport, Sinks};
use crate::ports::{ArtifactStore, DefinitionSource, DeliveryClient, FragmentSource, Prompter};
use crate::state::State;
use crate::walker::{FlowWalker, WalkError, WalkOutcome, WalkState};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to load wizard definitions: {0}")]
    Fetch(#[from] FetchError),

    #[error("invalid flow definition: {0}")]
    Flow(#[from] FlowError),

    #[error("invalid documentation manifest: {0}")]
    Manifest(String),

    #[error("walk aborted: {0}")]
    Walk(#[from] WalkError),
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Logical paths of the three definition documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub flow: String,
    pub docs_manifest: String,
    pub template: String,
}

impl From<&WizardConfig> for SourcePaths {
    fn from(config: &WizardConfig) -> Self {
        Self {
            flow: config.flow_path.clone(),
            docs_manifest: config.docs_manifest_path.clone(),
            template: config.template_path.clone(),
        }
    }
}

/// Everything fetched before the walk starts. Never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Definitions {
    pub flow: FlowDefinition,
    pub manifest: DocsManifest,
    pub template: String,
}

impl Definitions {
    /// Fetch the flow, manifest and template concurrently and parse them.
    ///
    /// Any failure aborts the session before the walk starts.
    pub async fn load<S: DefinitionSource>(
        source: &S,
        paths: &SourcePaths,
    ) -> Result<Self, SessionError> {
        let (flow, manifest, template) = try_join3(
            source.fetch_structured(&paths.flow),
            source.fetch_structured(&paths.docs_manifest),
            source.fetch_text(&paths.template),
        )
        .await?;

        let flow = load_flow(flow)?;
        let manifest: DocsManifest =
            serde_json::from_value(manifest).map_err(|e| SessionError::Manifest(e.to_string()))?;

        info!(
            steps = flow.steps.len(),
            instructions = manifest.documentation.instructions.len(),
            "Loaded wizard definitions"
        );
        Ok(Self {
            flow,
            manifest,
            template,
        })
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// The review step was reached and the artifact phases ran.
    Reviewed {
        report: ReviewReport,
        state: State,
        history: Vec<HistoryEntry>,
    },
    /// A question had no next step; no artifacts were generated.
    Ended { state: State, history: Vec<HistoryEntry> },
    /// The user cancelled at this step.
    Cancelled { step: StepId },
}

pub struct Session {
    definitions: Definitions,
    evaluator: ExpressionEvaluator,
}

impl Session {
    pub fn new(definitions: Definitions) -> Self {
        Self {
            definitions,
            evaluator: ExpressionEvaluator::new(),
        }
    }

    /// Fetch the definitions through `source` and build a session.
    pub async fn load<S: DefinitionSource>(
        source: &S,
        paths: &SourcePaths,
    ) -> Result<Self, SessionError> {
        Ok(Self::new(Definitions::load(source, paths).await?))
    }

    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    pub fn evaluator(&self) -> &ExpressionEvaluator {
        &self.evaluator
    }

    /// Walk the flow only.
    pub fn walk<P: Prompter + ?Sized>(&self, prompter: &mut P) -> Result<WalkOutcome, SessionError> {
        Ok(FlowWalker::new(&self.definitions.flow, &self.evaluator).walk(prompter)?)
    }

    /// Walk the flow and, when it reaches review, run the artifact phases.
    pub async fn run<P, F, D, A>(
        &self,
        prompter: &mut P,
        sinks: Sinks<'_, F, D, A>,
        options: PipelineOptions,
    ) -> Result<SessionOutcome, SessionError>
    where
        P: Prompter + ?Sized,
        F: FragmentSource,
        D: DeliveryClient,
        A: ArtifactStore,
    {
        let outcome = self.walk(prompter)?;
        info!(steps = outcome.path.len(), end = ?outcome.end, "Walk finished");

        match outcome.end {
            WalkState::Review(_) => {
                let pipeline = ArtifactPipeline::new(
                    &self.evaluator,
                    &self.definitions.template,
                    &self.definitions.manifest.documentation,
                    sinks,
                    options,
                );
                let report = pipeline.run(&outcome.state, &outcome.history).await;
                Ok(SessionOutcome::Reviewed {
                    report,
                    state: outcome.state,
                    history: outcome.history,
                })
            }
            WalkState::Cancelled(step) => Ok(SessionOutcome::Cancelled { step }),
            WalkState::Ended | WalkState::Running(_) => Ok(SessionOutcome::Ended {
                state: outcome.state,
                history: outcome.history,
            }),
        }
    }
}
