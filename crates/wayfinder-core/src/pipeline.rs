//! The review phase: turn the final state into artifacts.
//!
//! Runs sequentially against the read-only final state:
//!
//! 1. summary of the answers
//! 2. configuration: derive the payload, deliver it, save the returned
//!    artifact (or, in dry-run mode, save the payload itself)
//! 3. documentation: assemble the guide and save it
//! 4. optionally, export the state as JSON
//!
//! A phase failure is reported and the next phase still runs. Only a template
//! failure is fatal, which the caller turns into a non-zero exit.

use std::path::PathBuf;

use tracing::{info, warn};

use wayfinder_types::docs::Documentation;
use wayfinder_types::error::{DeliveryError, PersistenceError};
use wayfinder_types::history::HistoryEntry;

use crate::config_deriver::{DeriveError, derive_config};
use crate::document::assemble;
use crate::expression::ExpressionEvaluator;
use crate::ports::{ArtifactStore, DeliveryClient, FragmentSource, Phase, Reporter};
use crate::state::State;

/// Name the dry-run payload is saved under.
pub const PAYLOAD_ARTIFACT: &str = "payload.json";
/// Name the exported state is saved under.
pub const STATE_ARTIFACT: &str = "state.json";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Why a single phase failed.
#[derive(Debug, thiserror::Error)]
pub enum PhaseError {
    #[error(transparent)]
    Derive(#[from] DeriveError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("failed to serialize {what}: {message}")]
    Serialize { what: &'static str, message: String },
}

impl PhaseError {
    /// Fatal failures make the whole run unsuccessful.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Derive(_))
    }
}

// ---------------------------------------------------------------------------
// Options and sinks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Name of the saved installation document.
    pub document_name: String,
    /// Name of the saved delivery artifact, unless the payload overrides it.
    pub artifact_name: String,
    /// Skip delivery and save the derived payload instead.
    pub dry_run: bool,
    /// Also export the final state.
    pub save_state: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            document_name: "INSTALL.md".to_string(),
            artifact_name: "config.bin".to_string(),
            dry_run: false,
            save_state: false,
        }
    }
}

/// Where artifacts come from and go to.
pub struct Sinks<'a, F, D, A> {
    pub fragments: &'a F,
    pub delivery: &'a D,
    pub store: &'a A,
    pub reporter: &'a dyn Reporter,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Result of a single phase.
#[derive(Debug)]
pub enum PhaseOutcome {
    Saved(PathBuf),
    Failed(PhaseError),
}

impl PhaseOutcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Failed(e) if e.is_fatal())
    }

    pub fn saved_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Saved(path) => Some(path),
            Self::Failed(_) => None,
        }
    }
}

/// What the review phase produced.
#[derive(Debug)]
pub struct ReviewReport {
    pub configuration: PhaseOutcome,
    pub documentation: PhaseOutcome,
    /// Present when state export was requested.
    pub state_export: Option<PhaseOutcome>,
}

impl ReviewReport {
    pub fn has_fatal_failure(&self) -> bool {
        self.configuration.is_fatal()
            || self.documentation.is_fatal()
            || self.state_export.as_ref().is_some_and(PhaseOutcome::is_fatal)
    }
}

// ---------------------------------------------------------------------------
// ArtifactPipeline
// ---------------------------------------------------------------------------

pub struct ArtifactPipeline<'a, F, D, A> {
    evaluator: &'a ExpressionEvaluator,
    template: &'a str,
    documentation: &'a Documentation,
    sinks: Sinks<'a, F, D, A>,
    options: PipelineOptions,
}

impl<'a, F, D, A> ArtifactPipeline<'a, F, D, A>
where
    F: FragmentSource,
    D: DeliveryClient,
    A: ArtifactStore,
{
    pub fn new(
        evaluator: &'a ExpressionEvaluator,
        template: &'a str,
        documentation: &'a Documentation,
        sinks: Sinks<'a, F, D, A>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            evaluator,
            template,
            documentation,
            sinks,
            options,
        }
    }

    /// Run every phase against the final state.
    pub async fn run(&self, state: &State, history: &[HistoryEntry]) -> ReviewReport {
        self.sinks.reporter.summary(history);

        let configuration = self
            .phase(Phase::Configuration, self.configuration(state))
            .await;
        let documentation = self
            .phase(Phase::Documentation, self.documentation(state))
            .await;
        let state_export = if self.options.save_state {
            Some(self.phase(Phase::StateExport, self.state_export(state)).await)
        } else {
            None
        };

        ReviewReport {
            configuration,
            documentation,
            state_export,
        }
    }

    async fn phase(
        &self,
        phase: Phase,
        work: impl Future<Output = Result<PathBuf, PhaseError>>,
    ) -> PhaseOutcome {
        let reporter = self.sinks.reporter;
        reporter.phase_started(phase);

        match work.await {
            Ok(path) => {
                info!(%phase, path = %path.display(), "Phase complete");
                reporter.phase_succeeded(phase, &path.display().to_string());
                PhaseOutcome::Saved(path)
            }
            Err(e) => {
                warn!(%phase, error = %e, fatal = e.is_fatal(), "Phase failed");
                reporter.phase_failed(phase, &e.to_string());
                PhaseOutcome::Failed(e)
            }
        }
    }

    async fn configuration(&self, state: &State) -> Result<PathBuf, PhaseError> {
        let payload = derive_config(self.template, state, self.evaluator)?;

        if self.options.dry_run {
            info!(url = %payload.url, "Dry run, skipping delivery");
            let bytes = to_json("payload", &payload)?;
            return Ok(self.sinks.store.save(PAYLOAD_ARTIFACT, &bytes).await?);
        }

        let artifact = self.sinks.delivery.deliver(&payload).await?;
        let name = payload
            .filename
            .as_deref()
            .unwrap_or(self.options.artifact_name.as_str());
        Ok(self.sinks.store.save(name, &artifact).await?)
    }

    async fn documentation(&self, state: &State) -> Result<PathBuf, PhaseError> {
        let document = assemble(self.documentation, state, self.evaluator, self.sinks.fragments).await;
        Ok(self
            .sinks
            .store
            .save(&self.options.document_name, document.as_bytes())
            .await?)
    }

    async fn state_export(&self, state: &State) -> Result<PathBuf, PhaseError> {
        let bytes = to_json("state", state)?;
        Ok(self.sinks.store.save(STATE_ARTIFACT, &bytes).await?)
    }
}

fn to_json(what: &'static str, value: &impl serde::Serialize) -> Result<Vec<u8>, PhaseError> {
    serde_json::to_vec_pretty(value).map_err(|e| PhaseError::Serialize {
        what,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::SourceFragments;
    use crate::ports::fakes::{MemorySource, MemoryStore, RecordingDelivery, RecordingReporter};
    use serde_json::json;

    const TEMPLATE: &str =
        r#"{ "url": "https://build.example/" + device.board, "body": { "board": device.board } }"#;

    fn documentation() -> Documentation {
        serde_json::from_value(json!({
            "title": "Setup",
            "instructions": [
                { "id": "flash", "category": "setup", "always": true, "goal": "Flash", "file": "flash.md" }
            ]
        }))
        .unwrap()
    }

    fn final_state() -> State {
        let mut state = State::new();
        state
            .set(&"device.board".parse().unwrap(), json!("esp32"))
            .unwrap();
        state
    }

    fn history() -> Vec<HistoryEntry> {
        vec![HistoryEntry::new("Board", "ESP32")]
    }

    struct Harness {
        source: MemorySource,
        delivery: RecordingDelivery,
        store: MemoryStore,
        reporter: RecordingReporter,
        evaluator: ExpressionEvaluator,
        documentation: Documentation,
    }

    impl Harness {
        fn new(delivery: RecordingDelivery, store: MemoryStore) -> Self {
            Self {
                source: MemorySource::default().with("docs/flash.md", "Hold BOOT."),
                delivery,
                store,
                reporter: RecordingReporter::default(),
                evaluator: ExpressionEvaluator::new(),
                documentation: documentation(),
            }
        }

        async fn run(&self, template: &str, options: PipelineOptions) -> ReviewReport {
            let fragments = SourceFragments::new(&self.source, "docs");
            let pipeline = ArtifactPipeline::new(
                &self.evaluator,
                template,
                &self.documentation,
                Sinks {
                    fragments: &fragments,
                    delivery: &self.delivery,
                    store: &self.store,
                    reporter: &self.reporter,
                },
                options,
            );
            pipeline.run(&final_state(), &history()).await
        }

        fn events(&self) -> Vec<String> {
            self.reporter.events.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn test_successful_review_saves_both_artifacts() {
        let harness = Harness::new(RecordingDelivery::returning(b"\x7fELF"), MemoryStore::default());

        let report = harness.run(TEMPLATE, PipelineOptions::default()).await;

        assert!(!report.has_fatal_failure());
        assert_eq!(report.configuration.saved_path(), Some(&PathBuf::from("config.bin")));
        assert_eq!(report.documentation.saved_path(), Some(&PathBuf::from("INSTALL.md")));
        assert!(report.state_export.is_none());

        let delivered = harness.delivery.delivered.lock().unwrap().clone();
        assert_eq!(delivered[0].url, "https://build.example/esp32");
        assert_eq!(delivered[0].body, json!({ "board": "esp32" }));

        assert_eq!(harness.store.get("config.bin").unwrap(), b"\x7fELF");
        assert_eq!(
            String::from_utf8(harness.store.get("INSTALL.md").unwrap()).unwrap(),
            "# Setup\n\n## setup\n\n### Flash\n\nHold BOOT."
        );
        assert_eq!(
            harness.events(),
            vec!["summary:1", "ok:Configuration", "ok:Documentation"]
        );
    }

    #[tokio::test]
    async fn test_payload_filename_overrides_artifact_name() {
        let harness = Harness::new(RecordingDelivery::returning(b"bin"), MemoryStore::default());
        let template = r#"{ "url": "https://x.example", "body": {}, "filename": device.board + ".uf2" }"#;

        let report = harness.run(template, PipelineOptions::default()).await;
        assert_eq!(report.configuration.saved_path(), Some(&PathBuf::from("esp32.uf2")));
    }

    #[tokio::test]
    async fn test_template_failure_is_fatal_but_docs_still_run() {
        let harness = Harness::new(RecordingDelivery::returning(b"bin"), MemoryStore::default());

        let report = harness.run("{ broken", PipelineOptions::default()).await;

        assert!(report.has_fatal_failure());
        assert!(matches!(report.configuration, PhaseOutcome::Failed(PhaseError::Derive(_))));
        assert!(report.documentation.saved_path().is_some());
        assert!(harness.delivery.delivered.lock().unwrap().is_empty());
        assert_eq!(harness.store.names(), vec!["INSTALL.md"]);
        assert_eq!(
            harness.events(),
            vec!["summary:1", "failed:Configuration", "ok:Documentation"]
        );
    }

    #[tokio::test]
    async fn test_delivery_failure_is_not_fatal() {
        let harness = Harness::new(RecordingDelivery::failing(502), MemoryStore::default());

        let report = harness.run(TEMPLATE, PipelineOptions::default()).await;

        assert!(!report.has_fatal_failure());
        assert!(matches!(
            report.configuration,
            PhaseOutcome::Failed(PhaseError::Delivery(DeliveryError::Status { status: 502, .. }))
        ));
        assert!(report.documentation.saved_path().is_some());
    }

    #[tokio::test]
    async fn test_persistence_failure_is_not_fatal() {
        let store = MemoryStore {
            refuse: Some("INSTALL.md".to_string()),
            ..Default::default()
        };
        let harness = Harness::new(RecordingDelivery::returning(b"bin"), store);

        let report = harness.run(TEMPLATE, PipelineOptions::default()).await;

        assert!(!report.has_fatal_failure());
        assert!(report.configuration.saved_path().is_some());
        assert!(matches!(report.documentation, PhaseOutcome::Failed(PhaseError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_dry_run_saves_payload_and_skips_delivery() {
        let harness = Harness::new(RecordingDelivery::returning(b"bin"), MemoryStore::default());
        let options = PipelineOptions {
            dry_run: true,
            save_state: true,
            ..Default::default()
        };

        let report = harness.run(TEMPLATE, options).await;

        assert!(harness.delivery.delivered.lock().unwrap().is_empty());
        assert_eq!(report.configuration.saved_path(), Some(&PathBuf::from(PAYLOAD_ARTIFACT)));
        assert_eq!(harness.store.names(), vec![PAYLOAD_ARTIFACT, "INSTALL.md", STATE_ARTIFACT]);

        let payload: serde_json::Value =
            serde_json::from_slice(&harness.store.get(PAYLOAD_ARTIFACT).unwrap()).unwrap();
        assert_eq!(payload["url"], json!("https://build.example/esp32"));

        let exported: serde_json::Value =
            serde_json::from_slice(&harness.store.get(STATE_ARTIFACT).unwrap()).unwrap();
        assert_eq!(exported, json!({ "device": { "board": "esp32" } }));
    }
}
