//! One check-and-update cycle.
//!
//! `probe -> compare -> pipeline (if changed) -> cursor write (if all steps
//! succeeded)`. Comparison is plain equality against the stored cursor; a
//! missing cursor always counts as a change. Nothing in here returns an
//! error: every failure is folded into the [`PipelineRun`] outcome and
//! reported to the operator.

use crate::config::WatchConfig;
use crate::cursor::CursorStore;
use crate::error::Step;
use crate::notify::Notifier;
use crate::paths;
use crate::pipeline::{self, CollaboratorRegistry, StepContext, StepObserver};
use crate::probe::{short, RevisionProber};
use crate::remote::RemoteSpec;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// PipelineRun
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    NoChange,
    Updated,
    FailedProbe,
    FailedPipeline,
}

/// What happened during one cycle. Lives only as long as the cycle.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub remote: RemoteSpec,
    pub previous: Option<String>,
    pub observed: Option<String>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<Step>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// False for `Updated` runs whose cursor write failed.
    pub cursor_written: bool,
}

impl PipelineRun {
    fn begin(remote: &RemoteSpec) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            remote: remote.clone(),
            previous: None,
            observed: None,
            outcome: Outcome::NoChange,
            failed_step: None,
            error: None,
            cursor_written: false,
        }
    }

    fn finish(mut self, outcome: Outcome, error: Option<String>) -> Self {
        self.outcome = outcome;
        self.error = error;
        self.finished_at = Utc::now();
        self
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    root: PathBuf,
    cursor: Arc<dyn CursorStore>,
    prober: Arc<dyn RevisionProber>,
    registry: CollaboratorRegistry,
    notifier: Arc<dyn Notifier>,
}

impl Orchestrator {
    pub fn new(
        root: impl Into<PathBuf>,
        cursor: Arc<dyn CursorStore>,
        prober: Arc<dyn RevisionProber>,
        registry: CollaboratorRegistry,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            root: root.into(),
            cursor,
            prober,
            registry,
            notifier,
        }
    }

    pub fn cursor(&self) -> &dyn CursorStore {
        self.cursor.as_ref()
    }

    /// Wait for operator messages still in flight.
    pub async fn flush_notifications(&self) {
        self.notifier.flush().await;
    }

    /// Run one full cycle against `remote` with the settings in `config`.
    pub async fn run_cycle(&self, remote: &RemoteSpec, config: &WatchConfig) -> PipelineRun {
        let mut run = PipelineRun::begin(remote);
        info!(run = %run.id, remote = %remote, "checking for updates");

        let previous = self.cursor.read();
        run.previous = previous.clone();

        let observed = match self.prober.probe(remote).await {
            Ok(rev) if !rev.trim().is_empty() => rev,
            Ok(_) => {
                let msg = "remote reported an empty revision".to_string();
                warn!(run = %run.id, "{msg}");
                self.notifier.notify(&format!("Update check failed: {msg}"));
                return run.finish(Outcome::FailedProbe, Some(msg));
            }
            Err(e) => {
                warn!(run = %run.id, "probe failed: {e}");
                self.notifier
                    .notify(&format!("Update check failed for {remote}: {e}"));
                return run.finish(Outcome::FailedProbe, Some(e.to_string()));
            }
        };
        run.observed = Some(observed.clone());

        if previous.as_deref() == Some(observed.as_str()) {
            info!(run = %run.id, revision = %short(&observed), "already up to date");
            return run.finish(Outcome::NoChange, None);
        }

        let old = previous.as_deref().map(short).unwrap_or("none");
        info!(
            run = %run.id,
            new = %short(&observed),
            old,
            "new revision detected"
        );
        self.notifier.notify(&format!(
            "New revision {} detected (previous: {old}), starting update",
            short(&observed)
        ));

        let collaborator = match self.registry.resolve(&config.pipeline.collaborator) {
            Ok(c) => c,
            Err(e) => {
                error!(run = %run.id, "{e}");
                self.notifier
                    .notify(&format!("Cannot update: {e}; cursor left unchanged"));
                return run.finish(Outcome::FailedPipeline, Some(e.to_string()));
            }
        };

        let ctx = StepContext {
            remote: remote.clone(),
            revision: observed.clone(),
            fresh: previous.is_none(),
            checkout_dir: paths::resolve(&self.root, &config.pipeline.checkout_dir),
            settings: config.pipeline.clone(),
        };
        let progress = OperatorProgress(self.notifier.as_ref());
        if let Err(e) = pipeline::run(collaborator.as_ref(), &ctx, &progress).await {
            error!(run = %run.id, revision = %short(&observed), "update failed: {e}");
            self.notifier.notify(&format!(
                "Update to {} failed: {e}; will retry next cycle",
                short(&observed)
            ));
            run.failed_step = e.step();
            return run.finish(Outcome::FailedPipeline, Some(e.to_string()));
        }

        match self.cursor.write(&observed) {
            Ok(()) => run.cursor_written = true,
            Err(e) => {
                error!(run = %run.id, "update succeeded but the cursor could not be saved: {e}");
                self.notifier.notify(&format!(
                    "Updated to {} but could not record it ({e}); the next cycle will repeat the update",
                    short(&observed)
                ));
            }
        }

        self.notifier.notify(&format!(
            "Update complete, now at {}",
            short(&observed)
        ));
        run.finish(Outcome::Updated, None)
    }
}

/// Tells the operator when each blocking step begins.
struct OperatorProgress<'a>(&'a dyn Notifier);

impl StepObserver for OperatorProgress<'_> {
    fn step_started(&self, step: Step, ctx: &StepContext) {
        match step {
            Step::Fetch => self.0.notify(&format!(
                "Fetching revision {}...",
                short(&ctx.revision)
            )),
            Step::Initialize => self.0.notify("Fetch finished, initializing content..."),
            Step::Publish => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
