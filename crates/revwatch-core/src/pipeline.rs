//! The update pipeline: fetch, initialize, publish.
//!
//! The work itself belongs to a downstream collaborator looked up by id in a
//! [`CollaboratorRegistry`]. Fetch and initialize may block on subprocesses
//! and disk; they run on a worker (blocking pool or a spawned task) while the
//! orchestration task only awaits them. Publish runs on the orchestration
//! task after both have completed, so anything it wakes sees initialized data.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Step};
use crate::remote::RemoteSpec;
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Collaborator interface
// ---------------------------------------------------------------------------

/// Everything a step needs to know about the change being processed.
#[derive(Debug, Clone)]
pub struct StepContext {
    pub remote: RemoteSpec,
    /// The newly observed revision.
    pub revision: String,
    /// True when there was no prior cursor.
    pub fresh: bool,
    /// `pipeline.checkout_dir`, resolved against the project root.
    pub checkout_dir: PathBuf,
    /// The `pipeline` config section as read at the start of this cycle.
    pub settings: PipelineConfig,
}

/// One unit of step work, in whichever calling convention the collaborator
/// implements it.
pub enum StepCall {
    /// Synchronous work; runs on the blocking thread pool.
    Blocking(Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>),
    /// Asynchronous work; runs as its own task.
    Async(BoxFuture<'static, anyhow::Result<()>>),
}

impl StepCall {
    pub fn blocking<F>(f: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        StepCall::Blocking(Box::new(f))
    }

    pub fn future<F>(fut: F) -> Self
    where
        F: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        StepCall::Async(Box::pin(fut))
    }
}

impl fmt::Debug for StepCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepCall::Blocking(_) => f.write_str("StepCall::Blocking"),
            StepCall::Async(_) => f.write_str("StepCall::Async"),
        }
    }
}

/// The capability a downstream content pipeline exposes.
pub trait Collaborator: Send + Sync {
    /// Retrieve the updated content into local storage.
    fn fetch(&self, ctx: &StepContext) -> StepCall;

    /// Parse and validate fetched content for downstream consumers.
    fn initialize(&self, ctx: &StepContext) -> StepCall;

    /// Tell interested consumers that fresh data is available. Must not block.
    fn publish(&self, ctx: &StepContext) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// CollaboratorRegistry
// ---------------------------------------------------------------------------

/// Collaborators by stable id. Resolved once per cycle.
#[derive(Clone, Default)]
pub struct CollaboratorRegistry {
    entries: BTreeMap<String, Arc<dyn Collaborator>>,
}

impl CollaboratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the collaborator under `id`.
    pub fn register(&mut self, id: impl Into<String>, collaborator: Arc<dyn Collaborator>) {
        self.entries.insert(id.into(), collaborator);
    }

    pub fn with(mut self, id: impl Into<String>, collaborator: Arc<dyn Collaborator>) -> Self {
        self.register(id, collaborator);
        self
    }

    pub fn resolve(&self, id: &str) -> Result<Arc<dyn Collaborator>, PipelineError> {
        self.entries
            .get(id)
            .cloned()
            .ok_or_else(|| PipelineError::DownstreamUnavailable(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl fmt::Debug for CollaboratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollaboratorRegistry")
            .field("ids", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Progress hook so the orchestrator can tell the operator which step began.
pub trait StepObserver: Send + Sync {
    fn step_started(&self, step: Step, ctx: &StepContext);
}

impl StepObserver for () {
    fn step_started(&self, _step: Step, _ctx: &StepContext) {}
}

/// Run fetch -> initialize -> publish for one detected change.
///
/// Each step only starts if the previous one succeeded. The first failure
/// is returned as `StepFailed` naming the step.
pub async fn run(
    collaborator: &dyn Collaborator,
    ctx: &StepContext,
    observer: &dyn StepObserver,
) -> Result<(), PipelineError> {
    observer.step_started(Step::Fetch, ctx);
    offload(Step::Fetch, collaborator.fetch(ctx)).await?;

    observer.step_started(Step::Initialize, ctx);
    offload(Step::Initialize, collaborator.initialize(ctx)).await?;

    observer.step_started(Step::Publish, ctx);
    collaborator
        .publish(ctx)
        .map_err(|e| step_failed(Step::Publish, e))?;

    info!(revision = %crate::probe::short(&ctx.revision), "pipeline completed");
    Ok(())
}

/// Execute a step away from the calling task and wait for it.
async fn offload(step: Step, call: StepCall) -> Result<(), PipelineError> {
    debug!(%step, ?call, "offloading step");
    let joined = match call {
        StepCall::Blocking(f) => tokio::task::spawn_blocking(f).await,
        StepCall::Async(fut) => tokio::spawn(fut).await,
    };
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(step_failed(step, e)),
        Err(join) => Err(PipelineError::StepFailed {
            step,
            cause: if join.is_panic() {
                "worker panicked".to_string()
            } else {
                format!("worker cancelled: {join}")
            },
        }),
    }
}

fn step_failed(step: Step, e: anyhow::Error) -> PipelineError {
    PipelineError::StepFailed {
        step,
        cause: format!("{e:#}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
