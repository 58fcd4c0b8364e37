use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("not initialized: run 'revwatch init'")]
    NotInitialized,

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WatchError>;

// ---------------------------------------------------------------------------
// ProbeError
// ---------------------------------------------------------------------------

/// Failure to learn the remote head revision.
///
/// Every variant ends the cycle as `failed-probe` with the cursor untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("git executable not found on PATH")]
    ToolUnavailable,

    #[error("remote query failed: {0}")]
    NetworkOrAuth(String),

    #[error("unparseable remote response: {0}")]
    MalformedResponse(String),
}

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// A step of the update pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Fetch,
    Initialize,
    Publish,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Fetch => "fetch",
            Step::Initialize => "initialize",
            Step::Publish => "publish",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("downstream collaborator '{0}' is not available")]
    DownstreamUnavailable(String),

    #[error("{step} step failed: {cause}")]
    StepFailed { step: Step, cause: String },
}

impl PipelineError {
    /// The step that failed, if the collaborator was reachable at all.
    pub fn step(&self) -> Option<Step> {
        match self {
            PipelineError::DownstreamUnavailable(_) => None,
            PipelineError::StepFailed { step, .. } => Some(*step),
        }
    }
}
