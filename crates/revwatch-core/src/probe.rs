//! Remote head lookup via `git ls-remote`.
//!
//! No working copy is touched: git asks the remote for its advertised refs
//! and we pick the one we track. The query is always bounded by a timeout;
//! the child is killed if the wait is abandoned.

use crate::error::ProbeError;
use crate::remote::RemoteSpec;
use futures::future::{BoxFuture, FutureExt};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Asks a remote for the revision its tracked ref points at.
pub trait RevisionProber: Send + Sync {
    fn probe<'a>(&'a self, remote: &'a RemoteSpec) -> BoxFuture<'a, Result<String, ProbeError>>;
}

// ---------------------------------------------------------------------------
// GitProber
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GitProber {
    program: String,
    timeout: Duration,
}

impl GitProber {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "git".to_string(),
            timeout,
        }
    }

    /// Use a specific git executable (name on PATH or absolute path).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn ls_remote(&self, remote: &RemoteSpec) -> Result<String, ProbeError> {
        let git = which::which(&self.program).map_err(|_| ProbeError::ToolUnavailable)?;
        let reference = remote.probe_ref();
        debug!(url = %remote.url, reference = %reference, "querying remote head");

        let child = Command::new(git)
            .args(["ls-remote", &remote.url, &reference])
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|_| ProbeError::ToolUnavailable)?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(ProbeError::NetworkOrAuth(format!("git ls-remote: {e}"))),
            Err(_elapsed) => {
                return Err(ProbeError::NetworkOrAuth(format!(
                    "git ls-remote timed out after {}s",
                    self.timeout.as_secs_f32()
                )))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let hint = stderr
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("no diagnostic output");
            return Err(ProbeError::NetworkOrAuth(format!(
                "git ls-remote exited with {}: {hint}",
                output.status
            )));
        }

        parse_ls_remote(&String::from_utf8_lossy(&output.stdout), &reference)
    }
}

impl RevisionProber for GitProber {
    fn probe<'a>(&'a self, remote: &'a RemoteSpec) -> BoxFuture<'a, Result<String, ProbeError>> {
        self.ls_remote(remote).boxed()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Pick the revision for `reference` out of `git ls-remote` output.
pub fn parse_ls_remote(stdout: &str, reference: &str) -> Result<String, ProbeError> {
    if stdout.trim().is_empty() {
        return Err(ProbeError::NetworkOrAuth(format!(
            "remote returned no entry for {reference}"
        )));
    }

    for line in stdout.lines() {
        let mut parts = line.split_whitespace();
        let (Some(id), Some(name)) = (parts.next(), parts.next()) else {
            continue;
        };
        if name != reference {
            continue;
        }
        if is_revision_id(id) {
            return Ok(id.to_ascii_lowercase());
        }
        return Err(ProbeError::MalformedResponse(format!(
            "'{id}' is not a revision id"
        )));
    }

    let first = stdout.lines().next().unwrap_or("").chars().take(120);
    Err(ProbeError::MalformedResponse(format!(
        "no {reference} line in output starting '{}'",
        first.collect::<String>()
    )))
}

/// SHA-1 or SHA-256 object name in hex.
pub fn is_revision_id(s: &str) -> bool {
    matches!(s.len(), 40 | 64) && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// First seven characters, for log lines and operator messages.
pub fn short(revision: &str) -> &str {
    revision.get(..7).unwrap_or(revision)
}
