//! Built-in collaborator: keep a shallow git checkout of the watched
//! repository and run a configured command to parse it.
//!
//! # Steps
//! - fetch (async):      `git clone --depth 1` into an empty checkout dir,
//!                       otherwise `git fetch --depth 1` + `git reset --hard FETCH_HEAD`
//! - initialize (sync):  sanity-check the checkout, then run `pipeline.initialize`
//!                       with `REVWATCH_REVISION`, `REVWATCH_CHECKOUT`, `REVWATCH_ROOT`
//! - publish:            broadcast [`PipelineEvent::Published`]; [`run_publish_hooks`]
//!                       turns each event into a `pipeline.publish` command

use crate::pipeline::{Collaborator, StepCall, StepContext};
use crate::probe::short;
use anyhow::{anyhow, bail, Context};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::broadcast;
use tracing::{info, warn};

pub const GIT_MIRROR_ID: &str = "git-mirror";

/// Bytes of subprocess output kept in error messages.
const OUTPUT_TAIL: usize = 500;

/// Emitted once fresh content has been fetched and initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    Published {
        revision: String,
        checkout_dir: PathBuf,
        /// `pipeline.publish` as configured for the cycle that published.
        command: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub struct GitMirror {
    root: PathBuf,
    events: broadcast::Sender<PipelineEvent>,
}

impl GitMirror {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            root: root.into(),
            events,
        }
    }

    /// Receive a [`PipelineEvent`] for every successful publish.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }
}

impl Collaborator for GitMirror {
    fn fetch(&self, ctx: &StepContext) -> StepCall {
        let ctx = ctx.clone();
        StepCall::future(async move {
            let git = which::which("git").map_err(|_| anyhow!("git executable not found on PATH"))?;
            let limit = Duration::from_secs(ctx.settings.fetch_timeout_secs.max(1));
            tokio::time::timeout(limit, sync_checkout(&git, &ctx))
                .await
                .map_err(|_| anyhow!("fetch timed out after {}s", limit.as_secs()))?
        })
    }

    fn initialize(&self, ctx: &StepContext) -> StepCall {
        let ctx = ctx.clone();
        let root = self.root.clone();
        StepCall::blocking(move || initialize_checkout(&root, &ctx))
    }

    fn publish(&self, ctx: &StepContext) -> anyhow::Result<()> {
        let event = PipelineEvent::Published {
            revision: ctx.revision.clone(),
            checkout_dir: ctx.checkout_dir.clone(),
            command: ctx.settings.publish.clone(),
        };
        let receivers = self.events.send(event).unwrap_or(0);
        info!(
            revision = %short(&ctx.revision),
            receivers,
            "published fresh content"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// fetch
// ---------------------------------------------------------------------------

async fn sync_checkout(git: &Path, ctx: &StepContext) -> anyhow::Result<()> {
    let dir = &ctx.checkout_dir;

    if !dir.join(".git").is_dir() {
        if is_non_empty_dir(dir).await? {
            bail!(
                "refusing to clone into non-empty directory {} (not a git checkout)",
                dir.display()
            );
        }
        if let Some(parent) = dir.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        info!(url = %ctx.remote.url, dir = %dir.display(), "cloning");
        let mut cmd = git_command(git, None);
        cmd.args(["clone", "--depth", "1"]);
        if let Some(branch) = &ctx.remote.branch {
            cmd.args(["--branch", branch.as_str()]);
        }
        cmd.arg(&ctx.remote.url).arg(dir);
        run_git(cmd, "clone").await?;
        return Ok(());
    }

    // repo_url may have changed since the checkout was cloned.
    let mut cmd = git_command(git, Some(dir));
    cmd.args(["remote", "set-url", "origin", ctx.remote.url.as_str()]);
    run_git(cmd, "remote set-url").await?;

    let reference = ctx.remote.branch.as_deref().unwrap_or("HEAD");
    info!(dir = %dir.display(), reference, "updating checkout");
    let mut cmd = git_command(git, Some(dir));
    cmd.args(["fetch", "--depth", "1", "origin", reference]);
    run_git(cmd, "fetch").await?;

    let mut cmd = git_command(git, Some(dir));
    cmd.args(["reset", "--hard", "FETCH_HEAD"]);
    run_git(cmd, "reset").await?;
    Ok(())
}

async fn is_non_empty_dir(dir: &Path) -> anyhow::Result<bool> {
    match tokio::fs::read_dir(dir).await {
        Ok(mut entries) => Ok(entries.next_entry().await?.is_some()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("cannot read {}", dir.display())),
    }
}

fn git_command(git: &Path, cwd: Option<&Path>) -> Command {
    let mut cmd = Command::new(git);
    if let Some(dir) = cwd {
        cmd.arg("-C").arg(dir);
    }
    cmd.env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

async fn run_git(mut cmd: Command, verb: &str) -> anyhow::Result<String> {
    let output = cmd.output().await.context("failed to spawn git")?;
    if !output.status.success() {
        bail!(
            "git {verb} exited with {}: {}",
            output.status,
            tail(&output.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// ---------------------------------------------------------------------------
// initialize
// ---------------------------------------------------------------------------

fn initialize_checkout(root: &Path, ctx: &StepContext) -> anyhow::Result<()> {
    let dir = &ctx.checkout_dir;
    let has_content = std::fs::read_dir(dir)
        .with_context(|| format!("cannot read checkout {}", dir.display()))?
        .filter_map(Result::ok)
        .any(|entry| entry.file_name() != ".git");
    if !has_content {
        bail!("checkout {} is empty", dir.display());
    }

    if dir.join(".git").is_dir() {
        let origin = git_query(dir, &["remote", "get-url", "origin"]);
        if origin.as_deref() != Some(ctx.remote.url.as_str()) {
            bail!(
                "checkout {} tracks {} instead of {}",
                dir.display(),
                origin.as_deref().unwrap_or("no origin"),
                ctx.remote.url
            );
        }
    }

    if let Some(head) = git_query(dir, &["rev-parse", "HEAD"]) {
        if head != ctx.revision {
            // The remote moved between probe and fetch; the next cycle catches up.
            warn!(
                head = %short(&head),
                probed = %short(&ctx.revision),
                "checkout HEAD differs from probed revision"
            );
        }
    }

    let Some((program, args)) = ctx.settings.initialize.split_first() else {
        return Ok(());
    };

    info!(program = %program, dir = %dir.display(), "running initialize command");
    let output = std::process::Command::new(program)
        .args(args)
        .current_dir(dir)
        .env("REVWATCH_REVISION", &ctx.revision)
        .env("REVWATCH_CHECKOUT", dir)
        .env("REVWATCH_ROOT", root)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to spawn '{program}'"))?;

    if !output.status.success() {
        let mut detail = tail(&output.stderr);
        if detail.is_empty() {
            detail = tail(&output.stdout);
        }
        bail!("'{program}' exited with {}: {detail}", output.status);
    }
    Ok(())
}

fn git_query(dir: &Path, args: &[&str]) -> Option<String> {
    let git = which::which("git").ok()?;
    let output = std::process::Command::new(git)
        .arg("-C")
        .arg(dir)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

// ---------------------------------------------------------------------------
// publish hook
// ---------------------------------------------------------------------------

/// Run the event's `pipeline.publish` command for every
/// [`PipelineEvent::Published`] until all senders are dropped.
///
/// Hook failures are logged; the cycle that published has already
/// succeeded by then.
pub async fn run_publish_hooks(root: PathBuf, mut events: broadcast::Receiver<PipelineEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Err(e) = publish_hook(&root, &event).await {
                    warn!("publish hook failed: {e:#}");
                }
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "publish hook fell behind; skipped events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn publish_hook(root: &Path, event: &PipelineEvent) -> anyhow::Result<()> {
    let PipelineEvent::Published {
        revision,
        checkout_dir,
        command,
    } = event;
    let Some((program, args)) = command.split_first() else {
        return Ok(());
    };

    info!(program = %program, revision = %short(revision), "running publish command");
    let output = Command::new(program)
        .args(args)
        .current_dir(checkout_dir)
        .env("REVWATCH_REVISION", revision)
        .env("REVWATCH_CHECKOUT", checkout_dir)
        .env("REVWATCH_ROOT", root)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("failed to spawn '{program}'"))?;

    if !output.status.success() {
        bail!("'{program}' exited with {}: {}", output.status, tail(&output.stderr));
    }
    Ok(())
}

fn tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    let skip = text.chars().count().saturating_sub(OUTPUT_TAIL);
    text.chars().skip(skip).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
