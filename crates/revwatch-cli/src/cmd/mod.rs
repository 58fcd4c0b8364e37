pub mod check;
pub mod config;
pub mod init;
pub mod probe;
pub mod run;
pub mod status;

use anyhow::Context;
use revwatch_core::config::WatchConfig;
use revwatch_core::cursor::FileCursorStore;
use revwatch_core::mirror::{run_publish_hooks, GitMirror, GIT_MIRROR_ID};
use revwatch_core::notify;
use revwatch_core::orchestrator::Orchestrator;
use revwatch_core::pipeline::CollaboratorRegistry;
use revwatch_core::probe::GitProber;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Load `.revwatch/config.yaml` with the usual CLI context.
pub fn load_config(root: &Path) -> anyhow::Result<WatchConfig> {
    WatchConfig::load(root).context("failed to load config")
}

/// The production wiring: file cursor, git prober, git mirror, and the
/// notifiers named in `config.notify`.
///
/// Also spawns the task that runs `pipeline.publish` for every revision the
/// mirror publishes. It finishes once the orchestrator is dropped. Must be
/// called inside a runtime.
pub fn orchestrator(root: &Path, config: &WatchConfig) -> (Orchestrator, JoinHandle<()>) {
    let mirror = Arc::new(GitMirror::new(root));
    let hooks = tokio::spawn(run_publish_hooks(root.to_path_buf(), mirror.subscribe()));
    let registry = CollaboratorRegistry::new().with(GIT_MIRROR_ID, mirror);
    let orchestrator = Orchestrator::new(
        root,
        Arc::new(FileCursorStore::for_root(root)),
        Arc::new(GitProber::new(config.probe_timeout())),
        registry,
        Arc::new(notify::from_config(&config.notify)),
    );
    (orchestrator, hooks)
}
