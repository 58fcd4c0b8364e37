use super::{load_config, orchestrator};
use revwatch_core::config::{FileConfigSource, WarnLevel};
use revwatch_core::probe::short;
use revwatch_core::scheduler::{Watcher, DEFAULT_STARTUP_DELAY, TICK_INTERVAL};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

pub const DEFAULT_STARTUP_DELAY_SECS: u64 = DEFAULT_STARTUP_DELAY.as_secs();

/// Grace period for operator messages still being delivered at shutdown.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

pub fn run(root: &Path, startup_delay: u64) -> anyhow::Result<()> {
    // Fail fast when there is nothing to watch yet; after this the config
    // is re-read every tick and problems are only logged.
    let config = load_config(root)?;
    for w in config.validate() {
        match w.level {
            WarnLevel::Error => warn!("config error: {}", w.message),
            WarnLevel::Warning => warn!("config warning: {}", w.message),
        }
    }

    let rt = tokio::runtime::Runtime::new()?;
    let root_buf = root.to_path_buf();

    rt.block_on(async move {
        let (orchestrator, hooks) = orchestrator(&root_buf, &config);
        let orchestrator = Arc::new(orchestrator);
        if let Some(rev) = orchestrator.cursor().read() {
            info!(revision = %short(&rev), "resuming from recorded revision");
        }

        let watcher = Watcher::new(
            orchestrator.clone(),
            Arc::new(FileConfigSource::new(root_buf.clone())),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("interrupt received, shutting down");
                    let _ = shutdown_tx.send(true);
                }
                Err(e) => {
                    warn!("cannot listen for Ctrl-C: {e}");
                    // Keep the sender alive so the watcher keeps running.
                    std::future::pending::<()>().await;
                    drop(shutdown_tx);
                }
            }
        });

        println!(
            "Watching {} every {} min (tick {}s). Ctrl-C to stop.",
            config.repo_url,
            config.check_interval().as_secs() / 60,
            TICK_INTERVAL.as_secs()
        );

        watcher
            .supervise(Duration::from_secs(startup_delay), shutdown_rx)
            .await;

        if tokio::time::timeout(FLUSH_TIMEOUT, orchestrator.flush_notifications())
            .await
            .is_err()
        {
            warn!("gave up waiting for pending notifications");
        }
        drop(orchestrator);
        if tokio::time::timeout(FLUSH_TIMEOUT, hooks).await.is_err() {
            warn!("gave up waiting for a running publish command");
        }
        Ok(())
    })
}
