use crate::output::print_json;
use anyhow::Context;
use revwatch_core::config::WatchConfig;
use revwatch_core::probe::{GitProber, RevisionProber};
use revwatch_core::remote::RemoteSpec;
use revwatch_core::WatchError;
use std::path::Path;

pub fn run(root: &Path, url: Option<&str>, json: bool) -> anyhow::Result<()> {
    // An explicit URL works without an initialized project.
    let config = match WatchConfig::load(root) {
        Ok(cfg) => cfg,
        Err(WatchError::NotInitialized) if url.is_some() => WatchConfig::default(),
        Err(e) => return Err(anyhow::Error::new(e).context("failed to load config")),
    };
    let remote = match url {
        Some(u) => RemoteSpec::parse(u).context("invalid --url")?,
        None => config.remote().context("repo_url is not usable")?,
    };

    let prober = GitProber::new(config.probe_timeout());
    let rt = tokio::runtime::Runtime::new()?;
    let revision = rt
        .block_on(prober.probe(&remote))
        .with_context(|| format!("failed to query {remote}"))?;

    if json {
        let value = serde_json::json!({
            "remote": remote,
            "ref": remote.probe_ref(),
            "revision": revision,
        });
        print_json(&value)?;
    } else {
        println!("{revision}");
    }
    Ok(())
}
