use anyhow::Context;
use revwatch_core::{config::WatchConfig, io, paths, remote::RemoteSpec};
use std::path::Path;

pub fn run(root: &Path, repo_url: Option<&str>) -> anyhow::Result<()> {
    if let Some(url) = repo_url {
        RemoteSpec::parse(url).context("invalid --repo-url")?;
    }

    println!("Initializing revwatch in: {}", root.display());

    let dir = paths::revwatch_dir(root);
    std::fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config_path = paths::config_path(root);
    if !config_path.exists() {
        let cfg = WatchConfig {
            repo_url: repo_url.unwrap_or_default().to_string(),
            ..WatchConfig::default()
        };
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    } else if let Some(url) = repo_url {
        let mut cfg = WatchConfig::load(root).context("failed to load config")?;
        cfg.repo_url = url.to_string();
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  updated: {} (repo_url)", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }

    // Local state never belongs in the project's history.
    for entry in [paths::CURSOR_FILE, paths::CHECKOUT_DIR] {
        io::ensure_gitignore_entry(root, entry)
            .with_context(|| format!("failed to add {entry} to .gitignore"))?;
    }

    if repo_url.is_none() && WatchConfig::load(root)?.repo_url.trim().is_empty() {
        println!("\nNext: set repo_url in {} or run `revwatch init --repo-url <URL>`", paths::CONFIG_FILE);
    } else {
        println!("\nNext: `revwatch check` to run one cycle, `revwatch run` to keep watching");
    }
    Ok(())
}
