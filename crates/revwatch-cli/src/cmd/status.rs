use super::load_config;
use crate::output::{print_json, print_table};
use revwatch_core::cursor::{CursorStore, FileCursorStore};
use revwatch_core::paths;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(root)?;
    let cursor = FileCursorStore::for_root(root).read();
    let remote = config.remote().ok();
    let checkout_dir = paths::resolve(root, &config.pipeline.checkout_dir);

    if json {
        let value = serde_json::json!({
            "root": root,
            "plugin_enabled": config.plugin_enabled,
            "check_interval_minutes": config.check_interval().as_secs() / 60,
            "repo_url": config.repo_url,
            "remote": remote,
            "collaborator": config.pipeline.collaborator,
            "checkout_dir": checkout_dir,
            "cursor": cursor,
        });
        return print_json(&value);
    }

    let enabled = if config.plugin_enabled { "yes" } else { "no" };
    let remote_row = match &remote {
        Some(r) => r.to_string(),
        None => "(invalid repo_url)".to_string(),
    };
    let rows = vec![
        vec!["enabled".to_string(), enabled.to_string()],
        vec![
            "interval".to_string(),
            format!("{} min", config.check_interval().as_secs() / 60),
        ],
        vec!["remote".to_string(), remote_row],
        vec![
            "collaborator".to_string(),
            config.pipeline.collaborator.clone(),
        ],
        vec![
            "checkout".to_string(),
            checkout_dir.display().to_string(),
        ],
        vec![
            "cursor".to_string(),
            cursor.unwrap_or_else(|| "(no prior state)".to_string()),
        ],
    ];
    print_table(&["KEY", "VALUE"], rows);
    Ok(())
}
