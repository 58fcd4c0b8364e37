use crate::error::{Result, WatchError};
use crate::paths;
use crate::remote::RemoteSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Registry id of the downstream collaborator.
    #[serde(default = "default_collaborator")]
    pub collaborator: String,
    /// Where fetched content lands. Relative paths resolve against the root.
    #[serde(default = "default_checkout_dir")]
    pub checkout_dir: PathBuf,
    /// Command (argv) that parses/validates the fetched content.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub initialize: Vec<String>,
    /// Command (argv) run for every published revision, after initialize.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub publish: Vec<String>,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_collaborator() -> String {
    crate::mirror::GIT_MIRROR_ID.to_string()
}

fn default_checkout_dir() -> PathBuf {
    PathBuf::from(paths::CHECKOUT_DIR)
}

fn default_fetch_timeout() -> u64 {
    600
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            collaborator: default_collaborator(),
            checkout_dir: default_checkout_dir(),
            initialize: Vec::new(),
            publish: Vec::new(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

// ---------------------------------------------------------------------------
// NotifyConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "[revwatch]".to_string()
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            prefix: default_prefix(),
        }
    }
}

// ---------------------------------------------------------------------------
// WatchConfig (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_enabled")]
    pub plugin_enabled: bool,
    #[serde(default = "default_interval")]
    pub check_interval_minutes: u32,
    #[serde(default)]
    pub repo_url: String,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

fn default_enabled() -> bool {
    true
}

fn default_interval() -> u32 {
    30
}

fn default_probe_timeout() -> u64 {
    20
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            plugin_enabled: default_enabled(),
            check_interval_minutes: default_interval(),
            repo_url: String::new(),
            probe_timeout_secs: default_probe_timeout(),
            pipeline: PipelineConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl WatchConfig {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(WatchError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: WatchConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// The re-check interval, never shorter than one minute.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.check_interval_minutes.max(1)) * 60)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline.fetch_timeout_secs.max(1))
    }

    /// Normalized remote for `repo_url`, or `ConfigInvalid`.
    pub fn remote(&self) -> Result<RemoteSpec> {
        RemoteSpec::parse(&self.repo_url)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if let Err(e) = self.remote() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: match e {
                    WatchError::ConfigInvalid(msg) => msg,
                    other => other.to_string(),
                },
            });
        }

        if self.check_interval_minutes < 1 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "check_interval_minutes is 0; treated as 1".to_string(),
            });
        }

        if !self.plugin_enabled {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "plugin_enabled is false; no checks will run".to_string(),
            });
        }

        if self.pipeline.collaborator.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "pipeline.collaborator is empty".to_string(),
            });
        }

        for (key, argv) in [
            ("initialize", &self.pipeline.initialize),
            ("publish", &self.pipeline.publish),
        ] {
            if argv.first().is_some_and(|p| p.trim().is_empty()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("pipeline.{key} has an empty program name"),
                });
            }
        }

        if let Some(url) = &self.notify.webhook_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("notify.webhook_url '{url}' is not an HTTP(S) URL; ignored"),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// ConfigSource
// ---------------------------------------------------------------------------

/// Where the scheduler gets a fresh configuration on every tick.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<WatchConfig>;
}

/// Reads `.revwatch/config.yaml` from disk each time it is asked.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    root: PathBuf,
}

impl FileConfigSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> Result<WatchConfig> {
        WatchConfig::load(&self.root)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
