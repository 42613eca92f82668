//! Recorder configuration
//!
//! Loaded from YAML, then overridden by `SOUL_RECORDER_*` environment
//! variables, then by command-line flags.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use recorder_codegen::{ContextOptions, Language, LaunchOptions, ScriptHeader};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::RecorderError;

pub const DEFAULT_COMMIT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_LISTENER_REARM_MS: u64 = 100;

pub const ENV_TARGET: &str = "SOUL_RECORDER_TARGET";
pub const ENV_BROWSER: &str = "SOUL_RECORDER_BROWSER";
pub const ENV_DEVICE: &str = "SOUL_RECORDER_DEVICE";
pub const ENV_OUTPUT: &str = "SOUL_RECORDER_OUTPUT";
pub const ENV_COMMIT_TIMEOUT_MS: &str = "SOUL_RECORDER_COMMIT_TIMEOUT_MS";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Language of the generated script
    pub target: Language,
    pub browser: String,
    /// Emulated device descriptor name, e.g. `Pixel 2`
    pub device: Option<String>,
    pub launch: LaunchOptions,
    pub context: ContextOptions,
    /// How long a performed action stays open for late signals
    pub commit_timeout_ms: u64,
    pub listener_rearm_ms: u64,
    /// Script file, rewritten on every flush
    pub output: Option<PathBuf>,
    /// Mirror the script to the terminal while recording
    pub echo: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            target: Language::default(),
            browser: "chromium".to_string(),
            device: None,
            launch: LaunchOptions::default(),
            context: ContextOptions::default(),
            commit_timeout_ms: DEFAULT_COMMIT_TIMEOUT_MS,
            listener_rearm_ms: DEFAULT_LISTENER_REARM_MS,
            output: None,
            echo: true,
        }
    }
}

impl RecorderConfig {
    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }

    pub fn listener_rearm_interval(&self) -> Duration {
        Duration::from_millis(self.listener_rearm_ms)
    }

    pub fn script_header(&self) -> ScriptHeader {
        ScriptHeader {
            browser_name: self.browser.clone(),
            launch: self.launch.clone(),
            context: self.context.clone(),
            device: self.device.clone(),
        }
    }

    pub fn from_yaml(path: &Path, raw: &str) -> Result<Self, RecorderError> {
        serde_yaml::from_str(raw).map_err(|source| RecorderError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), RecorderError> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides from `lookup`; empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), RecorderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get(ENV_TARGET) {
            self.target = value.parse().map_err(|_| RecorderError::InvalidOverride {
                key: ENV_TARGET.to_string(),
                value,
            })?;
        }
        if let Some(value) = get(ENV_BROWSER) {
            self.browser = value;
        }
        if let Some(value) = get(ENV_DEVICE) {
            self.device = Some(value);
        }
        if let Some(value) = get(ENV_OUTPUT) {
            self.output = Some(PathBuf::from(value));
        }
        if let Some(value) = get(ENV_COMMIT_TIMEOUT_MS) {
            self.commit_timeout_ms =
                value
                    .trim()
                    .parse()
                    .map_err(|_| RecorderError::InvalidOverride {
                        key: ENV_COMMIT_TIMEOUT_MS.to_string(),
                        value,
                    })?;
        }
        Ok(())
    }
}

pub struct LoadedConfig {
    pub config: RecorderConfig,
    pub path: PathBuf,
    /// Whether `path` existed; defaults are used otherwise
    pub from_file: bool,
}

/// Priority: explicit path > ./config/recorder.yaml > ~/.config/soulbrowser/recorder.yaml
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let local = PathBuf::from("config/recorder.yaml");
    if local.exists() {
        return local;
    }
    match dirs::config_dir() {
        Some(mut path) => {
            path.push("soulbrowser");
            path.push("recorder.yaml");
            path
        }
        None => local,
    }
}

pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, RecorderError> {
    let path = resolve_config_path(explicit);
    let (mut config, from_file) = if path.exists() {
        let raw = fs::read_to_string(&path).map_err(|source| RecorderError::io(&path, source))?;
        let config = RecorderConfig::from_yaml(&path, &raw)?;
        info!("Loaded configuration from: {}", path.display());
        (config, true)
    } else {
        warn!("Config file not found, using defaults: {}", path.display());
        (RecorderConfig::default(), false)
    };
    config.apply_env_overrides()?;
    Ok(LoadedConfig {
        config,
        path,
        from_file,
    })
}
