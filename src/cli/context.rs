use std::path::Path;

use crate::config::{LoadedConfig, RecorderConfig};

/// State shared by every subcommand
pub struct CliContext {
    loaded: LoadedConfig,
}

impl CliContext {
    pub fn new(loaded: LoadedConfig) -> Self {
        Self { loaded }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.loaded.config
    }

    pub fn config_path(&self) -> &Path {
        &self.loaded.path
    }

    pub fn config_from_file(&self) -> bool {
        self.loaded.from_file
    }
}
