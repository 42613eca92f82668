use std::io;
use std::path::PathBuf;

use thiserror::Error;

use soulbrowser_core_types::SoulError;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("failed to write script to {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("terminal output failed: {0}")]
    Terminal(#[source] io::Error),
    #[error("unknown target language '{0}'")]
    UnknownLanguage(String),
}

impl CodegenError {
    /// Sink failures lose the generated script; nothing else does.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CodegenError::File { .. } | CodegenError::Terminal(_))
    }
}

impl From<CodegenError> for SoulError {
    fn from(err: CodegenError) -> Self {
        SoulError::new(err.to_string())
    }
}
