//! Error types for selector synthesis

use thiserror::Error;

/// Synthesis error enumeration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SynthError {
    /// Selector could not be parsed by the query engine
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Query capability failed (frame gone, evaluation error)
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Target element or its frame is no longer attached
    #[error("Target detached: {0}")]
    Detached(String),
}

impl SynthError {
    pub fn invalid(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        SynthError::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    /// Stale targets are expected while the user keeps navigating.
    pub fn is_stale(&self) -> bool {
        matches!(self, SynthError::Detached(_))
    }

    /// Get error severity (0=low, 1=medium, 2=high)
    pub fn severity(&self) -> u8 {
        match self {
            SynthError::InvalidSelector { .. } => 2,
            SynthError::QueryFailed(_) => 1,
            SynthError::Detached(_) => 0,
        }
    }
}
