//! Error handling for the recorder runtime

use std::io;
use std::path::PathBuf;

use recorder_codegen::CodegenError;
use selector_synth::SynthError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value '{value}' for {key}")]
    InvalidOverride { key: String, value: String },

    #[error("event log line {line}: {source}")]
    EventLog {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("event log line {line}: {reason}")]
    EventLogRead { line: usize, reason: String },

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Selector(#[from] SynthError),

    #[error("controller channel closed")]
    ChannelClosed,
}

impl RecorderError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Errors that end a recording session. Everything else is reported and
    /// the caller may continue with defaults.
    pub fn is_fatal(&self) -> bool {
        match self {
            RecorderError::Codegen(err) => err.is_fatal(),
            RecorderError::ChannelClosed => true,
            _ => false,
        }
    }

    /// Line of the event log the error points at
    pub fn line(&self) -> Option<usize> {
        match self {
            RecorderError::EventLog { line, .. } | RecorderError::EventLogRead { line, .. } => {
                Some(*line)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_failures_are_fatal() {
        let err = RecorderError::from(CodegenError::Terminal(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "closed",
        )));
        assert!(err.is_fatal());
        assert!(!RecorderError::InvalidOverride {
            key: "SOUL_RECORDER_TARGET".into(),
            value: "cobol".into(),
        }
        .is_fatal());
    }

    #[test]
    fn event_log_errors_carry_line() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = RecorderError::EventLog { line: 7, source };
        assert_eq!(err.line(), Some(7));
        assert!(err.to_string().starts_with("event log line 7:"));
    }
}
