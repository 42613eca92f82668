//! Browser events observed by the recorder
//!
//! A live adapter produces these from engine callbacks; an event log stores
//! one JSON object per line, tagged by `event`.

use std::io::BufRead;

use recorder_codegen::{Action, FrameRef};
use serde::{Deserialize, Serialize};
use soulbrowser_core_types::PageId;

use crate::errors::RecorderError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RecorderEvent {
    PageOpened {
        page: PageId,
        #[serde(default)]
        url: String,
        /// Set for pages opened by another page
        #[serde(default)]
        opener: Option<PageId>,
    },
    PageClosed {
        page: PageId,
    },
    FrameNavigated {
        page: PageId,
        frame: FrameRef,
    },
    Popup {
        page: PageId,
        popup: PageId,
    },
    Download {
        page: PageId,
    },
    Dialog {
        page: PageId,
    },
    /// `performPlaywrightAction` binding call
    PerformAction {
        page: PageId,
        #[serde(default)]
        frame: FrameRef,
        action: Action,
    },
    /// `recordPlaywrightAction` binding call
    RecordAction {
        page: PageId,
        #[serde(default)]
        frame: FrameRef,
        action: Action,
    },
    /// `commitLastAction` binding call
    CommitLastAction,
    /// Every browser call in flight has returned. Only meaningful in logs.
    Idle,
    ContextClosed,
}

impl RecorderEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RecorderEvent::PageOpened { .. } => "page_opened",
            RecorderEvent::PageClosed { .. } => "page_closed",
            RecorderEvent::FrameNavigated { .. } => "frame_navigated",
            RecorderEvent::Popup { .. } => "popup",
            RecorderEvent::Download { .. } => "download",
            RecorderEvent::Dialog { .. } => "dialog",
            RecorderEvent::PerformAction { .. } => "perform_action",
            RecorderEvent::RecordAction { .. } => "record_action",
            RecorderEvent::CommitLastAction => "commit_last_action",
            RecorderEvent::Idle => "idle",
            RecorderEvent::ContextClosed => "context_closed",
        }
    }

    /// Page-level side effects that attach to whatever action is executing.
    pub fn is_signal(&self) -> bool {
        matches!(
            self,
            RecorderEvent::PageOpened { .. }
                | RecorderEvent::FrameNavigated { .. }
                | RecorderEvent::Popup { .. }
                | RecorderEvent::Download { .. }
                | RecorderEvent::Dialog { .. }
        )
    }
}

/// Reads a JSON-lines event log. Blank lines and `#` comments are skipped;
/// the first malformed line aborts with its 1-based line number.
pub fn read_event_log<R: BufRead>(reader: R) -> Result<Vec<RecorderEvent>, RecorderError> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|err| RecorderError::EventLogRead {
            line: line_no,
            reason: err.to_string(),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(trimmed).map_err(|source| RecorderError::EventLog {
            line: line_no,
            source,
        })?;
        events.push(event);
    }
    Ok(events)
}
