//! Offline recording sessions
//!
//! Feeds a recorded event stream through [`RecorderController`] against a
//! browser port, usually [`DryRunBrowser`](crate::ports::DryRunBrowser), to
//! regenerate the script without a live browser.
//!
//! Ordering follows what a live session observes: page signals are handled
//! while the preceding performed action is still executing, every other
//! event waits until in-flight browser calls have returned.

use std::sync::Arc;

use recorder_codegen::{CodeGenerator, CodeOutput, FileOutput, OutputMultiplexer, TerminalOutput};
use tracing::{debug, info, instrument};

use crate::config::RecorderConfig;
use crate::controller::{Flow, RecorderController};
use crate::errors::RecorderError;
use crate::events::RecorderEvent;
use crate::ports::BrowserPort;

/// Sinks the configuration asks for: the script file and, when echoing,
/// the terminal.
pub fn build_output(config: &RecorderConfig) -> OutputMultiplexer {
    let mut output = OutputMultiplexer::default();
    if let Some(path) = &config.output {
        output.push(Box::new(FileOutput::new(path.clone())));
    }
    if config.echo {
        output.push(Box::new(TerminalOutput::stdout()));
    }
    output
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub events: usize,
    pub performed: usize,
    pub recorded: usize,
    pub signals: usize,
}

/// Replays `events` and returns the sink after the final flush.
///
/// A log without a trailing `context_closed` is closed implicitly, so the
/// script is always flushed.
#[instrument(skip_all, fields(target = config.target.name(), events = events.len()))]
pub async fn replay<O: CodeOutput>(
    config: &RecorderConfig,
    events: Vec<RecorderEvent>,
    browser: Arc<dyn BrowserPort>,
    output: O,
) -> Result<(O, ReplayStats), RecorderError> {
    let generator = CodeGenerator::new(config.script_header(), config.target.generator(), output);
    let (mut controller, _handle) =
        RecorderController::new(generator, browser, config.commit_timeout());
    controller.install_bindings().await;

    let mut stats = ReplayStats::default();
    let mut closed = false;
    for event in events {
        stats.events += 1;
        match &event {
            RecorderEvent::PerformAction { .. } => stats.performed += 1,
            RecorderEvent::RecordAction { .. } => stats.recorded += 1,
            other if other.is_signal() => stats.signals += 1,
            _ => {}
        }

        if !event.is_signal() && controller.settle().await? == Flow::Closed {
            closed = true;
            break;
        }
        debug!(event = event.name(), "replaying event");
        if controller.handle_event(event).await? == Flow::Closed {
            closed = true;
            break;
        }
    }

    if !closed {
        controller.settle().await?;
        controller.handle_event(RecorderEvent::ContextClosed).await?;
    }
    info!(
        performed = stats.performed,
        recorded = stats.recorded,
        signals = stats.signals,
        "replay finished"
    );
    Ok((controller.into_output(), stats))
}
