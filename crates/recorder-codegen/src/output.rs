//! Output sinks.
//!
//! `write_ln` appends one line per `\n`-separated segment of its text and
//! `pop_line` removes exactly one line, so the generator can erase and reprint
//! blocks by count. Only `flush` reports failures.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::errors::CodegenError;

const ERASE_PREVIOUS_LINE: &str = "\x1b[1A\x1b[2K";

pub trait CodeOutput: Send {
    fn write_ln(&mut self, text: &str);
    fn pop_line(&mut self);
    fn flush(&mut self) -> Result<(), CodegenError>;
}

impl CodeOutput for Box<dyn CodeOutput> {
    fn write_ln(&mut self, text: &str) {
        (**self).write_ln(text)
    }

    fn pop_line(&mut self) {
        (**self).pop_line()
    }

    fn flush(&mut self) -> Result<(), CodegenError> {
        (**self).flush()
    }
}

/// Buffers lines and rewrites the whole file on flush.
#[derive(Debug)]
pub struct FileOutput {
    path: PathBuf,
    lines: Vec<String>,
}

impl FileOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CodeOutput for FileOutput {
    fn write_ln(&mut self, text: &str) {
        self.lines.extend(text.split('\n').map(str::to_string));
    }

    fn pop_line(&mut self) {
        self.lines.pop();
    }

    fn flush(&mut self) -> Result<(), CodegenError> {
        debug!(path = %self.path.display(), lines = self.lines.len(), "writing script");
        fs::write(&self.path, self.lines.join("\n")).map_err(|source| CodegenError::File {
            path: self.path.clone(),
            source,
        })
    }
}

/// Streams lines to a terminal-like writer, erasing in place with ANSI escapes.
pub struct TerminalOutput<W: Write + Send> {
    writer: W,
    pending_error: Option<io::Error>,
}

impl<W: Write + Send> TerminalOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pending_error: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(err) = result {
            self.pending_error.get_or_insert(err);
        }
    }
}

impl TerminalOutput<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> CodeOutput for TerminalOutput<W> {
    fn write_ln(&mut self, text: &str) {
        let result = writeln!(self.writer, "{}", text);
        self.record(result);
    }

    fn pop_line(&mut self) {
        let result = self.writer.write_all(ERASE_PREVIOUS_LINE.as_bytes());
        self.record(result);
    }

    fn flush(&mut self) -> Result<(), CodegenError> {
        if let Some(err) = self.pending_error.take() {
            return Err(CodegenError::Terminal(err));
        }
        self.writer.flush().map_err(CodegenError::Terminal)
    }
}

/// Shared line buffer; clones observe the same lines.
#[derive(Clone, Debug, Default)]
pub struct MemoryOutput {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn text(&self) -> String {
        self.lines.lock().join("\n")
    }
}

impl CodeOutput for MemoryOutput {
    fn write_ln(&mut self, text: &str) {
        self.lines
            .lock()
            .extend(text.split('\n').map(str::to_string));
    }

    fn pop_line(&mut self) {
        self.lines.lock().pop();
    }

    fn flush(&mut self) -> Result<(), CodegenError> {
        Ok(())
    }
}

/// Fans every call out to several sinks.
#[derive(Default)]
pub struct OutputMultiplexer {
    outputs: Vec<Box<dyn CodeOutput>>,
}

impl OutputMultiplexer {
    pub fn new(outputs: Vec<Box<dyn CodeOutput>>) -> Self {
        Self { outputs }
    }

    pub fn push(&mut self, output: Box<dyn CodeOutput>) {
        self.outputs.push(output);
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl CodeOutput for OutputMultiplexer {
    fn write_ln(&mut self, text: &str) {
        for output in &mut self.outputs {
            output.write_ln(text);
        }
    }

    fn pop_line(&mut self) {
        for output in &mut self.outputs {
            output.pop_line();
        }
    }

    /// Flushes every sink, reporting the first failure.
    fn flush(&mut self) -> Result<(), CodegenError> {
        let mut first_error = None;
        for output in &mut self.outputs {
            if let Err(err) = output.flush() {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_output_pops_single_lines() {
        let mut output = MemoryOutput::new();
        output.write_ln("a\nb");
        output.write_ln("\nc");
        assert_eq!(output.lines(), vec!["a", "b", "", "c"]);
        output.pop_line();
        output.pop_line();
        assert_eq!(output.text(), "a\nb");
    }

    #[test]
    fn terminal_output_erases_with_escape() {
        let mut output = TerminalOutput::new(Vec::new());
        output.write_ln("one");
        output.pop_line();
        output.write_ln("two");
        output.flush().unwrap();
        let bytes = output.into_inner();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            format!("one\n{}two\n", ERASE_PREVIOUS_LINE)
        );
    }

    #[test]
    fn file_output_rewrites_on_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.js");
        let mut output = FileOutput::new(&path);
        output.write_ln("first\nsecond");
        output.flush().unwrap();
        output.pop_line();
        output.write_ln("third");
        output.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nthird");
    }

    #[test]
    fn file_output_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut output = FileOutput::new(dir.path().join("missing").join("script.js"));
        output.write_ln("x");
        let err = output.flush().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("script.js"));
    }

    #[test]
    fn multiplexer_fans_out() {
        let left = MemoryOutput::new();
        let right = MemoryOutput::new();
        let mut mux = OutputMultiplexer::new(vec![Box::new(left.clone()), Box::new(right.clone())]);
        mux.write_ln("x\ny");
        mux.pop_line();
        mux.flush().unwrap();
        assert_eq!(left.lines(), vec!["x"]);
        assert_eq!(right.lines(), vec!["x"]);
    }
}
