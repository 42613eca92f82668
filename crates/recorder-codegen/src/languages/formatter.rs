/// Re-indents brace-delimited code.
///
/// Lines are trimmed on entry; a line ending in `{` or `[` opens a level and
/// a line starting with `}` or `]` closes one. With paren blocks enabled a
/// line ending in `(` opens a level that the next `);` line closes.
#[derive(Debug)]
pub(crate) struct BlockFormatter {
    offset: String,
    indent: String,
    paren_blocks: bool,
    lines: Vec<String>,
}

impl BlockFormatter {
    pub(crate) fn new(offset: usize, indent: usize) -> Self {
        Self {
            offset: " ".repeat(offset),
            indent: " ".repeat(indent),
            paren_blocks: false,
            lines: Vec::new(),
        }
    }

    pub(crate) fn with_paren_blocks(mut self) -> Self {
        self.paren_blocks = true;
        self
    }

    pub(crate) fn add(&mut self, text: &str) {
        self.lines
            .extend(text.trim().split('\n').map(|line| line.trim().to_string()));
    }

    pub(crate) fn new_line(&mut self) {
        self.lines.push(String::new());
    }

    pub(crate) fn format(&self) -> String {
        let mut depth = 0usize;
        let mut open_parens = 0usize;
        let mut out = Vec::with_capacity(self.lines.len());

        for line in &self.lines {
            if line.is_empty() {
                out.push(String::new());
                continue;
            }
            if line.starts_with('}') || line.starts_with(']') {
                depth = depth.saturating_sub(1);
            }
            out.push(format!("{}{}{}", self.offset, self.indent.repeat(depth), line));

            if line.ends_with('{') || line.ends_with('[') {
                depth += 1;
            } else if self.paren_blocks && line.ends_with('(') {
                depth += 1;
                open_parens += 1;
            } else if self.paren_blocks && open_parens > 0 && line.ends_with(");") {
                depth = depth.saturating_sub(1);
                open_parens -= 1;
            }
        }
        out.join("\n")
    }
}

/// Indentation-structured code; levels are explicit.
#[derive(Debug)]
pub(crate) struct PythonFormatter {
    offset: String,
    lines: Vec<(usize, String)>,
}

impl PythonFormatter {
    const INDENT: &'static str = "    ";

    pub(crate) fn new(offset: usize) -> Self {
        Self {
            offset: " ".repeat(offset),
            lines: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, level: usize, text: impl Into<String>) {
        self.lines.push((level, text.into()));
    }

    pub(crate) fn new_line(&mut self) {
        self.lines.push((0, String::new()));
    }

    pub(crate) fn format(&self) -> String {
        self.lines
            .iter()
            .map(|(level, line)| {
                if line.is_empty() {
                    String::new()
                } else {
                    format!("{}{}{}", self.offset, Self::INDENT.repeat(*level), line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
