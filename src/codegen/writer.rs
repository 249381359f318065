//! Indent-aware string builder for indentation-significant target code.

/// Indent-aware string builder. Blocks are opened by a header line ending in
/// `:` and closed by dedenting; there are no closing tokens.
pub struct CodeWriter {
    buf: String,
    unit: String,
    indent_level: usize,
    lines: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::with_indent("    ")
    }

    pub fn with_indent(unit: &str) -> Self {
        Self {
            buf: String::with_capacity(4096),
            unit: unit.to_string(),
            indent_level: 0,
            lines: 0,
        }
    }

    /// Write a complete line (appends newline).
    pub fn line(&mut self, text: &str) {
        for _ in 0..self.indent_level {
            self.buf.push_str(&self.unit);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
        self.lines += 1;
    }

    /// Write an empty line.
    pub fn blank(&mut self) {
        self.buf.push('\n');
        self.lines += 1;
    }

    /// Write multi-line text at the current level. Relative indentation inside
    /// `text` is kept; empty lines stay empty.
    pub fn lines(&mut self, text: &str) {
        for l in text.lines() {
            if l.trim().is_empty() {
                self.blank();
            } else {
                self.line(l);
            }
        }
    }

    /// Append already-indented text verbatim.
    pub fn raw(&mut self, text: &str) {
        self.buf.push_str(text);
        self.lines += text.matches('\n').count();
    }

    /// Increase indent by one level.
    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    /// Decrease indent by one level.
    pub fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    /// Write `header` (e.g. `if x:`) and increase indent.
    pub fn block_open(&mut self, header: &str) {
        self.line(header);
        self.indent();
    }

    /// Decrease indent, write `else:` and re-indent.
    pub fn block_else(&mut self) {
        self.dedent();
        self.line("else:");
        self.indent();
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level
    }

    /// Number of lines written so far.
    pub fn line_count(&self) -> usize {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the writer and return the generated string.
    pub fn finish(self) -> String {
        self.buf
    }
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_line() {
        let mut w = CodeWriter::new();
        w.line("x = 1");
        assert_eq!(w.finish(), "x = 1\n");
    }

    #[test]
    fn indent_dedent() {
        let mut w = CodeWriter::new();
        w.line("def foo():");
        w.indent();
        w.line("return 1");
        w.dedent();
        w.line("foo()");
        assert_eq!(w.finish(), "def foo():\n    return 1\nfoo()\n");
    }

    #[test]
    fn block_else() {
        let mut w = CodeWriter::with_indent("  ");
        w.block_open("if x:");
        w.line("a()");
        w.block_else();
        w.line("b()");
        w.dedent();
        assert_eq!(w.finish(), "if x:\n  a()\nelse:\n  b()\n");
    }

    #[test]
    fn multi_line_keeps_relative_indent() {
        let mut w = CodeWriter::new();
        w.indent();
        w.lines("with open(p) as f:\n    data = f.read()\n\nprint(data)");
        assert_eq!(
            w.finish(),
            "    with open(p) as f:\n        data = f.read()\n\n    print(data)\n"
        );
    }

    #[test]
    fn counts_lines() {
        let mut w = CodeWriter::new();
        w.line("a");
        w.blank();
        w.raw("    b\n    c\n");
        assert_eq!(w.line_count(), 4);
    }

    #[test]
    fn dedent_saturates_at_zero() {
        let mut w = CodeWriter::new();
        w.dedent();
        w.line("x");
        assert_eq!(w.finish(), "x\n");
    }
}
