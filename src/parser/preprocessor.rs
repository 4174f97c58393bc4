use std::fmt;
use std::io::{self, BufRead};

/// One physical line together with its terminator (`\n`, `\r\n` or none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    raw: String,
    text_len: usize,
}

impl SourceLine {
    pub fn new(raw: String) -> Self {
        let text_len = match raw.strip_suffix('\n') {
            Some(text) => text.strip_suffix('\r').unwrap_or(text).len(),
            None => raw.len(),
        };
        Self { raw, text_len }
    }

    pub fn text(&self) -> &str {
        &self.raw[..self.text_len]
    }

    pub fn eol(&self) -> &str {
        &self.raw[self.text_len..]
    }

    /// Terminator for lines generated next to this one.
    pub fn newline(&self) -> &str {
        match self.eol() {
            "" => "\n",
            eol => eol,
        }
    }
}

/// Writes the line exactly as read.
impl fmt::Display for SourceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Iterator over the [`SourceLine`]s of a reader.
pub struct SourceLines<R> {
    reader: R,
}

impl<R: BufRead> Iterator for SourceLines<R> {
    type Item = io::Result<SourceLine>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut raw = String::new();
        match self.reader.read_line(&mut raw) {
            Ok(0) => None,
            Ok(_) => Some(Ok(SourceLine::new(raw))),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Like [`BufRead::lines`], but terminators survive so passthrough stays
/// byte for byte.
pub fn source_lines<R: BufRead>(reader: R) -> SourceLines<R> {
    SourceLines { reader }
}

/// Strip exactly one trailing backslash, if the line continues.
pub fn continuation_body(line: &str) -> Option<&str> {
    line.trim_end().strip_suffix('\\')
}

/// Accumulates one backslash-continued statement, segment by segment.
///
/// Segments are joined with a single space; the first segment keeps its
/// leading indentation, later ones are trimmed on both sides.
#[derive(Debug, Clone)]
pub struct StatementJoiner {
    acc: String,
    open: bool,
    segments: usize,
}

impl StatementJoiner {
    pub fn start(first: &str) -> Self {
        let (text, open) = match continuation_body(first) {
            Some(body) => (body, true),
            None => (first.trim_end(), false),
        };
        Self {
            acc: text.to_string(),
            open,
            segments: 1,
        }
    }

    /// True while the last pushed segment ended with a backslash.
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn segments(&self) -> usize {
        self.segments
    }

    pub fn push(&mut self, line: &str) {
        let (text, open) = match continuation_body(line) {
            Some(body) => (body.trim(), true),
            None => (line.trim(), false),
        };

        let keep = self.acc.trim_end().len();
        self.acc.truncate(keep);
        if !self.acc.is_empty() {
            self.acc.push(' ');
        }
        self.acc.push_str(text);

        self.open = open;
        self.segments += 1;
    }

    pub fn finish(self) -> String {
        let mut acc = self.acc;
        let keep = acc.trim_end().len();
        acc.truncate(keep);
        acc
    }
}
