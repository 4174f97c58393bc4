use std::io::{self, BufRead, Write};

use log::debug;

use crate::error::{Error, Result};
use crate::parser::{
    continuation_body, BodyRange, LineCursor, LineStep, PragmaSpan, PragmaStatement,
    StatementJoiner, PRAGMA,
};

pub const BODY_START: &str = "body_start";
pub const BODY_END: &str = "body_end";

#[derive(Debug, Clone)]
pub struct LocatorOptions {
    /// Namespaces reported after `#pragma`.
    pub namespaces: Vec<String>,
    /// Only spans from this file are reported when set.
    pub main_file: Option<String>,
}

impl LocatorOptions {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespaces: vec![namespace.to_string()],
            main_file: None,
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespaces.push(namespace.to_string());
        self
    }

    pub fn main_file(mut self, main_file: Option<String>) -> Self {
        self.main_file = main_file;
        self
    }
}

/// Lazy scan over a stream yielding one [`PragmaSpan`] per matching pragma
/// statement, in source order. Iteration stops for good after the input is
/// exhausted or an I/O error has been reported.
pub struct PragmaLocator<R> {
    lines: io::Lines<R>,
    cursor: LineCursor,
    file: Option<String>,
    options: LocatorOptions,
    done: bool,
}

impl<R: BufRead> PragmaLocator<R> {
    pub fn new(input: R, options: LocatorOptions) -> Self {
        Self {
            lines: input.lines(),
            cursor: LineCursor::for_main_file(options.main_file.as_deref()),
            file: None,
            options,
            done: false,
        }
    }

    /// Feed one physical line through the cursor. Returns the logical line
    /// number and main-file flag for content lines, `None` for markers.
    fn advance(&mut self, line: &str) -> Option<(u32, bool)> {
        let (cursor, step) = self.cursor.step(line, self.options.main_file.as_deref());
        self.cursor = cursor;
        match step {
            LineStep::Marker(marker) => {
                if marker.file.is_some() {
                    self.file = marker.file;
                }
                None
            }
            LineStep::Content {
                line_no,
                in_main_file,
            } => Some((line_no, in_main_file)),
        }
    }

    fn opens_statement(&self, line: &str) -> bool {
        let first = continuation_body(line).unwrap_or(line);
        let mut tokens = first.split_whitespace();
        tokens.next() == Some(PRAGMA)
            && tokens
                .next()
                .is_some_and(|ns| self.options.namespaces.iter().any(|n| n == ns))
    }

    fn next_line(&mut self) -> Option<Result<String>> {
        match self.lines.next()? {
            Ok(line) => Some(Ok(line)),
            Err(e) => {
                self.done = true;
                Some(Err(Error::from(e)))
            }
        }
    }
}

impl<R: BufRead> Iterator for PragmaLocator<R> {
    type Item = Result<PragmaSpan>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = match self.next_line() {
                Some(Ok(line)) => line,
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    self.done = true;
                    return None;
                }
            };
            let Some((start_line, in_main_file)) = self.advance(&line) else {
                continue;
            };

            if !self.opens_statement(&line) {
                continue;
            }
            let mut joiner = StatementJoiner::start(&line);

            let mut end_line = start_line;
            while joiner.is_open() {
                let segment = match self.next_line() {
                    Some(Ok(segment)) => segment,
                    Some(Err(e)) => return Some(Err(e)),
                    None => break,
                };
                // Markers interleaved mid-statement still move the cursor.
                if let Some((line_no, _)) = self.advance(&segment) {
                    end_line = line_no;
                    joiner.push(&segment);
                }
            }

            if !in_main_file {
                continue;
            }

            let text = joiner.finish();
            let Some(statement) = PragmaStatement::parse(&text) else {
                continue;
            };
            debug!("pragma at {start_line}-{end_line}: {statement}");

            return Some(Ok(PragmaSpan {
                start_line,
                end_line,
                file: self.file.clone(),
                namespace: statement.namespace,
                directive: statement.directive,
                raw_argument_tokens: statement.arguments,
            }));
        }
    }
}

/// Find the single `body_start` / `body_end` pair of the internal namespace.
pub fn find_body<I>(spans: I, internal_namespace: &str) -> Result<Option<BodyRange>>
where
    I: IntoIterator<Item = Result<PragmaSpan>>,
{
    let mut start: Option<u32> = None;
    let mut end: Option<u32> = None;

    for span in spans {
        let span = span?;
        if span.namespace != internal_namespace {
            continue;
        }
        let slot = match span.directive.as_str() {
            BODY_START => &mut start,
            BODY_END => &mut end,
            _ => continue,
        };
        if let Some(first) = *slot {
            return Err(Error::MalformedBoundary(format!(
                "`{}` appears at line {} and again at line {}",
                span.directive, first, span.start_line
            )));
        }
        *slot = Some(span.start_line);
    }

    match (start, end) {
        (Some(start), Some(end)) => Ok(Some(BodyRange { start, end })),
        (None, None) => Ok(None),
        (Some(line), None) => Err(Error::MalformedBoundary(format!(
            "`{BODY_START}` at line {line} has no matching `{BODY_END}`"
        ))),
        (None, Some(line)) => Err(Error::MalformedBoundary(format!(
            "`{BODY_END}` at line {line} has no matching `{BODY_START}`"
        ))),
    }
}

/// Write the pragma list, one `<start> <end> <pragma>` record per span, or a
/// JSON array when `json` is set.
pub fn write_spans<I, W>(spans: I, out: &mut W, json: bool) -> Result<usize>
where
    I: IntoIterator<Item = Result<PragmaSpan>>,
    W: Write,
{
    if json {
        let spans = spans.into_iter().collect::<Result<Vec<_>>>()?;
        serde_json::to_writer_pretty(&mut *out, &spans)?;
        writeln!(out)?;
        return Ok(spans.len());
    }

    let mut count = 0usize;
    for span in spans {
        writeln!(out, "{}", span?)?;
        count += 1;
    }
    Ok(count)
}
