use std::io::{self, BufRead, Write};

use log::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::parser::{
    is_pragma_line, source_lines, HandledPragmaTable, LineMarker, PragmaKind, PragmaStatement,
    SourceLine, StatementJoiner,
};

/// Quote `text` as a C string literal.
fn c_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

/// `pragma<line>_<namespace>_<directive>`
pub fn pragma_label(line: u32, statement: &PragmaStatement) -> String {
    if statement.directive.is_empty() {
        format!("pragma{}_{}", line, statement.namespace)
    } else {
        format!("pragma{}_{}_{}", line, statement.namespace, statement.directive)
    }
}

/// The generic call a pragma is lowered to when no dedicated form exists.
pub fn marker_call(config: &Config, statement: &PragmaStatement, label_line: Option<u32>) -> String {
    let mut args = vec![c_string(&statement.namespace), c_string(&statement.rest())];
    if let Some(line) = label_line {
        args.push(c_string(&pragma_label(line, statement)));
    }
    format!("{}({});", config.marker_function, args.join(", "))
}

/// Read the rest of a continued statement. Marker lines in between are
/// dropped. Returns the joined text and the terminator of its last segment.
fn join_statement<I>(
    first: &SourceLine,
    lines: &mut I,
    physical: &mut usize,
) -> Result<(String, String)>
where
    I: Iterator<Item = io::Result<SourceLine>>,
{
    let mut joiner = StatementJoiner::start(first.text());
    let mut eol = first.eol().to_string();
    while joiner.is_open() {
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        *physical += 1;
        if LineMarker::parse(line.text()).is_some() {
            continue;
        }
        joiner.push(line.text());
        eol = line.eol().to_string();
    }
    Ok((joiner.finish(), eol))
}

/// The marker call for `text`. `None`, with a warning, when `text` does not
/// parse as a statement, e.g. a lone `#pragma \` at the end of the input;
/// callers then copy `text` as is.
fn lowered_or_verbatim(config: &Config, text: &str, label_line: Option<u32>) -> Option<String> {
    match PragmaStatement::parse(text) {
        Some(statement) => Some(marker_call(config, &statement, label_line)),
        None => {
            warn!("`{text}` has no namespace; copied verbatim");
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct RewriteOptions<'a> {
    pub config: &'a Config,
    /// Append a per-line label literal to generic marker calls.
    pub labels: bool,
}

/// Lower the pragmas listed in `table` and strip bare line markers.
///
/// Every pragma line must directly follow a marker; the marker's number is
/// the key looked up in `table`. Pragmas that are not in the table are
/// copied verbatim.
pub fn rewrite<R, W>(
    input: R,
    out: &mut W,
    table: &HandledPragmaTable,
    options: &RewriteOptions<'_>,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut lines = source_lines(input);
    let mut physical = 0usize;
    let mut prev_marker: Option<u32> = None;
    let mut lowered = 0usize;

    while let Some(line) = lines.next() {
        let line = line?;
        physical += 1;

        if let Some(marker) = LineMarker::parse(line.text()) {
            if !marker.is_bare() {
                write!(out, "{line}")?;
            }
            prev_marker = Some(marker.line_no);
            continue;
        }

        if !is_pragma_line(line.text()) {
            write!(out, "{line}")?;
            prev_marker = None;
            continue;
        }

        let line_no = prev_marker
            .take()
            .ok_or(Error::MissingProvenance { physical })?;
        let Some(kind) = table.get(line_no) else {
            write!(out, "{line}")?;
            continue;
        };

        let (text, eol) = join_statement(&line, &mut lines, &mut physical)?;
        debug!("line {line_no}: lowering `{text}` as {kind}");
        lowered += 1;

        match kind {
            PragmaKind::Taskwait => write!(out, "{}{eol}", options.config.barrier)?,
            PragmaKind::Critical => {}
            PragmaKind::Other(_) => {
                let label = options.labels.then_some(line_no);
                let call = lowered_or_verbatim(options.config, &text, label);
                write!(out, "{}{eol}", call.as_deref().unwrap_or(text.as_str()))?;
            }
        }
    }

    info!("lowered {lowered} of {} handled pragma(s)", table.len());
    Ok(())
}

/// Replace every pragma statement with a marker call, labelled with its
/// physical line when `labels` is set.
pub fn mark_pragmas<R, W>(input: R, out: &mut W, config: &Config, labels: bool) -> Result<usize>
where
    R: BufRead,
    W: Write,
{
    let mut lines = source_lines(input);
    let mut physical = 0usize;
    let mut marked = 0usize;

    while let Some(line) = lines.next() {
        let line = line?;
        physical += 1;

        if !is_pragma_line(line.text()) {
            write!(out, "{line}")?;
            continue;
        }

        let start = physical as u32;
        let (text, eol) = join_statement(&line, &mut lines, &mut physical)?;
        match lowered_or_verbatim(config, &text, labels.then_some(start)) {
            Some(call) => {
                write!(out, "{call}{eol}")?;
                marked += 1;
            }
            None => write!(out, "{text}{eol}")?,
        }
    }
    Ok(marked)
}
