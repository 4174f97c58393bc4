use std::io::{BufRead, Write};

use log::debug;

use crate::error::Result;
use crate::parser::{is_pragma_line, source_lines, LineCursor, LineMarker, LineStep};

/// Stamp a bare `# <n>` marker before every content line that belongs to
/// `main_file`, `n` being the line's original number as announced by the
/// preprocessor markers already in the stream.
///
/// Bare markers (ours, from an earlier run) reset the counter but leave the
/// main-file flag alone, so re-running the pass conveys the same numbers.
pub fn tag_lines<R, W>(input: R, out: &mut W, main_file: &str) -> Result<usize>
where
    R: BufRead,
    W: Write,
{
    let mut cursor = LineCursor::new(false);
    let mut stamped = 0usize;

    for line in source_lines(input) {
        let line = line?;
        let (next, step) = cursor.step(line.text(), Some(main_file));
        cursor = next;

        if let LineStep::Content {
            line_no,
            in_main_file: true,
        } = step
        {
            write!(out, "{}{}", LineMarker::bare(line_no), line.newline())?;
            stamped += 1;
        }
        write!(out, "{line}")?;
    }

    debug!("stamped {stamped} line(s) of {main_file}");
    Ok(stamped)
}

/// Stamp the physical line number before every `#pragma` line of a file
/// that never went through the preprocessor.
pub fn label_pragmas<R, W>(input: R, out: &mut W) -> Result<usize>
where
    R: BufRead,
    W: Write,
{
    let mut labelled = 0usize;
    for (idx, line) in source_lines(input).enumerate() {
        let line = line?;
        if is_pragma_line(line.text()) {
            write!(out, "{}{}", LineMarker::bare(idx as u32 + 1), line.newline())?;
            labelled += 1;
        }
        write!(out, "{line}")?;
    }
    Ok(labelled)
}
