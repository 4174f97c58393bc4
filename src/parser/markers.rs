use std::fmt;

/// A preprocessor line directive: `# 12 "main.c" 1 3` or `#line 12`.
///
/// `line_no` is the logical number of the line that *follows* the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMarker {
    pub line_no: u32,
    pub file: Option<String>,
    /// Spelled `#line`, i.e. written by the user rather than stamped.
    pub line_directive: bool,
}

impl LineMarker {
    /// The two-token form stamped by `tag-lines` and `label-pragmas`.
    pub fn bare(line_no: u32) -> Self {
        Self {
            line_no,
            file: None,
            line_directive: false,
        }
    }

    /// `# <n>` exactly. Only these are provenance stamps; a `#line` directive
    /// is source text even without a file name.
    pub fn is_bare(&self) -> bool {
        self.file.is_none() && !self.line_directive
    }

    /// Parse a marker line. Anything else, including `# define`-style
    /// directives written with a space after the hash, yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let t = line.trim_start();
        let (rest, line_directive) = match t.strip_prefix("#line") {
            Some(rest) => (rest, true),
            None => (t.strip_prefix('#')?, false),
        };
        if !rest.starts_with([' ', '\t']) {
            return None;
        }
        let rest = rest.trim_start();

        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let line_no = rest[..digits].parse::<u32>().ok()?;

        let tail = &rest[digits..];
        if !tail.is_empty() && !tail.starts_with(char::is_whitespace) {
            return None;
        }
        let tail = tail.trim();

        let file = if tail.is_empty() {
            None
        } else {
            // Flags after the closing quote are ignored.
            let quoted = tail.strip_prefix('"')?;
            let close = quoted.find('"')?;
            Some(quoted[..close].to_string())
        };

        Some(Self {
            line_no,
            file,
            line_directive,
        })
    }
}

impl fmt::Display for LineMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let introducer = if self.line_directive { "#line" } else { "#" };
        match &self.file {
            Some(file) => write!(f, "{introducer} {} \"{}\"", self.line_no, file),
            None => write!(f, "{introducer} {}", self.line_no),
        }
    }
}

/// What one physical line turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineStep {
    Marker(LineMarker),
    Content { line_no: u32, in_main_file: bool },
}

/// Running provenance state of a pass.
///
/// A cursor is a plain value: [`LineCursor::step`] consumes it together with
/// one physical line and hands back the successor, so every pass threads it
/// explicitly instead of mutating shared counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCursor {
    next_line: u32,
    in_main_file: bool,
}

impl LineCursor {
    pub fn new(in_main_file: bool) -> Self {
        Self {
            next_line: 1,
            in_main_file,
        }
    }

    /// Without a main file every line counts as main-file content.
    pub fn for_main_file(main_file: Option<&str>) -> Self {
        Self::new(main_file.is_none())
    }

    pub fn step(self, line: &str, main_file: Option<&str>) -> (Self, LineStep) {
        if let Some(marker) = LineMarker::parse(line) {
            let in_main_file = match (&marker.file, main_file) {
                (Some(file), Some(main)) => file == main,
                (Some(_), None) => true,
                // Bare markers only carry a line number.
                (None, _) => self.in_main_file,
            };
            let next = Self {
                next_line: marker.line_no,
                in_main_file,
            };
            return (next, LineStep::Marker(marker));
        }

        let step = LineStep::Content {
            line_no: self.next_line,
            in_main_file: self.in_main_file,
        };
        let next = Self {
            next_line: self.next_line.saturating_add(1),
            ..self
        };
        (next, step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_preprocessor_markers() {
        let m = LineMarker::parse("# 12 \"main.c\" 1 3 4").unwrap();
        assert_eq!(m.line_no, 12);
        assert_eq!(m.file.as_deref(), Some("main.c"));

        let m = LineMarker::parse("#line 7").unwrap();
        assert_eq!(m.line_no, 7);
        assert!(!m.is_bare());
        assert!(LineMarker::parse("# 7").unwrap().is_bare());
        assert_eq!(LineMarker::parse("# 0 \"<built-in>\"").unwrap().line_no, 0);
    }

    #[test]
    fn rejects_other_directives() {
        assert_eq!(LineMarker::parse("# define N 10"), None);
        assert_eq!(LineMarker::parse("#pragma omp parallel"), None);
        assert_eq!(LineMarker::parse("#12"), None);
        assert_eq!(LineMarker::parse("# 12abc"), None);
        assert_eq!(LineMarker::parse("int x; # 3"), None);
    }

    #[test]
    fn display_matches_parse() {
        for text in ["# 41", "# 3 \"kernel.c\"", "#line 9"] {
            assert_eq!(LineMarker::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn cursor_tracks_markers_and_main_file() {
        let main = Some("a.c");
        let c = LineCursor::new(false);

        let (c, step) = c.step("# 1 \"stdio.h\"", main);
        assert!(matches!(step, LineStep::Marker(_)));
        let (c, step) = c.step("int printf();", main);
        assert_eq!(step, LineStep::Content { line_no: 1, in_main_file: false });

        let (c, _) = c.step("# 10 \"a.c\"", main);
        let (c, step) = c.step("int x;", main);
        assert_eq!(step, LineStep::Content { line_no: 10, in_main_file: true });

        let (c, _) = c.step("# 20", main);
        let (_, step) = c.step("int y;", main);
        assert_eq!(step, LineStep::Content { line_no: 20, in_main_file: true });
    }
}
