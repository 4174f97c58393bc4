use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

/// How the classification step resolved a pragma.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PragmaKind {
    /// Lowered to a close-then-reopen finish scope.
    Taskwait,
    /// Covered by a `critical_<line>_lock` declaration.
    Critical,
    /// Anything else becomes a generic marker call.
    Other(String),
}

impl PragmaKind {
    pub fn from_token(token: &str) -> Self {
        match token {
            "taskwait" => PragmaKind::Taskwait,
            "critical" => PragmaKind::Critical,
            other => PragmaKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PragmaKind::Taskwait => "taskwait",
            PragmaKind::Critical => "critical",
            PragmaKind::Other(token) => token,
        }
    }
}

impl fmt::Display for PragmaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `original_line_no -> kind`, one entry per handled pragma.
#[derive(Debug, Clone, Default)]
pub struct HandledPragmaTable {
    entries: FxHashMap<u32, PragmaKind>,
}

impl HandledPragmaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, line: u32, kind: PragmaKind) -> Result<()> {
        if self.entries.contains_key(&line) {
            return Err(Error::DuplicateLine { line });
        }
        self.entries.insert(line, kind);
        Ok(())
    }

    pub fn get(&self, line: u32) -> Option<&PragmaKind> {
        self.entries.get(&line)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse `<line_no> <kind>` records, one per line.
    pub fn parse<R: BufRead>(reader: R, source_name: &str) -> Result<Self> {
        let mut table = Self::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let [line_no, kind] = tokens.as_slice() else {
                return Err(Error::malformed(
                    source_name,
                    idx + 1,
                    format!("expected `<line> <kind>`, found {} token(s)", tokens.len()),
                ));
            };
            let line_no = line_no.parse::<u32>().map_err(|_| {
                Error::malformed(source_name, idx + 1, format!("`{line_no}` is not a line number"))
            })?;
            table.insert(line_no, PragmaKind::from_token(kind))?;
        }
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file), &path.display().to_string())
    }

    /// Serialize in ascending line order.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut lines: Vec<_> = self.entries.iter().collect();
        lines.sort_by_key(|(line, _)| **line);
        for (line, kind) in lines {
            writeln!(out, "{line} {kind}")?;
        }
        Ok(())
    }
}
