use std::fmt;

use serde::Serialize;

/// Token `#pragma` that opens every statement the passes care about.
pub const PRAGMA: &str = "#pragma";

/// A fully joined `#pragma <namespace> <directive> [args…]` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PragmaStatement {
    pub namespace: String,
    /// Empty for a bare `#pragma <namespace>`.
    pub directive: String,
    pub arguments: Vec<String>,
}

impl PragmaStatement {
    /// Whitespace tokenization only; quoting is not interpreted.
    pub fn parse(text: &str) -> Option<Self> {
        let mut tokens = text.split_whitespace();
        if tokens.next()? != PRAGMA {
            return None;
        }
        let namespace = tokens.next()?.to_string();
        let directive = tokens.next().unwrap_or_default().to_string();
        Some(Self {
            namespace,
            directive,
            arguments: tokens.map(str::to_string).collect(),
        })
    }

    /// Directive and arguments, space joined.
    pub fn rest(&self) -> String {
        let mut parts = Vec::with_capacity(self.arguments.len() + 1);
        if !self.directive.is_empty() {
            parts.push(self.directive.as_str());
        }
        parts.extend(self.arguments.iter().map(String::as_str));
        parts.join(" ")
    }
}

impl fmt::Display for PragmaStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", PRAGMA, self.namespace)?;
        let rest = self.rest();
        if !rest.is_empty() {
            write!(f, " {rest}")?;
        }
        Ok(())
    }
}

/// Whether `line` starts a pragma statement in any namespace.
pub fn is_pragma_line(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    tokens.next() == Some(PRAGMA) && tokens.next().is_some()
}

/// One located pragma statement and the logical lines it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PragmaSpan {
    pub start_line: u32,
    pub end_line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub namespace: String,
    pub directive: String,
    pub raw_argument_tokens: Vec<String>,
}

impl PragmaSpan {
    pub fn statement(&self) -> PragmaStatement {
        PragmaStatement {
            namespace: self.namespace.clone(),
            directive: self.directive.clone(),
            arguments: self.raw_argument_tokens.clone(),
        }
    }
}

/// Record format of the pragma list: `<start> <end> <joined pragma>`.
impl fmt::Display for PragmaSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.start_line, self.end_line, self.statement())
    }
}

/// The region delimited by `body_start` / `body_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BodyRange {
    pub start: u32,
    pub end: u32,
}

impl fmt::Display for BodyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BODY {} {}", self.start, self.end)
    }
}
