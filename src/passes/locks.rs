use std::io::{BufRead, Write};
use std::ops::Range;

use log::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::parser::source_lines;

/// Half-open interval of critical-section lines that each get a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRequest {
    pub start: u32,
    pub end: u32,
}

impl LockRequest {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Empty when `start >= end`.
    pub fn lines(&self) -> Range<u32> {
        self.start..self.end
    }
}

pub fn lock_name(line: u32) -> String {
    format!("critical_{line}_lock")
}

pub fn lock_declaration(config: &Config, line: u32) -> String {
    format!(
        "{} {} = {};",
        config.lock_type,
        lock_name(line),
        config.lock_initializer
    )
}

/// Re-emit the expected header, then one static recursive lock per line in
/// `request`, then the rest of the input.
pub fn insert_locks<R, W>(input: R, out: &mut W, request: LockRequest, config: &Config) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut lines = source_lines(input);
    let mut newline = String::from("\n");

    for (idx, expected) in config.expected_header.iter().enumerate() {
        let found = match lines.next() {
            Some(line) => line?,
            None => {
                return Err(Error::HeaderMismatch {
                    line: idx + 1,
                    expected: expected.clone(),
                    found: "<end of input>".to_string(),
                })
            }
        };
        if found.text().trim() != expected.trim() {
            return Err(Error::HeaderMismatch {
                line: idx + 1,
                expected: expected.clone(),
                found: found.text().to_string(),
            });
        }
        newline = found.newline().to_string();
        write!(out, "{}{newline}", found.text())?;
    }

    for line in request.lines() {
        write!(out, "{}{newline}", lock_declaration(config, line))?;
    }
    info!("declared {} critical section lock(s)", request.lines().len());

    for line in lines {
        write!(out, "{}", line?)?;
    }
    Ok(())
}
