use std::io::{BufRead, Write};

use log::debug;

use crate::config::Config;
use crate::error::Result;
use crate::parser::{source_lines, StatementJoiner, PRAGMA};

/// Make the `untied` clause of every task pragma switchable at compile time.
///
/// Continued lines are joined first, whatever they hold; a joined line keeps
/// the trailing whitespace of its last physical segment.
pub fn make_untied_configurable<R, W>(input: R, out: &mut W, config: &Config) -> Result<usize>
where
    R: BufRead,
    W: Write,
{
    let mut lines = source_lines(input);
    let mut rewritten = 0usize;

    while let Some(line) = lines.next() {
        let line = line?;
        let mut joiner = StatementJoiner::start(line.text());
        let mut last = line.clone();
        while joiner.is_open() {
            let Some(next) = lines.next() else {
                break;
            };
            last = next?;
            joiner.push(last.text());
        }
        let joined = if joiner.segments() == 1 {
            line.to_string()
        } else {
            let trailing = &last.text()[last.text().trim_end().len()..];
            format!("{}{}{}", joiner.finish(), trailing, last.eol())
        };

        let tokens: Vec<&str> = joined.split_whitespace().collect();
        let is_task = tokens.len() >= 3
            && tokens[0] == PRAGMA
            && tokens[1] == config.namespace
            && tokens[2] == "task";
        if !is_task {
            write!(out, "{joined}")?;
            continue;
        }

        let tied = tokens
            .iter()
            .filter(|t| **t != "untied")
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        let nl = last.newline();
        write!(out, "#ifdef {}{nl}", config.untied_macro)?;
        write!(out, "{tied} untied{nl}")?;
        write!(out, "#else{nl}")?;
        write!(out, "{tied}{nl}")?;
        write!(out, "#endif{}", last.eol())?;
        rewritten += 1;
    }
    debug!("untied: {rewritten} task pragma(s) made configurable");
    Ok(rewritten)
}
