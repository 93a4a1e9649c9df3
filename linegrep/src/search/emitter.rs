//! Renders search results to an output stream. This is the sole observable
//! output channel of a search pass.

use std::io::{self, Write};

use crate::config::SearchConfig;
use crate::results::SearchOutput;

/// Writes the result of a search pass to `out`.
///
/// In count mode a single line with the number of selected lines is written
/// and the ranges are ignored. Otherwise every line covered by the merged
/// ranges is written in ascending index order, prefixed with its 1-based
/// line number when `line_numbers` is set. Disjointness of the merged ranges
/// guarantees no line is written twice.
pub fn emit<W: Write>(
    out: &mut W,
    lines: &[String],
    output: &SearchOutput,
    config: &SearchConfig,
) -> io::Result<()> {
    if config.count_only {
        return writeln!(out, "{}", output.match_count);
    }

    for range in &output.ranges {
        for index in range.start..=range.end {
            if config.line_numbers {
                writeln!(out, "{}:{}", index + 1, lines[index])?;
            } else {
                writeln!(out, "{}", lines[index])?;
            }
        }
    }

    Ok(())
}
