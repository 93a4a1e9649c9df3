use rayon::prelude::*;
use std::io::Write;
use tracing::{debug, info};

use super::emitter;
use super::matcher::LineMatcher;
use super::ranges::{build_ranges, merge_ranges};
use crate::config::SearchConfig;
use crate::errors::SearchResult;
use crate::results::SearchOutput;

/// Runs one search pass over `lines`: match every line, widen the matched
/// indices into context ranges, merge them, and return the result.
///
/// Count mode skips range building; an empty match set short-circuits before
/// the merger, whose contract requires non-empty input.
pub fn search(lines: &[String], config: &SearchConfig) -> SearchOutput {
    info!("Starting search for pattern: {:?}", config.pattern);

    let matcher = LineMatcher::from_config(config);
    if matcher.is_rejected() {
        debug!("Pattern rejected; pass will select no lines");
    }

    let matches = collect_matches(lines, &matcher, config);
    debug!("Selected {} of {} lines", matches.len(), lines.len());

    let mut output = SearchOutput {
        match_count: matches.len(),
        lines_searched: lines.len(),
        ranges: Vec::new(),
    };

    if config.count_only || matches.is_empty() {
        return output;
    }

    let (before, after) = config.context_window();
    let raw = build_ranges(&matches, lines.len(), before, after);
    output.ranges = merge_ranges(&raw);

    info!(
        "Search complete. {} matching lines in {} output ranges",
        output.match_count,
        output.ranges.len()
    );

    output
}

/// Runs a search pass and emits its result to `out`. This is the full
/// pipeline the CLI drives: match, build, merge, emit.
pub fn run<W: Write>(lines: &[String], config: &SearchConfig, out: &mut W) -> SearchResult<()> {
    let output = search(lines, config);
    emitter::emit(out, lines, &output, config)?;
    Ok(())
}

/// Collects the indices of lines selected by the inclusion predicate
/// (`matches XOR invert`), in ascending order.
fn collect_matches(lines: &[String], matcher: &LineMatcher, config: &SearchConfig) -> Vec<usize> {
    if lines.is_empty() {
        return Vec::new();
    }

    // Match in parallel with adaptive chunk size
    let thread_count = config.thread_count.get();
    let chunk_size = (lines.len() / thread_count).clamp(16, 256);

    let mut matches: Vec<usize> = lines
        .par_chunks(chunk_size)
        .enumerate()
        .flat_map(|(chunk_index, chunk)| {
            let base = chunk_index * chunk_size;
            chunk
                .iter()
                .enumerate()
                .filter(|(_, line)| matcher.is_match(line) != config.invert_match)
                .map(|(offset, _)| base + offset)
                .collect::<Vec<_>>()
        })
        .collect();

    // The merger requires ascending indices; restore the ordering the
    // parallel collection does not promise.
    matches.sort_unstable();
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::LineRange;

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    fn base_config(pattern: &str) -> SearchConfig {
        SearchConfig {
            pattern: pattern.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_match_with_symmetric_context() {
        let lines = lines(&["a", "b", "c", "d", "e"]);
        let config = SearchConfig {
            context_before: 1,
            context_after: 1,
            ..base_config("c")
        };

        let output = search(&lines, &config);
        assert_eq!(output.match_count, 1);
        assert_eq!(output.ranges, vec![LineRange::new(1, 3)]);
    }

    #[test]
    fn test_fixed_string_count() {
        let lines = lines(&["foo", "bar", "foo"]);
        let config = SearchConfig {
            fixed_string: true,
            count_only: true,
            ..base_config("foo")
        };

        let output = search(&lines, &config);
        assert_eq!(output.match_count, 2);
        assert!(output.ranges.is_empty());
    }

    #[test]
    fn test_invert_match() {
        let lines = lines(&["x", "y", "x", "y"]);
        let config = SearchConfig {
            invert_match: true,
            ..base_config("x")
        };

        let output = search(&lines, &config);
        assert_eq!(output.match_count, 2);
        assert_eq!(
            output.ranges,
            vec![LineRange::new(1, 1), LineRange::new(3, 3)]
        );
    }

    #[test]
    fn test_match_count_equals_predicate_enumeration() {
        let lines = lines(&["ab", "cd", "abc", "d", "xabx"]);
        let config = base_config("ab");

        let matcher = LineMatcher::from_config(&config);
        let expected = lines
            .iter()
            .filter(|line| matcher.is_match(line) != config.invert_match)
            .count();

        let output = search(&lines, &config);
        assert_eq!(output.match_count, expected);
        assert_eq!(output.match_count, 3);
    }

    #[test]
    fn test_no_matches_yields_empty_output() {
        let lines = lines(&["a", "b"]);
        let output = search(&lines, &base_config("zzz"));
        assert_eq!(output.match_count, 0);
        assert!(output.ranges.is_empty());
    }

    #[test]
    fn test_empty_line_sequence() {
        let output = search(&[], &base_config("x"));
        assert_eq!(output.match_count, 0);
        assert_eq!(output.lines_searched, 0);
        assert!(output.ranges.is_empty());
    }

    #[test]
    fn test_malformed_pattern_is_fail_open() {
        let lines = lines(&["(unclosed", "anything"]);
        let output = search(&lines, &base_config("(unclosed"));
        assert_eq!(output.match_count, 0);
        assert!(output.ranges.is_empty());
    }

    #[test]
    fn test_combined_context_overrides_both_sides() {
        let lines = lines(&["a", "b", "c", "d", "e", "f", "g"]);
        let config = SearchConfig {
            context_before: 0,
            context_after: 0,
            context: Some(2),
            ..base_config("d")
        };

        let output = search(&lines, &config);
        assert_eq!(output.ranges, vec![LineRange::new(1, 5)]);
    }

    #[test]
    fn test_adjacent_context_ranges_merge() {
        // Matches at 1 and 4 with one line of context on both sides widen to
        // [0,2] and [3,5], which touch and must merge
        let lines = lines(&["m", "a", "m?", "x", "a", "y"]);
        let config = SearchConfig {
            context_before: 1,
            context_after: 1,
            ..base_config("a")
        };

        let output = search(&lines, &config);
        assert_eq!(output.ranges, vec![LineRange::new(0, 5)]);
    }

    #[test]
    fn test_context_clamped_to_sequence_edges() {
        let lines = lines(&["hit", "b", "c", "b", "hit"]);
        let config = SearchConfig {
            context_before: 3,
            context_after: 3,
            ..base_config("hit")
        };

        let output = search(&lines, &config);
        assert_eq!(output.ranges, vec![LineRange::new(0, 4)]);
    }

    #[test]
    fn test_run_emits_through_the_full_pipeline() {
        let lines = lines(&["a", "b", "c", "d", "e"]);
        let config = SearchConfig {
            context_before: 1,
            context_after: 1,
            ..base_config("c")
        };

        let mut buf = Vec::new();
        run(&lines, &config, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "b\nc\nd\n");
    }

    #[test]
    fn test_many_lines_stay_ordered() {
        // Enough lines to spread across several parallel chunks
        let lines: Vec<String> = (0..5000)
            .map(|i| {
                if i % 7 == 0 {
                    format!("hit {}", i)
                } else {
                    format!("miss {}", i)
                }
            })
            .collect();
        let config = base_config("hit");

        let output = search(&lines, &config);
        assert_eq!(output.match_count, (5000 + 6) / 7);
        for pair in output.ranges.windows(2) {
            assert!(pair[0].end + 1 < pair[1].start);
        }
    }
}
