//! Log mining for the TeX engine's unstructured log stream.
//!
//! The log format is a loosely-specified text stream from a
//! decades-old toolchain, so these functions scan for two independent
//! conventions rather than parsing a grammar:
//!
//! - fatal errors are lines that begin with `!`;
//! - the offending source line is cited as `l.<num>` at the start of
//!   a log line.
//!
//! Everything here is pure text analysis with no filesystem or
//! process dependencies, and every miss degrades gracefully (log
//! tail, or an omitted snippet) instead of failing the pipeline.

use std::sync::LazyLock;

use regex::Regex;

/// Characters of log tail returned when no fatal marker is found.
pub const LOG_TAIL_FALLBACK: usize = 8000;

/// Default window of context returned after a fatal marker.
pub const DEFAULT_CONTEXT_CHARS: usize = 5000;

/// Default number of source lines shown either side of the error line.
pub const DEFAULT_SNIPPET_RADIUS: usize = 5;

static LINE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\nl\.(\d+)\b").expect("line marker regex"));

/// Extract the first fatal-error region from a log.
///
/// Returns a window of at most `context_chars` characters starting at
/// the first line-initial `!`. When no such marker exists, returns
/// the last [`LOG_TAIL_FALLBACK`] characters instead; an empty log
/// yields an empty string, which callers must treat as "no structured
/// error available".
pub fn extract_fatal_error(log_text: &str, context_chars: usize) -> String {
    if log_text.is_empty() {
        return String::new();
    }

    let start = match log_text.find("\n!") {
        Some(idx) => idx + 1,
        None if log_text.starts_with('!') => 0,
        None => return tail(log_text, LOG_TAIL_FALLBACK).to_string(),
    };

    take(&log_text[start..], context_chars).to_string()
}

/// Find the first source line number cited in the log (`l.<num>`).
pub fn find_error_line(log_text: &str) -> Option<usize> {
    let captures = LINE_MARKER.captures(log_text)?;
    captures[1].parse().ok()
}

/// Build a numbered listing of source lines around the error line the
/// log cites.
///
/// Returns `None` when the log cites no line; callers render that as
/// an omitted section, not an error. Lines are 1-indexed, each
/// prefixed with a zero-padded line number, and the header names the
/// displayed range and the cited line.
pub fn extract_source_snippet(
    source_text: &str,
    log_text: &str,
    radius: usize,
) -> Option<String> {
    let line_no = find_error_line(log_text)?;
    let lines: Vec<&str> = source_text.lines().collect();

    let start = line_no.saturating_sub(radius).max(1);
    let end = (line_no + radius).min(lines.len());

    let mut out = vec![format!(
        "(showing lines {}-{}, error at line {})",
        start, end, line_no
    )];
    for i in start..=end {
        out.push(format!("{:04}: {}", i, lines[i - 1]));
    }

    Some(out.join("\n"))
}

/// Last `max_chars` characters of `text`, respecting char boundaries.
pub fn tail(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

/// First `max_chars` characters of `text`, respecting char boundaries.
fn take(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_error_starts_at_marker() {
        let log = "This is XeTeX\nsome output\n! Undefined control sequence.\nmore text";
        let excerpt = extract_fatal_error(log, 5000);

        assert!(excerpt.starts_with("! Undefined control sequence."));
        assert!(excerpt.chars().count() <= 5000);
    }

    #[test]
    fn test_fatal_error_window_is_bounded() {
        let log = format!("noise\n! Error here.{}", "x".repeat(10_000));
        let excerpt = extract_fatal_error(&log, 100);

        assert!(excerpt.starts_with("! Error here."));
        assert_eq!(excerpt.chars().count(), 100);
    }

    #[test]
    fn test_fatal_error_at_log_start() {
        let log = "! Emergency stop.\nrest of log";
        let excerpt = extract_fatal_error(log, 5000);
        assert!(excerpt.starts_with("! Emergency stop."));
    }

    #[test]
    fn test_no_marker_falls_back_to_tail() {
        let log = "a".repeat(20_000);
        let excerpt = extract_fatal_error(&log, 5000);
        assert_eq!(excerpt.len(), LOG_TAIL_FALLBACK);

        // Shorter than the fallback window: whole input.
        let short = "no markers anywhere";
        assert_eq!(extract_fatal_error(short, 5000), short);
    }

    #[test]
    fn test_bang_mid_line_is_not_fatal() {
        let log = "warning: overfull hbox! badness 10000\nall fine";
        let excerpt = extract_fatal_error(log, 5000);
        // Falls back to the tail, which here is the whole log.
        assert_eq!(excerpt, log);
    }

    #[test]
    fn test_empty_log_yields_empty_excerpt() {
        assert_eq!(extract_fatal_error("", 5000), "");
    }

    #[test]
    fn test_find_error_line() {
        let log = "! Undefined control sequence.\nl.20 \\badmacro\n";
        assert_eq!(find_error_line(log), Some(20));

        assert_eq!(find_error_line("no markers"), None);
        // `l.` must start a line.
        assert_eq!(find_error_line("normal.64 text"), None);
        // First match wins.
        let log = "x\nl.6 first\nl.99 later\n";
        assert_eq!(find_error_line(log), Some(6));
    }

    #[test]
    fn test_snippet_window_and_numbering() {
        let source = (1..=10)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let log = "! Error.\nl.6 some text\n";

        let snippet = extract_source_snippet(&source, log, 3).expect("snippet");
        let mut lines = snippet.lines();

        assert_eq!(
            lines.next().unwrap(),
            "(showing lines 3-9, error at line 6)"
        );
        assert_eq!(lines.next().unwrap(), "0003: line 3");
        assert_eq!(snippet.lines().last().unwrap(), "0009: line 9");
        assert_eq!(snippet.lines().count(), 8);
    }

    #[test]
    fn test_snippet_clamps_to_source_bounds() {
        let source = "only\ntwo";
        let log = "x\nl.1 oops\n";

        let snippet = extract_source_snippet(source, log, 5).expect("snippet");
        assert!(snippet.starts_with("(showing lines 1-2, error at line 1)"));
        assert!(snippet.contains("0001: only"));
        assert!(snippet.contains("0002: two"));
    }

    #[test]
    fn test_snippet_absent_without_marker() {
        let snippet = extract_source_snippet("some source", "log without markers", 5);
        assert!(snippet.is_none());
    }

    #[test]
    fn test_tail_bounds() {
        assert_eq!(tail("hello", 10), "hello");
        assert_eq!(tail("hello", 3), "llo");
        assert_eq!(tail("", 3), "");
        // Multi-byte input must not split a char.
        assert_eq!(tail("héllo", 4), "éllo");
    }
}
