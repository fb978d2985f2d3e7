//! Whitespace and entity normalization

use crate::extract::{ExtractedText, Fragment};

/// Join extracted fragments and normalize the result
pub fn normalize(extracted: &ExtractedText) -> String {
    normalize_text(&join_fragments(extracted))
}

/// Join fragments into one string, turning boundaries into newlines
///
/// A block boundary only starts a new line when the output is not already at
/// the start of one, so nested and adjacent blocks yield a single break.
/// Separators likewise add at most one space.
/// Newlines inside non-preformatted text are plain HTML whitespace.
pub fn join_fragments(extracted: &ExtractedText) -> String {
    let mut out = String::new();
    for fragment in extracted.fragments() {
        match fragment {
            Fragment::Text {
                text,
                preformatted: true,
            } => out.push_str(text),
            Fragment::Text {
                text,
                preformatted: false,
            } => out.extend(text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c })),
            Fragment::BlockBoundary => {
                if !at_line_start(&out) {
                    out.push('\n');
                }
            }
            Fragment::LineBreak => out.push('\n'),
            Fragment::Separator => {
                if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                    out.push(' ');
                }
            }
        }
    }
    out
}

/// Decode entities and collapse whitespace
///
/// - HTML entities become their literal characters, escaped ones included
/// - runs of horizontal whitespace become one space
/// - every line is trimmed
/// - one or two blank lines are kept, three or more become one
/// - leading and trailing blank lines are dropped
///
/// Idempotent on its own output.
pub fn normalize_text(text: &str) -> String {
    let decoded = decode_entities(text);
    let unified = decoded.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(unified.len());
    let mut blank_run = 0usize;
    for line in unified.split('\n') {
        let line = collapse_spaces(line);
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            let blanks = if blank_run >= 3 { 1 } else { blank_run };
            out.extend(std::iter::repeat('\n').take(blanks + 1));
        }
        out.push_str(&line);
        blank_run = 0;
    }
    out
}

/// Decode until no entity is left
///
/// Each decoding pass that changes the text makes it shorter, so this ends.
fn decode_entities(text: &str) -> String {
    let mut current = html_escape::decode_html_entities(text).into_owned();
    loop {
        let next = html_escape::decode_html_entities(&current);
        if next == current {
            return current;
        }
        current = next.into_owned();
    }
}

fn collapse_spaces(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn at_line_start(s: &str) -> bool {
    let trimmed = s.trim_end_matches(|c: char| c != '\n' && c.is_whitespace());
    trimmed.is_empty() || trimmed.ends_with('\n')
}
