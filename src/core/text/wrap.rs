//! Width-aware word wrapping and truncation.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::strip_ansi;
use super::width::{grapheme_width, visible_width, TAB_WIDTH};

/// Stand-in for a grapheme wider than the whole target width.
const UNFITTABLE_GRAPHEME: &str = "?";

/// Prepares agent text for measuring: escape sequences removed, tabs expanded,
/// carriage returns and other control characters dropped. Newlines are kept.
pub fn sanitize(text: &str) -> String {
    let stripped = strip_ansi(text);
    let mut clean = String::with_capacity(stripped.len());
    for ch in stripped.chars() {
        match ch {
            '\n' => clean.push('\n'),
            '\t' => clean.extend(std::iter::repeat(' ').take(TAB_WIDTH)),
            ch if ch.is_control() => {}
            ch => clean.push(ch),
        }
    }
    clean
}

/// Wraps `text` into rows of at most `width` columns.
///
/// Breaks happen at spaces; a word longer than the width is split at grapheme
/// boundaries. Explicit newlines always start a new row. The result always has at
/// least one row, and width 0 yields a single empty row.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![String::new()];
    }

    let clean = sanitize(text);
    clean
        .split('\n')
        .flat_map(|line| wrap_single_line(line, width))
        .map(|line| line.trim_end().to_string())
        .collect()
}

fn wrap_single_line(line: &str, width: usize) -> Vec<String> {
    if visible_width(line) <= width {
        return vec![line.to_string()];
    }

    let mut wrapped = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for token in split_into_tokens(line) {
        let token_width = visible_width(token);
        let is_whitespace = token.starts_with(' ');
        let has_text = !current.trim_end().is_empty();

        if token_width > width && !is_whitespace {
            if has_text {
                wrapped.push(current.trim_end().to_string());
            }
            let mut pieces = break_long_word(token, width);
            current = pieces.pop().unwrap_or_default();
            current_width = visible_width(&current);
            wrapped.append(&mut pieces);
            continue;
        }

        if current_width + token_width > width && current_width > 0 {
            if has_text {
                wrapped.push(current.trim_end().to_string());
            }
            if is_whitespace {
                current = String::new();
                current_width = 0;
            } else {
                current = token.to_string();
                current_width = token_width;
            }
        } else {
            current.push_str(token);
            current_width += token_width;
        }
    }

    if !current.is_empty() || wrapped.is_empty() {
        wrapped.push(current);
    }
    wrapped
}

/// Splits a line into alternating runs of spaces and non-spaces.
fn split_into_tokens(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (idx, ch) in line.char_indices() {
        let is_space = ch == ' ';
        if in_space.is_some_and(|previous| previous != is_space) {
            tokens.push(&line[start..idx]);
            start = idx;
        }
        in_space = Some(is_space);
    }
    if start < line.len() {
        tokens.push(&line[start..]);
    }
    tokens
}

fn break_long_word(word: &str, width: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for grapheme in word.graphemes(true) {
        let (grapheme, grapheme_cols) = match grapheme_width(grapheme) {
            cols if cols > width => (UNFITTABLE_GRAPHEME, visible_width(UNFITTABLE_GRAPHEME)),
            cols => (grapheme, cols),
        };
        if current_width + grapheme_cols > width && current_width > 0 {
            pieces.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push_str(grapheme);
        current_width += grapheme_cols;
    }

    if !current.is_empty() || pieces.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Cuts `text` to a single row of at most `max_width` columns, ending in
/// `ellipsis` when anything was removed. Newlines become spaces.
pub fn truncate_to_width(text: &str, max_width: usize, ellipsis: &str) -> String {
    if max_width == 0 {
        return String::new();
    }
    let text = sanitize(text).replace('\n', " ");
    if visible_width(&text) <= max_width {
        return text;
    }

    let ellipsis_width = visible_width(ellipsis);
    if ellipsis_width >= max_width {
        return take_columns(ellipsis, max_width);
    }

    let mut truncated = take_columns(&text, max_width - ellipsis_width);
    truncated.push_str(ellipsis);
    truncated
}

fn take_columns(text: &str, columns: usize) -> String {
    let mut taken = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let cols = grapheme_width(grapheme);
        if used + cols > columns {
            break;
        }
        taken.push_str(grapheme);
        used += cols;
    }
    taken
}
