//! Grapheme display widths.
//!
//! Widths come from a fixed table, never from the presentation a particular terminal
//! might pick. A grapheme cluster is as wide as its base character, so variation
//! selectors, joiners and combining marks never change the column count:
//! `"⚠"` and `"⚠\u{FE0F}"` both measure one column.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use super::ansi::escape_at;

pub const TAB_WIDTH: usize = 3;

const TEXT_PRESENTATION_SELECTOR: char = '\u{FE0E}';
const EMOJI_PRESENTATION_SELECTOR: char = '\u{FE0F}';
const ZERO_WIDTH_JOINER: char = '\u{200D}';

/// Column width of a single scalar value in isolation.
pub fn char_width(ch: char) -> usize {
    match ch {
        '\t' => TAB_WIDTH,
        TEXT_PRESENTATION_SELECTOR | EMOJI_PRESENTATION_SELECTOR | ZERO_WIDTH_JOINER => 0,
        ch if ch.is_control() => 0,
        ch => UnicodeWidthChar::width(ch).unwrap_or(0),
    }
}

pub fn grapheme_width(grapheme: &str) -> usize {
    grapheme.chars().next().map_or(0, char_width)
}

/// Display width of `input`, ignoring escape sequences.
pub fn visible_width(input: &str) -> usize {
    let mut width = 0;
    let mut text_start = 0;
    let mut idx = 0;
    while idx < input.len() {
        if let Some(seq) = escape_at(input, idx) {
            width += plain_width(&input[text_start..idx]);
            idx += seq.length;
            text_start = idx;
            continue;
        }
        idx += input[idx..].chars().next().map_or(1, char::len_utf8);
    }
    width + plain_width(&input[text_start..])
}

fn plain_width(text: &str) -> usize {
    text.graphemes(true).map(grapheme_width).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_and_wide_characters() {
        assert_eq!(visible_width("hello"), 5);
        assert_eq!(visible_width("日本"), 4);
        assert_eq!(visible_width("ｆｕｌｌ"), 8);
        assert_eq!(visible_width("😀"), 2);
    }

    #[test]
    fn variation_selectors_do_not_change_width() {
        assert_eq!(visible_width("⚠"), 1);
        assert_eq!(visible_width("⚠\u{FE0F}"), 1);
        assert_eq!(visible_width("⚠\u{FE0E}"), 1);
        assert_eq!(visible_width("✔\u{FE0F} done"), 6);
    }

    #[test]
    fn combining_marks_and_joiners_are_zero_width() {
        assert_eq!(visible_width("e\u{301}"), 1);
        assert_eq!(grapheme_width("\u{301}"), 0);
        assert_eq!(char_width(ZERO_WIDTH_JOINER), 0);
        // Family emoji: a single cluster measured by its first person.
        assert_eq!(visible_width("👨\u{200D}👩\u{200D}👧"), 2);
    }

    #[test]
    fn controls_and_tabs() {
        assert_eq!(visible_width("a\tb"), 2 + TAB_WIDTH);
        assert_eq!(visible_width("a\u{7}b"), 2);
        assert_eq!(char_width('\u{1b}'), 0);
    }

    #[test]
    fn escape_sequences_are_ignored() {
        assert_eq!(visible_width("hi\x1b[31m!!\x1b[0m"), 4);
        assert_eq!(
            visible_width("\x1b]8;;https://example.com\x07link\x1b]8;;\x07"),
            4
        );
    }
}
