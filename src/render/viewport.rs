//! Virtual scroll state for one pane.
//!
//! Stores only the requested top row and whether the pane follows the tail. The
//! visible window is recomputed from the current line count and height on every
//! query, so a resize never needs to touch this state.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    offset: usize,
    follow_tail: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: 0,
            follow_tail: true,
        }
    }
}

fn max_start(total_lines: usize, height: usize) -> usize {
    total_lines.saturating_sub(height)
}

impl Viewport {
    pub fn is_following_tail(&self) -> bool {
        self.follow_tail
    }

    /// First visible row, clamped to `[0, max(0, total - height)]`.
    pub fn first_visible(&self, total_lines: usize, height: usize) -> usize {
        let max_start = max_start(total_lines, height);
        if self.follow_tail {
            max_start
        } else {
            self.offset.min(max_start)
        }
    }

    /// Half-open range of visible rows.
    pub fn window(&self, total_lines: usize, height: usize) -> Range<usize> {
        let start = self.first_visible(total_lines, height);
        start..start.saturating_add(height).min(total_lines)
    }

    /// Scrolls by `delta` rows (negative is up). Following resumes once the last row is visible.
    pub fn scroll_by(&mut self, delta: isize, total_lines: usize, height: usize) {
        let start = self.first_visible(total_lines, height);
        let target = if delta.is_negative() {
            start.saturating_sub(delta.unsigned_abs())
        } else {
            start.saturating_add(delta.unsigned_abs())
        };
        self.scroll_to(target, total_lines, height);
    }

    pub fn scroll_to(&mut self, row: usize, total_lines: usize, height: usize) {
        let max_start = max_start(total_lines, height);
        self.offset = row.min(max_start);
        self.follow_tail = self.offset >= max_start;
    }

    pub fn scroll_to_top(&mut self, total_lines: usize, height: usize) {
        self.scroll_to(0, total_lines, height);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_tail = true;
    }

    pub fn page_up(&mut self, total_lines: usize, height: usize) {
        self.scroll_by(-page_rows(height), total_lines, height);
    }

    pub fn page_down(&mut self, total_lines: usize, height: usize) {
        self.scroll_by(page_rows(height), total_lines, height);
    }
}

fn page_rows(height: usize) -> isize {
    isize::try_from(height.max(1)).unwrap_or(isize::MAX)
}
