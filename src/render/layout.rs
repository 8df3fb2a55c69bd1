//! Split-view pane geometry.

/// Columns between two side-by-side panes.
pub const DIVIDER_WIDTH: usize = 1;
/// Rows each pane reserves for its header.
pub const PANE_HEADER_ROWS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitOrientation {
    SideBySide,
    Stacked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaneRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl PaneRect {
    /// Rows left for transcript lines below the header.
    pub fn body_height(&self) -> usize {
        self.height.saturating_sub(PANE_HEADER_ROWS)
    }
}

/// Side-by-side when every pane gets at least `min_pane_width` columns plus dividers.
pub fn split_orientation(width: usize, pane_count: usize, min_pane_width: usize) -> SplitOrientation {
    if pane_count <= 1 {
        return SplitOrientation::SideBySide;
    }
    let needed = pane_count
        .saturating_mul(min_pane_width)
        .saturating_add((pane_count - 1) * DIVIDER_WIDTH);
    if width >= needed {
        SplitOrientation::SideBySide
    } else {
        SplitOrientation::Stacked
    }
}

/// Splits the terminal among `pane_count` panes in registry order.
///
/// Leftover columns or rows go to the leading panes, one each.
pub fn compute_pane_rects(
    width: usize,
    height: usize,
    pane_count: usize,
    min_pane_width: usize,
) -> (SplitOrientation, Vec<PaneRect>) {
    let orientation = split_orientation(width, pane_count, min_pane_width);
    if pane_count == 0 {
        return (orientation, Vec::new());
    }

    let rects = match orientation {
        SplitOrientation::SideBySide => {
            let usable = width.saturating_sub((pane_count - 1) * DIVIDER_WIDTH);
            let mut x = 0;
            distribute(usable, pane_count)
                .into_iter()
                .map(|pane_width| {
                    let rect = PaneRect {
                        x,
                        y: 0,
                        width: pane_width,
                        height,
                    };
                    x += pane_width + DIVIDER_WIDTH;
                    rect
                })
                .collect()
        }
        SplitOrientation::Stacked => {
            let mut y = 0;
            distribute(height, pane_count)
                .into_iter()
                .map(|pane_height| {
                    let rect = PaneRect {
                        x: 0,
                        y,
                        width,
                        height: pane_height,
                    };
                    y += pane_height;
                    rect
                })
                .collect()
        }
    };
    (orientation, rects)
}

fn distribute(total: usize, parts: usize) -> Vec<usize> {
    let base = total / parts;
    let leftover = total % parts;
    (0..parts)
        .map(|index| base + usize::from(index < leftover))
        .collect()
}
