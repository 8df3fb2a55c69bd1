//! Abstract render model.
//!
//! A frame says what text goes in which pane and how each row should be styled.
//! Turning tags into colours or escape sequences is left to the host terminal layer.

use agent_events::SessionId;

use crate::session::pause::SessionStatus;

use super::layout::{PaneRect, SplitOrientation};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum StyleTag {
    User,
    Assistant,
    Thinking,
    Tool,
    Status,
    Error,
    Streaming,
    Separator,
    Highlight,
    Header,
    Focused,
}

/// One rendered row.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StyledLine {
    text: String,
    tags: Vec<StyleTag>,
    message_index: Option<usize>,
}

impl StyledLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tags: Vec::new(),
            message_index: None,
        }
    }

    /// Adds `tag` once; tags stay sorted.
    pub fn with_tag(mut self, tag: StyleTag) -> Self {
        if let Err(position) = self.tags.binary_search(&tag) {
            self.tags.insert(position, tag);
        }
        self
    }

    pub fn with_message_index(mut self, message_index: usize) -> Self {
        self.message_index = Some(message_index);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tags(&self) -> &[StyleTag] {
        &self.tags
    }

    pub fn has_tag(&self, tag: StyleTag) -> bool {
        self.tags.binary_search(&tag).is_ok()
    }

    /// Source message of a transcript row; `None` for headers.
    pub fn message_index(&self) -> Option<usize> {
        self.message_index
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl From<String> for StyledLine {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// The rendered viewport of one session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaneFrame {
    pub session_id: SessionId,
    pub rect: PaneRect,
    pub focused: bool,
    pub status: SessionStatus,
    pub header: StyledLine,
    /// Visible transcript rows, at most `rect.body_height()` of them.
    pub lines: Vec<StyledLine>,
    /// Row index of `lines[0]` within the full transcript.
    pub first_line: usize,
    pub total_lines: usize,
    pub following_tail: bool,
}

impl PaneFrame {
    /// Header then transcript rows as plain text.
    pub fn rows(&self) -> Vec<&str> {
        std::iter::once(self.header.text())
            .chain(self.lines.iter().map(StyledLine::text))
            .collect()
    }

    pub fn highlighted_rows(&self) -> impl Iterator<Item = &StyledLine> {
        self.lines
            .iter()
            .filter(|line| line.has_tag(StyleTag::Highlight))
    }
}

/// A complete console frame for one terminal size.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConsoleFrame {
    pub width: usize,
    pub height: usize,
    pub orientation: SplitOrientation,
    pub panes: Vec<PaneFrame>,
    pub selection: Option<String>,
}

impl ConsoleFrame {
    pub fn pane(&self, session_id: &SessionId) -> Option<&PaneFrame> {
        self.panes.iter().find(|pane| &pane.session_id == session_id)
    }

    pub fn focused_pane(&self) -> Option<&PaneFrame> {
        self.panes.iter().find(|pane| pane.focused)
    }
}
