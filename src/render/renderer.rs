//! Pure console renderer.
//!
//! `render` reads committed state only. Calling it twice with the same state and
//! size yields identical frames.

use agent_events::SessionId;

use crate::console::ConsoleState;
use crate::core::text::wrap::truncate_to_width;
use crate::session::correlation::HighlightSet;
use crate::session::{Session, SessionRegistry};
use crate::transcript::{ConversationLine, MessageKind};

use super::frame::{ConsoleFrame, PaneFrame, StyleTag, StyledLine};
use super::layout::{compute_pane_rects, PaneRect};

const FOCUS_MARKER: &str = "▸ ";
const UNFOCUSED_MARKER: &str = "  ";

/// Lays out every pane at `width x height`.
///
/// Scrolling and row selection on [`ConsoleState`] use its recorded terminal size;
/// hosts rendering at another size go through [`ConsoleState::render_at`].
pub fn render(state: &ConsoleState, width: usize, height: usize) -> ConsoleFrame {
    let registry = state.registry();
    let (orientation, rects) = compute_pane_rects(
        width,
        height,
        registry.len(),
        state.config().min_pane_width,
    );
    let highlight = state
        .selection()
        .map(|id| state.correlation().highlight_set(id))
        .unwrap_or_default();

    let panes = registry
        .iter()
        .zip(rects)
        .map(|(session, rect)| render_pane(session, rect, registry, &highlight))
        .collect();

    ConsoleFrame {
        width,
        height,
        orientation,
        panes,
        selection: state.selection().map(str::to_string),
    }
}

fn render_pane(
    session: &Session,
    rect: PaneRect,
    registry: &SessionRegistry,
    highlight: &HighlightSet,
) -> PaneFrame {
    let lines = session.lines(rect.width);
    let window = session.viewport().window(lines.len(), rect.body_height());
    let first_line = window.start;

    let visible = lines[window]
        .iter()
        .map(|line| style_line(session, line, highlight))
        .collect();

    PaneFrame {
        session_id: session.id().clone(),
        rect,
        focused: session.is_focused(),
        status: session.status(),
        header: header_line(session, rect, registry),
        lines: visible,
        first_line,
        total_lines: lines.len(),
        following_tail: session.viewport().is_following_tail(),
    }
}

fn style_line(session: &Session, line: &ConversationLine, highlight: &HighlightSet) -> StyledLine {
    let styled = StyledLine::new(line.content.as_str()).with_message_index(line.message_index);
    if line.is_separator {
        return styled.with_tag(StyleTag::Separator);
    }

    let mut styled = styled.with_tag(role_tag(line.role));
    if line.is_error {
        styled = styled.with_tag(StyleTag::Error);
    }
    if session
        .messages()
        .get(line.message_index)
        .is_some_and(|message| message.streaming)
    {
        styled = styled.with_tag(StyleTag::Streaming);
    }
    if highlight.contains(session.id(), line.message_index) {
        styled = styled.with_tag(StyleTag::Highlight);
    }
    styled
}

fn role_tag(kind: MessageKind) -> StyleTag {
    match kind {
        MessageKind::UserInput => StyleTag::User,
        MessageKind::AssistantText => StyleTag::Assistant,
        MessageKind::Thinking => StyleTag::Thinking,
        MessageKind::ToolCall => StyleTag::Tool,
        MessageKind::Status => StyleTag::Status,
    }
}

fn header_line(session: &Session, rect: PaneRect, registry: &SessionRegistry) -> StyledLine {
    let marker = if session.is_focused() {
        FOCUS_MARKER
    } else {
        UNFOCUSED_MARKER
    };
    let mut text = format!("{marker}{} [{}]", session.name(), session.status());

    let pause = session.pause();
    if pause.is_paused() || pause.is_terminated() {
        if let Some(reason) = &pause.info().reason {
            text.push(' ');
            text.push_str(reason.lines().next().unwrap_or_default());
        }
        if let Some(details) = &pause.info().details {
            text.push_str(" · ");
            text.push_str(details.lines().next().unwrap_or_default());
        }
    }

    let watch = registry.watch();
    if let Some(parent) = watch.parent(session.id()) {
        text.push_str(&format!(" · watching {}", display_name(registry, parent)));
    }
    match watch.watchers(session.id()).len() {
        0 => {}
        1 => text.push_str(" · 1 watcher"),
        n => text.push_str(&format!(" · {n} watchers")),
    }

    let height_allows_header = rect.height > 0;
    let text = if height_allows_header {
        truncate_to_width(&text, rect.width, "…")
    } else {
        String::new()
    };

    let header = StyledLine::new(text).with_tag(StyleTag::Header);
    if session.is_focused() {
        header.with_tag(StyleTag::Focused)
    } else {
        header
    }
}

fn display_name<'a>(registry: &'a SessionRegistry, id: &'a SessionId) -> &'a str {
    registry.get(id).map_or(id.as_str(), Session::name)
}
