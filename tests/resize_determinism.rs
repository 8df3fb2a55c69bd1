use agent_console::{
    visible_width, AgentEvent, ConsoleConfig, ConsoleState, EventRecord, SessionId,
    SplitOrientation, StyleTag,
};
use pretty_assertions::assert_eq;

const TRANSCRIPT: &[&str] = &[
    "Plain ASCII output that is long enough to wrap at narrow widths",
    "混合 CJK 文本 and ASCII words side by side",
    "⚠️ warning with a variation selector ⚠ and without",
    "emoji 😀 family 👨‍👩‍👧 and combining e\u{301}",
    "tabs\tare\texpanded",
];

fn populated(ids: &[&str]) -> ConsoleState {
    let mut state = ConsoleState::new(ConsoleConfig {
        min_pane_width: 30,
        ..ConsoleConfig::default()
    });
    for id in ids {
        state.add_session(SessionId::from(*id), *id).expect("add session");
        state
            .apply_event(
                &SessionId::from(*id),
                &EventRecord::new(AgentEvent::UserInput {
                    text: "summarize the log".to_string(),
                }),
            )
            .expect("user input");
        for text in TRANSCRIPT {
            state
                .apply_event(
                    &SessionId::from(*id),
                    &EventRecord::new(AgentEvent::StatusChange {
                        status: text.to_string(),
                    }),
                )
                .expect("status");
        }
    }
    state
}

#[test]
fn every_row_fits_its_pane_at_every_width() {
    let state = populated(&["a", "b"]);
    for width in 1..=120 {
        let frame = agent_console::render(&state, width, 30);
        for pane in &frame.panes {
            for row in pane.rows() {
                assert!(
                    visible_width(row) <= pane.rect.width,
                    "width {width}: {row:?} overflows {}",
                    pane.rect.width
                );
            }
        }
    }
}

#[test]
fn same_state_and_size_render_identically() {
    let mut state = populated(&["a", "b", "c"]);
    state.select("a-1");
    for (width, height) in [(20, 5), (93, 30), (200, 60)] {
        let first = agent_console::render(&state, width, height);
        let second = agent_console::render(&state, width, height);
        assert_eq!(first, second);
    }
}

#[test]
fn resizing_back_restores_the_original_frame() {
    let mut state = populated(&["a", "b"]);
    state.resize(100, 20);
    let before = state.render();

    state.resize(37, 9);
    let narrow = state.render();
    assert_eq!(narrow.orientation, SplitOrientation::Stacked);

    state.resize(100, 20);
    assert_eq!(state.render(), before);
}

#[test]
fn highlight_survives_reflow() {
    let mut state = populated(&["a"]);
    state.select("a-1");
    for width in [12, 40, 120] {
        let frame = agent_console::render(&state, width, 200);
        let pane = &frame.panes[0];
        let highlighted: Vec<_> = pane.highlighted_rows().collect();
        assert!(!highlighted.is_empty(), "width {width}");
        assert!(highlighted
            .iter()
            .all(|line| line.message_index() == Some(1)));
    }
}

#[test]
fn variation_selectors_do_not_change_width() {
    assert_eq!(visible_width("⚠"), visible_width("⚠\u{fe0f}"));
    let state = populated(&["a"]);
    let frame = agent_console::render(&state, 20, 40);
    let warning_rows: Vec<_> = frame.panes[0]
        .lines
        .iter()
        .filter(|line| line.text().contains('⚠'))
        .collect();
    assert!(!warning_rows.is_empty());
    assert!(warning_rows
        .iter()
        .all(|line| visible_width(line.text()) <= 20 && line.has_tag(StyleTag::Status)));
}
