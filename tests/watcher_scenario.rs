use agent_console::{AgentEvent, ConsoleState, EventRecord, SessionId, StyleTag};
use pretty_assertions::assert_eq;

fn sid(value: &str) -> SessionId {
    SessionId::from(value)
}

fn apply(state: &mut ConsoleState, session: &str, record: EventRecord) {
    state.apply_event(&sid(session), &record).expect("apply record");
}

/// Session `a` streams one message with id `a1`; watcher `b` runs a tool call in
/// response to it.
fn watcher_console() -> ConsoleState {
    let mut state = ConsoleState::default();
    state.add_session(sid("a"), "author").expect("add a");
    state.add_session(sid("b"), "watcher").expect("add b");
    state.add_watcher(&sid("a"), &sid("b")).expect("watch");
    state.resize(100, 20);

    apply(
        &mut state,
        "a",
        EventRecord::new(AgentEvent::TextDelta {
            text: "Hello".to_string(),
        })
        .with_correlation_id("a1"),
    );
    apply(
        &mut state,
        "a",
        EventRecord::new(AgentEvent::TextDelta {
            text: " world".to_string(),
        }),
    );
    apply(&mut state, "a", EventRecord::new(AgentEvent::TurnComplete));

    apply(
        &mut state,
        "b",
        EventRecord::new(AgentEvent::ToolCallStart {
            tool_call_id: "t1".to_string(),
            tool_name: "grep".to_string(),
            input: "world".to_string(),
        })
        .observing(["a1"]),
    );
    apply(
        &mut state,
        "b",
        EventRecord::new(AgentEvent::ToolCallResult {
            tool_call_id: "t1".to_string(),
            content: "src/main.rs:1: Hello world".to_string(),
            is_error: false,
        })
        .observing(["a1"]),
    );
    state
}

fn highlighted_texts(state: &ConsoleState, session: &str) -> Vec<String> {
    let frame = state.render();
    frame
        .pane(&sid(session))
        .expect("pane")
        .highlighted_rows()
        .map(|line| line.text().to_string())
        .collect()
}

#[test]
fn deltas_accumulate_into_one_finalized_message() {
    let state = watcher_console();
    let a = state.session(&sid("a")).expect("a");
    assert_eq!(a.messages().len(), 1);
    assert_eq!(a.messages()[0].content, "Hello world");
    assert!(!a.messages()[0].streaming);
    assert_eq!(a.messages()[0].correlation_id.as_deref(), Some("a1"));
}

#[test]
fn selecting_the_author_line_highlights_both_panes() {
    let mut state = watcher_console();
    let selected = state.select_line(&sid("a"), 0).expect("select line");
    assert_eq!(selected.as_deref(), Some("a1"));

    assert_eq!(highlighted_texts(&state, "a"), vec!["Hello world"]);
    assert_eq!(
        highlighted_texts(&state, "b"),
        vec!["● grep(world)", "  src/main.rs:1: Hello world"]
    );
}

#[test]
fn selecting_the_watcher_line_highlights_only_the_watcher() {
    let mut state = watcher_console();
    let selected = state
        .select_line(&sid("b"), 0)
        .expect("select line")
        .expect("tool line has an id");
    assert_ne!(selected, "a1");

    assert!(highlighted_texts(&state, "a").is_empty());
    assert_eq!(highlighted_texts(&state, "b").len(), 2);
}

#[test]
fn clearing_the_selection_removes_every_highlight() {
    let mut state = watcher_console();
    state.select("a1");
    state.clear_selection();
    let frame = state.render();
    assert!(frame
        .panes
        .iter()
        .flat_map(|pane| pane.lines.iter())
        .all(|line| !line.has_tag(StyleTag::Highlight)));
}

#[test]
fn headers_describe_the_watch_relation() {
    let state = watcher_console();
    let frame = state.render();
    assert_eq!(
        frame.pane(&sid("a")).expect("a").header.text(),
        "▸ author [idle] · 1 watcher"
    );
    assert_eq!(
        frame.pane(&sid("b")).expect("b").header.text(),
        "  watcher [idle] · watching author"
    );
}

#[test]
fn removing_the_author_purges_its_correlation_entries() {
    let mut state = watcher_console();
    state.remove_session(&sid("a")).expect("remove a");
    state.select("a1");

    let highlight = state.correlation().highlight_set("a1");
    assert!(highlight.contains(&sid("b"), 0));
    assert!(!state.correlation().origins("a1").any(|r| r.session_id == sid("a")));
    assert_eq!(state.registry().watch().parent(&sid("b")), None);
}

#[test]
fn watcher_of_a_continuation_chunk_lights_up_with_the_author_message() {
    let mut state = ConsoleState::default();
    state.add_session(sid("a"), "author").expect("add a");
    state.add_session(sid("b"), "watcher").expect("add b");
    state.resize(100, 20);

    apply(
        &mut state,
        "a",
        EventRecord::new(AgentEvent::TextDelta {
            text: "Hello".to_string(),
        })
        .with_correlation_id("a1"),
    );
    apply(
        &mut state,
        "a",
        EventRecord::new(AgentEvent::TextDelta {
            text: " world".to_string(),
        })
        .with_correlation_id("a2"),
    );
    apply(
        &mut state,
        "b",
        EventRecord::new(AgentEvent::TextDelta {
            text: "reacting".to_string(),
        })
        .observing(["a2"]),
    );

    let a = state.session(&sid("a")).expect("a");
    assert_eq!(a.messages().len(), 1);
    assert_eq!(a.messages()[0].chunk_correlation_ids, vec!["a2".to_string()]);

    let selected = state.select_line(&sid("a"), 0).expect("select line");
    assert_eq!(selected.as_deref(), Some("a1"));
    assert_eq!(highlighted_texts(&state, "a"), vec!["Hello world"]);
    assert_eq!(highlighted_texts(&state, "b"), vec!["reacting"]);
}
