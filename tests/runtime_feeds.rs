use std::sync::Arc;
use std::thread;
use std::time::Duration;

use agent_console::{
    AgentEvent, ConsoleConfig, ConsoleError, ConsoleRuntime, EventRecord, NoopTransport,
    SessionId, SessionStatus, StyleTag,
};
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

fn runtime() -> Arc<ConsoleRuntime> {
    ConsoleRuntime::new(ConsoleConfig::default(), Arc::new(NoopTransport))
}

fn status(text: String) -> EventRecord {
    EventRecord::new(AgentEvent::StatusChange { status: text })
}

#[test]
fn concurrent_feeds_keep_per_session_order() {
    let runtime = runtime();
    let feeds: Vec<_> = (0..4)
        .map(|n| {
            runtime
                .start_session_with_id(SessionId::from(format!("s{n}")), format!("session {n}"))
                .expect("start session")
        })
        .collect();

    let producers: Vec<_> = feeds
        .into_iter()
        .map(|feed| {
            thread::spawn(move || {
                for step in 0..50 {
                    feed.push(status(format!("step {step}"))).expect("push");
                }
                feed.close();
            })
        })
        .collect();
    for producer in producers {
        producer.join().expect("producer thread");
    }

    runtime.with_state(|state| {
        for n in 0..4 {
            let session = state
                .session(&SessionId::from(format!("s{n}")))
                .expect("session");
            let contents: Vec<_> = session
                .messages()
                .iter()
                .map(|message| message.content.as_str())
                .collect();
            let expected: Vec<_> = (0..50).map(|step| format!("step {step}")).collect();
            assert_eq!(contents, expected);
        }
    });
}

#[test]
fn renders_during_ingest_only_see_whole_records() {
    let runtime = runtime();
    let feed = runtime
        .start_session_with_id(SessionId::from("main"), "main")
        .expect("start");

    let reader = {
        let runtime = Arc::clone(&runtime);
        thread::spawn(move || {
            for _ in 0..200 {
                let frame = runtime.render(60, 10);
                let pane = frame.pane(&SessionId::from("main")).expect("pane");
                for line in &pane.lines {
                    assert!(line.text().is_empty() || line.text().starts_with("chunk"));
                }
            }
        })
    };

    for step in 0..200 {
        feed.push(status(format!("chunk {step}"))).expect("push");
    }
    feed.close();
    reader.join().expect("reader thread");

    let frame = runtime.render(60, 10);
    let pane = frame.pane(&SessionId::from("main")).expect("pane");
    assert_eq!(pane.lines.last().expect("tail").text(), "chunk 199");
    assert!(pane.following_tail);
}

#[test]
fn applied_records_wake_the_render_loop() {
    let runtime = runtime();
    let feed = runtime.start_session("main").expect("start");
    assert!(runtime.scheduler().take_request());

    feed.push(status("hello".to_string())).expect("push");
    assert!(runtime.scheduler().wait(Duration::from_secs(5)));
    feed.close();
}

#[test]
fn closed_feed_reports_its_session() {
    let runtime = runtime();
    let feed = runtime
        .start_session_with_id(SessionId::from("main"), "main")
        .expect("start");
    let id = feed.session_id().clone();
    feed.close();

    assert_matches!(
        runtime.terminate_session(&id),
        Ok(())
    );
    assert_matches!(
        runtime.terminate_session(&id),
        Err(ConsoleError::UnknownSession(session)) if session == id
    );
}

#[test]
fn fatal_error_marks_only_its_own_pane() {
    let runtime = runtime();
    let failing = runtime
        .start_session_with_id(SessionId::from("failing"), "failing")
        .expect("start failing");
    let healthy = runtime
        .start_session_with_id(SessionId::from("healthy"), "healthy")
        .expect("start healthy");

    failing
        .push(EventRecord::new(AgentEvent::TextDelta {
            text: "partial".to_string(),
        }))
        .expect("push");
    failing
        .push(EventRecord::new(AgentEvent::SessionError {
            message: "agent crashed".to_string(),
            fatal: true,
        }))
        .expect("push");
    healthy
        .push(status("still fine".to_string()))
        .expect("push");
    failing.close();
    healthy.close();

    let frame = runtime.render(100, 12);
    let failing_pane = frame.pane(&SessionId::from("failing")).expect("failing");
    assert_eq!(failing_pane.status, SessionStatus::Terminated);
    assert!(failing_pane
        .lines
        .iter()
        .any(|line| line.has_tag(StyleTag::Error)));
    assert!(failing_pane
        .lines
        .iter()
        .all(|line| !line.has_tag(StyleTag::Streaming)));

    let healthy_pane = frame.pane(&SessionId::from("healthy")).expect("healthy");
    assert_eq!(healthy_pane.status, SessionStatus::Idle);
    assert!(healthy_pane.lines.iter().all(|line| !line.has_tag(StyleTag::Error)));
}
