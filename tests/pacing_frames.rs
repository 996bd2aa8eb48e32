mod support;

use std::time::Duration;

use agent_chat::{ChatSession, Conversation, SessionConfig};
use pretty_assertions::assert_eq;
use support::{join_lines, Ending, Script, ScriptedTransport};
use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
struct Frame {
    at: Duration,
    operations: usize,
    is_streaming: bool,
}

/// Record every published snapshot of the latest turn until the session is dropped.
fn observe(mut rx: watch::Receiver<Conversation>) -> tokio::task::JoinHandle<Vec<Frame>> {
    let started = Instant::now();
    tokio::spawn(async move {
        let mut frames = Vec::new();
        while rx.changed().await.is_ok() {
            let Some(response) = rx.borrow_and_update().last_response().cloned() else {
                continue;
            };
            frames.push(Frame {
                at: started.elapsed(),
                operations: response.operations.len(),
                is_streaming: response.is_streaming,
            });
        }
        frames
    })
}

fn three_tool_starts() -> String {
    join_lines(&[
        r#"{"type":"tool_start","tool_name":"tavily_search","content":{"query":"a"}}"#,
        r#"{"type":"tool_start","tool_name":"tavily_extract","content":{"urls":["b"]}}"#,
        r#"{"type":"tool_start","tool_name":"tavily_crawl","content":{"url":"c"}}"#,
    ])
}

#[tokio::test(start_paused = true)]
async fn burst_of_tool_events_is_applied_as_separate_frames() {
    let transport = ScriptedTransport::new([Script::body(vec![three_tool_starts().into_bytes()])]);
    let mut session = ChatSession::new(transport, SessionConfig::default());
    let observer = observe(session.subscribe());

    session.submit("question").await.expect("turn completes");
    drop(session);
    let frames = observer.await.expect("observer task");

    let mut operation_frames: Vec<(usize, Duration)> = frames
        .iter()
        .filter(|frame| frame.operations > 0)
        .map(|frame| (frame.operations, frame.at))
        .collect();
    operation_frames.dedup_by_key(|(operations, _)| *operations);
    assert_eq!(
        operation_frames,
        vec![
            (1, Duration::ZERO),
            (2, Duration::from_millis(50)),
            (3, Duration::from_millis(100)),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn streaming_flag_flips_once_on_eof() {
    let transport = ScriptedTransport::new([Script::body(vec![three_tool_starts().into_bytes()])]);
    let mut session = ChatSession::new(transport, SessionConfig::default());
    let observer = observe(session.subscribe());

    session.submit("question").await.expect("turn completes");
    drop(session);
    let frames = observer.await.expect("observer task");

    let closed = frames.iter().filter(|frame| !frame.is_streaming).count();
    assert_eq!(closed, 1);
    assert_eq!(frames.last().map(|frame| frame.is_streaming), Some(false));
}

#[tokio::test(start_paused = true)]
async fn streaming_flag_flips_once_on_transport_error() {
    let transport = ScriptedTransport::new([Script::Body {
        chunks: vec![three_tool_starts().into_bytes()],
        ending: Ending::Error("connection reset".to_string()),
    }]);
    let mut session = ChatSession::new(transport, SessionConfig::default());
    let observer = observe(session.subscribe());

    session.submit("question").await.expect_err("transport error");
    let snapshot = session.snapshot();
    drop(session);
    let frames = observer.await.expect("observer task");

    let closed: Vec<&Frame> = frames.iter().filter(|frame| !frame.is_streaming).collect();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].operations, 3);
    assert_eq!(
        snapshot
            .last_response()
            .and_then(|response| response.error.as_deref()),
        Some("Error fetching streaming data: response body read failed: connection reset")
    );
}
