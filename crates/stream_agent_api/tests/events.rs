use serde_json::json;
use stream_agent_api::{EventKind, StreamEvent, ToolKind, ToolRef, ToolStart};

#[test]
fn tool_kind_parse_parity() {
    assert_eq!(ToolKind::parse("search"), Some(ToolKind::Search));
    assert_eq!(ToolKind::parse("extract"), Some(ToolKind::Extract));
    assert_eq!(ToolKind::parse("crawl"), Some(ToolKind::Crawl));
    assert_eq!(ToolKind::parse("map"), None);
}

#[test]
fn tool_kind_inference_prefers_specific_verbs() {
    assert_eq!(
        ToolKind::infer_from_name("tavily_search"),
        Some(ToolKind::Search)
    );
    assert_eq!(
        ToolKind::infer_from_name("tavily_extract"),
        Some(ToolKind::Extract)
    );
    assert_eq!(
        ToolKind::infer_from_name("Tavily_Crawl"),
        Some(ToolKind::Crawl)
    );
    assert_eq!(
        ToolKind::infer_from_name("search_and_extract"),
        Some(ToolKind::Extract)
    );
}

#[test]
fn tool_kind_serializes_as_wire_name() {
    for kind in ToolKind::ALL {
        assert_eq!(serde_json::to_value(kind).expect("serialize"), json!(kind.as_str()));
    }
}

#[test]
fn only_tool_events_are_routed_through_the_queue() {
    let start = StreamEvent::ToolStart(ToolStart {
        tool: ToolRef::resolve(Some("tavily_search".to_string()), None, None),
        parameters: json!({"query": "q"}),
    });
    let delta = StreamEvent::ChatbotDelta {
        text: "hi".to_string(),
    };
    let error = StreamEvent::AgentError {
        message: "boom".to_string(),
    };

    assert!(start.is_tool_event());
    assert_eq!(start.kind(), EventKind::ToolStart);
    assert_eq!(start.kind().as_str(), "tool_start");
    assert!(!delta.is_tool_event());
    assert_eq!(delta.kind().as_str(), "chatbot");
    assert!(!error.is_tool_event());
    assert!(error.tool().is_none());
}
