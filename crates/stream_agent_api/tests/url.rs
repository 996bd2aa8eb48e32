use stream_agent_api::normalize_stream_url;
use stream_agent_api::url::DEFAULT_BASE_URL;

#[test]
fn url_normalization_keeps_existing_stream_endpoint() {
    assert_eq!(
        normalize_stream_url("https://agent.example.com/stream_agent/"),
        "https://agent.example.com/stream_agent"
    );
}

#[test]
fn url_normalization_appends_stream_path_to_generic_base() {
    assert_eq!(
        normalize_stream_url("https://agent.example.com/api/"),
        "https://agent.example.com/api/stream_agent"
    );
}

#[test]
fn url_normalization_defaults_blank_base() {
    assert_eq!(
        normalize_stream_url("  "),
        format!("{DEFAULT_BASE_URL}/stream_agent")
    );
}
