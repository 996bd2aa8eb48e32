/// Default base URL for agent requests.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Path of the streaming agent endpoint.
pub const STREAM_AGENT_PATH: &str = "/stream_agent";

/// Normalize a base URL to the streaming agent endpoint.
///
/// Normalization rules:
/// 1) blank input falls back to [`DEFAULT_BASE_URL`]
/// 2) keep a trailing `/stream_agent` unchanged
/// 3) append `/stream_agent` otherwise
pub fn normalize_stream_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with(STREAM_AGENT_PATH) {
        return trimmed.to_string();
    }
    format!("{trimmed}{STREAM_AGENT_PATH}")
}
