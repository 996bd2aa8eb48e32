use std::collections::BTreeMap;

use crate::config::StreamAgentConfig;
use crate::error::StreamAgentError;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_USER_AGENT: &str = "user-agent";

/// Build a deterministic header map for agent requests.
///
/// The API key is forwarded verbatim: the backend validates the raw header value.
pub fn build_headers(
    config: &StreamAgentConfig,
    user_agent: Option<&str>,
) -> Result<BTreeMap<String, String>, StreamAgentError> {
    let mut headers = BTreeMap::new();

    let api_key = config.api_key.trim();
    if api_key.is_empty() {
        return Err(StreamAgentError::MissingApiKey);
    }

    headers.insert(HEADER_AUTHORIZATION.to_owned(), api_key.to_owned());
    headers.insert(HEADER_ACCEPT.to_owned(), "application/json".to_owned());
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json".to_owned(),
    );

    let ua = match (user_agent, config.user_agent.as_deref()) {
        (Some(explicit), _) if !explicit.trim().is_empty() => explicit.trim().to_owned(),
        (None, Some(explicit)) if !explicit.trim().is_empty() => explicit.trim().to_owned(),
        _ => default_user_agent(),
    };
    headers.insert(HEADER_USER_AGENT.to_owned(), ua);

    for (key, value) in &config.extra_headers {
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            continue;
        }
        headers.insert(key, value.trim().to_owned());
    }

    Ok(headers)
}

/// Copy of `headers` with the credential masked, for diagnostics.
pub fn redacted(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(key, value)| {
            if key == HEADER_AUTHORIZATION {
                (key.clone(), "[REDACTED]".to_owned())
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}

fn default_user_agent() -> String {
    format!(
        "{}/{} ({}; {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
