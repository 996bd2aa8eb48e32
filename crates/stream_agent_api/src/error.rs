use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamAgentError {
    #[error("API key is required")]
    MissingApiKey,

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} {message}")]
    Status { status: StatusCode, message: String },

    #[error("response body read failed: {0}")]
    Body(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("request was cancelled")]
    Cancelled,
}

impl StreamAgentError {
    /// Returns true when the request was rejected locally, before anything hit the network.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingApiKey | Self::InvalidBaseUrl(_) | Self::InvalidHeader(_)
        )
    }
}

/// FastAPI-style error body: `{"detail": ...}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    pub detail: Option<Value>,
}

impl ErrorPayload {
    fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(message) => non_empty_string(message).map(ToOwned::to_owned),
            // Validation failures arrive as a list of `{loc, msg, type}` entries.
            Value::Array(entries) => {
                let messages: Vec<&str> = entries
                    .iter()
                    .filter_map(|entry| entry.get("msg").and_then(Value::as_str))
                    .filter_map(non_empty_string)
                    .collect();
                if messages.is_empty() {
                    None
                } else {
                    Some(messages.join("; "))
                }
            }
            Value::Object(fields) => fields
                .get("message")
                .or_else(|| fields.get("error"))
                .and_then(Value::as_str)
                .and_then(non_empty_string)
                .map(ToOwned::to_owned),
            _ => None,
        }
    }
}

pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
        if let Some(message) = payload.message() {
            return message;
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

fn non_empty_string(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{parse_error_message, StreamAgentError};

    #[test]
    fn precondition_errors_are_local_rejections() {
        assert!(StreamAgentError::MissingApiKey.is_precondition());
        assert!(StreamAgentError::InvalidHeader("x".to_string()).is_precondition());
        assert!(!StreamAgentError::Cancelled.is_precondition());
        assert!(!StreamAgentError::Body("eof".to_string()).is_precondition());
    }

    #[test]
    fn validation_detail_list_is_joined() {
        let body = r#"{"detail":[{"loc":["body","agent_type"],"msg":"bad agent type"},{"msg":"too long"}]}"#;
        assert_eq!(
            parse_error_message(StatusCode::UNPROCESSABLE_ENTITY, body),
            "bad agent type; too long"
        );
    }
}
