use stream_agent_api::StreamAgentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a turn is already streaming in this conversation")]
    TurnInProgress,

    #[error("input is empty")]
    EmptyInput,

    #[error("invalid thread id '{id}': {reason}")]
    InvalidThreadId { id: String, reason: &'static str },

    /// The request failed a precondition and was never sent.
    #[error("request rejected: {0}")]
    Rejected(#[source] StreamAgentError),

    #[error("error fetching streaming data: {0}")]
    Transport(#[source] StreamAgentError),

    #[error("request was cancelled")]
    Cancelled,
}

impl SessionError {
    /// Classify a transport failure the way the turn will report it.
    pub fn from_transport(error: StreamAgentError) -> Self {
        match error {
            StreamAgentError::Cancelled => Self::Cancelled,
            error if error.is_precondition() => Self::Rejected(error),
            error => Self::Transport(error),
        }
    }

    /// Message stored on the turn's response when this error ends it.
    pub fn turn_message(&self) -> String {
        match self {
            Self::Rejected(cause) => format!("Request rejected: {cause}"),
            Self::Transport(cause) => format!("Error fetching streaming data: {cause}"),
            Self::Cancelled => "Request was cancelled".to_string(),
            other => other.to_string(),
        }
    }
}
