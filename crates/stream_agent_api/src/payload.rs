use serde::{Deserialize, Serialize};

/// Request body for the streaming agent endpoint.
///
/// `agent_type` is forwarded verbatim; the client never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub input: String,
    pub thread_id: String,
    pub agent_type: String,
}

impl AgentRequest {
    pub fn new(
        input: impl Into<String>,
        thread_id: impl Into<String>,
        agent_type: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            thread_id: thread_id.into(),
            agent_type: agent_type.into(),
        }
    }
}
