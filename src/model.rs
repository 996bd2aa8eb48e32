//! Conversation state published to the rendering layer.

use serde::Serialize;
use serde_json::Value;

pub use stream_agent_api::ToolKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Conversation {
    pub turns: Vec<Turn>,
}

impl Conversation {
    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn last_response(&self) -> Option<&Response> {
        self.turns.last().and_then(|turn| turn.response.as_ref())
    }

    /// True while any turn's response is still streaming.
    pub fn has_open_turn(&self) -> bool {
        self.turns
            .iter()
            .any(|turn| turn.response.as_ref().is_some_and(|r| r.is_streaming))
    }

    pub(crate) fn last_response_mut(&mut self) -> Option<&mut Response> {
        self.turns.last_mut().and_then(|turn| turn.response.as_mut())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub user_input: String,
    pub response: Option<Response>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    PlainChat,
    ToolAugmented,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub kind: ResponseKind,
    pub is_streaming: bool,
    pub is_searching: bool,
    pub recap_text: String,
    pub operations: Vec<ToolOperation>,
    pub error: Option<String>,
}

impl Response {
    pub fn has_active_operation(&self) -> bool {
        self.operations
            .iter()
            .any(|operation| operation.status == OperationStatus::Active)
    }

    pub fn operations_of(&self, kind: ToolKind) -> impl Iterator<Item = &ToolOperation> {
        self.operations
            .iter()
            .filter(move |operation| operation.kind == kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Active,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOperation {
    pub kind: ToolKind,
    pub sequence_index: u64,
    pub parameters: Value,
    pub status: OperationStatus,
    pub result: Option<Value>,
}
