//! Folds ordered stream events into the open turn's [`Response`].
//!
//! Every function returns whether the response changed, so the caller can
//! skip publishing a snapshot for ignored events.

use tracing::{debug, warn};

use stream_agent_api::{StreamEvent, ToolEnd, ToolStart};

use crate::model::{OperationStatus, Response, ResponseKind, ToolOperation};

/// Fresh response for a turn that has just been submitted.
pub fn begin_turn() -> Response {
    Response {
        kind: ResponseKind::PlainChat,
        is_streaming: true,
        is_searching: false,
        recap_text: String::new(),
        operations: Vec::new(),
        error: None,
    }
}

/// Dispatch one event to the matching reducer.
pub fn apply_event(response: &mut Response, event: StreamEvent) -> bool {
    match event {
        StreamEvent::ToolStart(start) => apply_tool_start(response, start),
        StreamEvent::ToolEnd(end) => apply_tool_end(response, end),
        StreamEvent::ChatbotDelta { text } => append_delta(response, &text),
        StreamEvent::AgentError { message } => record_agent_error(response, message),
    }
}

/// Open a tool operation, or refine the parameters of the one already open.
///
/// A start whose kind matches the most recent operation while it is still
/// active replaces that operation's parameters instead of appending.
pub fn apply_tool_start(response: &mut Response, start: ToolStart) -> bool {
    let Some(kind) = start.tool.kind else {
        debug!(tool_name = ?start.tool.name, "Ignoring tool start for an unrecognized tool.");
        return false;
    };

    match response.operations.last_mut() {
        Some(last) if last.status == OperationStatus::Active && last.kind == kind => {
            debug!(
                kind = kind.as_str(),
                sequence_index = last.sequence_index,
                "Merging tool start into the open operation."
            );
            last.parameters = start.parameters;
        }
        _ => {
            let sequence_index = start
                .tool
                .operation_index
                .unwrap_or(response.operations.len() as u64);
            response.operations.push(ToolOperation {
                kind,
                sequence_index,
                parameters: start.parameters,
                status: OperationStatus::Active,
                result: None,
            });
        }
    }

    response.kind = ResponseKind::ToolAugmented;
    response.is_searching = true;
    true
}

/// Complete the nearest active operation of the same kind.
pub fn apply_tool_end(response: &mut Response, end: ToolEnd) -> bool {
    let Some(kind) = end.tool.kind else {
        debug!(tool_name = ?end.tool.name, "Ignoring tool end for an unrecognized tool.");
        return false;
    };

    let Some(operation) = response
        .operations
        .iter_mut()
        .rev()
        .find(|operation| operation.status == OperationStatus::Active && operation.kind == kind)
    else {
        warn!(
            kind = kind.as_str(),
            tool_name = ?end.tool.name,
            "Discarding tool end without a matching active operation."
        );
        return false;
    };

    operation.status = OperationStatus::Complete;
    operation.result = Some(end.result);
    response.is_searching = response.has_active_operation();
    true
}

pub fn append_delta(response: &mut Response, text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    response.recap_text.push_str(text);
    true
}

/// Record a backend-reported failure; the turn stays open until the stream ends.
pub fn record_agent_error(response: &mut Response, message: String) -> bool {
    if response.error.as_deref() == Some(message.as_str()) {
        return false;
    }
    response.error = Some(message);
    true
}

/// Close the turn. Only the first call has any effect.
///
/// `error` overwrites any error recorded earlier; `None` keeps it.
pub fn finish_turn(response: &mut Response, error: Option<String>) -> bool {
    if !response.is_streaming {
        return false;
    }
    response.is_streaming = false;
    if let Some(error) = error {
        response.error = Some(error);
    }
    true
}
