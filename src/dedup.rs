use std::collections::{HashSet, VecDeque};

use stream_agent_api::{EventKind, ParsedRecord, StreamEvent};

/// Identity of a tool record: event kind, tool name and canonical content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey {
    pub kind: EventKind,
    pub tool_name: Option<String>,
    pub fingerprint: String,
}

impl IdempotencyKey {
    pub fn of(record: &ParsedRecord) -> Self {
        Self {
            kind: record.event.kind(),
            tool_name: record.event.tool().and_then(|tool| tool.name.clone()),
            fingerprint: record.fingerprint.clone(),
        }
    }
}

/// FIFO of novel tool events for one turn.
///
/// Keys stay recorded after their event has been popped, so a record replayed
/// late in the turn is still suppressed.
#[derive(Debug, Default)]
pub struct DedupQueue {
    seen: HashSet<IdempotencyKey>,
    queue: VecDeque<StreamEvent>,
}

impl DedupQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `record` unless its key was already seen. Returns whether it was accepted.
    pub fn offer(&mut self, record: ParsedRecord) -> bool {
        if !self.seen.insert(IdempotencyKey::of(&record)) {
            return false;
        }
        self.queue.push_back(record.event);
        true
    }

    pub fn pop_front(&mut self) -> Option<StreamEvent> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn seen_keys(&self) -> usize {
        self.seen.len()
    }

    /// Remove every queued event in order.
    pub fn drain(&mut self) -> Vec<StreamEvent> {
        self.queue.drain(..).collect()
    }
}
