//! Turn lifecycle: one request per turn, folded into a published [`Conversation`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use stream_agent_api::{
    await_or_cancel, is_cancelled, AgentRequest, CancellationSignal, NdjsonStreamParser,
    ParsedRecord, StreamAgentError, StreamEvent,
};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::model::{Conversation, Response, Turn};
use crate::pacing::PacingScheduler;
use crate::reducer;
use crate::thread_id;
use crate::transport::Transport;

/// Owns one conversation and drives each submitted turn to completion.
///
/// State changes are published through a [`watch`] channel; subscribers only
/// ever see cloned snapshots.
pub struct ChatSession<T> {
    transport: T,
    config: SessionConfig,
    thread_id: Option<String>,
    state: watch::Sender<Conversation>,
    cancel: CancellationSignal,
}

impl<T: Transport> ChatSession<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        let (state, _) = watch::channel(Conversation::default());
        Self {
            transport,
            config,
            thread_id: None,
            state,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Continue an existing backend thread instead of generating a new id.
    pub fn with_thread_id(mut self, id: impl Into<String>) -> Result<Self, SessionError> {
        let id = id.into();
        thread_id::validate(&id)?;
        self.thread_id = Some(id);
        Ok(self)
    }

    pub fn subscribe(&self) -> watch::Receiver<Conversation> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> Conversation {
        self.state.borrow().clone()
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Shared flag that aborts the turn in flight when set.
    ///
    /// The flag is cleared at the start of every submit.
    pub fn cancel_signal(&self) -> CancellationSignal {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Drop every turn and forget the thread id; the next submit starts a new thread.
    pub fn new_conversation(&mut self) {
        self.cancel.store(false, Ordering::Release);
        self.thread_id = None;
        self.state.send_replace(Conversation::default());
        info!("Started a new conversation.");
    }

    /// Submit `input` as a new turn and stream its response to completion.
    ///
    /// The turn is closed on every path that reaches the stream, including
    /// the returned future being dropped mid-turn, which closes it as
    /// cancelled. Refusals (`TurnInProgress`, `EmptyInput`) leave the
    /// conversation untouched.
    pub async fn submit(&mut self, input: &str) -> Result<(), SessionError> {
        if self.state.borrow().has_open_turn() {
            return Err(SessionError::TurnInProgress);
        }
        if input.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        self.cancel.store(false, Ordering::Release);
        let thread_id = self
            .thread_id
            .get_or_insert_with(thread_id::generate)
            .clone();

        self.state.send_modify(|conversation| {
            conversation.turns.push(Turn {
                user_input: input.to_string(),
                response: Some(reducer::begin_turn()),
            });
        });
        info!(thread_id = %thread_id, agent_type = %self.config.agent_type, "Turn started.");
        let open_turn = OpenTurn::new(&self.state);

        let request = AgentRequest::new(input, thread_id.as_str(), self.config.agent_type.as_str());
        let outcome = self.run_turn(&request).await;

        open_turn.close(outcome.as_ref().err().map(SessionError::turn_message));
        match &outcome {
            Ok(()) => info!(thread_id = %thread_id, "Turn finished."),
            Err(error) => info!(thread_id = %thread_id, %error, "Turn ended with an error."),
        }
        outcome
    }

    async fn run_turn(&self, request: &AgentRequest) -> Result<(), SessionError> {
        let cancel = Some(&self.cancel);
        let mut body = await_or_cancel(self.transport.open(request), cancel)
            .await
            .and_then(|opened| opened)
            .map_err(SessionError::from_transport)?;

        let mut parser = NdjsonStreamParser::default();
        let mut pacer = PacingScheduler::new(self.config.pacing_interval);
        let mut reading = true;

        let result: Result<(), StreamAgentError> = loop {
            tokio::select! {
                biased;

                _ = pacer.ready(), if pacer.has_pending() => {
                    if is_cancelled(cancel) {
                        break Err(StreamAgentError::Cancelled);
                    }
                    if let Some(event) = pacer.next_event() {
                        self.apply(event);
                    }
                }
                chunk = await_or_cancel(body.next(), cancel), if reading => match chunk {
                    Ok(Some(Ok(bytes))) => {
                        for record in parser.feed(&bytes) {
                            self.route(record, &mut pacer);
                        }
                    }
                    Ok(Some(Err(error))) | Err(error) => break Err(error),
                    Ok(None) => {
                        for record in parser.finish() {
                            self.route(record, &mut pacer);
                        }
                        reading = false;
                        debug!(
                            malformed_lines = parser.malformed_lines(),
                            pending = pacer.pending(),
                            "Response body finished."
                        );
                    }
                },
                else => break Ok(()),
            }
        };

        if let Err(error) = result {
            let remaining = pacer.flush();
            debug!(count = remaining.len(), "Flushing queued tool events after stream failure.");
            for event in remaining {
                self.apply(event);
            }
            return Err(SessionError::from_transport(error));
        }
        Ok(())
    }

    /// Deltas and agent errors apply on arrival; tool events go through the pacer.
    fn route(&self, record: ParsedRecord, pacer: &mut PacingScheduler) {
        if !record.event.is_tool_event() {
            if let StreamEvent::AgentError { message } = &record.event {
                warn!(%message, "Agent reported an error.");
            }
            self.apply(record.event);
            return;
        }

        let kind = record.event.kind();
        if !pacer.offer(record) {
            debug!(kind = kind.as_str(), "Dropping replayed tool record.");
        }
    }

    fn apply(&self, event: StreamEvent) -> bool {
        self.update_response(|response| reducer::apply_event(response, event))
    }

    fn update_response<F>(&self, update: F) -> bool
    where
        F: FnOnce(&mut Response) -> bool,
    {
        update_last_response(&self.state, update)
    }
}

fn update_last_response<F>(state: &watch::Sender<Conversation>, update: F) -> bool
where
    F: FnOnce(&mut Response) -> bool,
{
    state.send_if_modified(|conversation| conversation.last_response_mut().is_some_and(update))
}

/// Closes the current turn as cancelled unless [`OpenTurn::close`] ran first.
struct OpenTurn<'a> {
    state: &'a watch::Sender<Conversation>,
    closed: bool,
}

impl<'a> OpenTurn<'a> {
    fn new(state: &'a watch::Sender<Conversation>) -> Self {
        Self { state, closed: false }
    }

    fn close(mut self, error: Option<String>) {
        self.closed = true;
        update_last_response(self.state, |response| reducer::finish_turn(response, error));
    }
}

impl Drop for OpenTurn<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let message = SessionError::Cancelled.turn_message();
        if update_last_response(self.state, |response| reducer::finish_turn(response, Some(message))) {
            info!("Turn abandoned before completion; closed as cancelled.");
        }
    }
}
