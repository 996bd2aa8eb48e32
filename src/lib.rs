//! Incremental session-stream processor for a tool-augmented research agent.
//!
//! A [`ChatSession`] submits one request per turn through a [`Transport`],
//! decodes the newline-delimited JSON response as it arrives, and folds tool
//! operations and streamed answer text into a [`Conversation`] that
//! subscribers observe as immutable snapshots.
//!
//! # Pipeline
//! bytes → [`stream_agent_api::Utf8StreamDecoder`] → [`stream_agent_api::LineFramer`]
//! → [`stream_agent_api::ndjson`] → [`DedupQueue`] inside the [`PacingScheduler`]
//! → [`reducer`] → `watch` channel.
//!
//! Text deltas skip the queue and apply as soon as they are parsed, so a tool
//! event's effect may trail a delta that arrived after it.

pub mod config;
pub mod dedup;
pub mod error;
pub mod model;
pub mod pacing;
pub mod reducer;
pub mod session;
pub mod thread_id;
pub mod transport;
pub mod views;

pub use crate::config::{ChatConfig, ConfigError, SessionConfig};
pub use crate::dedup::{DedupQueue, IdempotencyKey};
pub use crate::error::SessionError;
pub use crate::model::{
    Conversation, OperationStatus, Response, ResponseKind, ToolKind, ToolOperation, Turn,
};
pub use crate::pacing::{PacingScheduler, DEFAULT_PACING_INTERVAL};
pub use crate::session::ChatSession;
pub use crate::transport::Transport;
pub use crate::views::{KindSummary, PageContent, PipelineStep, SearchHit};

pub use stream_agent_api;
