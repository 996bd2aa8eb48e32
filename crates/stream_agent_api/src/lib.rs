//! Transport-only client primitives for the `/stream_agent` endpoint.
//!
//! This crate owns request building, HTTP transport and the wire-level decode
//! pipeline for the agent's newline-delimited JSON response body. It holds no
//! conversation state: folding events into turns is the caller's job.
//!
//! The wire pipeline is three stages, each usable on its own:
//!
//! 1. [`Utf8StreamDecoder`] turns byte chunks into text, holding back partial
//!    multi-byte sequences across chunk boundaries.
//! 2. [`LineFramer`] splits text into complete newline-terminated records.
//! 3. [`ndjson::parse_record`] classifies each record into a [`StreamEvent`].
//!
//! [`NdjsonStreamParser`] composes all three for the common case.

pub mod client;
pub mod config;
pub mod decoder;
pub mod error;
pub mod events;
pub mod framer;
pub mod headers;
pub mod ndjson;
pub mod payload;
pub mod url;

pub use bytes::Bytes;
pub use client::{
    await_or_cancel, is_cancelled, BodyStream, CancellationSignal, StreamAgentClient, StreamResult,
};
pub use config::StreamAgentConfig;
pub use decoder::Utf8StreamDecoder;
pub use error::StreamAgentError;
pub use events::{EventKind, StreamEvent, ToolEnd, ToolKind, ToolRef, ToolStart};
pub use framer::LineFramer;
pub use ndjson::{NdjsonStreamParser, ParsedRecord};
pub use payload::AgentRequest;
pub use url::normalize_stream_url;
