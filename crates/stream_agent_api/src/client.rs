use std::future::Future;
use std::pin::Pin;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::trace;

use crate::config::StreamAgentConfig;
use crate::error::{parse_error_message, StreamAgentError};
use crate::events::StreamEvent;
use crate::headers::{build_headers, redacted};
use crate::ndjson::NdjsonStreamParser;
use crate::payload::AgentRequest;
use crate::url::normalize_stream_url;

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

/// Raw response body, chunked as it arrives from the network.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, StreamAgentError>> + Send>>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct StreamAgentClient {
    http: Client,
    config: StreamAgentConfig,
}

#[derive(Debug, Clone)]
pub struct StreamResult {
    pub events: Vec<StreamEvent>,
    pub malformed_lines: usize,
}

impl StreamAgentClient {
    pub fn new(config: StreamAgentConfig) -> Result<Self, StreamAgentError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(StreamAgentError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &StreamAgentConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_stream_url(&self.config.base_url)
    }

    pub fn build_headers(&self, user_agent: Option<&str>) -> Result<HeaderMap, StreamAgentError> {
        let headers = build_headers(&self.config, user_agent)?;
        trace!(headers = ?redacted(&headers), "Built request headers.");
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    StreamAgentError::InvalidHeader(format!("invalid header key: {key}"))
                })?,
                HeaderValue::from_str(&value).map_err(|_| {
                    StreamAgentError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        request: &AgentRequest,
    ) -> Result<reqwest::RequestBuilder, StreamAgentError> {
        let endpoint = self.normalized_endpoint();
        reqwest::Url::parse(&endpoint)
            .map_err(|error| StreamAgentError::InvalidBaseUrl(format!("{endpoint}: {error}")))?;

        let headers = self.build_headers(self.config.user_agent.as_deref())?;
        Ok(self.http.post(endpoint).headers(headers).json(request))
    }

    /// Sends one request and returns its body as a byte stream.
    ///
    /// Exactly one HTTP request is made per call; non-success statuses are
    /// read to completion and returned as [`StreamAgentError::Status`].
    pub async fn open(&self, request: &AgentRequest) -> Result<BodyStream, StreamAgentError> {
        let builder = self.build_request(request)?;
        trace!(
            endpoint = %self.normalized_endpoint(),
            thread_id = %request.thread_id,
            agent_type = %request.agent_type,
            "Opening agent stream."
        );

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            return Err(StreamAgentError::Status {
                status,
                message: parse_error_message(status, &body),
            });
        }

        Ok(Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(StreamAgentError::from)),
        ))
    }

    /// Streams a whole response, handing each decoded event to `on_event`.
    ///
    /// Events are delivered exactly as parsed and as soon as their line
    /// completes: replayed tool records are not deduplicated and tool events
    /// are not paced. Callers that need either must apply it themselves.
    /// Returns the number of malformed lines.
    pub async fn stream_with_handler<F>(
        &self,
        request: &AgentRequest,
        cancellation: Option<&CancellationSignal>,
        mut on_event: F,
    ) -> Result<usize, StreamAgentError>
    where
        F: FnMut(StreamEvent),
    {
        let mut bytes = await_or_cancel(self.open(request), cancellation).await??;
        let mut parser = NdjsonStreamParser::default();

        loop {
            let Some(chunk) = await_or_cancel(bytes.next(), cancellation).await? else {
                break;
            };
            if is_cancelled(cancellation) {
                return Err(StreamAgentError::Cancelled);
            }
            for record in parser.feed(&chunk?) {
                on_event(record.event);
            }
        }

        for record in parser.finish() {
            on_event(record.event);
        }

        Ok(parser.malformed_lines())
    }

    /// Collects every event of one response, unfiltered and unpaced.
    ///
    /// See [`Self::stream_with_handler`]; a replayed tool record shows up
    /// once per occurrence in [`StreamResult::events`].
    pub async fn stream(
        &self,
        request: &AgentRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<StreamResult, StreamAgentError> {
        let mut events = Vec::new();
        let malformed_lines = self
            .stream_with_handler(request, cancellation, |event| {
                events.push(event);
            })
            .await?;

        Ok(StreamResult {
            events,
            malformed_lines,
        })
    }
}

pub fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

/// Awaits `future`, giving up with [`StreamAgentError::Cancelled`] once the signal is set.
pub async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, StreamAgentError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(StreamAgentError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(StreamAgentError::Cancelled);
            }
            return Ok(output);
        }
    }
}
