use std::future::Future;
use std::sync::Arc;

use stream_agent_api::{AgentRequest, BodyStream, StreamAgentClient, StreamAgentError};

/// Opens the response body for one agent request.
///
/// Implementations make exactly one request per call and must not retry.
pub trait Transport: Send + Sync {
    fn open(
        &self,
        request: &AgentRequest,
    ) -> impl Future<Output = Result<BodyStream, StreamAgentError>> + Send;
}

impl Transport for StreamAgentClient {
    fn open(
        &self,
        request: &AgentRequest,
    ) -> impl Future<Output = Result<BodyStream, StreamAgentError>> + Send {
        StreamAgentClient::open(self, request)
    }
}

impl<T: Transport> Transport for &T {
    fn open(
        &self,
        request: &AgentRequest,
    ) -> impl Future<Output = Result<BodyStream, StreamAgentError>> + Send {
        (**self).open(request)
    }
}

impl<T: Transport> Transport for Arc<T> {
    fn open(
        &self,
        request: &AgentRequest,
    ) -> impl Future<Output = Result<BodyStream, StreamAgentError>> + Send {
        (**self).open(request)
    }
}
