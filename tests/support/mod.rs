#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use agent_chat::stream_agent_api::{AgentRequest, BodyStream, Bytes, StreamAgentError};
use agent_chat::Transport;
use futures_util::stream::{self, StreamExt};

type BodyItem = Result<Bytes, StreamAgentError>;

/// How a scripted body ends after its chunks have been delivered.
#[derive(Debug, Clone)]
pub enum Ending {
    Eof,
    Error(String),
    /// Never yields again; only cancellation ends the turn.
    Hang,
}

#[derive(Debug)]
pub enum Script {
    Body { chunks: Vec<Vec<u8>>, ending: Ending },
    Refuse(StreamAgentError),
}

impl Script {
    pub fn body(chunks: Vec<Vec<u8>>) -> Self {
        Self::Body {
            chunks,
            ending: Ending::Eof,
        }
    }

    pub fn lines(lines: &[&str]) -> Self {
        Self::body(vec![join_lines(lines).into_bytes()])
    }
}

/// In-memory transport replaying one script per opened request.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<AgentRequest>>,
}

impl ScriptedTransport {
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<AgentRequest> {
        lock_unpoisoned(&self.requests).clone()
    }

    fn next_body(&self, request: &AgentRequest) -> Result<BodyStream, StreamAgentError> {
        lock_unpoisoned(&self.requests).push(request.clone());
        let script = lock_unpoisoned(&self.scripts)
            .pop_front()
            .unwrap_or_else(|| panic!("no script left for request {request:?}"));

        let (chunks, ending) = match script {
            Script::Refuse(error) => return Err(error),
            Script::Body { chunks, ending } => (chunks, ending),
        };

        let head = stream::iter(chunks.into_iter().map(|chunk| Ok(Bytes::from(chunk))));
        let tail: BodyStream = match ending {
            Ending::Eof => Box::pin(stream::empty::<BodyItem>()),
            Ending::Error(message) => Box::pin(stream::once(async move {
                Err::<Bytes, _>(StreamAgentError::Body(message))
            })),
            Ending::Hang => Box::pin(stream::pending::<BodyItem>()),
        };
        Ok(Box::pin(head.chain(tail)))
    }
}

impl Transport for ScriptedTransport {
    fn open(
        &self,
        request: &AgentRequest,
    ) -> impl Future<Output = Result<BodyStream, StreamAgentError>> + Send {
        std::future::ready(self.next_body(request))
    }
}

pub fn join_lines(lines: &[&str]) -> String {
    let mut body = String::new();
    for line in lines {
        body.push_str(line);
        body.push('\n');
    }
    body
}

/// Split `bytes` into chunks of at most `size` bytes.
pub fn chunked(bytes: &[u8], size: usize) -> Vec<Vec<u8>> {
    bytes.chunks(size.max(1)).map(<[u8]>::to_vec).collect()
}

pub fn read_fixture(name: &str) -> Vec<u8> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read(&path).unwrap_or_else(|err| panic!("failed to read fixture {name}: {err}"))
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
