//! Session and environment configuration.

use std::env;
use std::time::Duration;

use stream_agent_api::{StreamAgentClient, StreamAgentConfig, StreamAgentError};
use thiserror::Error;

use crate::pacing::DEFAULT_PACING_INTERVAL;

pub const DEFAULT_AGENT_TYPE: &str = "fast";

pub const ENV_BASE_URL: &str = "AGENT_CHAT_BASE_URL";
pub const ENV_API_KEY: &str = "AGENT_CHAT_API_KEY";
pub const ENV_AGENT_TYPE: &str = "AGENT_CHAT_AGENT_TYPE";
pub const ENV_PACING_MS: &str = "AGENT_CHAT_PACING_MS";
pub const ENV_TIMEOUT_SEC: &str = "AGENT_CHAT_TIMEOUT_SEC";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    NotPositive { key: &'static str },
}

/// Per-session behavior that is not part of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Agent variant forwarded verbatim with every request.
    pub agent_type: String,
    /// Minimum spacing between applied tool events.
    pub pacing_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            agent_type: DEFAULT_AGENT_TYPE.to_string(),
            pacing_interval: DEFAULT_PACING_INTERVAL,
        }
    }
}

impl SessionConfig {
    pub fn with_agent_type(mut self, agent_type: impl Into<String>) -> Self {
        self.agent_type = agent_type.into();
        self
    }

    pub fn with_pacing_interval(mut self, interval: Duration) -> Self {
        self.pacing_interval = interval;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub stream: StreamAgentConfig,
    pub session: SessionConfig,
}

impl ChatConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from any key/value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key).and_then(|value| {
                if value.trim().is_empty() {
                    None
                } else {
                    Some(value.trim().to_string())
                }
            })
        };

        let mut stream = StreamAgentConfig::new(get(ENV_API_KEY).unwrap_or_default());
        if let Some(base_url) = get(ENV_BASE_URL) {
            stream = stream.with_base_url(base_url);
        }
        if let Some(seconds) = get(ENV_TIMEOUT_SEC) {
            let seconds = parse_number(ENV_TIMEOUT_SEC, &seconds)?;
            if seconds == 0 {
                return Err(ConfigError::NotPositive {
                    key: ENV_TIMEOUT_SEC,
                });
            }
            stream = stream.with_timeout(Duration::from_secs(seconds));
        }

        let mut session = SessionConfig::default();
        if let Some(agent_type) = get(ENV_AGENT_TYPE) {
            session = session.with_agent_type(agent_type);
        }
        if let Some(millis) = get(ENV_PACING_MS) {
            session = session
                .with_pacing_interval(Duration::from_millis(parse_number(ENV_PACING_MS, &millis)?));
        }

        Ok(Self { stream, session })
    }

    pub fn client(&self) -> Result<StreamAgentClient, StreamAgentError> {
        StreamAgentClient::new(self.stream.clone())
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: value.to_string(),
    })
}
