use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category of backend tool an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Search,
    Extract,
    Crawl,
}

impl ToolKind {
    pub const ALL: [Self; 3] = [Self::Search, Self::Extract, Self::Crawl];

    pub fn parse(value: &str) -> Option<Self> {
        Some(match value.trim() {
            "search" => Self::Search,
            "extract" => Self::Extract,
            "crawl" => Self::Crawl,
            _ => return None,
        })
    }

    /// Infers the kind from a backend tool name such as `tavily_search`.
    ///
    /// `extract` and `crawl` are checked first so names mentioning both a
    /// specific verb and `search` resolve to the specific one.
    pub fn infer_from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name.contains("extract") {
            Some(Self::Extract)
        } else if name.contains("crawl") {
            Some(Self::Crawl)
        } else if name.contains("search") {
            Some(Self::Search)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Extract => "extract",
            Self::Crawl => "crawl",
        }
    }
}

/// Identity of the tool a start/end record refers to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolRef {
    pub name: Option<String>,
    /// Explicit `tool_type` when the server sent a known one, otherwise inferred from `name`.
    pub kind: Option<ToolKind>,
    pub operation_index: Option<u64>,
}

impl ToolRef {
    pub fn resolve(
        name: Option<String>,
        tool_type: Option<&str>,
        operation_index: Option<u64>,
    ) -> Self {
        let kind = tool_type
            .and_then(ToolKind::parse)
            .or_else(|| name.as_deref().and_then(ToolKind::infer_from_name));
        Self {
            name,
            kind,
            operation_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolStart {
    pub tool: ToolRef,
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolEnd {
    pub tool: ToolRef,
    /// Decoded tool output; an undecodable payload is replaced with an error object.
    pub result: Value,
}

/// Application event reconstructed from one wire record.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    ToolStart(ToolStart),
    ToolEnd(ToolEnd),
    ChatbotDelta { text: String },
    /// Backend-reported failure of the agent run itself.
    AgentError { message: String },
}

impl StreamEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ToolStart(_) => EventKind::ToolStart,
            Self::ToolEnd(_) => EventKind::ToolEnd,
            Self::ChatbotDelta { .. } => EventKind::ChatbotDelta,
            Self::AgentError { .. } => EventKind::AgentError,
        }
    }

    pub fn tool(&self) -> Option<&ToolRef> {
        match self {
            Self::ToolStart(start) => Some(&start.tool),
            Self::ToolEnd(end) => Some(&end.tool),
            Self::ChatbotDelta { .. } | Self::AgentError { .. } => None,
        }
    }

    /// Tool events go through de-duplication and pacing; everything else is applied on arrival.
    pub fn is_tool_event(&self) -> bool {
        matches!(self, Self::ToolStart(_) | Self::ToolEnd(_))
    }
}

/// Discriminant of [`StreamEvent`], usable as a hash key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ToolStart,
    ToolEnd,
    ChatbotDelta,
    AgentError,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToolStart => "tool_start",
            Self::ToolEnd => "tool_end",
            Self::ChatbotDelta => "chatbot",
            Self::AgentError => "error",
        }
    }
}
