use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::decoder::Utf8StreamDecoder;
use crate::events::{StreamEvent, ToolEnd, ToolRef, ToolStart};
use crate::framer::LineFramer;

/// Result substituted for a `tool_end` payload that is not decodable JSON.
pub const UNPARSEABLE_TOOL_OUTPUT: &str = "unparseable tool output";

/// One classified record plus the canonical form of its raw `content`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub event: StreamEvent,
    /// Key-sorted serialization of the record's `content` as received.
    pub fingerprint: String,
}

#[derive(Debug, Deserialize)]
struct WireRecord {
    #[serde(rename = "type")]
    kind: String,
    // Routing fields of the wrong type read as absent.
    #[serde(default)]
    tool_name: Value,
    #[serde(default)]
    tool_type: Value,
    #[serde(default)]
    operation_index: Value,
    #[serde(default)]
    content: Value,
}

impl WireRecord {
    fn tool_ref(&self) -> ToolRef {
        ToolRef::resolve(
            optional_field("tool_name", &self.tool_name, |v| v.as_str().map(str::to_owned)),
            optional_field("tool_type", &self.tool_type, Value::as_str),
            optional_field("operation_index", &self.operation_index, Value::as_u64),
        )
    }
}

fn optional_field<'a, T>(
    field: &'static str,
    value: &'a Value,
    extract: impl FnOnce(&'a Value) -> Option<T>,
) -> Option<T> {
    if value.is_null() {
        return None;
    }
    let extracted = extract(value);
    if extracted.is_none() {
        debug!(field, %value, "Ignoring optional field with unexpected type.");
    }
    extracted
}

enum LineOutcome {
    Record(ParsedRecord),
    Ignored,
    Malformed,
}

/// Parse one complete line into a [`ParsedRecord`].
///
/// Malformed and unknown records are logged and yield `None`; they never
/// abort the stream.
pub fn parse_record(line: &str) -> Option<ParsedRecord> {
    match classify_line(line) {
        LineOutcome::Record(record) => Some(record),
        LineOutcome::Ignored | LineOutcome::Malformed => None,
    }
}

fn classify_line(line: &str) -> LineOutcome {
    let line = line.trim();
    let record = match serde_json::from_str::<WireRecord>(line) {
        Ok(record) => record,
        Err(error) => {
            warn!(%error, line, "Skipping malformed stream record.");
            return LineOutcome::Malformed;
        }
    };

    let fingerprint = canonical_json(&record.content);
    match map_record(record) {
        Some(event) => LineOutcome::Record(ParsedRecord { event, fingerprint }),
        None => LineOutcome::Ignored,
    }
}

/// Serialize `value` with object keys sorted at every depth.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(fields) => {
            let mut keys: Vec<&String> = fields.keys().collect();
            keys.sort();
            out.push('{');
            for (position, key) in keys.into_iter().enumerate() {
                if position > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&fields[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (position, item) in items.iter().enumerate() {
                if position > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn map_record(record: WireRecord) -> Option<StreamEvent> {
    match record.kind.as_str() {
        "chatbot" => match record.content {
            Value::String(text) if !text.is_empty() => Some(StreamEvent::ChatbotDelta { text }),
            other => {
                debug!(content = %other, "Ignoring chatbot record without text content.");
                None
            }
        },
        "tool_start" => Some(StreamEvent::ToolStart(ToolStart {
            tool: record.tool_ref(),
            parameters: record.content,
        })),
        "tool_end" => Some(StreamEvent::ToolEnd(ToolEnd {
            tool: record.tool_ref(),
            result: decode_tool_output(record.content),
        })),
        "error" => {
            let message = match record.content {
                Value::String(message) if !message.trim().is_empty() => message,
                Value::Null => "agent reported an error".to_owned(),
                other => other.to_string(),
            };
            Some(StreamEvent::AgentError { message })
        }
        other => {
            debug!(record_type = other, "Ignoring unknown stream record type.");
            None
        }
    }
}

/// Tool output arrives either as an object or as a JSON-encoded string.
fn decode_tool_output(content: Value) -> Value {
    match content {
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or_else(|error| {
            warn!(%error, "Tool output is not valid JSON.");
            json!({ "error": UNPARSEABLE_TOOL_OUTPUT })
        }),
        other => other,
    }
}

/// Incremental NDJSON parser: bytes in, classified records out.
#[derive(Debug, Default)]
pub struct NdjsonStreamParser {
    decoder: Utf8StreamDecoder,
    framer: LineFramer,
    malformed_lines: usize,
}

impl NdjsonStreamParser {
    /// Feed an arbitrary byte chunk and drain every record it completes.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ParsedRecord> {
        let text = self.decoder.decode(bytes);
        let lines = self.framer.push(&text);
        self.parse_lines(lines)
    }

    /// Flush decoder and framer at end of stream.
    pub fn finish(&mut self) -> Vec<ParsedRecord> {
        let text = self.decoder.finish();
        let mut lines = self.framer.push(&text);
        lines.extend(self.framer.finish());
        self.parse_lines(lines)
    }

    /// Parse a complete body in one shot.
    pub fn parse_all(input: &[u8]) -> Vec<ParsedRecord> {
        let mut parser = Self::default();
        let mut records = parser.feed(input);
        records.extend(parser.finish());
        records
    }

    /// Number of lines so far that were not valid records.
    pub fn malformed_lines(&self) -> usize {
        self.malformed_lines
    }

    pub fn is_empty_buffer(&self) -> bool {
        !self.decoder.has_pending() && self.framer.is_empty_buffer()
    }

    fn parse_lines(&mut self, lines: Vec<String>) -> Vec<ParsedRecord> {
        let mut records = Vec::with_capacity(lines.len());
        for line in lines {
            match classify_line(&line) {
                LineOutcome::Record(record) => records.push(record),
                LineOutcome::Ignored => {}
                LineOutcome::Malformed => self.malformed_lines += 1,
            }
        }
        records
    }
}
