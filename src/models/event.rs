use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::metadata::Metadata;
use super::null_as_default;

/// One decoded `data:` line of a chat-message stream
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEvent {
    /// Kind tag exactly as it appeared on the wire
    pub event: String,
    pub task_id: String,
    pub message_id: String,
    pub payload: EventPayload,
    /// The JSON envelope text, `data: ` prefix stripped
    pub raw: Bytes,
}

impl ChatEvent {
    /// Recognized kind, `None` for tags this crate does not know about
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::from_tag(&self.event)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.payload, EventPayload::MessageEnd(_))
    }

    /// Answer text carried by `message`, `agent_message` and `message_replace`
    pub fn answer(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Message(chunk) | EventPayload::AgentMessage(chunk) => {
                Some(&chunk.answer)
            }
            EventPayload::MessageReplace(replace) => Some(&replace.answer),
            _ => None,
        }
    }

    pub fn raw_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }
}

/// Kind-specific body of an event. Exactly one is present per envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Message(MessageChunk),
    AgentMessage(MessageChunk),
    AgentThought(AgentThought),
    MessageFile(MessageFile),
    MessageReplace(MessageReplace),
    MessageEnd(MessageEnd),
    /// Service-side failure reported in-band
    Error(UpstreamError),
    /// A kind tag newer than this crate; inspect `ChatEvent::raw`
    Unknown,
}

/// Event kinds that carry a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Message,
    AgentMessage,
    AgentThought,
    MessageFile,
    MessageReplace,
    MessageEnd,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Message,
        EventKind::AgentMessage,
        EventKind::AgentThought,
        EventKind::MessageFile,
        EventKind::MessageReplace,
        EventKind::MessageEnd,
        EventKind::Error,
    ];

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "message" => Some(EventKind::Message),
            "agent_message" => Some(EventKind::AgentMessage),
            "agent_thought" => Some(EventKind::AgentThought),
            "message_file" => Some(EventKind::MessageFile),
            "message_replace" => Some(EventKind::MessageReplace),
            "message_end" => Some(EventKind::MessageEnd),
            "error" => Some(EventKind::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Message => "message",
            EventKind::AgentMessage => "agent_message",
            EventKind::AgentThought => "agent_thought",
            EventKind::MessageFile => "message_file",
            EventKind::MessageReplace => "message_replace",
            EventKind::MessageEnd => "message_end",
            EventKind::Error => "error",
        }
    }

    /// Decode this kind's payload from the full envelope text.
    ///
    /// Payload fields sit at the top level of the envelope, so the same bytes
    /// that produced the envelope are parsed a second time into the
    /// kind-specific struct. Unrelated keys are ignored.
    pub fn decode_payload(self, raw: &[u8]) -> serde_json::Result<EventPayload> {
        match self {
            EventKind::Message => serde_json::from_slice(raw).map(EventPayload::Message),
            EventKind::AgentMessage => {
                serde_json::from_slice(raw).map(EventPayload::AgentMessage)
            }
            EventKind::AgentThought => {
                serde_json::from_slice(raw).map(EventPayload::AgentThought)
            }
            EventKind::MessageFile => serde_json::from_slice(raw).map(EventPayload::MessageFile),
            EventKind::MessageReplace => {
                serde_json::from_slice(raw).map(EventPayload::MessageReplace)
            }
            EventKind::MessageEnd => serde_json::from_slice(raw).map(EventPayload::MessageEnd),
            EventKind::Error => serde_json::from_slice(raw).map(EventPayload::Error),
        }
    }
}

/// Routing fields shared by every line
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub event: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message_id: String,
}

/// Incremental answer fragment (`message` and `agent_message`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageChunk {
    #[serde(deserialize_with = "null_as_default")]
    pub conversation_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub answer: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentThought {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub conversation_id: String,
    /// Order of this thought within the answer, starting at 1
    pub position: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub thought: String,
    #[serde(deserialize_with = "null_as_default")]
    pub observation: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tool: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tool_input: String,
    /// Ids of `message_file` events produced by this step
    #[serde(deserialize_with = "null_as_default")]
    pub message_files: Vec<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageFile {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub conversation_id: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub file_type: String,
    /// "user" or "assistant"
    #[serde(deserialize_with = "null_as_default")]
    pub belongs_to: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
}

/// Full answer replacement, e.g. after content moderation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageReplace {
    #[serde(deserialize_with = "null_as_default")]
    pub conversation_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub answer: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageEnd {
    #[serde(deserialize_with = "null_as_default")]
    pub conversation_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamError {
    /// HTTP-like status code
    pub status: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
}
