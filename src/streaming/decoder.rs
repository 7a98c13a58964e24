use bytes::Bytes;

use crate::error::{Result, StreamError};
use crate::models::event::Envelope;
use crate::models::{ChatEvent, EventKind, EventPayload};

pub const DATA_PREFIX: &[u8] = b"data: ";
pub const ENVELOPE_OPENING: &[u8] = br#"{"event":"#;
pub const KEEP_ALIVE_EVENT: &str = "ping";

/// What a single framed line turned out to be
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Event(ChatEvent),
    /// A `ping` event
    KeepAlive,
    /// Blank line, comment, or any other non-`data: ` line
    Noise,
}

/// Classifies framed lines and decodes their payloads
#[derive(Debug, Default)]
pub struct EventDecoder {
    terminated: bool,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once `message_end` has been decoded
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn decode_line(&mut self, line: &Bytes) -> Result<LineOutcome> {
        let Some(body) = line.trim_ascii().strip_prefix(DATA_PREFIX) else {
            return Ok(LineOutcome::Noise);
        };

        if !body.starts_with(ENVELOPE_OPENING) {
            return Err(malformed("missing {\"event\": opening", body));
        }

        let envelope: Envelope =
            serde_json::from_slice(body).map_err(|e| malformed(&e.to_string(), body))?;

        if envelope.event == KEEP_ALIVE_EVENT {
            tracing::trace!("Skipping keep-alive");
            return Ok(LineOutcome::KeepAlive);
        }

        let payload = match EventKind::from_tag(&envelope.event) {
            Some(kind) => kind
                .decode_payload(body)
                .map_err(|source| StreamError::PayloadDecode {
                    event: envelope.event.clone(),
                    raw: String::from_utf8_lossy(body).into_owned(),
                    source,
                })?,
            None => {
                tracing::debug!(event = %envelope.event, "Surfacing unrecognized event kind");
                EventPayload::Unknown
            }
        };

        if matches!(payload, EventPayload::MessageEnd(_)) {
            tracing::debug!(task_id = %envelope.task_id, "Received terminal event");
            self.terminated = true;
        }

        Ok(LineOutcome::Event(ChatEvent {
            event: envelope.event,
            task_id: envelope.task_id,
            message_id: envelope.message_id,
            payload,
            raw: line.slice_ref(body),
        }))
    }
}

fn malformed(reason: &str, body: &[u8]) -> StreamError {
    StreamError::MalformedEvent {
        reason: reason.to_string(),
        raw: String::from_utf8_lossy(body).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(line: &'static str) -> Result<LineOutcome> {
        EventDecoder::new().decode_line(&Bytes::from_static(line.as_bytes()))
    }

    fn decode_event(line: &'static str) -> ChatEvent {
        match decode(line).unwrap() {
            LineOutcome::Event(event) => event,
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[test]
    fn test_message_event() {
        let event = decode_event(
            "data: {\"event\":\"message\",\"task_id\":\"t1\",\"message_id\":\"m1\",\"conversation_id\":\"c1\",\"answer\":\"Hi\",\"created_at\":1705395332}\n",
        );

        assert_eq!(event.event, "message");
        assert_eq!(event.task_id, "t1");
        assert_eq!(event.message_id, "m1");
        assert_eq!(event.answer(), Some("Hi"));
        let EventPayload::Message(chunk) = &event.payload else {
            panic!("expected message payload");
        };
        assert_eq!(chunk.conversation_id, "c1");
        assert_eq!(chunk.created_at, 1705395332);
        assert!(event.raw.starts_with(b"{\"event\""));
        assert!(event.raw.ends_with(b"}"));
    }

    #[test]
    fn test_noise_lines() {
        let lines = [
            "\n",
            "   \r\n",
            ": keep-alive comment\n",
            "event: message\n",
            "data:\n",
            "id: 7\n",
        ];
        for line in lines {
            assert_eq!(decode(line).unwrap(), LineOutcome::Noise, "line {:?}", line);
        }
    }

    #[test]
    fn test_ping_is_keep_alive() {
        assert_eq!(
            decode("data: {\"event\":\"ping\"}\n\n").unwrap(),
            LineOutcome::KeepAlive
        );
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        let event = decode_event("  data: {\"event\":\"agent_message\",\"answer\":\"ok\"}  \r\n");
        assert_eq!(
            event.payload,
            EventPayload::AgentMessage(crate::models::MessageChunk {
                answer: "ok".to_string(),
                ..Default::default()
            })
        );
        assert_eq!(
            event.raw_str(),
            "{\"event\":\"agent_message\",\"answer\":\"ok\"}"
        );
    }

    #[test]
    fn test_body_without_envelope_opening() {
        let err = decode("data: not-json\n").unwrap_err();
        match err {
            StreamError::MalformedEvent { raw, .. } => assert_eq!(raw, "not-json"),
            other => panic!("unexpected error {:?}", other),
        }

        // the opening must be exact
        assert!(matches!(
            decode("data: { \"event\": \"message\"}\n"),
            Err(StreamError::MalformedEvent { .. })
        ));
    }

    #[test]
    fn test_truncated_envelope() {
        let err = decode("data: {\"event\":\"message\",\"answer\":\"H\n").unwrap_err();
        assert!(matches!(err, StreamError::MalformedEvent { .. }));
    }

    #[test]
    fn test_payload_decode_error_carries_kind() {
        let err = decode(
            "data: {\"event\":\"message_end\",\"metadata\":{\"usage\":{\"total_tokens\":\"many\"}}}\n",
        )
        .unwrap_err();
        match err {
            StreamError::PayloadDecode { event, raw, .. } => {
                assert_eq!(event, "message_end");
                assert!(raw.contains("\"many\""));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unknown_kind_has_no_payload() {
        let event = decode_event(
            "data: {\"event\":\"workflow_started\",\"task_id\":\"t9\",\"workflow_run_id\":\"w1\"}\n",
        );
        assert_eq!(event.event, "workflow_started");
        assert_eq!(event.task_id, "t9");
        assert_eq!(event.payload, EventPayload::Unknown);
        assert_eq!(event.kind(), None);
    }

    #[test]
    fn test_message_replace_event() {
        let event = decode_event(
            "data: {\"event\":\"message_replace\",\"task_id\":\"t1\",\"message_id\":\"m1\",\"conversation_id\":\"c1\",\"answer\":\"[filtered]\",\"created_at\":1705395340}\n",
        );

        assert_eq!(event.kind(), Some(EventKind::MessageReplace));
        let EventPayload::MessageReplace(replace) = &event.payload else {
            panic!("expected message_replace payload");
        };
        assert_eq!(replace.conversation_id, "c1");
        assert_eq!(replace.answer, "[filtered]");
        assert_eq!(replace.created_at, 1705395340);
        assert_eq!(event.answer(), Some("[filtered]"));
    }

    #[test]
    fn test_null_kind_is_unknown() {
        let event = decode_event("data: {\"event\":null,\"task_id\":\"t1\"}\n");
        assert_eq!(event.event, "");
        assert_eq!(event.task_id, "t1");
        assert_eq!(event.payload, EventPayload::Unknown);
    }

    #[test]
    fn test_message_end_terminates() {
        let mut decoder = EventDecoder::new();
        let line = Bytes::from_static(
            b"data: {\"event\":\"message_end\",\"task_id\":\"t1\",\"message_id\":\"m1\",\"metadata\":{\"usage\":{\"total_tokens\":42}}}\n",
        );

        assert!(!decoder.is_terminated());
        let LineOutcome::Event(event) = decoder.decode_line(&line).unwrap() else {
            panic!("expected event");
        };
        assert!(decoder.is_terminated());
        assert!(event.is_terminal());
        let EventPayload::MessageEnd(end) = event.payload else {
            panic!("expected message_end payload");
        };
        assert_eq!(end.metadata.usage.total_tokens, 42);
    }

    #[test]
    fn test_upstream_error_is_data() {
        let event = decode_event(
            "data: {\"event\":\"error\",\"task_id\":\"t1\",\"message_id\":\"m1\",\"status\":500,\"code\":\"internal_server_error\",\"message\":\"model overloaded\"}\n",
        );
        let EventPayload::Error(err) = event.payload else {
            panic!("expected error payload");
        };
        assert_eq!(err.status, 500);
        assert_eq!(err.message, "model overloaded");
    }
}
