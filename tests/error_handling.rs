use bytes::Bytes;
use dify_stream::{BodyStream, ChatStream, EventPayload, StreamConfig, StreamError};
use std::io;

fn stream_of(chunks: Vec<io::Result<Bytes>>) -> ChatStream<impl dify_stream::ByteSource> {
    ChatStream::new(BodyStream::new(futures::stream::iter(chunks)))
}

fn lines(lines: &[&'static str]) -> Vec<io::Result<Bytes>> {
    lines
        .iter()
        .map(|l| Ok(Bytes::from_static(l.as_bytes())))
        .collect()
}

const MESSAGE: &str =
    "data: {\"event\":\"message\",\"task_id\":\"t1\",\"message_id\":\"m1\",\"answer\":\"Hi\"}\n";
const END: &str = "data: {\"event\":\"message_end\",\"task_id\":\"t1\",\"message_id\":\"m1\"}\n";

#[tokio::test]
async fn test_not_json_is_malformed() {
    let mut stream = stream_of(lines(&["data: not-json\n", MESSAGE, END]));

    let err = stream.next().await.unwrap_err();
    match &err {
        StreamError::MalformedEvent { raw, .. } => assert_eq!(raw, "not-json"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("not-json"));

    // no further events from this cursor
    assert!(matches!(stream.next().await, Err(StreamError::Closed)));
    assert!(matches!(stream.next().await, Err(StreamError::Closed)));
}

#[tokio::test]
async fn test_envelope_must_open_with_event_key() {
    let mut stream = stream_of(lines(&[
        "data: {\"task_id\":\"t1\",\"event\":\"message\"}\n",
        END,
    ]));

    assert!(matches!(
        stream.next().await,
        Err(StreamError::MalformedEvent { .. })
    ));
}

#[tokio::test]
async fn test_openai_style_done_marker_is_malformed() {
    let mut stream = stream_of(lines(&[MESSAGE, "data: [DONE]\n"]));

    assert!(stream.next().await.unwrap().is_some());
    assert!(matches!(
        stream.next().await,
        Err(StreamError::MalformedEvent { .. })
    ));
}

#[tokio::test]
async fn test_payload_decode_error() {
    let mut stream = stream_of(lines(&[
        "data: {\"event\":\"agent_thought\",\"task_id\":\"t1\",\"position\":\"first\"}\n",
    ]));

    let err = stream.next().await.unwrap_err();
    match err {
        StreamError::PayloadDecode { event, raw, source } => {
            assert_eq!(event, "agent_thought");
            assert!(raw.starts_with("{\"event\":\"agent_thought\""));
            assert!(source.is_data());
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(stream.is_closed());
}

#[tokio::test]
async fn test_transport_error_mid_stream() {
    let mut stream = stream_of(vec![
        Ok(Bytes::from_static(MESSAGE.as_bytes())),
        Ok(Bytes::from_static(b"data: {\"event\":\"mess")),
        Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        )),
    ]);

    assert!(stream.next().await.unwrap().is_some());

    let err = stream.next().await.unwrap_err();
    assert!(matches!(err, StreamError::Transport(_)));
    assert!(!err.is_unexpected_eof());
    assert!(err.to_string().contains("connection reset by peer"));
    assert!(matches!(stream.next().await, Err(StreamError::Closed)));
}

#[tokio::test]
async fn test_early_eof_is_transport_error() {
    let mut stream = stream_of(lines(&[MESSAGE, "data: {\"event\":\"ping\"}\n"]));

    assert!(stream.next().await.unwrap().is_some());
    let err = stream.next().await.unwrap_err();
    assert!(err.is_unexpected_eof());
    assert!(err.to_string().starts_with("Transport error"));
}

#[tokio::test]
async fn test_empty_body_is_transport_error() {
    let mut stream = stream_of(Vec::new());
    assert!(stream.next().await.unwrap_err().is_unexpected_eof());
}

#[tokio::test]
async fn test_upstream_error_is_ordinary_data() {
    let mut stream = stream_of(lines(&[
        "data: {\"event\":\"error\",\"task_id\":\"t1\",\"message_id\":\"m1\",\"status\":400,\"code\":\"completion_request_error\",\"message\":\"quota exceeded\"}\n",
        END,
    ]));

    let event = stream.next().await.unwrap().unwrap();
    let EventPayload::Error(err) = &event.payload else {
        panic!("expected upstream error payload");
    };
    assert_eq!(err.status, 400);
    assert_eq!(err.code, "completion_request_error");

    // caller decides whether to stop; the stream itself keeps going
    assert!(stream.next().await.unwrap().unwrap().is_terminal());
    assert!(stream.next().await.unwrap().is_none());
}

#[tokio::test]
async fn test_line_limit_from_config() {
    let config = StreamConfig {
        initial_capacity: 16,
        max_line_bytes: 32,
    };
    let whole = "data: {\"event\":\"message\",\"answer\":\"0123456789012345678901234567890123456789\"}\n";
    let split = lines(&[
        "data: {\"event\":\"message\",\"answer\":\"",
        "0123456789012345678901234567890123456789",
        "\"}\n",
    ]);

    for chunks in [lines(&[whole]), split] {
        let mut stream = ChatStream::with_config(
            BodyStream::new(futures::stream::iter(chunks)),
            &config,
        );

        let err = stream.next().await.unwrap_err();
        assert!(matches!(err, StreamError::LineTooLong { limit: 32 }));
        assert!(stream.is_closed());
    }
}

#[test]
fn test_config_file_errors() {
    let err = StreamConfig::from_file("tests/fixtures/does-not-exist.toml").unwrap_err();
    assert!(matches!(err, StreamError::Config(_)));
    assert!(err.to_string().contains("Failed to read config file"));
}
