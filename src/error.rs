use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Malformed event ({reason}): {raw}")]
    MalformedEvent { reason: String, raw: String },

    #[error("Failed to decode {event} payload: {source} - raw: {raw}")]
    PayloadDecode {
        event: String,
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Line exceeds {limit} bytes without a delimiter")]
    LineTooLong { limit: usize },

    #[error("Stream is closed")]
    Closed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl StreamError {
    /// Body ended before the terminal event arrived.
    pub(crate) fn unexpected_eof(buffered: usize) -> Self {
        let message = if buffered == 0 {
            "stream ended before message_end".to_string()
        } else {
            format!("stream ended before message_end with {buffered} bytes of partial line")
        };
        StreamError::Transport(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            message,
        ))
    }

    /// Whether this is an unexpected end of the body rather than a read failure.
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, StreamError::Transport(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
