//! # Dify Stream
//!
//! Incremental decoder for the Server-Sent-Event body returned by Dify's
//! streaming `chat-messages` endpoint.
//!
//! ## Overview
//!
//! A streaming chat response is a long-lived chunked body of lines like:
//!
//! ```text
//! data: {"event":"message","task_id":"t1","message_id":"m1","answer":"Hi"}
//! data: {"event":"ping"}
//! data: {"event":"message_end","task_id":"t1","message_id":"m1","metadata":{...}}
//! ```
//!
//! The crate handles:
//! - Reassembling lines split across arbitrary transport reads
//! - Filtering blank lines, comments and `ping` keep-alives
//! - Decoding each line into a typed [`ChatEvent`] selected by its kind tag
//! - Clean termination after `message_end`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dify_stream::{ChatStream, EventPayload};
//!
//! # async fn run(response: reqwest::Response) -> dify_stream::Result<()> {
//! let mut stream = ChatStream::new(response);
//! while let Some(event) = stream.next().await? {
//!     match &event.payload {
//!         EventPayload::Message(chunk) => print!("{}", chunk.answer),
//!         EventPayload::Error(err) => eprintln!("{}: {}", err.code, err.message),
//!         _ => {}
//!     }
//! }
//! stream.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Buffer sizing and limits
//! - [`error`] - Error types
//! - [`models`] - Event envelope and payload types
//! - [`source`] - Transport adapters
//! - [`streaming`] - Line framer, event decoder and stream cursor
//! - [`stats`] - Per-stream counters

pub mod config;
pub mod error;
pub mod models;
pub mod source;
pub mod stats;
pub mod streaming;

pub use config::StreamConfig;
pub use error::{Result, StreamError};
pub use models::{ChatEvent, EventKind, EventPayload};
pub use source::{BodyStream, ByteSource, ReaderSource};
pub use stats::StreamStats;
pub use streaming::{AnswerAccumulator, ChatStream};
