pub mod event;
pub mod metadata;

pub use event::{
    AgentThought, ChatEvent, EventKind, EventPayload, MessageChunk, MessageEnd, MessageFile,
    MessageReplace, UpstreamError,
};
pub use metadata::{Metadata, RetrieverResource, Usage};

use serde::{Deserialize, Deserializer};

/// Treat an explicit JSON `null` the same as a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
