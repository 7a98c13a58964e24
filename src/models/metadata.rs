use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Billing and retrieval metadata attached to `message_end`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    #[serde(deserialize_with = "null_as_default")]
    pub usage: Usage,

    /// Knowledge-base segments the answer was grounded on
    #[serde(deserialize_with = "null_as_default")]
    pub retriever_resources: Vec<RetrieverResource>,
}

/// Token usage and pricing for one answer
///
/// Prices arrive as decimal strings (e.g. `"0.0010"`) and are kept verbatim
/// so no precision is lost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub prompt_tokens: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub prompt_unit_price: String,
    #[serde(deserialize_with = "null_as_default")]
    pub prompt_price_unit: String,
    #[serde(deserialize_with = "null_as_default")]
    pub prompt_price: String,

    pub completion_tokens: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub completion_unit_price: String,
    #[serde(deserialize_with = "null_as_default")]
    pub completion_price_unit: String,
    #[serde(deserialize_with = "null_as_default")]
    pub completion_price: String,

    pub total_tokens: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_price: String,
    #[serde(deserialize_with = "null_as_default")]
    pub currency: String,

    /// Seconds
    pub latency: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverResource {
    pub position: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub dataset_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub dataset_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub document_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub document_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub segment_id: String,
    pub score: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
}
