//! Wire types for the chat backend.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::options::ModelOptions;

/// Body of `POST /chat/completion`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// The user's message
    pub message: String,

    pub model: String,

    pub temperature: f32,

    pub max_tokens: u32,

    /// Ask the backend for an SSE body instead of a single JSON object
    pub stream: bool,
}

impl From<(&str, &ModelOptions, bool)> for ChatRequest {
    fn from((message, model_options, stream): (&str, &ModelOptions, bool)) -> Self {
        Self {
            message: message.to_string(),
            model: model_options.model.clone(),
            temperature: model_options.temperature,
            max_tokens: model_options.max_tokens,
            stream,
        }
    }
}

/// Complete (non-streamed) reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub response: String,
}

/// JSON payload of one `data:` frame.
///
/// Unknown fields are ignored; a missing `content` carries no text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StreamPayload {
    #[serde(default)]
    pub content: Option<String>,
}

impl StreamPayload {
    /// Parse one frame payload, which must be a JSON object.
    ///
    /// Arrays and scalars are rejected even where serde's struct
    /// deserializer would accept them. Repeated keys resolve to the last value.
    pub fn parse(data: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str::<Value>(data)? {
            object @ Value::Object(_) => serde_json::from_value(object),
            other => Err(serde_json::Error::custom(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// One entry of `GET /chat/models`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelList {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

/// Error body returned by the backend on non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
