//! Model provider interface and the request/response wire model shared by
//! all backends. Retry policy lives inside each concrete provider; the
//! engine treats any returned error as fatal to that call.

pub mod anthropic;
pub mod cost;
pub mod fake;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use cost::estimate_cost;
pub use fake::FakeProvider;
pub use openai::OpenAIProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Request {
    pub model: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub system: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            role: "tool".into(),
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Tool the model may invoke; `parameters` is a JSON Schema object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// One tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    pub usage: Usage,
    #[serde(default)]
    pub stop_reason: String,
}

impl Response {
    /// A plain text turn with the given usage.
    pub fn text(content: impl Into<String>, input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            usage: Usage {
                input_tokens,
                output_tokens,
            },
            stop_reason: "end_turn".into(),
        }
    }

    /// A turn requesting the given tool calls.
    pub fn tool_use(tool_calls: Vec<ToolCallRequest>, input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            content: String::new(),
            tool_calls,
            usage: Usage {
                input_tokens,
                output_tokens,
            },
            stop_reason: "tool_use".into(),
        }
    }
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// Sends one completion request. Any error is fatal to this call; retry
    /// policy, if any, is the provider's own concern.
    async fn complete(&self, req: &Request) -> anyhow::Result<Response>;

    /// Provider identifier, e.g. "anthropic".
    fn name(&self) -> &'static str;
}
