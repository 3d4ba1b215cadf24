//! Anthropic Messages API client. Transient failures (429, 5xx, transport)
//! are retried with exponential backoff inside the provider; the engine
//! never sees a retry.

use super::{Provider, Request, Response, ToolCallRequest, Usage};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 500;

pub struct AnthropicProvider {
    api_key: String,
    base_url: String,
    max_retries: u32,
    client: reqwest::Client,
}

enum CallError {
    Retryable(anyhow::Error),
    Fatal(anyhow::Error),
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn build_body(&self, req: &Request) -> Value {
        let mut messages = Vec::new();
        for m in &req.messages {
            match m.role.as_str() {
                "tool" => {
                    // Tool results travel as user-role tool_result blocks.
                    messages.push(json!({
                        "role": "user",
                        "content": [{
                            "type": "tool_result",
                            "tool_use_id": m.tool_call_id.clone().unwrap_or_default(),
                            "content": m.content,
                        }]
                    }));
                }
                "assistant" if !m.tool_calls.is_empty() => {
                    let mut blocks = Vec::new();
                    if !m.content.is_empty() {
                        blocks.push(json!({"type": "text", "text": m.content}));
                    }
                    for tc in &m.tool_calls {
                        blocks.push(json!({
                            "type": "tool_use",
                            "id": tc.id,
                            "name": tc.name,
                            "input": tc.parameters,
                        }));
                    }
                    messages.push(json!({"role": "assistant", "content": blocks}));
                }
                role => {
                    messages.push(json!({"role": role, "content": m.content}));
                }
            }
        }

        let mut body = json!({
            "model": req.model,
            "max_tokens": req.max_tokens.unwrap_or(4096),
            "messages": messages,
        });
        if !req.system.is_empty() {
            body["system"] = json!(req.system);
        }
        if let Some(t) = req.temperature {
            body["temperature"] = json!(t);
        }
        if !req.tools.is_empty() {
            let tools: Vec<Value> = req
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": t.parameters,
                    })
                })
                .collect();
            body["tools"] = json!(tools);
        }
        body
    }

    async fn do_request(&self, body: &Value) -> Result<Response, CallError> {
        let resp = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| CallError::Retryable(anyhow::anyhow!("anthropic request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let err = anyhow::anyhow!("anthropic API error (status {status}): {text}");
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(CallError::Retryable(err));
            }
            return Err(CallError::Fatal(err));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| CallError::Fatal(anyhow::anyhow!("anthropic response decode: {e}")))?;
        Ok(parse_response(&json))
    }
}

fn parse_response(json: &Value) -> Response {
    let mut content = String::new();
    let mut tool_calls = Vec::new();

    if let Some(blocks) = json.get("content").and_then(|c| c.as_array()) {
        for block in blocks {
            match block.get("type").and_then(|t| t.as_str()) {
                Some("text") => {
                    content.push_str(block.get("text").and_then(|t| t.as_str()).unwrap_or(""));
                }
                Some("tool_use") => {
                    tool_calls.push(ToolCallRequest {
                        id: block
                            .get("id")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                        name: block
                            .get("name")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                        parameters: block.get("input").cloned().unwrap_or(json!({})),
                    });
                }
                _ => {}
            }
        }
    }

    Response {
        content,
        tool_calls,
        usage: Usage {
            input_tokens: json
                .pointer("/usage/input_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0),
            output_tokens: json
                .pointer("/usage/output_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0),
        },
        stop_reason: json
            .get("stop_reason")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn complete(&self, req: &Request) -> anyhow::Result<Response> {
        let body = self.build_body(req);

        let mut last_err = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = BASE_BACKOFF_MS * (1u64 << (attempt - 1));
                tracing::debug!(attempt, backoff_ms = backoff, "retrying anthropic call");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }
            match self.do_request(&body).await {
                Ok(resp) => return Ok(resp),
                Err(CallError::Fatal(e)) => return Err(e),
                Err(CallError::Retryable(e)) => last_err = Some(e),
            }
        }

        Err(anyhow::anyhow!(
            "anthropic API request failed after {} attempts: {}",
            self.max_retries + 1,
            last_err.unwrap_or_else(|| anyhow::anyhow!("unknown error"))
        ))
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ChatMessage, ToolSchema};

    #[test]
    fn tool_results_become_user_tool_result_blocks() {
        let provider = AnthropicProvider::new("test-key".into());
        let req = Request {
            model: "claude-sonnet-4-5".into(),
            system: "be brief".into(),
            messages: vec![
                ChatMessage::user("what is 2+2?"),
                ChatMessage::assistant(
                    "",
                    vec![ToolCallRequest {
                        id: "tc_1".into(),
                        name: "calculator".into(),
                        parameters: json!({"expr": "2+2"}),
                    }],
                ),
                ChatMessage::tool("4", "tc_1"),
            ],
            tools: vec![ToolSchema {
                name: "calculator".into(),
                description: "evaluates arithmetic".into(),
                parameters: json!({"type": "object"}),
            }],
            temperature: None,
            max_tokens: None,
        };

        let body = provider.build_body(&req);
        assert_eq!(body["system"], json!("be brief"));
        assert_eq!(body["max_tokens"], json!(4096));
        assert_eq!(body["messages"][1]["content"][0]["type"], json!("tool_use"));
        assert_eq!(body["messages"][2]["role"], json!("user"));
        assert_eq!(
            body["messages"][2]["content"][0]["type"],
            json!("tool_result")
        );
        assert_eq!(body["tools"][0]["input_schema"]["type"], json!("object"));
    }

    #[test]
    fn parses_text_and_tool_use_blocks() {
        let json = json!({
            "content": [
                {"type": "text", "text": "let me check"},
                {"type": "tool_use", "id": "tc_9", "name": "search", "input": {"q": "rust"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 12, "output_tokens": 34}
        });

        let resp = parse_response(&json);
        assert_eq!(resp.content, "let me check");
        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(resp.tool_calls[0].name, "search");
        assert_eq!(resp.usage.input_tokens, 12);
        assert_eq!(resp.stop_reason, "tool_use");
    }
}
