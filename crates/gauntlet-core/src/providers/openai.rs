//! OpenAI Chat Completions client. Tool-call arguments travel as JSON
//! strings on the wire; they are decoded into structured parameters here so
//! the engine only ever sees the shared model.

use super::{Provider, Request, Response, ToolCallRequest, Usage};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 500;

pub struct OpenAIProvider {
    api_key: String,
    base_url: String,
    max_retries: u32,
    client: reqwest::Client,
}

enum CallError {
    Retryable(anyhow::Error),
    Fatal(anyhow::Error),
}

impl OpenAIProvider {
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
        if !req.system.is_empty() {
            messages.push(json!({"role": "system", "content": req.system}));
        }
        for m in &req.messages {
            let mut msg = json!({"role": m.role, "content": m.content});
            if !m.tool_calls.is_empty() {
                let calls: Vec<Value> = m
                    .tool_calls
                    .iter()
                    .map(|tc| {
                        json!({
                            "id": tc.id,
                            "type": "function",
                            "function": {
                                "name": tc.name,
                                "arguments": tc.parameters.to_string(),
                            }
                        })
                    })
                    .collect();
                msg["tool_calls"] = json!(calls);
            }
            if let Some(id) = &m.tool_call_id {
                msg["tool_call_id"] = json!(id);
            }
            messages.push(msg);
        }

        let mut body = json!({"model": req.model, "messages": messages});
        if let Some(t) = req.temperature {
            body["temperature"] = json!(t);
        }
        if let Some(mt) = req.max_tokens {
            body["max_tokens"] = json!(mt);
        }
        if !req.tools.is_empty() {
            let tools: Vec<Value> = req
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
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
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| CallError::Retryable(anyhow::anyhow!("openai request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let err = anyhow::anyhow!("openai API error (status {status}): {text}");
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(CallError::Retryable(err));
            }
            return Err(CallError::Fatal(err));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| CallError::Fatal(anyhow::anyhow!("openai response decode: {e}")))?;
        Ok(parse_response(&json))
    }
}

fn parse_response(json: &Value) -> Response {
    let message = json.pointer("/choices/0/message").cloned().unwrap_or(json!({}));

    let mut tool_calls = Vec::new();
    if let Some(calls) = message.get("tool_calls").and_then(|c| c.as_array()) {
        for call in calls {
            let arguments = call
                .pointer("/function/arguments")
                .and_then(|a| a.as_str())
                .unwrap_or("{}");
            tool_calls.push(ToolCallRequest {
                id: call
                    .get("id")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                name: call
                    .pointer("/function/name")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                parameters: serde_json::from_str(arguments).unwrap_or(json!({})),
            });
        }
    }

    Response {
        content: message
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        tool_calls,
        usage: Usage {
            input_tokens: json
                .pointer("/usage/prompt_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0),
            output_tokens: json
                .pointer("/usage/completion_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0),
        },
        stop_reason: json
            .pointer("/choices/0/finish_reason")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    async fn complete(&self, req: &Request) -> anyhow::Result<Response> {
        let body = self.build_body(req);

        let mut last_err = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = BASE_BACKOFF_MS * (1u64 << (attempt - 1));
                tracing::debug!(attempt, backoff_ms = backoff, "retrying openai call");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }
            match self.do_request(&body).await {
                Ok(resp) => return Ok(resp),
                Err(CallError::Fatal(e)) => return Err(e),
                Err(CallError::Retryable(e)) => last_err = Some(e),
            }
        }

        Err(anyhow::anyhow!(
            "openai API request failed after {} attempts: {}",
            self.max_retries + 1,
            last_err.unwrap_or_else(|| anyhow::anyhow!("unknown error"))
        ))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tool_calls_with_string_arguments() {
        let json = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "search", "arguments": "{\"q\": \"rust\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 7, "completion_tokens": 3}
        });

        let resp = parse_response(&json);
        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(resp.tool_calls[0].parameters, json!({"q": "rust"}));
        assert_eq!(resp.usage.output_tokens, 3);
        assert_eq!(resp.stop_reason, "tool_calls");
    }

    #[test]
    fn malformed_arguments_decode_to_empty_object() {
        let json = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "id": "call_1",
                        "function": {"name": "search", "arguments": "not json"}
                    }]
                }
            }]
        });

        let resp = parse_response(&json);
        assert_eq!(resp.tool_calls[0].parameters, json!({}));
    }
}
