//! Per-case execution ledger: conversation messages, resolved tool calls and
//! running token usage. One executor writes it during the run; judges and
//! reporters read copies afterwards. A single lock guards all fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// One resolved tool invocation. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub parameters: serde_json::Value,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

/// Serializable snapshot of a finished (or in-flight) trace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceSnapshot {
    pub messages: Vec<Message>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub usage: TokenUsage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
}

#[derive(Debug)]
struct TraceInner {
    messages: Vec<Message>,
    tool_calls: Vec<ToolCallRecord>,
    usage: TokenUsage,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    duration_ms: u64,
}

/// Live trace handle. All accessors return independent copies; internal state
/// is never exposed by reference.
#[derive(Debug)]
pub struct Trace {
    inner: Mutex<TraceInner>,
}

impl Default for Trace {
    fn default() -> Self {
        Self::new()
    }
}

impl Trace {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TraceInner {
                messages: Vec::new(),
                tool_calls: Vec::new(),
                usage: TokenUsage::default(),
                started_at: Utc::now(),
                ended_at: None,
                duration_ms: 0,
            }),
        }
    }

    pub fn add_message(&self, role: &str, content: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.messages.push(Message {
            role: role.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub fn add_tool_call(&self, record: ToolCallRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner.tool_calls.push(record);
    }

    /// Accumulates token usage from one provider call into the running totals.
    pub fn add_usage(&self, input_tokens: u64, output_tokens: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.usage.input_tokens += input_tokens;
        inner.usage.output_tokens += output_tokens;
        inner.usage.total_tokens += input_tokens + output_tokens;
    }

    /// Stamps the end time and duration. Called once per case by the executor.
    pub fn finish(&self) {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        inner.duration_ms = (now - inner.started_at).num_milliseconds().max(0) as u64;
        inner.ended_at = Some(now);
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.lock().unwrap().messages.clone()
    }

    pub fn tool_calls(&self) -> Vec<ToolCallRecord> {
        self.inner.lock().unwrap().tool_calls.clone()
    }

    pub fn usage(&self) -> TokenUsage {
        self.inner.lock().unwrap().usage
    }

    pub fn snapshot(&self) -> TraceSnapshot {
        let inner = self.inner.lock().unwrap();
        TraceSnapshot {
            messages: inner.messages.clone(),
            tool_calls: inner.tool_calls.clone(),
            usage: inner.usage,
            started_at: Some(inner.started_at),
            ended_at: inner.ended_at,
            duration_ms: inner.duration_ms,
        }
    }
}
