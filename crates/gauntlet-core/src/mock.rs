//! Deterministic tool-call simulation. Each tool name maps to an ordered list
//! of one-shot responses plus an optional default used once the list runs
//! out. Every resolution is recorded in an append-only call log.

use crate::errors::MockError;
use crate::trace::ToolCallRecord;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// One mock response. A non-empty `error` surfaces as a call failure instead
/// of return content; a non-zero `delay_ms` blocks the call before returning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockResponse {
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub delay_ms: u64,
}

impl MockResponse {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockConfig {
    pub tool_name: String,
    #[serde(default)]
    pub responses: Vec<MockResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_response: Option<MockResponse>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    mocks: HashMap<String, MockConfig>,
    cursors: HashMap<String, usize>,
    calls: Vec<ToolCallRecord>,
}

/// Per-case mock state. A registry is normally scoped to one case but all
/// methods stay safe under concurrent use; one lock guards every field.
#[derive(Debug, Default)]
pub struct MockRegistry {
    inner: Mutex<RegistryInner>,
}

impl MockRegistry {
    pub fn new(configs: &[MockConfig]) -> Self {
        let mut mocks = HashMap::new();
        for c in configs {
            mocks.insert(c.tool_name.clone(), c.clone());
        }
        Self {
            inner: Mutex::new(RegistryInner {
                mocks,
                cursors: HashMap::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// Adds or replaces the mock config for a tool.
    pub fn register(&self, config: MockConfig) {
        let mut inner = self.inner.lock().unwrap();
        inner.mocks.insert(config.tool_name.clone(), config);
    }

    /// Simulates one tool call. Advances the per-tool cursor through the
    /// one-shot list, then falls back to the default response. Fails closed
    /// when no mock exists so an unmocked case can never reach a real system.
    pub async fn resolve(
        &self,
        tool_name: &str,
        parameters: &serde_json::Value,
    ) -> Result<String, MockError> {
        let started_at = Utc::now();
        let start = Instant::now();

        // Select the response under the lock, then release before sleeping.
        let selected: Result<MockResponse, MockError> = {
            let mut inner = self.inner.lock().unwrap();
            match inner.mocks.get(tool_name).cloned() {
                None => Err(MockError::NotConfigured(tool_name.to_string())),
                Some(cfg) => {
                    let idx = inner.cursors.get(tool_name).copied().unwrap_or(0);
                    if idx < cfg.responses.len() {
                        inner.cursors.insert(tool_name.to_string(), idx + 1);
                        Ok(cfg.responses[idx].clone())
                    } else if let Some(default) = cfg.default_response {
                        Ok(default)
                    } else {
                        Err(MockError::Exhausted(tool_name.to_string()))
                    }
                }
            }
        };

        let outcome = match selected {
            Ok(resp) => {
                if resp.delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(resp.delay_ms)).await;
                }
                match resp.error {
                    Some(message) => Err(MockError::Simulated(tool_name.to_string(), message)),
                    None => Ok(resp.content),
                }
            }
            Err(e) => Err(e),
        };

        let record = ToolCallRecord {
            tool_name: tool_name.to_string(),
            parameters: parameters.clone(),
            response: outcome.clone().unwrap_or_default(),
            error: outcome.as_ref().err().map(|e| e.to_string()),
            started_at,
            ended_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        self.inner.lock().unwrap().calls.push(record);

        outcome
    }

    /// Returns a copy of every recorded call, in resolution order.
    pub fn calls(&self) -> Vec<ToolCallRecord> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Returns recorded calls filtered to one tool name.
    pub fn calls_for_tool(&self, tool_name: &str) -> Vec<ToolCallRecord> {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.tool_name == tool_name)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sequenced(tool: &str, responses: &[&str], default: Option<&str>) -> MockRegistry {
        MockRegistry::new(&[MockConfig {
            tool_name: tool.to_string(),
            responses: responses.iter().map(|r| MockResponse::content(*r)).collect(),
            default_response: default.map(MockResponse::content),
        }])
    }

    #[tokio::test]
    async fn sequential_responses_then_exhausted() {
        let reg = sequenced("search", &["r1", "r2", "r3"], None);
        let params = json!({});

        assert_eq!(reg.resolve("search", &params).await.unwrap(), "r1");
        assert_eq!(reg.resolve("search", &params).await.unwrap(), "r2");
        assert_eq!(reg.resolve("search", &params).await.unwrap(), "r3");

        let err = reg.resolve("search", &params).await.unwrap_err();
        assert!(matches!(err, MockError::Exhausted(_)));
    }

    #[tokio::test]
    async fn default_response_after_sequence() {
        let reg = sequenced("search", &["r1"], Some("d"));
        let params = json!({});

        assert_eq!(reg.resolve("search", &params).await.unwrap(), "r1");
        assert_eq!(reg.resolve("search", &params).await.unwrap(), "d");
        assert_eq!(reg.resolve("search", &params).await.unwrap(), "d");
    }

    #[tokio::test]
    async fn unmocked_tool_fails_closed() {
        let reg = MockRegistry::new(&[]);
        let err = reg.resolve("shell", &json!({})).await.unwrap_err();
        assert!(matches!(err, MockError::NotConfigured(_)));
        // The failed call still lands in the log.
        assert_eq!(reg.calls().len(), 1);
        assert!(reg.calls()[0].error.is_some());
    }

    #[tokio::test]
    async fn configured_error_surfaces_as_failure() {
        let reg = MockRegistry::new(&[MockConfig {
            tool_name: "flaky".into(),
            responses: vec![MockResponse::failure("connection refused")],
            default_response: None,
        }]);

        let err = reg.resolve("flaky", &json!({})).await.unwrap_err();
        assert!(matches!(err, MockError::Simulated(_, _)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn delay_blocks_before_returning() {
        let reg = MockRegistry::new(&[MockConfig {
            tool_name: "slow".into(),
            responses: vec![MockResponse {
                content: "ok".into(),
                error: None,
                delay_ms: 50,
            }],
            default_response: None,
        }]);

        let start = Instant::now();
        assert_eq!(reg.resolve("slow", &json!({})).await.unwrap(), "ok");
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn call_log_records_all_calls_in_order() {
        let reg = sequenced("a", &["1"], Some("d"));
        reg.register(MockConfig {
            tool_name: "b".into(),
            responses: vec![MockResponse::content("x")],
            default_response: None,
        });

        reg.resolve("a", &json!({"q": 1})).await.unwrap();
        reg.resolve("b", &json!({})).await.unwrap();
        reg.resolve("a", &json!({"q": 2})).await.unwrap();

        let all = reg.calls();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].tool_name, "a");
        assert_eq!(all[1].tool_name, "b");
        assert_eq!(all[2].tool_name, "a");

        let a_calls = reg.calls_for_tool("a");
        assert_eq!(a_calls.len(), 2);
        assert_eq!(a_calls[0].parameters, json!({"q": 1}));
        assert_eq!(a_calls[1].parameters, json!({"q": 2}));
    }
}
