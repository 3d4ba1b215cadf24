use super::{Judge, JudgeInput, JudgeVerdict};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How expected tool-call parameters are matched against actual ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamMatchMode {
    /// Every expected key must be present with the same value; extra actual
    /// keys are allowed.
    #[default]
    Subset,
    /// Expected and actual maps must be identical.
    Exact,
}

/// One tool-call assertion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectedToolCall {
    pub tool_name: String,
    #[serde(default)]
    pub parameters: serde_json::Map<String, Value>,
    /// When set, asserts the tool was NOT called at all.
    #[serde(default)]
    pub negate: bool,
    #[serde(default)]
    pub match_mode: ParamMatchMode,
}

/// Asserts that expected tool calls happened in order (and that negated
/// ones never happened).
pub struct ToolCallJudge {
    pub expected: Vec<ExpectedToolCall>,
}

#[async_trait]
impl Judge for ToolCallJudge {
    async fn evaluate(&self, input: &JudgeInput) -> anyhow::Result<JudgeVerdict> {
        let mut failures = Vec::new();

        let (negatives, positives): (Vec<_>, Vec<_>) =
            self.expected.iter().partition(|e| e.negate);

        for neg in &negatives {
            if input
                .tool_calls
                .iter()
                .any(|c| c.tool_name == neg.tool_name)
            {
                failures.push(format!(
                    "tool {:?} was called but should not have been",
                    neg.tool_name
                ));
            }
        }

        // Positive assertions consume the actual call sequence in order.
        let mut call_idx = 0;
        for exp in &positives {
            let mut found = false;
            while call_idx < input.tool_calls.len() {
                let call = &input.tool_calls[call_idx];
                call_idx += 1;
                if call.tool_name == exp.tool_name
                    && params_match(&exp.parameters, &call.parameters, exp.match_mode)
                {
                    found = true;
                    break;
                }
            }
            if !found {
                failures.push(format!(
                    "expected tool call {:?} not found in sequence",
                    exp.tool_name
                ));
            }
        }

        if failures.is_empty() {
            Ok(JudgeVerdict::pass("all tool call assertions passed"))
        } else {
            Ok(JudgeVerdict::fail(failures.join("; ")))
        }
    }

    fn name(&self) -> &'static str {
        "toolcall"
    }
}

fn params_match(
    expected: &serde_json::Map<String, Value>,
    actual: &Value,
    mode: ParamMatchMode,
) -> bool {
    if expected.is_empty() {
        return true;
    }
    let Some(actual) = actual.as_object() else {
        return false;
    };

    match mode {
        ParamMatchMode::Exact => {
            expected.len() == actual.len()
                && expected.iter().all(|(k, v)| actual.get(k) == Some(v))
        }
        ParamMatchMode::Subset => expected.iter().all(|(k, v)| actual.get(k) == Some(v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::ToolCallRecord;
    use serde_json::json;

    fn call(name: &str, params: Value) -> ToolCallRecord {
        let now = chrono::Utc::now();
        ToolCallRecord {
            tool_name: name.to_string(),
            parameters: params,
            response: String::new(),
            error: None,
            started_at: now,
            ended_at: now,
            duration_ms: 0,
        }
    }

    fn input(calls: Vec<ToolCallRecord>) -> JudgeInput {
        JudgeInput {
            tool_calls: calls,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn ordered_positive_assertions() {
        let j = ToolCallJudge {
            expected: vec![
                ExpectedToolCall {
                    tool_name: "search".into(),
                    ..Default::default()
                },
                ExpectedToolCall {
                    tool_name: "fetch".into(),
                    ..Default::default()
                },
            ],
        };

        let ordered = input(vec![
            call("search", json!({})),
            call("fetch", json!({})),
        ]);
        assert!(j.evaluate(&ordered).await.unwrap().pass);

        // Out of order fails: "search" consumes past "fetch".
        let reversed = input(vec![
            call("fetch", json!({})),
            call("search", json!({})),
        ]);
        let v = j.evaluate(&reversed).await.unwrap();
        assert!(!v.pass);
        assert!(v.reason.contains("fetch"));
    }

    #[tokio::test]
    async fn subset_vs_exact_param_matching() {
        let actual = input(vec![call("search", json!({"q": "rust", "limit": 5}))]);

        let subset = ToolCallJudge {
            expected: vec![ExpectedToolCall {
                tool_name: "search".into(),
                parameters: json!({"q": "rust"}).as_object().unwrap().clone(),
                ..Default::default()
            }],
        };
        assert!(subset.evaluate(&actual).await.unwrap().pass);

        let exact = ToolCallJudge {
            expected: vec![ExpectedToolCall {
                tool_name: "search".into(),
                parameters: json!({"q": "rust"}).as_object().unwrap().clone(),
                match_mode: ParamMatchMode::Exact,
                ..Default::default()
            }],
        };
        assert!(!exact.evaluate(&actual).await.unwrap().pass);
    }

    #[tokio::test]
    async fn negated_assertion_fires_on_call() {
        let j = ToolCallJudge {
            expected: vec![ExpectedToolCall {
                tool_name: "delete".into(),
                negate: true,
                ..Default::default()
            }],
        };

        let clean = input(vec![call("search", json!({}))]);
        assert!(j.evaluate(&clean).await.unwrap().pass);

        let dirty = input(vec![call("delete", json!({}))]);
        let v = j.evaluate(&dirty).await.unwrap();
        assert!(!v.pass);
        assert!(v.reason.contains("should not have been"));
    }
}
