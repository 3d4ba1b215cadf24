//! Judges score an agent's output. Each judge looks at the final response
//! (and optionally the tool-call record) and produces a pass/fail verdict
//! with a score in `[0, 1]`.

use crate::errors::ConfigError;
use crate::suite::JudgeSpec;
use crate::trace::ToolCallRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod composite;
mod contains;
mod exact;
mod llm;
mod regex;
mod review;
mod schema;
mod toolcall;

pub use composite::{CompositeResult, CompositeScorer, JudgeScore, JudgeStatus};
pub use contains::ContainsJudge;
pub use exact::ExactJudge;
pub use llm::LlmJudge;
pub use regex::RegexJudge;
pub use review::HumanReviewJudge;
pub use schema::SchemaJudge;
pub use toolcall::{ExpectedToolCall, ParamMatchMode, ToolCallJudge};

/// Reserved reason string that routes a verdict to human review instead of
/// auto pass/fail.
pub const REVIEW_REASON: &str = "review";

/// Everything a judge may inspect about a finished case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JudgeInput {
    pub output: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expected_output: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,
}

/// A single judge's verdict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JudgeVerdict {
    pub pass: bool,
    pub score: f64,
    pub reason: String,
}

impl JudgeVerdict {
    pub fn pass(reason: impl Into<String>) -> Self {
        Self {
            pass: true,
            score: 1.0,
            reason: reason.into(),
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            pass: false,
            score: 0.0,
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait Judge: Send + Sync {
    /// Scores the agent's output.
    async fn evaluate(&self, input: &JudgeInput) -> anyhow::Result<JudgeVerdict>;

    /// The judge type identifier, as referenced in suite files.
    fn name(&self) -> &'static str;
}

/// Pairs a judge with its weight for composite scoring.
pub struct JudgeConfig {
    pub judge: Box<dyn Judge>,
    pub weight: f64,
}

impl JudgeConfig {
    pub fn new(judge: Box<dyn Judge>, weight: f64) -> Self {
        Self { judge, weight }
    }
}

impl std::fmt::Debug for JudgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgeConfig")
            .field("judge", &self.judge.name())
            .field("weight", &self.weight)
            .finish()
    }
}

/// Resolves a suite-level judge spec into a concrete judge instance.
///
/// The `llm` kind is not constructible here because it needs a live
/// provider; callers wire it separately.
pub fn from_spec(spec: &JudgeSpec) -> Result<JudgeConfig, ConfigError> {
    let judge: Box<dyn Judge> = match spec.kind.as_str() {
        "exact" => Box::new(ExactJudge {
            normalize_whitespace: spec
                .value
                .get("normalize_whitespace")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        }),
        "contains" => {
            let needle = spec
                .value
                .as_str()
                .map(str::to_string)
                .or_else(|| spec.value.get("value").and_then(|v| v.as_str()).map(str::to_string))
                .ok_or_else(|| {
                    ConfigError("contains judge requires a string value".to_string())
                })?;
            Box::new(ContainsJudge { needle })
        }
        "regex" => {
            let pattern = spec
                .value
                .as_str()
                .map(str::to_string)
                .or_else(|| {
                    spec.value
                        .get("pattern")
                        .and_then(|v| v.as_str())
                        .map(str::to_string)
                })
                .ok_or_else(|| ConfigError("regex judge requires a pattern".to_string()))?;
            Box::new(RegexJudge { pattern })
        }
        "schema" => {
            let schema = spec
                .value
                .get("schema")
                .cloned()
                .unwrap_or_else(|| spec.value.clone());
            Box::new(SchemaJudge { schema })
        }
        "toolcall" => {
            let expected: Vec<ExpectedToolCall> = serde_json::from_value(
                spec.value
                    .get("expected")
                    .cloned()
                    .unwrap_or_else(|| spec.value.clone()),
            )
            .map_err(|e| ConfigError(format!("invalid toolcall expectations: {}", e)))?;
            Box::new(ToolCallJudge { expected })
        }
        "human_review" => Box::new(HumanReviewJudge),
        other => {
            return Err(ConfigError(format!("unknown judge type \"{}\"", other)));
        }
    };

    Ok(JudgeConfig::new(judge, spec.weight))
}

pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_spec_resolves_known_kinds() {
        let specs = [
            ("exact", json!({"normalize_whitespace": true})),
            ("contains", json!("hello")),
            ("regex", json!(r"\d+")),
            ("schema", json!({"type": "object"})),
            ("toolcall", json!({"expected": [{"tool_name": "search"}]})),
            ("human_review", json!(null)),
        ];
        for (kind, value) in specs {
            let spec = JudgeSpec {
                kind: kind.to_string(),
                value,
                weight: 1.0,
                comment: String::new(),
            };
            let cfg = from_spec(&spec).unwrap();
            assert_eq!(cfg.judge.name(), kind, "kind {}", kind);
        }
    }

    #[test]
    fn from_spec_rejects_unknown_kind() {
        let spec = JudgeSpec {
            kind: "vibes".to_string(),
            value: json!(null),
            weight: 1.0,
            comment: String::new(),
        };
        let err = from_spec(&spec).unwrap_err();
        assert!(err.to_string().contains("unknown judge type"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 100), "short");
        let t = truncate("aaaaaaaaaa", 4);
        assert_eq!(t, "aaaa...");
    }
}
