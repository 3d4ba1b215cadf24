//! Model-graded evaluation: a judge model scores the agent's output against
//! a rubric on a 1-5 scale which is normalized into `[0, 1]`.

use super::{truncate, Judge, JudgeInput, JudgeVerdict};
use crate::providers::{ChatMessage, Provider, Request, Usage};
use anyhow::{bail, Context};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::{Mutex, OnceLock};

const JUDGE_SYSTEM_PROMPT: &str = r#"You are an expert evaluator grading an AI agent's output. You will be given:
1. The original input/question
2. The agent's output
3. A rubric describing how to evaluate

Grade the output on a scale of 1-5:
  1 = Completely wrong or irrelevant
  2 = Mostly wrong with minor correct elements
  3 = Partially correct but significant issues
  4 = Mostly correct with minor issues
  5 = Fully correct and complete

You MUST respond with ONLY a JSON object in this exact format, no other text:
{"score": <1-5>, "pass": <true/false>, "reasoning": "<your explanation>"}

Set "pass" to true if score >= 4, false otherwise."#;

fn score_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([1-5])\b").unwrap())
}

/// Grades outputs by calling a judge model with a rubric.
pub struct LlmJudge {
    provider: Box<dyn Provider>,
    model: String,
    rubric: String,
    // Judge token spend, tracked separately from the agent's own usage.
    usage: Mutex<Usage>,
}

impl LlmJudge {
    pub fn new(provider: Box<dyn Provider>, model: impl Into<String>, rubric: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            rubric: rubric.into(),
            usage: Mutex::new(Usage::default()),
        }
    }

    /// Accumulated token usage from judge calls.
    pub fn usage(&self) -> Usage {
        *self.usage.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl Judge for LlmJudge {
    async fn evaluate(&self, input: &JudgeInput) -> anyhow::Result<JudgeVerdict> {
        let req = Request {
            model: self.model.clone(),
            system: JUDGE_SYSTEM_PROMPT.to_string(),
            messages: vec![ChatMessage::user(build_judge_prompt(&self.rubric, input))],
            tools: Vec::new(),
            temperature: None,
            max_tokens: Some(1024),
        };

        let resp = self
            .provider
            .complete(&req)
            .await
            .context("llm judge call failed")?;

        {
            let mut usage = self.usage.lock().unwrap_or_else(|p| p.into_inner());
            usage.input_tokens += resp.usage.input_tokens;
            usage.output_tokens += resp.usage.output_tokens;
        }

        parse_judge_response(&resp.content).context("parsing judge response")
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

fn build_judge_prompt(rubric: &str, input: &JudgeInput) -> String {
    let mut b = String::new();

    if !input.expected_output.is_empty() {
        b.push_str("## Expected Output\n");
        b.push_str(&input.expected_output);
        b.push_str("\n\n");
    }

    b.push_str("## Agent Output\n");
    b.push_str(&input.output);
    b.push_str("\n\n");

    if !input.tool_calls.is_empty() {
        b.push_str("## Tool Calls Made\n");
        for (i, tc) in input.tool_calls.iter().enumerate() {
            let params = serde_json::to_string(&tc.parameters).unwrap_or_default();
            let _ = writeln!(b, "{}. {}({})", i + 1, tc.tool_name, params);
        }
        b.push('\n');
    }

    b.push_str("## Rubric\n");
    b.push_str(rubric);

    b
}

#[derive(Debug, Deserialize)]
struct JudgeOutput {
    #[serde(default)]
    score: i64,
    #[serde(default)]
    pass: bool,
    #[serde(default)]
    reasoning: String,
}

impl JudgeOutput {
    fn to_verdict(&self) -> Option<JudgeVerdict> {
        if (1..=5).contains(&self.score) {
            Some(JudgeVerdict {
                pass: self.pass,
                score: self.score as f64 / 5.0,
                reason: self.reasoning.clone(),
            })
        } else {
            None
        }
    }
}

/// Parses the judge model's reply. Tries strict JSON first, then JSON
/// embedded in surrounding text or code fences, then a bare 1-5 digit.
fn parse_judge_response(content: &str) -> anyhow::Result<JudgeVerdict> {
    let content = content.trim();

    if let Ok(out) = serde_json::from_str::<JudgeOutput>(content) {
        if let Some(v) = out.to_verdict() {
            return Ok(v);
        }
    }

    if let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) {
        if end > start {
            if let Ok(out) = serde_json::from_str::<JudgeOutput>(&content[start..=end]) {
                if let Some(v) = out.to_verdict() {
                    return Ok(v);
                }
            }
        }
    }

    if let Some(caps) = score_pattern().captures(content) {
        let score: i64 = caps[1].parse().unwrap_or(0);
        return Ok(JudgeVerdict {
            pass: score >= 4,
            score: score as f64 / 5.0,
            reason: format!(
                "score extracted from text (malformed JSON): {}",
                truncate(content, 200)
            ),
        });
    }

    bail!("could not parse judge response: {}", truncate(content, 200))
}
