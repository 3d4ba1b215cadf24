use super::{Judge, JudgeInput, JudgeVerdict};
use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;

/// Matches the output against a regular expression pattern.
pub struct RegexJudge {
    pub pattern: String,
}

#[async_trait]
impl Judge for RegexJudge {
    async fn evaluate(&self, input: &JudgeInput) -> anyhow::Result<JudgeVerdict> {
        let re = Regex::new(&self.pattern)
            .with_context(|| format!("invalid regex pattern {:?}", self.pattern))?;

        if re.is_match(&input.output) {
            Ok(JudgeVerdict::pass(format!(
                "output matches pattern {:?}",
                self.pattern
            )))
        } else {
            Ok(JudgeVerdict::fail(format!(
                "output does not match pattern {:?}",
                self.pattern
            )))
        }
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}
