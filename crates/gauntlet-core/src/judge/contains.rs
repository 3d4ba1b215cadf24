use super::{Judge, JudgeInput, JudgeVerdict};
use async_trait::async_trait;

/// Passes when the output contains a configured substring.
pub struct ContainsJudge {
    pub needle: String,
}

#[async_trait]
impl Judge for ContainsJudge {
    async fn evaluate(&self, input: &JudgeInput) -> anyhow::Result<JudgeVerdict> {
        if input.output.contains(&self.needle) {
            Ok(JudgeVerdict::pass(format!(
                "output contains {:?}",
                self.needle
            )))
        } else {
            Ok(JudgeVerdict::fail(format!(
                "output does not contain {:?}",
                self.needle
            )))
        }
    }

    fn name(&self) -> &'static str {
        "contains"
    }
}
