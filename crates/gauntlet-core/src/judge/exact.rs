use super::{truncate, Judge, JudgeInput, JudgeVerdict};
use async_trait::async_trait;

/// Compares the output against the expected string.
pub struct ExactJudge {
    /// When set, leading/trailing whitespace is trimmed and internal runs of
    /// whitespace collapse to single spaces before comparing.
    pub normalize_whitespace: bool,
}

#[async_trait]
impl Judge for ExactJudge {
    async fn evaluate(&self, input: &JudgeInput) -> anyhow::Result<JudgeVerdict> {
        let (got, want) = if self.normalize_whitespace {
            (
                normalize_whitespace(&input.output),
                normalize_whitespace(&input.expected_output),
            )
        } else {
            (input.output.clone(), input.expected_output.clone())
        };

        if got == want {
            Ok(JudgeVerdict::pass("output matches expected"))
        } else {
            Ok(JudgeVerdict::fail(format!(
                "output does not match expected: got {:?}, want {:?}",
                truncate(&got, 100),
                truncate(&want, 100)
            )))
        }
    }

    fn name(&self) -> &'static str {
        "exact"
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
