use super::{Judge, JudgeInput, JudgeVerdict, REVIEW_REASON};
use async_trait::async_trait;

/// Marks cases for human review instead of auto-grading. Always emits the
/// reserved review reason, which the composite scorer turns into a `review`
/// status so the review command can present these cases for manual grading.
#[derive(Default)]
pub struct HumanReviewJudge;

#[async_trait]
impl Judge for HumanReviewJudge {
    async fn evaluate(&self, _input: &JudgeInput) -> anyhow::Result<JudgeVerdict> {
        Ok(JudgeVerdict {
            pass: false,
            score: 0.0,
            reason: REVIEW_REASON.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "human_review"
    }
}
