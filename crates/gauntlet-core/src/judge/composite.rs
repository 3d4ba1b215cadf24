//! Combines multiple judge verdicts into a single weighted score and an
//! overall status. Error outranks review, review outranks the pass
//! threshold.

use super::{JudgeConfig, JudgeInput, REVIEW_REASON};
use serde::{Deserialize, Serialize};

/// Overall evaluation status for a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeStatus {
    Pass,
    Fail,
    Review,
    Error,
}

impl JudgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JudgeStatus::Pass => "pass",
            JudgeStatus::Fail => "fail",
            JudgeStatus::Review => "review",
            JudgeStatus::Error => "error",
        }
    }
}

/// A single judge's contribution to the composite score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeScore {
    pub judge_name: String,
    pub pass: bool,
    pub score: f64,
    pub weight: f64,
    pub reason: String,
    pub status: JudgeStatus,
}

/// The aggregated scoring result from all judges on one case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeResult {
    pub status: JudgeStatus,
    pub composite_score: f64,
    pub pass: bool,
    pub scores: Vec<JudgeScore>,
    pub reason: String,
}

/// Weighted-average scorer over a set of judges.
pub struct CompositeScorer {
    pub threshold: f64,
}

impl CompositeScorer {
    /// A zero threshold falls back to 0.5.
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold == 0.0 { 0.5 } else { threshold };
        Self { threshold }
    }

    /// Runs every judge and folds the verdicts into a composite. Judge
    /// weights default to 1.0 when unset; an erroring judge contributes no
    /// weight but forces the overall status to `error`.
    pub async fn score(&self, input: &JudgeInput, configs: &[JudgeConfig]) -> CompositeResult {
        let mut scores = Vec::with_capacity(configs.len());
        let mut total_weight = 0.0;
        let mut weighted_sum = 0.0;
        let mut has_review = false;
        let mut has_error = false;
        let mut reasons = Vec::with_capacity(configs.len());

        for cfg in configs {
            let weight = if cfg.weight == 0.0 { 1.0 } else { cfg.weight };
            let name = cfg.judge.name();

            match cfg.judge.evaluate(input).await {
                Err(e) => {
                    has_error = true;
                    reasons.push(format!("{}: error: {:#}", name, e));
                    scores.push(JudgeScore {
                        judge_name: name.to_string(),
                        pass: false,
                        score: 0.0,
                        weight,
                        reason: format!("{:#}", e),
                        status: JudgeStatus::Error,
                    });
                }
                Ok(verdict) => {
                    let status = if verdict.reason == REVIEW_REASON {
                        has_review = true;
                        JudgeStatus::Review
                    } else if verdict.pass {
                        JudgeStatus::Pass
                    } else {
                        JudgeStatus::Fail
                    };

                    weighted_sum += verdict.score * weight;
                    total_weight += weight;
                    reasons.push(format!(
                        "{}: {} (score={:.2})",
                        name, verdict.reason, verdict.score
                    ));
                    scores.push(JudgeScore {
                        judge_name: name.to_string(),
                        pass: verdict.pass,
                        score: verdict.score,
                        weight,
                        reason: verdict.reason,
                        status,
                    });
                }
            }
        }

        let composite = if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            0.0
        };

        let mut pass = composite >= self.threshold;
        let status = if has_error {
            pass = false;
            JudgeStatus::Error
        } else if has_review {
            pass = false;
            JudgeStatus::Review
        } else if pass {
            JudgeStatus::Pass
        } else {
            JudgeStatus::Fail
        };

        CompositeResult {
            status,
            composite_score: composite,
            pass,
            scores,
            reason: reasons.join("; "),
        }
    }
}
