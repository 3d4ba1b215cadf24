//! Persisted run results: scored cases, aggregate statistics, and the JSON
//! files the diff and review commands consume.

use crate::engine::RunResult;
use crate::errors::ConfigError;
use crate::judge::{self, CompositeScorer, JudgeInput, JudgeScore, JudgeStatus};
use crate::suite::EvalSuite;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level structure persisted to JSON for each run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub suite_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub stats: Stats,
    pub results: Vec<ScoredCase>,
}

/// Aggregate statistics for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total_cases: usize,
    pub passed_cases: usize,
    pub failed_cases: usize,
    pub errored_cases: usize,
    pub review_cases: usize,
    /// Passed over non-errored; errored cases say nothing about quality.
    pub pass_rate: f64,
    pub avg_score: f64,
    pub latency_p50_ms: u64,
    pub latency_p95_ms: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
}

/// Per-case entry in the persisted output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCase {
    pub case_id: String,
    pub case_name: String,
    pub prompt: String,
    pub model: String,
    pub final_response: String,
    pub score: f64,
    pub status: JudgeStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub judge_scores: Vec<JudgeScore>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl ScoredCase {
    pub fn passed(&self) -> bool {
        self.status == JudgeStatus::Pass
    }
}

/// Converts a raw run into a summary without applying judges. Errored cases
/// carry `error` status; everything else is left at `fail` with a zero score
/// until scoring runs.
pub fn from_run_result(rr: &RunResult) -> RunSummary {
    let results = rr
        .cases
        .iter()
        .map(|cr| {
            let status = if cr.error.is_some() {
                JudgeStatus::Error
            } else {
                JudgeStatus::Fail
            };
            ScoredCase {
                case_id: cr.case_id.clone(),
                case_name: cr.case_name.clone(),
                prompt: cr.prompt.clone(),
                model: cr.model.clone(),
                final_response: cr.final_response.clone(),
                score: 0.0,
                status,
                judge_scores: Vec::new(),
                reason: String::new(),
                error: cr.error.as_ref().map(|e| e.to_string()),
                duration_ms: cr.duration_ms,
                input_tokens: cr.trace.usage.input_tokens,
                output_tokens: cr.trace.usage.output_tokens,
            }
        })
        .collect::<Vec<_>>();

    RunSummary {
        run_id: run_id(&rr.suite_name, rr.started_at),
        suite_name: rr.suite_name.clone(),
        started_at: rr.started_at,
        ended_at: rr.ended_at,
        duration_ms: rr.duration_ms,
        stats: compute_stats(&results),
        results,
    }
}

/// Applies each case's judges to a finished run and produces the scored
/// summary. Cases that errored during execution are not judged.
pub async fn score_run(
    rr: &RunResult,
    suite: &EvalSuite,
    scorer: &CompositeScorer,
) -> Result<RunSummary, ConfigError> {
    let mut summary = from_run_result(rr);

    for (scored, cr) in summary.results.iter_mut().zip(&rr.cases) {
        if scored.status == JudgeStatus::Error {
            continue;
        }

        let case = suite
            .cases
            .iter()
            .find(|c| c.name == cr.case_name)
            .ok_or_else(|| {
                ConfigError(format!("case \"{}\" not found in suite", cr.case_name))
            })?;

        let configs = case
            .judges
            .iter()
            .map(judge::from_spec)
            .collect::<Result<Vec<_>, _>>()?;

        let input = JudgeInput {
            output: cr.final_response.clone(),
            expected_output: case.expected_output.clone(),
            tool_calls: cr.trace.tool_calls.clone(),
        };

        let composite = scorer.score(&input, &configs).await;
        scored.score = composite.composite_score;
        scored.status = composite.status;
        scored.judge_scores = composite.scores;
        scored.reason = composite.reason;
    }

    summary.stats = compute_stats(&summary.results);
    Ok(summary)
}

/// Recomputes aggregate statistics from scored cases.
pub fn compute_stats(results: &[ScoredCase]) -> Stats {
    let mut s = Stats {
        total_cases: results.len(),
        ..Default::default()
    };
    if results.is_empty() {
        return s;
    }

    let mut total_score = 0.0;
    let mut durations: Vec<u64> = Vec::with_capacity(results.len());

    for r in results {
        match r.status {
            JudgeStatus::Pass => s.passed_cases += 1,
            JudgeStatus::Fail => s.failed_cases += 1,
            JudgeStatus::Review => s.review_cases += 1,
            JudgeStatus::Error => s.errored_cases += 1,
        }
        total_score += r.score;
        durations.push(r.duration_ms);
        s.total_input_tokens += r.input_tokens;
        s.total_output_tokens += r.output_tokens;
    }

    let non_errored = s.total_cases - s.errored_cases;
    if non_errored > 0 {
        s.pass_rate = s.passed_cases as f64 / non_errored as f64;
    }
    s.avg_score = total_score / s.total_cases as f64;

    durations.sort_unstable();
    s.latency_p50_ms = percentile(&durations, 0.5);
    s.latency_p95_ms = percentile(&durations, 0.95);

    s
}

/// Value at percentile `p` (0.0-1.0) from a sorted slice, with linear
/// interpolation between neighbors.
fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = p * (sorted.len() - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    if lower == upper || upper >= sorted.len() {
        return sorted[lower];
    }
    let frac = idx - lower as f64;
    (sorted[lower] as f64 * (1.0 - frac) + sorted[upper] as f64 * frac).round() as u64
}

fn run_id(suite_name: &str, started_at: DateTime<Utc>) -> String {
    format!("{}-{}", started_at.format("%Y%m%d-%H%M%S"), suite_name)
}

/// Default output file path for a run.
pub fn default_path(output_dir: &str, suite_name: &str, started_at: DateTime<Utc>) -> PathBuf {
    Path::new(output_dir).join(format!(
        "{}-{}.json",
        started_at.format("%Y%m%d-%H%M%S"),
        suite_name
    ))
}

impl RunSummary {
    /// Writes the summary as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating result directory {}", dir.display()))?;
        }
        let data = serde_json::to_vec_pretty(self).context("serializing result")?;
        std::fs::write(path, data)
            .with_context(|| format!("writing result to {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("reading result file {}", path.display()))?;
        serde_json::from_slice(&data)
            .with_context(|| format!("parsing result file {}", path.display()))
    }
}
