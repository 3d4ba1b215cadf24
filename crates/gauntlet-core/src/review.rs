//! Interactive grading of run results. Cases are presented one at a time;
//! a grade of `pass`, `fail`, `1`-`5` or `skip` is read per case and stats
//! are recomputed afterwards.

use crate::judge::{truncate, JudgeStatus};
use crate::result::{self, RunSummary, ScoredCase};
use std::io::{BufRead, Write};

/// Which cases are surfaced for review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewFilter {
    /// Only cases the judges flagged for human review.
    #[default]
    Review,
    /// Failed cases, review-flagged included.
    Fail,
    All,
}

impl ReviewFilter {
    /// Lenient parse; anything unrecognized falls back to `Review`.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "fail" | "failed" => ReviewFilter::Fail,
            "all" => ReviewFilter::All,
            _ => ReviewFilter::Review,
        }
    }

    fn matches(&self, cr: &ScoredCase) -> bool {
        match self {
            ReviewFilter::Review => cr.status == JudgeStatus::Review,
            ReviewFilter::Fail => {
                cr.status == JudgeStatus::Fail || cr.status == JudgeStatus::Review
            }
            ReviewFilter::All => true,
        }
    }
}

/// Drives an interactive review session over the given reader/writer pair.
pub struct Reviewer<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Reviewer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Presents filtered cases for grading, applies grades in place, and
    /// recomputes stats. Returns the number of cases actually graded.
    pub fn review(
        &mut self,
        summary: &mut RunSummary,
        filter: ReviewFilter,
    ) -> anyhow::Result<usize> {
        let indices: Vec<usize> = summary
            .results
            .iter()
            .enumerate()
            .filter(|(_, cr)| filter.matches(cr))
            .map(|(i, _)| i)
            .collect();

        if indices.is_empty() {
            writeln!(self.output, "No cases match filter {:?}.", filter)?;
            return Ok(0);
        }

        let mut reviewed = 0;
        for (shown, &idx) in indices.iter().enumerate() {
            {
                let cr = &summary.results[idx];
                writeln!(
                    self.output,
                    "\n--- Case {} of {} ---",
                    shown + 1,
                    indices.len()
                )?;
                print_case(&mut self.output, cr)?;
                write!(self.output, "\nGrade [pass/fail/1-5/skip]: ")?;
                self.output.flush()?;
            }

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let grade = line.trim().to_ascii_lowercase();

            if grade.is_empty() || grade == "skip" || grade == "s" {
                writeln!(self.output, "  Skipped.")?;
                continue;
            }

            let cr = &mut summary.results[idx];
            if !apply_grade(cr, &grade) {
                writeln!(self.output, "  Unrecognized grade {:?}; skipped.", grade)?;
                continue;
            }
            reviewed += 1;
            writeln!(
                self.output,
                "  Graded: status={} score={:.1}",
                cr.status.as_str(),
                cr.score
            )?;
        }

        summary.stats = result::compute_stats(&summary.results);
        Ok(reviewed)
    }
}

fn print_case(w: &mut impl Write, cr: &ScoredCase) -> std::io::Result<()> {
    writeln!(w, "Name:     {}", cr.case_name)?;
    writeln!(w, "Status:   {}", cr.status.as_str())?;
    if !cr.prompt.is_empty() {
        writeln!(w, "Prompt:   {}", truncate(&cr.prompt, 200))?;
    }
    writeln!(w, "Output:   {}", truncate(&cr.final_response, 500))?;
    if let Some(err) = &cr.error {
        writeln!(w, "Error:    {}", err)?;
    }
    Ok(())
}

/// Applies one grade to a case. `1`-`5` maps to `n/5`, passing at 4 and
/// above. Returns false (case untouched) for unrecognized input.
fn apply_grade(cr: &mut ScoredCase, grade: &str) -> bool {
    match grade {
        "pass" | "p" => {
            cr.status = JudgeStatus::Pass;
            cr.score = 1.0;
            true
        }
        "fail" | "f" => {
            cr.status = JudgeStatus::Fail;
            cr.score = 0.0;
            true
        }
        other => {
            let Ok(score) = other.parse::<u32>() else {
                return false;
            };
            if !(1..=5).contains(&score) {
                return false;
            }
            cr.score = f64::from(score) / 5.0;
            cr.status = if score >= 4 {
                JudgeStatus::Pass
            } else {
                JudgeStatus::Fail
            };
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::compute_stats;
    use chrono::Utc;

    fn case(name: &str, status: JudgeStatus, response: &str) -> ScoredCase {
        ScoredCase {
            case_id: String::new(),
            case_name: name.to_string(),
            prompt: "default".to_string(),
            model: "m".to_string(),
            final_response: response.to_string(),
            score: if status == JudgeStatus::Pass { 1.0 } else { 0.0 },
            status,
            judge_scores: Vec::new(),
            reason: String::new(),
            error: None,
            duration_ms: 1,
            input_tokens: 0,
            output_tokens: 0,
        }
    }

    fn summary() -> RunSummary {
        let now = Utc::now();
        let results = vec![
            case("case-pass", JudgeStatus::Pass, "correct answer"),
            case("case-review", JudgeStatus::Review, "needs human check"),
            case("case-fail", JudgeStatus::Fail, "wrong answer"),
            case("case-review2", JudgeStatus::Review, "another review"),
        ];
        RunSummary {
            run_id: "r".to_string(),
            suite_name: "test-suite".to_string(),
            started_at: now,
            ended_at: now,
            duration_ms: 1,
            stats: compute_stats(&results),
            results,
        }
    }

    fn run(input: &str, filter: ReviewFilter) -> (RunSummary, usize) {
        let mut s = summary();
        let mut reviewer = Reviewer::new(input.as_bytes(), Vec::new());
        let reviewed = reviewer.review(&mut s, filter).unwrap();
        (s, reviewed)
    }

    #[test]
    fn review_filter_only_shows_flagged_cases() {
        let (s, reviewed) = run("pass\nfail\n", ReviewFilter::Review);
        assert_eq!(reviewed, 2);
        assert_eq!(s.results[1].status, JudgeStatus::Pass);
        assert_eq!(s.results[1].score, 1.0);
        assert_eq!(s.results[3].status, JudgeStatus::Fail);
        // Untouched cases keep their status.
        assert_eq!(s.results[0].status, JudgeStatus::Pass);
        assert_eq!(s.results[2].status, JudgeStatus::Fail);
    }

    #[test]
    fn numeric_grades_map_to_fifths() {
        let (s, reviewed) = run("4\n2\n", ReviewFilter::Review);
        assert_eq!(reviewed, 2);
        assert_eq!(s.results[1].score, 0.8);
        assert_eq!(s.results[1].status, JudgeStatus::Pass);
        assert_eq!(s.results[3].score, 0.4);
        assert_eq!(s.results[3].status, JudgeStatus::Fail);
    }

    #[test]
    fn skip_leaves_case_unreviewed() {
        let (s, reviewed) = run("skip\npass\n", ReviewFilter::Review);
        assert_eq!(reviewed, 1);
        assert_eq!(s.results[1].status, JudgeStatus::Review);
        assert_eq!(s.results[3].status, JudgeStatus::Pass);
    }

    #[test]
    fn exhausted_input_stops_the_session() {
        let (s, reviewed) = run("pass\n", ReviewFilter::Review);
        assert_eq!(reviewed, 1);
        assert_eq!(s.results[3].status, JudgeStatus::Review);
    }

    #[test]
    fn stats_recompute_after_grading() {
        let (s, _) = run("pass\npass\n", ReviewFilter::Review);
        assert_eq!(s.stats.passed_cases, 3);
        assert_eq!(s.stats.review_cases, 0);
    }

    #[test]
    fn fail_filter_includes_reviews() {
        let (_, reviewed) = run("pass\npass\npass\n", ReviewFilter::Fail);
        assert_eq!(reviewed, 3);
    }

    #[test]
    fn unrecognized_grade_does_not_count() {
        let (s, reviewed) = run("7\nbanana\n", ReviewFilter::Review);
        assert_eq!(reviewed, 0);
        assert_eq!(s.results[1].status, JudgeStatus::Review);
        assert_eq!(s.results[3].status, JudgeStatus::Review);
    }

    #[test]
    fn filter_parse_defaults_to_review() {
        assert_eq!(ReviewFilter::parse("fail"), ReviewFilter::Fail);
        assert_eq!(ReviewFilter::parse("FAILED"), ReviewFilter::Fail);
        assert_eq!(ReviewFilter::parse("all"), ReviewFilter::All);
        assert_eq!(ReviewFilter::parse("whatever"), ReviewFilter::Review);
    }
}
