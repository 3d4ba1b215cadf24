//! Terminal output: summary and diff tables, verbose per-case dumps.

use crate::diff::{Category, DiffResult};
use crate::judge::JudgeStatus;
use crate::result::{RunSummary, ScoredCase};
use std::io::{self, Write};
use std::time::Duration;

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";

fn status_label(cr: &ScoredCase, color: bool) -> String {
    let label = match cr.status {
        JudgeStatus::Pass => "PASS",
        JudgeStatus::Fail => "FAIL",
        JudgeStatus::Review => "REVIEW",
        JudgeStatus::Error => "ERROR",
    };
    if !color {
        return label.to_string();
    }
    let paint = match cr.status {
        JudgeStatus::Pass => GREEN,
        JudgeStatus::Fail | JudgeStatus::Error => RED,
        JudgeStatus::Review => YELLOW,
    };
    format!("{}{}{}", paint, label, RESET)
}

/// Formats a duration for table display: `123us`, `45ms`, `1.2s`.
pub fn format_duration(d: Duration) -> String {
    if d < Duration::from_millis(1) {
        format!("{}us", d.as_micros())
    } else if d < Duration::from_secs(1) {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max.saturating_sub(3);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Writes the per-case summary table with aggregate footer.
pub fn print_summary_table(
    w: &mut dyn Write,
    summary: &RunSummary,
    color: bool,
) -> io::Result<()> {
    let sep = "-".repeat(78);
    writeln!(w, "{}", sep)?;
    writeln!(
        w,
        "  {:<30}  {:<7}  {:>8}  {:>8}",
        "CASE", "STATUS", "SCORE", "LATENCY"
    )?;
    writeln!(w, "{}", sep)?;

    for cr in &summary.results {
        writeln!(
            w,
            "  {:<30}  {:<7}  {:>8.2}  {:>8}",
            truncate(&cr.case_name, 30),
            status_label(cr, color),
            cr.score,
            format_duration(Duration::from_millis(cr.duration_ms))
        )?;
    }

    writeln!(w, "{}", sep)?;
    let s = &summary.stats;
    if color {
        writeln!(
            w,
            "  {}{} passed{}  {}{} failed{}  {}{} errored{}  {}{} review{}  | avg {:.2} | {} total",
            GREEN, s.passed_cases, RESET,
            RED, s.failed_cases, RESET,
            YELLOW, s.errored_cases, RESET,
            YELLOW, s.review_cases, RESET,
            s.avg_score,
            format_duration(Duration::from_millis(summary.duration_ms))
        )?;
    } else {
        writeln!(
            w,
            "  {} passed  {} failed  {} errored  {} review  | avg {:.2} | {} total",
            s.passed_cases,
            s.failed_cases,
            s.errored_cases,
            s.review_cases,
            s.avg_score,
            format_duration(Duration::from_millis(summary.duration_ms))
        )?;
    }
    writeln!(
        w,
        "  p50 {} | p95 {} | tokens: {} in / {} out",
        format_duration(Duration::from_millis(summary.stats.latency_p50_ms)),
        format_duration(Duration::from_millis(summary.stats.latency_p95_ms)),
        s.total_input_tokens,
        s.total_output_tokens
    )?;
    writeln!(w, "{}", sep)?;
    Ok(())
}

/// Summary table plus full per-case details, responses included.
pub fn print_verbose(w: &mut dyn Write, summary: &RunSummary, color: bool) -> io::Result<()> {
    print_summary_table(w, summary, color)?;

    writeln!(w, "\n--- Detailed Results ---\n")?;

    for cr in &summary.results {
        writeln!(w, "Case: {} [{}]", cr.case_name, status_label(cr, color))?;
        writeln!(w, "  ID:       {}", cr.case_id)?;
        writeln!(w, "  Prompt:   {}", cr.prompt)?;
        writeln!(w, "  Model:    {}", cr.model)?;
        writeln!(w, "  Score:    {:.2}", cr.score)?;
        writeln!(
            w,
            "  Latency:  {}",
            format_duration(Duration::from_millis(cr.duration_ms))
        )?;
        writeln!(
            w,
            "  Tokens:   {} in / {} out",
            cr.input_tokens, cr.output_tokens
        )?;

        if let Some(err) = &cr.error {
            writeln!(w, "  Error:    {}", err)?;
        }
        if !cr.reason.is_empty() {
            writeln!(w, "  Judges:   {}", cr.reason)?;
        }
        if !cr.final_response.is_empty() {
            writeln!(w, "  Response:")?;
            for line in cr.final_response.lines() {
                writeln!(w, "    {}", line)?;
            }
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Writes the run-to-run diff table.
pub fn print_diff_table(w: &mut dyn Write, dr: &DiffResult) -> io::Result<()> {
    let sep = "-".repeat(82);
    writeln!(w, "{}", sep)?;
    writeln!(
        w,
        "  {:<25}  {:<10}  {:>8}  {:>8}  {:>8}",
        "CASE", "CHANGE", "SCORE A", "SCORE B", "DELTA"
    )?;
    writeln!(w, "{}", sep)?;

    for cd in &dr.cases {
        let delta = match cd.category {
            Category::New => "new".to_string(),
            Category::Removed => "removed".to_string(),
            _ => format!("{:+.2}", cd.score_delta),
        };
        writeln!(
            w,
            "  {:<25}  {:<10}  {:>8.2}  {:>8.2}  {:>8}",
            truncate(&cd.case_name, 25),
            cd.category.as_str(),
            cd.score_a,
            cd.score_b,
            delta
        )?;
    }

    writeln!(w, "{}", sep)?;
    writeln!(
        w,
        "  {} improved  {} regressed  {} unchanged  {} new  {} removed",
        dr.summary.improved,
        dr.summary.regressed,
        dr.summary.unchanged,
        dr.summary.new,
        dr.summary.removed
    )?;
    writeln!(w, "{}", sep)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::compute_stats;
    use chrono::Utc;

    fn scored(name: &str, status: JudgeStatus, score: f64) -> ScoredCase {
        ScoredCase {
            case_id: "c1".to_string(),
            case_name: name.to_string(),
            prompt: "default".to_string(),
            model: "m".to_string(),
            final_response: "line one\nline two".to_string(),
            score,
            status,
            judge_scores: Vec::new(),
            reason: "contains: output contains \"x\" (score=1.00)".to_string(),
            error: None,
            duration_ms: 1234,
            input_tokens: 10,
            output_tokens: 5,
        }
    }

    fn summary() -> RunSummary {
        let now = Utc::now();
        let results = vec![
            scored("first-case", JudgeStatus::Pass, 1.0),
            scored("second-case", JudgeStatus::Fail, 0.25),
        ];
        RunSummary {
            run_id: "r".to_string(),
            suite_name: "s".to_string(),
            started_at: now,
            ended_at: now,
            duration_ms: 2500,
            stats: compute_stats(&results),
            results,
        }
    }

    #[test]
    fn format_duration_picks_sane_units() {
        assert_eq!(format_duration(Duration::from_micros(500)), "500us");
        assert_eq!(format_duration(Duration::from_millis(45)), "45ms");
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
    }

    #[test]
    fn summary_table_without_color_has_plain_labels() {
        let mut out = Vec::new();
        print_summary_table(&mut out, &summary(), false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("first-case"));
        assert!(text.contains("PASS"));
        assert!(text.contains("FAIL"));
        assert!(!text.contains("\x1b["));
        assert!(text.contains("1 passed  1 failed"));
        assert!(text.contains("tokens: 20 in / 10 out"));
    }

    #[test]
    fn colored_output_wraps_status_in_ansi() {
        let mut out = Vec::new();
        print_summary_table(&mut out, &summary(), true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\x1b[32mPASS\x1b[0m"));
        assert!(text.contains("\x1b[31mFAIL\x1b[0m"));
    }

    #[test]
    fn verbose_output_indents_the_response() {
        let mut out = Vec::new();
        print_verbose(&mut out, &summary(), false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("--- Detailed Results ---"));
        assert!(text.contains("    line one\n    line two"));
        assert!(text.contains("Judges:"));
    }

    #[test]
    fn diff_table_shows_deltas_and_markers() {
        use crate::diff::compare;

        let now = Utc::now();
        let mk = |run_id: &str, results: Vec<ScoredCase>| RunSummary {
            run_id: run_id.to_string(),
            suite_name: "s".to_string(),
            started_at: now,
            ended_at: now,
            duration_ms: 1,
            stats: compute_stats(&results),
            results,
        };
        let a = mk("a", vec![scored("steady", JudgeStatus::Pass, 0.5)]);
        let b = mk(
            "b",
            vec![
                scored("steady", JudgeStatus::Pass, 0.9),
                scored("fresh", JudgeStatus::Pass, 1.0),
            ],
        );

        let mut out = Vec::new();
        print_diff_table(&mut out, &compare(&a, &b, 0.05)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("+0.40"));
        assert!(text.contains("new"));
        assert!(text.contains("1 improved  0 regressed"));
    }
}
