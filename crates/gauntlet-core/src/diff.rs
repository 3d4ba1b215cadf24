//! Run-to-run comparison: matches cases by name between two run summaries
//! and classifies each as improved, regressed, unchanged, new or removed.

use crate::result::{RunSummary, ScoredCase};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Improved,
    Regressed,
    Unchanged,
    New,
    Removed,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Improved => "improved",
            Category::Regressed => "regressed",
            Category::Unchanged => "unchanged",
            Category::New => "new",
            Category::Removed => "removed",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "improved" => Ok(Category::Improved),
            "regressed" => Ok(Category::Regressed),
            "unchanged" => Ok(Category::Unchanged),
            "new" => Ok(Category::New),
            "removed" => Ok(Category::Removed),
            other => Err(format!("unknown diff category \"{}\"", other)),
        }
    }
}

/// Comparison of a single case between two runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseDiff {
    pub case_name: String,
    pub category: Category,
    pub score_a: f64,
    pub score_b: f64,
    pub score_delta: f64,
    pub status_a: String,
    pub status_b: String,
}

/// Counts by category.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DiffSummary {
    pub improved: usize,
    pub regressed: usize,
    pub unchanged: usize,
    pub new: usize,
    pub removed: usize,
}

/// Full comparison between two runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffResult {
    pub run_a: String,
    pub run_b: String,
    pub cases: Vec<CaseDiff>,
    pub summary: DiffSummary,
}

/// Compares run `b` against baseline `a`. Cases are matched by name.
/// Score deltas within `threshold` (absolute) count as unchanged.
pub fn compare(a: &RunSummary, b: &RunSummary, threshold: f64) -> DiffResult {
    let mut dr = DiffResult {
        run_a: a.run_id.clone(),
        run_b: b.run_id.clone(),
        cases: Vec::with_capacity(b.results.len()),
        summary: DiffSummary::default(),
    };

    let a_by_name: HashMap<&str, &ScoredCase> = a
        .results
        .iter()
        .map(|cr| (cr.case_name.as_str(), cr))
        .collect();

    let mut seen: HashSet<&str> = HashSet::with_capacity(b.results.len());
    for cr_b in &b.results {
        seen.insert(cr_b.case_name.as_str());

        let mut cd = CaseDiff {
            case_name: cr_b.case_name.clone(),
            category: Category::New,
            score_a: 0.0,
            score_b: cr_b.score,
            score_delta: 0.0,
            status_a: String::new(),
            status_b: status_str(cr_b),
        };

        match a_by_name.get(cr_b.case_name.as_str()) {
            None => {
                dr.summary.new += 1;
            }
            Some(cr_a) => {
                cd.score_a = cr_a.score;
                cd.status_a = status_str(cr_a);
                cd.score_delta = cr_b.score - cr_a.score;

                cd.category = if cd.score_delta.abs() <= threshold {
                    dr.summary.unchanged += 1;
                    Category::Unchanged
                } else if cd.score_delta > 0.0 {
                    dr.summary.improved += 1;
                    Category::Improved
                } else {
                    dr.summary.regressed += 1;
                    Category::Regressed
                };
            }
        }

        dr.cases.push(cd);
    }

    // Cases present only in the baseline.
    for cr_a in &a.results {
        if !seen.contains(cr_a.case_name.as_str()) {
            dr.cases.push(CaseDiff {
                case_name: cr_a.case_name.clone(),
                category: Category::Removed,
                score_a: cr_a.score,
                score_b: 0.0,
                score_delta: 0.0,
                status_a: status_str(cr_a),
                status_b: String::new(),
            });
            dr.summary.removed += 1;
        }
    }

    dr
}

impl DiffResult {
    /// Restricts the diff to the given categories. An empty filter keeps
    /// everything. The summary keeps the full counts either way.
    pub fn filter(&self, categories: &[Category]) -> DiffResult {
        if categories.is_empty() {
            return self.clone();
        }
        let keep: HashSet<Category> = categories.iter().copied().collect();
        DiffResult {
            run_a: self.run_a.clone(),
            run_b: self.run_b.clone(),
            cases: self
                .cases
                .iter()
                .filter(|cd| keep.contains(&cd.category))
                .cloned()
                .collect(),
            summary: self.summary,
        }
    }

    /// True when any case regressed, for CI gating.
    pub fn has_regressions(&self) -> bool {
        self.summary.regressed > 0
    }
}

fn status_str(cr: &ScoredCase) -> String {
    cr.status.as_str().to_string()
}
