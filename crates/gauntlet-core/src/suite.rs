//! Eval suite files: a named collection of cases with per-case input
//! variables, mock configuration and judges. Suite-level defaults are merged
//! into cases that do not declare their own.

use crate::mock::MockConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One judge reference in suite YAML; resolved to a concrete judge at
/// scoring time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JudgeSpec {
    #[serde(rename = "type")]
    pub kind: String,
    /// Judge-specific configuration. Simple judges take a bare string here;
    /// structured judges (schema, toolcall) take a mapping.
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalCase {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub input: serde_json::Map<String, Value>,
    #[serde(default)]
    pub mocks: Vec<MockConfig>,
    #[serde(default)]
    pub judges: Vec<JudgeSpec>,
    #[serde(default)]
    pub expected_output: String,
    #[serde(default)]
    pub expected_tools: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Overrides the run-wide default when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalSuite {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Name of the prompt variant this suite runs against.
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub default_judges: Vec<JudgeSpec>,
    #[serde(default)]
    pub default_mocks: Vec<MockConfig>,
    #[serde(default)]
    pub cases: Vec<EvalCase>,
}

pub fn load(path: &Path) -> anyhow::Result<EvalSuite> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading suite file {}: {}", path.display(), e))?;
    let mut s: EvalSuite = serde_yaml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("parsing suite file {}: {}", path.display(), e))?;
    s.apply_defaults();
    Ok(s)
}

/// Loads every .yaml/.yml file in `dir` as an eval suite.
pub fn load_dir(dir: &Path) -> anyhow::Result<Vec<EvalSuite>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| anyhow::anyhow!("reading suite directory {}: {}", dir.display(), e))?;

    let mut suites = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            continue;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => suites.push(load(&path)?),
            _ => {}
        }
    }
    Ok(suites)
}

impl EvalSuite {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.is_empty() {
            anyhow::bail!("suite name is required");
        }
        if self.cases.is_empty() {
            anyhow::bail!("suite \"{}\" must have at least one case", self.name);
        }
        for (i, c) in self.cases.iter().enumerate() {
            if c.name.is_empty() {
                anyhow::bail!("suite \"{}\": case {} has no name", self.name, i);
            }
        }
        Ok(())
    }

    /// Returns a suite containing only cases carrying at least one of the
    /// given tags. An empty tag list returns all cases.
    pub fn filter_by_tags(&self, tags: &[String]) -> EvalSuite {
        if tags.is_empty() {
            return self.clone();
        }
        let mut filtered = EvalSuite {
            cases: Vec::new(),
            ..self.clone()
        };
        for c in &self.cases {
            if c.tags.iter().any(|t| tags.contains(t)) {
                filtered.cases.push(c.clone());
            }
        }
        filtered
    }

    fn apply_defaults(&mut self) {
        for c in &mut self.cases {
            if c.judges.is_empty() && !self.default_judges.is_empty() {
                c.judges = self.default_judges.clone();
            }
            if c.mocks.is_empty() && !self.default_mocks.is_empty() {
                c.mocks = self.default_mocks.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUITE_YAML: &str = r#"
name: search-suite
description: exercises the search tool
prompt: default
default_judges:
  - type: contains
    value: "found"
    weight: 1.0
default_mocks:
  - tool_name: search
    responses:
      - content: "result one"
cases:
  - name: uses-defaults
    input:
      question: "find rust docs"
  - name: has-own-judges
    input:
      question: "find go docs"
    judges:
      - type: regex
        value: "docs"
    mocks:
      - tool_name: search
        default_response:
          content: "override"
    tags: [regex]
"#;

    fn write_suite(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("suite.yaml");
        std::fs::write(&path, SUITE_YAML).unwrap();
        path
    }

    #[test]
    fn defaults_merge_only_into_unset_cases() {
        let dir = tempfile::tempdir().unwrap();
        let s = load(&write_suite(&dir)).unwrap();

        assert_eq!(s.cases[0].judges.len(), 1);
        assert_eq!(s.cases[0].judges[0].kind, "contains");
        assert_eq!(s.cases[0].mocks[0].responses.len(), 1);

        assert_eq!(s.cases[1].judges[0].kind, "regex");
        assert!(s.cases[1].mocks[0].default_response.is_some());
    }

    #[test]
    fn tag_filter_subsets_cases() {
        let dir = tempfile::tempdir().unwrap();
        let s = load(&write_suite(&dir)).unwrap();

        let filtered = s.filter_by_tags(&["regex".to_string()]);
        assert_eq!(filtered.cases.len(), 1);
        assert_eq!(filtered.cases[0].name, "has-own-judges");

        let all = s.filter_by_tags(&[]);
        assert_eq!(all.cases.len(), 2);
    }

    #[test]
    fn validate_rejects_empty_and_unnamed() {
        let empty = EvalSuite {
            name: "x".into(),
            ..Default::default()
        };
        assert!(empty.validate().is_err());

        let unnamed = EvalSuite {
            name: "x".into(),
            cases: vec![EvalCase::default()],
            ..Default::default()
        };
        assert!(unnamed.validate().is_err());
    }
}
