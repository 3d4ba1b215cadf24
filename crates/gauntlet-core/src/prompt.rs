//! Prompt variants loaded from YAML: a system/user template pair plus the
//! tool definitions offered to the model. `{{var}}` placeholders are filled
//! from case input variables; referencing a missing variable is an error so
//! a typo'd case fails loudly instead of sending a half-rendered prompt.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the tool's parameters.
    #[serde(default)]
    pub parameters: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptVariant {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

pub fn load(path: &Path) -> anyhow::Result<PromptVariant> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading prompt file {}: {}", path.display(), e))?;
    let p: PromptVariant = serde_yaml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("parsing prompt file {}: {}", path.display(), e))?;
    Ok(p)
}

/// Loads every .yaml/.yml file in `dir` as a prompt variant.
pub fn load_dir(dir: &Path) -> anyhow::Result<Vec<PromptVariant>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| anyhow::anyhow!("reading prompt directory {}: {}", dir.display(), e))?;

    let mut prompts = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            continue;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => prompts.push(load(&path)?),
            _ => {}
        }
    }
    Ok(prompts)
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap())
}

fn render(template: &str, vars: &serde_json::Map<String, Value>) -> anyhow::Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in placeholder_re().captures_iter(template) {
        let whole = caps.get(0).unwrap();
        let name = &caps[1];
        let value = vars
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("template references undefined variable \"{name}\""))?;
        out.push_str(&template[last..whole.start()]);
        match value {
            Value::String(s) => out.push_str(s),
            other => out.push_str(&other.to_string()),
        }
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

impl PromptVariant {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.is_empty() {
            anyhow::bail!("prompt name is required");
        }
        if self.system.is_empty() && self.user.is_empty() {
            anyhow::bail!(
                "prompt \"{}\" must have at least a system or user prompt",
                self.name
            );
        }
        Ok(())
    }

    /// Renders system and user templates with the given variables, returning
    /// a new variant; the original is untouched.
    pub fn interpolate(&self, vars: &serde_json::Map<String, Value>) -> anyhow::Result<Self> {
        let system = render(&self.system, vars)
            .map_err(|e| anyhow::anyhow!("interpolating system prompt for \"{}\": {e}", self.name))?;
        let user = render(&self.user, vars)
            .map_err(|e| anyhow::anyhow!("interpolating user prompt for \"{}\": {e}", self.name))?;

        Ok(Self {
            system,
            user,
            ..self.clone()
        })
    }
}
