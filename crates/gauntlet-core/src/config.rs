//! Top-level framework configuration loaded from YAML. Missing files fall
//! back to defaults; parse failures do not.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub model: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub providers: HashMap<String, ProviderConfig>,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub output_dir: String,
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            concurrency: 5,
            timeout_secs: 60,
            output_dir: "results/".to_string(),
            retry: RetryConfig::default(),
        }
    }
}

pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    let cfg: Config = serde_yaml::from_str(&raw)
        .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;
    Ok(cfg)
}

/// Loads config from `path`, returning defaults when the file is absent.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    load(path)
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errs = Vec::new();

        if self.concurrency < 1 {
            errs.push(format!("concurrency must be >= 1, got {}", self.concurrency));
        }
        if self.timeout_secs == 0 {
            errs.push("timeout_secs must be > 0".to_string());
        }
        if self.output_dir.is_empty() {
            errs.push("output_dir must not be empty".to_string());
        }
        for (name, p) in &self.providers {
            if p.model.is_empty() {
                errs.push(format!("provider \"{}\": model is required", name));
            }
            if p.api_key_env.is_empty() {
                errs.push(format!("provider \"{}\": api_key_env is required", name));
            }
        }

        if errs.is_empty() {
            Ok(())
        } else {
            Err(ConfigError(errs.join("; ")))
        }
    }

    /// Reads the named provider's API key from the environment variable its
    /// config points at.
    pub fn resolve_api_key(&self, provider_name: &str) -> Result<String, ConfigError> {
        let p = self.providers.get(provider_name).ok_or_else(|| {
            ConfigError(format!("provider \"{}\" not found in config", provider_name))
        })?;
        if p.api_key_env.is_empty() {
            return Err(ConfigError(format!(
                "provider \"{}\" has no api_key_env configured",
                provider_name
            )));
        }
        match std::env::var(&p.api_key_env) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(ConfigError(format!(
                "environment variable {} for provider \"{}\" is not set",
                p.api_key_env, provider_name
            ))),
        }
    }
}
