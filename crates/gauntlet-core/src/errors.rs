use serde::{Deserialize, Serialize};

/// Classification of a per-case failure. Mock resolution errors are absent
/// here on purpose: they never terminate a case, they are fed back into the
/// conversation as a tool result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunErrorKind {
    Setup,
    Provider,
    Timeout,
    LoopExhausted,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct RunError {
    pub kind: RunErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl RunError {
    pub fn new(kind: RunErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn setup(detail: impl Into<String>) -> Self {
        Self::new(RunErrorKind::Setup, detail)
    }

    pub fn provider_error(provider: &str, detail: impl Into<String>) -> Self {
        Self::new(
            RunErrorKind::Provider,
            format!("provider error: {}", detail.into()),
        )
        .with_provider(provider)
    }

    pub fn timeout(seconds: u64) -> Self {
        Self::new(
            RunErrorKind::Timeout,
            format!("case timed out after {}s", seconds),
        )
    }

    pub fn loop_exhausted(max_iterations: usize) -> Self {
        Self::new(
            RunErrorKind::LoopExhausted,
            format!("max iterations exceeded ({} tool loop rounds)", max_iterations),
        )
    }
}

/// Errors returned by the mock resolver. These are deliberately fail-closed:
/// a tool without a mock never falls through to a real system.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MockError {
    #[error("no mock configured for tool \"{0}\"")]
    NotConfigured(String),
    #[error("mock for tool \"{0}\": sequential responses exhausted and no default_response configured")]
    Exhausted(String),
    #[error("mock error for tool \"{0}\": {1}")]
    Simulated(String, String),
}

#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(pub String);
