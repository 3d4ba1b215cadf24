//! Suite execution: a bounded-concurrency runner that drives each case
//! through the agent tool-call loop against a provider, with mocked tools.

use crate::errors::RunError;
use crate::mock::MockRegistry;
use crate::prompt::PromptVariant;
use crate::providers::{ChatMessage, Provider, Request, ToolSchema};
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::suite::{EvalCase, EvalSuite};
use crate::trace::{ToolCallRecord, Trace, TraceSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// Maximum tool-call round-trips per case. Guarantees termination even when
/// a model keeps requesting tools.
pub const MAX_TOOL_LOOP_ITERATIONS: usize = 20;

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub concurrency: usize,
    /// Run-wide per-case timeout; cases may override it.
    pub timeout_secs: u64,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            timeout_secs: 60,
            model: String::new(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Output of running a single case, judging not yet applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub case_id: String,
    pub case_name: String,
    /// Name of the prompt variant the case ran against.
    pub prompt: String,
    pub model: String,
    pub final_response: String,
    pub trace: TraceSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RunError>,
    pub duration_ms: u64,
}

/// Output of an entire suite run, cases in suite order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub suite_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub cases: Vec<CaseResult>,
}

/// Drives suite execution with bounded concurrency and per-case timeouts.
pub struct Runner {
    cfg: RunnerConfig,
}

impl Runner {
    pub fn new(mut cfg: RunnerConfig) -> Self {
        if cfg.concurrency < 1 {
            cfg.concurrency = 1;
        }
        if cfg.timeout_secs == 0 {
            cfg.timeout_secs = 60;
        }
        Self { cfg }
    }

    /// Runs every case in the suite against the given prompt variant and
    /// provider. Case failures are recorded on their own results and never
    /// abort sibling cases; results come back in suite order regardless of
    /// completion order.
    pub async fn run(
        &self,
        suite: &EvalSuite,
        variant: &PromptVariant,
        provider: Arc<dyn Provider>,
        progress: Option<ProgressSink>,
    ) -> RunResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let total = suite.cases.len();

        let semaphore = Arc::new(Semaphore::new(self.cfg.concurrency));
        let mut join_set = JoinSet::new();

        for (idx, case) in suite.cases.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let provider = Arc::clone(&provider);
            let variant = variant.clone();
            let cfg = self.cfg.clone();

            join_set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            idx,
                            errored_result(&case, &variant, &cfg, RunError::setup("runner shut down")),
                        );
                    }
                };
                debug!(case = %case.name, "case started");
                (idx, run_case(&cfg, &case, &variant, provider.as_ref()).await)
            });
        }

        let mut slots: Vec<Option<CaseResult>> = (0..total).map(|_| None).collect();
        let mut done = 0usize;

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, result)) => {
                    done += 1;
                    if let Some(sink) = &progress {
                        sink(ProgressEvent {
                            done,
                            total,
                            case_name: result.case_name.clone(),
                            elapsed: start.elapsed(),
                            error: result.error.as_ref().map(|e| e.to_string()),
                        });
                    }
                    slots[idx] = Some(result);
                }
                Err(e) => {
                    error!("case task failed: {}", e);
                }
            }
        }

        // A panicked task leaves its slot empty; surface that as a case error
        // rather than dropping the case from the results.
        let cases = slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.unwrap_or_else(|| {
                    errored_result(
                        &suite.cases[idx],
                        variant,
                        &self.cfg,
                        RunError::new(crate::errors::RunErrorKind::Other, "case task panicked"),
                    )
                })
            })
            .collect();

        let ended_at = Utc::now();
        RunResult {
            suite_name: suite.name.clone(),
            started_at,
            ended_at,
            duration_ms: start.elapsed().as_millis() as u64,
            cases,
        }
    }
}

fn errored_result(
    case: &EvalCase,
    variant: &PromptVariant,
    cfg: &RunnerConfig,
    error: RunError,
) -> CaseResult {
    CaseResult {
        case_id: case.id.clone(),
        case_name: case.name.clone(),
        prompt: variant.name.clone(),
        model: cfg.model.clone(),
        final_response: String::new(),
        trace: TraceSnapshot::default(),
        error: Some(error),
        duration_ms: 0,
    }
}

/// Executes one case end to end. The trace lives outside the timeout so a
/// cancelled case still reports the turns it completed.
async fn run_case(
    cfg: &RunnerConfig,
    case: &EvalCase,
    variant: &PromptVariant,
    provider: &dyn Provider,
) -> CaseResult {
    let start = Instant::now();
    let mut result = CaseResult {
        case_id: case.id.clone(),
        case_name: case.name.clone(),
        prompt: variant.name.clone(),
        model: cfg.model.clone(),
        final_response: String::new(),
        trace: TraceSnapshot::default(),
        error: None,
        duration_ms: 0,
    };

    let rendered = match variant.interpolate(&case.input) {
        Ok(r) => r,
        Err(e) => {
            result.error = Some(RunError::setup(format!("interpolating prompt: {:#}", e)));
            result.duration_ms = start.elapsed().as_millis() as u64;
            return result;
        }
    };

    let registry = MockRegistry::new(&case.mocks);
    let tools: Vec<ToolSchema> = rendered
        .tools
        .iter()
        .map(|t| ToolSchema {
            name: t.name.clone(),
            description: t.description.clone(),
            parameters: t.parameters.clone(),
        })
        .collect();

    let trace = Trace::new();
    trace.add_message("user", &rendered.user);

    let timeout_secs = case.timeout_secs.unwrap_or(cfg.timeout_secs);
    let outcome = tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        tool_loop(cfg, &rendered, &tools, provider, &registry, &trace),
    )
    .await;

    match outcome {
        Ok(Ok(final_response)) => result.final_response = final_response,
        Ok(Err(e)) => result.error = Some(e),
        Err(_) => result.error = Some(RunError::timeout(timeout_secs)),
    }

    trace.finish();
    result.trace = trace.snapshot();
    result.duration_ms = start.elapsed().as_millis() as u64;
    result
}

/// The agent tool-call loop: send the conversation, resolve requested tools
/// through mocks in provider order, repeat until a terminal text response or
/// the iteration cap.
async fn tool_loop(
    cfg: &RunnerConfig,
    rendered: &PromptVariant,
    tools: &[ToolSchema],
    provider: &dyn Provider,
    registry: &MockRegistry,
    trace: &Trace,
) -> Result<String, RunError> {
    let mut messages = vec![ChatMessage::user(rendered.user.clone())];

    for _ in 0..MAX_TOOL_LOOP_ITERATIONS {
        let req = Request {
            model: cfg.model.clone(),
            system: rendered.system.clone(),
            messages: messages.clone(),
            tools: tools.to_vec(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        };

        let resp = provider
            .complete(&req)
            .await
            .map_err(|e| RunError::provider_error(provider.name(), format!("{:#}", e)))?;

        trace.add_usage(resp.usage.input_tokens, resp.usage.output_tokens);
        trace.add_message("assistant", &resp.content);

        if resp.tool_calls.is_empty() {
            return Ok(resp.content);
        }

        messages.push(ChatMessage::assistant(
            resp.content.clone(),
            resp.tool_calls.clone(),
        ));

        // Sequential on purpose: a deterministic resolution order keeps
        // traces reproducible.
        for tc in &resp.tool_calls {
            let started_at = Utc::now();
            let started = Instant::now();
            let resolved = registry.resolve(&tc.name, &tc.parameters).await;

            trace.add_tool_call(ToolCallRecord {
                tool_name: tc.name.clone(),
                parameters: tc.parameters.clone(),
                response: resolved.clone().unwrap_or_default(),
                error: resolved.as_ref().err().map(|e| e.to_string()),
                started_at,
                ended_at: Utc::now(),
                duration_ms: started.elapsed().as_millis() as u64,
            });

            // A mock error becomes a textual tool result so the agent can
            // react to the simulated failure.
            let content = match resolved {
                Ok(content) => content,
                Err(e) => format!("Error: {}", e),
            };
            messages.push(ChatMessage::tool(content.clone(), tc.id.clone()));
            trace.add_message("tool", &content);
        }
    }

    Err(RunError::loop_exhausted(MAX_TOOL_LOOP_ITERATIONS))
}
