mod runner;

pub use runner::{CaseResult, Runner, RunnerConfig, RunResult, MAX_TOOL_LOOP_ITERATIONS};
