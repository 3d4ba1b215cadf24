//! Full pipeline: run a tool-using suite against a scripted provider,
//! score it, and diff two scored runs.

use gauntlet_core::diff::{self, Category};
use gauntlet_core::engine::{Runner, RunnerConfig};
use gauntlet_core::judge::{CompositeScorer, JudgeStatus};
use gauntlet_core::mock::{MockConfig, MockResponse};
use gauntlet_core::prompt::{PromptVariant, ToolDefinition};
use gauntlet_core::providers::{FakeProvider, Response, ToolCallRequest};
use gauntlet_core::result;
use gauntlet_core::suite::{EvalCase, EvalSuite, JudgeSpec};
use serde_json::json;
use std::sync::Arc;

fn calculator_variant() -> PromptVariant {
    PromptVariant {
        name: "calc".into(),
        system: "You are a calculator assistant.".into(),
        user: "What is {{expr}}?".into(),
        tools: vec![ToolDefinition {
            name: "calculator".into(),
            description: "Evaluates an arithmetic expression".into(),
            parameters: json!({
                "type": "object",
                "properties": {"expr": {"type": "string"}}
            }),
        }],
        ..Default::default()
    }
}

fn calculator_suite() -> EvalSuite {
    EvalSuite {
        name: "calc-smoke".into(),
        prompt: "calc".into(),
        cases: vec![EvalCase {
            name: "addition".into(),
            input: json!({"expr": "2+2"}).as_object().unwrap().clone(),
            mocks: vec![MockConfig {
                tool_name: "calculator".into(),
                responses: Vec::new(),
                default_response: Some(MockResponse::content("4")),
            }],
            judges: vec![
                JudgeSpec {
                    kind: "contains".into(),
                    value: json!("answer is 4"),
                    weight: 1.0,
                    ..Default::default()
                },
                JudgeSpec {
                    kind: "toolcall".into(),
                    value: json!({
                        "expected": [{"tool_name": "calculator"}]
                    }),
                    weight: 1.0,
                    ..Default::default()
                },
            ],
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn scripted_provider() -> Arc<FakeProvider> {
    Arc::new(
        FakeProvider::new()
            .with_turn(Response::tool_use(
                vec![ToolCallRequest {
                    id: "tc_1".into(),
                    name: "calculator".into(),
                    parameters: json!({"expr": "2+2"}),
                }],
                10,
                5,
            ))
            .with_fallback("The answer is 4."),
    )
}

#[tokio::test]
async fn calculator_case_runs_and_passes_both_judges() {
    let runner = Runner::new(RunnerConfig::default());
    let rr = runner
        .run(&calculator_suite(), &calculator_variant(), scripted_provider(), None)
        .await;

    assert_eq!(rr.cases.len(), 1);
    let case = &rr.cases[0];
    assert!(case.error.is_none(), "case errored: {:?}", case.error);
    assert_eq!(case.final_response, "The answer is 4.");
    assert_eq!(case.trace.tool_calls.len(), 1);
    assert_eq!(case.trace.tool_calls[0].tool_name, "calculator");
    assert_eq!(case.trace.tool_calls[0].response, "4");
    assert_eq!(case.trace.usage.input_tokens, 10);
    assert_eq!(case.trace.usage.output_tokens, 5);

    let scorer = CompositeScorer::new(0.5);
    let summary = result::score_run(&rr, &calculator_suite(), &scorer)
        .await
        .expect("scoring failed");

    assert_eq!(summary.stats.total_cases, 1);
    assert_eq!(summary.stats.passed_cases, 1);
    assert_eq!(summary.stats.pass_rate, 1.0);
    assert_eq!(summary.stats.total_input_tokens, 10);
    assert_eq!(summary.stats.total_output_tokens, 5);

    let scored = &summary.results[0];
    assert_eq!(scored.status, JudgeStatus::Pass);
    assert_eq!(scored.score, 1.0);
    assert_eq!(scored.judge_scores.len(), 2);
}

#[tokio::test]
async fn diffing_a_regression_flags_it() {
    let runner = Runner::new(RunnerConfig::default());
    let suite = calculator_suite();
    let variant = calculator_variant();

    let rr_a = runner.run(&suite, &variant, scripted_provider(), None).await;
    let scorer = CompositeScorer::new(0.5);
    let summary_a = result::score_run(&rr_a, &suite, &scorer).await.unwrap();

    // Second run never calls the tool and gives a wrong answer.
    let bad_provider = Arc::new(FakeProvider::new().with_fallback("I cannot do math."));
    let rr_b = runner.run(&suite, &variant, bad_provider, None).await;
    let summary_b = result::score_run(&rr_b, &suite, &scorer).await.unwrap();

    let diff = diff::compare(&summary_a, &summary_b, 0.01);
    assert_eq!(diff.summary.regressed, 1);
    assert!(diff.has_regressions());
    assert_eq!(diff.cases[0].category, Category::Regressed);
    assert_eq!(diff.cases[0].case_name, "addition");
    assert!(diff.cases[0].score_delta < 0.0);
}
