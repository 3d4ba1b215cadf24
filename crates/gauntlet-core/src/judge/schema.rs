use super::{Judge, JudgeInput, JudgeVerdict};
use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;

/// Validates that the output is JSON conforming to a JSON Schema.
///
/// A malformed schema is a judge error; output that is not valid JSON or
/// that violates the schema is a plain fail.
pub struct SchemaJudge {
    pub schema: Value,
}

#[async_trait]
impl Judge for SchemaJudge {
    async fn evaluate(&self, input: &JudgeInput) -> anyhow::Result<JudgeVerdict> {
        let validator =
            jsonschema::validator_for(&self.schema).context("compiling JSON schema")?;

        let instance: Value = match serde_json::from_str(&input.output) {
            Ok(v) => v,
            Err(e) => {
                return Ok(JudgeVerdict::fail(format!(
                    "output is not valid JSON: {}",
                    e
                )));
            }
        };

        match validator.validate(&instance) {
            Ok(()) => Ok(JudgeVerdict::pass("output matches JSON schema")),
            Err(e) => Ok(JudgeVerdict::fail(format!(
                "output does not match schema: {}",
                e
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "schema"
    }
}
