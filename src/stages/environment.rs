// src/stages/environment.rs

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::info;

use crate::errors::ToolError;
use crate::stages::{StageContext, StageFuture, StageLogic, StageResult};
use crate::tool::{ToolCall, ToolName};
use crate::types::PayloadValue;

/// Reads the provisioned infrastructure's outputs and publishes them as
/// facts for every later stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentSetup;

impl StageLogic for EnvironmentSetup {
    fn execute<'a>(&'a self, ctx: &'a StageContext) -> StageFuture<'a> {
        Box::pin(async move {
            let call = ToolCall::new(ToolName::TerraformOutput)
                .arg("project_id", ctx.settings().project_id.clone());
            let result = StageResult::ok(ctx.stage());

            match ctx.invoke(call).await.and_then(infra_facts) {
                Ok(facts) => {
                    info!(stage = %ctx.stage(), facts = facts.len(), "infrastructure facts collected");
                    let count = facts.len();
                    facts
                        .into_iter()
                        .fold(result, |acc, (key, value)| acc.with(key, value))
                        .with_diagnostic(format!("{count} infrastructure facts collected"))
                }
                Err(err) => result.from_tool_error("terraform_output failed", &err),
            }
        })
    }
}

/// Flatten `terraform output -json` style output into payload facts.
///
/// The collaborator may hand back the command's raw stdout, so a string is
/// parsed as JSON first. Entries shaped `{"value": ...}` are unwrapped; scalars
/// are kept as text or numbers; anything nested is kept as its JSON text.
pub fn infra_facts(output: Value) -> Result<BTreeMap<String, PayloadValue>, ToolError> {
    let output = match output {
        Value::String(stdout) => serde_json::from_str(&stdout).map_err(|e| {
            ToolError::malformed(
                ToolName::TerraformOutput,
                format!("stdout is not valid JSON: {e}"),
            )
        })?,
        other => other,
    };

    let Value::Object(map) = output else {
        return Err(ToolError::malformed(
            ToolName::TerraformOutput,
            "expected a JSON object of outputs",
        ));
    };

    if map.is_empty() {
        return Err(ToolError::malformed(
            ToolName::TerraformOutput,
            "no infrastructure outputs returned",
        ));
    }

    Ok(map
        .into_iter()
        .map(|(key, value)| (key, fact_value(unwrap_output(value))))
        .collect())
}

fn unwrap_output(value: Value) -> Value {
    match value {
        Value::Object(mut entry) if entry.contains_key("value") => {
            entry.remove("value").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn fact_value(value: Value) -> PayloadValue {
    match value {
        Value::String(s) => PayloadValue::Text(s),
        Value::Number(n) => n
            .as_f64()
            .map(PayloadValue::Number)
            .unwrap_or_else(|| PayloadValue::Text(n.to_string())),
        Value::Null => PayloadValue::Text(String::new()),
        other => PayloadValue::Text(other.to_string()),
    }
}
