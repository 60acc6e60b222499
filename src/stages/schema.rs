// src/stages/schema.rs

use serde::Deserialize;
use tracing::info;

use crate::stages::{StageContext, StageFuture, StageLogic, StageResult, decode_output};
use crate::tool::{ToolCall, ToolName};

/// Output of `compare_schema`.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaComparison {
    pub compatible: bool,
    #[serde(default)]
    pub differences: Vec<String>,
}

/// Compares source and target schemas and creates the target schema when
/// they differ.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaConversion;

impl StageLogic for SchemaConversion {
    fn execute<'a>(&'a self, ctx: &'a StageContext) -> StageFuture<'a> {
        Box::pin(async move {
            let result = StageResult::ok(ctx.stage());

            let compare = ToolCall::new(ToolName::CompareSchema).args(ctx.fact_args());
            let comparison: SchemaComparison = match ctx
                .invoke(compare)
                .await
                .and_then(|out| decode_output(ToolName::CompareSchema, out))
            {
                Ok(comparison) => comparison,
                Err(err) => return result.from_tool_error("compare_schema failed", &err),
            };

            if comparison.compatible {
                info!(stage = %ctx.stage(), "schemas compatible; nothing to create");
                return result
                    .with("schema", "unchanged")
                    .with_diagnostic("schema compatible, no changes needed");
            }

            let result = result.with("differences", comparison.differences.join("; "));
            info!(
                stage = %ctx.stage(),
                differences = comparison.differences.len(),
                "schemas differ; creating target schema"
            );

            let create = ToolCall::new(ToolName::CreateSchema).args(ctx.fact_args());
            match ctx.invoke(create).await {
                Ok(_) => result
                    .with("schema", "created")
                    .with_diagnostic("target schema created"),
                Err(err) => result.from_tool_error("schema creation failed", &err),
            }
        })
    }
}
