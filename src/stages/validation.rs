// src/stages/validation.rs

use serde::Deserialize;
use tracing::{info, warn};

use crate::stages::{StageContext, StageFuture, StageLogic, StageResult, decode_output};
use crate::tool::{ToolCall, ToolName};

/// Output of `validate_row_counts` and `validate_checksums`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidationReport {
    #[serde(default)]
    pub tables_checked: Option<u64>,
    #[serde(default)]
    pub mismatches: Vec<TableMismatch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableMismatch {
    pub table: String,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ValidationReport {
    fn mismatched_tables(&self) -> String {
        self.mismatches
            .iter()
            .map(|m| match &m.detail {
                Some(detail) => format!("{} ({})", m.table, detail),
                None => m.table.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Compares source and target: row counts first, checksums only when the
/// row counts agree.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataValidation;

impl StageLogic for DataValidation {
    fn execute<'a>(&'a self, ctx: &'a StageContext) -> StageFuture<'a> {
        Box::pin(async move {
            let result = StageResult::ok(ctx.stage());

            let rows = match run_check(ctx, ToolName::ValidateRowCounts).await {
                Ok(report) => report,
                Err(failed) => return failed,
            };
            let result = match rows.tables_checked {
                Some(n) => result.with("tables_checked", n),
                None => result,
            };

            if !rows.mismatches.is_empty() {
                let tables = rows.mismatched_tables();
                warn!(stage = %ctx.stage(), %tables, "row count mismatch");
                return result
                    .with("row_counts", "mismatch")
                    .with("mismatched_tables", tables.clone())
                    .with("error_kind", "validation_mismatch")
                    .failed(format!("discrepancies: row counts differ for {tables}"));
            }
            let result = result.with("row_counts", "match");

            let sums = match run_check(ctx, ToolName::ValidateChecksums).await {
                Ok(report) => report,
                Err(failed) => return failed.with("row_counts", "match"),
            };

            if !sums.mismatches.is_empty() {
                let tables = sums.mismatched_tables();
                warn!(stage = %ctx.stage(), %tables, "checksum mismatch");
                return result
                    .with("checksums", "mismatch")
                    .with("mismatched_tables", tables.clone())
                    .with("error_kind", "validation_mismatch")
                    .failed(format!("discrepancies: checksums differ for {tables}"));
            }

            info!(stage = %ctx.stage(), "row counts and checksums match");
            result
                .with("checksums", "match")
                .with_diagnostic("row counts and checksums match")
        })
    }
}

/// Run one validation tool; a tool failure becomes the stage's failed result.
async fn run_check(ctx: &StageContext, tool: ToolName) -> Result<ValidationReport, StageResult> {
    let call = ToolCall::new(tool).args(ctx.base_args());
    ctx.invoke(call)
        .await
        .and_then(|out| decode_output(tool, out))
        .map_err(|err| StageResult::ok(ctx.stage()).from_tool_error(&format!("{tool} failed"), &err))
}
