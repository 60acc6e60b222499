// src/stages/migration.rs

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::errors::ToolError;
use crate::stages::{StageContext, StageFuture, StageLogic, StageResult, decode_output};
use crate::tool::{ToolCall, ToolName};

/// Databases below this size (GB) are moved with a storage export.
pub const SMALL_DB_LIMIT_GB: f64 = 100.0;
/// Databases above this size (GB) are moved with parallel dumps.
pub const LARGE_DB_LIMIT_GB: f64 = 500.0;

/// How the data is moved, chosen from the database size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStrategy {
    Gcs,
    Dms,
    Mydumper,
}

impl MigrationStrategy {
    /// `< 100` GB: gcs, `100..=500` GB: dms, `> 500` GB: mydumper.
    pub fn for_size_gb(size_gb: f64) -> Self {
        if size_gb < SMALL_DB_LIMIT_GB {
            MigrationStrategy::Gcs
        } else if size_gb <= LARGE_DB_LIMIT_GB {
            MigrationStrategy::Dms
        } else {
            MigrationStrategy::Mydumper
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MigrationStrategy::Gcs => "gcs",
            MigrationStrategy::Dms => "dms",
            MigrationStrategy::Mydumper => "mydumper",
        }
    }

    pub fn tool(self) -> ToolName {
        match self {
            MigrationStrategy::Gcs => ToolName::MigrateGcs,
            MigrationStrategy::Dms => ToolName::MigrateDms,
            MigrationStrategy::Mydumper => ToolName::MigrateMydumper,
        }
    }
}

impl fmt::Display for MigrationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct DbSize {
    size_gb: f64,
}

/// Parse `get_db_size` output, rejecting sizes that cannot be real.
pub fn parse_size(output: Value) -> Result<f64, ToolError> {
    let size: DbSize = decode_output(ToolName::GetDbSize, output)?;
    if !size.size_gb.is_finite() || size.size_gb < 0.0 {
        return Err(ToolError::malformed(
            ToolName::GetDbSize,
            format!("invalid database size {}", size.size_gb),
        ));
    }
    Ok(size.size_gb)
}

/// Prefix of every failed migration's diagnostic.
const INCOMPLETE: &str = "discrepancies: migration did not complete";

/// Measures the source database, picks a strategy and runs the migration.
///
/// The strategy is recorded before the migrate tool runs, so it shows up in
/// the report even when the migration itself fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataMigration;

impl StageLogic for DataMigration {
    fn execute<'a>(&'a self, ctx: &'a StageContext) -> StageFuture<'a> {
        Box::pin(async move {
            let result = StageResult::ok(ctx.stage());

            let size_call = ToolCall::new(ToolName::GetDbSize).args(ctx.base_args());
            let size_gb = match ctx.invoke(size_call).await.and_then(parse_size) {
                Ok(size) => size,
                Err(err) => {
                    return result.from_tool_error(
                        &format!("{INCOMPLETE}: could not determine database size"),
                        &err,
                    );
                }
            };

            let strategy = MigrationStrategy::for_size_gb(size_gb);
            let result = result
                .with("size_gb", size_gb)
                .with("strategy", strategy.as_str());
            info!(stage = %ctx.stage(), size_gb, %strategy, "migration strategy selected");

            let migrate = ToolCall::new(strategy.tool())
                .args(ctx.base_args())
                .arg("size_gb", size_gb);

            match ctx.invoke(migrate).await {
                Ok(output) => {
                    let result = match output.get("job_id").and_then(Value::as_str) {
                        Some(job_id) => result.with("job_id", job_id),
                        None => result,
                    };
                    result
                        .with("migration", "completed")
                        .with_diagnostic(format!("migrated {size_gb} GB via {strategy}"))
                }
                Err(err) => result.from_tool_error(INCOMPLETE, &err),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn strategy_tiers_and_boundaries() {
        assert_eq!(MigrationStrategy::for_size_gb(0.0), MigrationStrategy::Gcs);
        assert_eq!(MigrationStrategy::for_size_gb(50.0), MigrationStrategy::Gcs);
        assert_eq!(MigrationStrategy::for_size_gb(99.9), MigrationStrategy::Gcs);
        assert_eq!(MigrationStrategy::for_size_gb(100.0), MigrationStrategy::Dms);
        assert_eq!(MigrationStrategy::for_size_gb(250.0), MigrationStrategy::Dms);
        assert_eq!(MigrationStrategy::for_size_gb(500.0), MigrationStrategy::Dms);
        assert_eq!(MigrationStrategy::for_size_gb(500.1), MigrationStrategy::Mydumper);
    }

    #[test]
    fn strategy_maps_to_its_tool() {
        assert_eq!(MigrationStrategy::Gcs.tool(), ToolName::MigrateGcs);
        assert_eq!(MigrationStrategy::Dms.tool(), ToolName::MigrateDms);
        assert_eq!(MigrationStrategy::Mydumper.tool(), ToolName::MigrateMydumper);
    }

    #[test]
    fn size_must_be_a_non_negative_number() {
        assert_eq!(parse_size(json!({"size_gb": 250})).unwrap(), 250.0);
        assert!(parse_size(json!({"size_gb": -1})).is_err());
        assert!(parse_size(json!({"size_gb": "big"})).is_err());
        assert!(parse_size(json!({})).is_err());
    }
}
