// src/tool/registry.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ToolError;

/// Every tool the collaborator is known to expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    TerraformOutput,
    CompareSchema,
    CreateSchema,
    GetDbSize,
    MigrateGcs,
    MigrateDms,
    MigrateMydumper,
    ValidateRowCounts,
    ValidateChecksums,
    MonitorLogs,
    AnalyzePerformance,
}

impl ToolName {
    pub const ALL: [ToolName; 11] = [
        ToolName::TerraformOutput,
        ToolName::CompareSchema,
        ToolName::CreateSchema,
        ToolName::GetDbSize,
        ToolName::MigrateGcs,
        ToolName::MigrateDms,
        ToolName::MigrateMydumper,
        ToolName::ValidateRowCounts,
        ToolName::ValidateChecksums,
        ToolName::MonitorLogs,
        ToolName::AnalyzePerformance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::TerraformOutput => "terraform_output",
            ToolName::CompareSchema => "compare_schema",
            ToolName::CreateSchema => "create_schema",
            ToolName::GetDbSize => "get_db_size",
            ToolName::MigrateGcs => "migrate_gcs",
            ToolName::MigrateDms => "migrate_dms",
            ToolName::MigrateMydumper => "migrate_mydumper",
            ToolName::ValidateRowCounts => "validate_row_counts",
            ToolName::ValidateChecksums => "validate_checksums",
            ToolName::MonitorLogs => "monitor_logs",
            ToolName::AnalyzePerformance => "analyze_performance",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_registered_name_parses_back() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>(), Ok(tool));
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(
            "drop_database".parse::<ToolName>(),
            Err(ToolError::UnknownTool("drop_database".to_string()))
        );
    }

    #[test]
    fn serde_name_matches_wire_name() {
        let json = serde_json::to_string(&ToolName::MigrateMydumper).unwrap();
        assert_eq!(json, "\"migrate_mydumper\"");
    }
}
