// src/stages/result.rs

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::StageName;
use crate::errors::ToolError;
use crate::tool::ToolName;
use crate::types::{PayloadValue, Verdict};

/// Immutable outcome of one stage execution.
///
/// Built with the chaining helpers below and frozen once handed to the engine
/// (it is shared as `Arc<StageResult>` with downstream stages).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageResult {
    stage: StageName,
    verdict: Verdict,
    payload: BTreeMap<String, PayloadValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostic: Option<String>,
    tool_calls: Vec<ToolName>,
    #[serde(skip)]
    fatal: bool,
}

impl StageResult {
    pub fn ok(stage: impl Into<StageName>) -> Self {
        Self {
            stage: stage.into(),
            verdict: Verdict::Ok,
            payload: BTreeMap::new(),
            diagnostic: None,
            tool_calls: Vec::new(),
            fatal: false,
        }
    }

    pub fn fail(stage: impl Into<StageName>, diagnostic: impl Into<String>) -> Self {
        Self::ok(stage).failed(diagnostic)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }

    /// Turn this result into a failure, keeping the payload gathered so far.
    pub fn failed(mut self, diagnostic: impl Into<String>) -> Self {
        self.verdict = Verdict::Fail;
        self.diagnostic = Some(diagnostic.into());
        self
    }

    /// Fail with `context: err`, recording the error kind in the payload.
    /// An unknown tool additionally marks the result fatal.
    pub fn from_tool_error(self, context: &str, err: &ToolError) -> Self {
        let mut result = self
            .with("error_kind", err.kind())
            .failed(format!("{context}: {err}"));
        result.fatal = err.is_fatal();
        result
    }

    pub fn with_tool_calls(mut self, calls: Vec<ToolName>) -> Self {
        self.tool_calls = calls;
        self
    }

    /// Mark this result as one that must abort the whole run.
    pub fn mark_fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn is_ok(&self) -> bool {
        self.verdict.is_ok()
    }

    pub fn payload(&self) -> &BTreeMap<String, PayloadValue> {
        &self.payload
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.payload.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(PayloadValue::as_str)
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub fn tool_calls(&self) -> &[ToolName] {
        &self.tool_calls
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_error_sets_kind_and_fatality() {
        let err = ToolError::UnknownTool("migrate_tape".into());
        let result = StageResult::ok("data_migration")
            .with("strategy", "dms")
            .from_tool_error("migration did not complete", &err);

        assert_eq!(result.verdict(), Verdict::Fail);
        assert!(result.is_fatal());
        assert_eq!(result.get_str("error_kind"), Some("unknown_tool"));
        assert_eq!(result.get_str("strategy"), Some("dms"));
        assert_eq!(
            result.diagnostic(),
            Some("migration did not complete: unknown tool: migrate_tape")
        );
    }

    #[test]
    fn execution_errors_are_not_fatal() {
        let err = ToolError::ToolExecutionError {
            tool: "create_schema".into(),
            message: "permission denied".into(),
        };
        let result = StageResult::ok("schema_conversion").from_tool_error("schema creation failed", &err);

        assert!(!result.is_ok());
        assert!(!result.is_fatal());
        assert_eq!(result.get_str("error_kind"), Some("tool_execution_error"));
    }
}
