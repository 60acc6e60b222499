// src/report.rs

//! Final migration report: one entry per stage in topological order.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use crate::dag::Scheduler;
use crate::engine::StageName;
use crate::errors::Result;
use crate::stages::StageResult;
use crate::tool::ToolName;
use crate::types::{PayloadValue, StageStatus, Verdict};

/// What happened to one stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub stage: StageName,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    /// Diagnostic for stages that ran, skip reason for skipped ones.
    pub summary: String,
    pub payload: BTreeMap<String, PayloadValue>,
    /// Distinct tools the stage invoked, in first-use order.
    pub tool_calls: Vec<ToolName>,
}

/// Outcome of a whole migration run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationReport {
    pub project_id: String,
    pub entries: Vec<ReportEntry>,
    /// No stage failed and every stage reached `Succeeded`.
    pub success: bool,
}

impl MigrationReport {
    pub fn build(
        project_id: &str,
        scheduler: &Scheduler,
        results: &BTreeMap<StageName, Arc<StageResult>>,
    ) -> Self {
        let entries: Vec<ReportEntry> = scheduler
            .stage_names()
            .map(|name| {
                let status = scheduler.status_of(name).unwrap_or(StageStatus::Pending);
                let result = results.get(name);
                ReportEntry {
                    stage: name.to_string(),
                    status,
                    verdict: result.map(|r| r.verdict()),
                    summary: summarize(status, result.map(Arc::as_ref), scheduler.detail_of(name)),
                    payload: result.map(|r| r.payload().clone()).unwrap_or_default(),
                    tool_calls: result.map(|r| distinct(r.tool_calls())).unwrap_or_default(),
                }
            })
            .collect();

        let success = !entries.is_empty()
            && entries.iter().all(|e| e.status == StageStatus::Succeeded);

        Self {
            project_id: project_id.to_string(),
            entries,
            success,
        }
    }

    pub fn entry(&self, stage: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.stage == stage)
    }

    pub fn status_of(&self, stage: &str) -> Option<StageStatus> {
        self.entry(stage).map(|e| e.status)
    }

    /// Every tool invoked during the run, per stage in report order.
    pub fn tool_calls(&self) -> Vec<ToolName> {
        self.entries
            .iter()
            .flat_map(|e| e.tool_calls.iter().copied())
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).context("serializing migration report")?)
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.success { "SUCCESS" } else { "FAILED" };
        writeln!(f, "migration report for project '{}': {}", self.project_id, outcome)?;

        for entry in &self.entries {
            writeln!(f, "  [{}] {}: {}", entry.status, entry.stage, entry.summary)?;
            if !entry.tool_calls.is_empty() {
                let tools: Vec<&str> = entry.tool_calls.iter().map(|t| t.as_str()).collect();
                writeln!(f, "      tools: {}", tools.join(", "))?;
            }
            for (key, value) in &entry.payload {
                writeln!(f, "      {key} = {value}")?;
            }
        }

        Ok(())
    }
}

fn summarize(status: StageStatus, result: Option<&StageResult>, detail: Option<&str>) -> String {
    match status {
        StageStatus::Succeeded | StageStatus::Failed => result
            .and_then(StageResult::diagnostic)
            .or(detail)
            .unwrap_or(if status == StageStatus::Succeeded { "ok" } else { "failed" })
            .to_string(),
        StageStatus::Skipped => detail.unwrap_or("skipped").to_string(),
        StageStatus::Pending | StageStatus::Running => "not reached".to_string(),
    }
}

fn distinct(calls: &[ToolName]) -> Vec<ToolName> {
    let mut out: Vec<ToolName> = Vec::new();
    for call in calls {
        if !out.contains(call) {
            out.push(*call);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::migration_workflow;

    fn finished_scheduler(fail_validation: bool) -> (Scheduler, BTreeMap<StageName, Arc<StageResult>>) {
        let mut scheduler = Scheduler::new(migration_workflow().unwrap());
        let mut results = BTreeMap::new();
        let mut ready = scheduler.start().newly_scheduled;

        while let Some(stage) = ready.pop() {
            let result = if fail_validation && stage.name == "data_validation" {
                StageResult::fail(&stage.name, "discrepancies: row counts differ for orders")
            } else {
                StageResult::ok(&stage.name)
                    .with_tool_calls(vec![ToolName::MonitorLogs, ToolName::MonitorLogs])
            };
            let step = scheduler.handle_completion(&stage.name, result.verdict(), result.diagnostic().map(str::to_string));
            results.insert(stage.name.clone(), Arc::new(result));
            ready.extend(step.newly_scheduled);
        }

        (scheduler, results)
    }

    #[test]
    fn all_succeeded_is_success() {
        let (scheduler, results) = finished_scheduler(false);
        let report = MigrationReport::build("p", &scheduler, &results);

        assert!(report.success);
        assert_eq!(report.entries.len(), 6);
        assert_eq!(report.entries[0].stage, "environment_setup");
        assert_eq!(report.entries[0].tool_calls, vec![ToolName::MonitorLogs]);
    }

    #[test]
    fn failure_and_skip_are_explained() {
        let (scheduler, results) = finished_scheduler(true);
        let report = MigrationReport::build("p", &scheduler, &results);

        assert!(!report.success);
        let validation = report.entry("data_validation").unwrap();
        assert_eq!(validation.status, StageStatus::Failed);
        assert_eq!(validation.summary, "discrepancies: row counts differ for orders");

        let perf = report.entry("performance_optimization").unwrap();
        assert_eq!(perf.status, StageStatus::Skipped);
        assert_eq!(perf.verdict, None);
        assert!(perf.summary.contains("data_validation failed"));

        let text = report.to_string();
        assert!(text.contains("FAILED"));
        assert!(text.contains("[skipped] performance_optimization"));
    }
}
