// src/dag/stage_info.rs

//! Per-stage run state.

use crate::engine::StageName;
use crate::types::StageStatus;

/// Static dependency information plus the stage's state in the current run.
#[derive(Debug, Clone)]
pub struct StageInfo {
    pub name: StageName,
    /// Stages that must complete (successfully) first.
    pub deps: Vec<StageName>,
    /// Stage this one starts alongside.
    pub starts_with: Option<StageName>,
    pub status: StageStatus,
    /// Failure diagnostic or skip reason, once terminal.
    pub detail: Option<String>,
}

impl StageInfo {
    pub fn new(name: StageName, deps: Vec<StageName>, starts_with: Option<StageName>) -> Self {
        Self {
            name,
            deps,
            starts_with,
            status: StageStatus::Pending,
            detail: None,
        }
    }

    /// Short description used when this stage blocks a dependent.
    pub fn blocking_reason(&self) -> String {
        match (self.status, self.detail.as_deref()) {
            (StageStatus::Failed, Some(detail)) => format!("{} failed: {}", self.name, detail),
            (status, _) => format!("{} {}", self.name, status),
        }
    }
}

/// A stage the scheduler wants started now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledStage {
    pub name: StageName,
}
