// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::stage_info::ScheduledStage;
use crate::engine::StageName;

/// A stage that will never run in this run, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStage {
    pub name: StageName,
    pub reason: String,
}

/// Structured result of a single scheduler "step".
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Stages that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledStage>,
    /// Stages that were marked `Skipped` in this step.
    pub newly_skipped: Vec<SkippedStage>,
    /// Whether this step left every stage in a terminal state.
    pub run_just_finished: bool,
}

impl SchedulerStep {
    pub fn merge(&mut self, other: SchedulerStep) {
        self.newly_scheduled.extend(other.newly_scheduled);
        self.newly_skipped.extend(other.newly_skipped);
        self.run_just_finished |= other.run_just_finished;
    }

    pub fn scheduled_names(&self) -> Vec<&str> {
        self.newly_scheduled.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn skipped_names(&self) -> Vec<&str> {
        self.newly_skipped.iter().map(|s| s.name.as_str()).collect()
    }
}
