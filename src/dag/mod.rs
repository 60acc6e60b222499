// src/dag/mod.rs

//! Workflow graph representation and scheduling.
//!
//! - [`graph`] holds the validated directed acyclic graph of stages.
//! - [`scheduler`] contains the per-run state machine that decides which
//!   stages are ready to run and which can never run.
//! - [`stage_info`] provides per-stage run state and scheduled stage types.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod stage_info;
pub mod state_manager;

pub use graph::{StageSpec, WorkflowGraph};
pub use scheduler::Scheduler;
pub use scheduler_step::{SchedulerStep, SkippedStage};
pub use stage_info::{ScheduledStage, StageInfo};
