// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - handing dispatched stages to the backend
//! - publishing the status table
//!
//! The core is unit tested without any Tokio, channels, or network.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::dag::Scheduler;
use crate::engine::event_handlers::{
    CoreStep, handle_run_start, handle_shutdown, handle_stage_completion,
};
use crate::engine::status::StatusTable;
use crate::engine::{RuntimeEvent, StageName};
use crate::report::MigrationReport;
use crate::stages::StageResult;

/// Pure core runtime state.
///
/// This owns:
/// - the DAG scheduler
/// - the results of every stage that completed in this run
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    results: BTreeMap<StageName, Arc<StageResult>>,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            results: BTreeMap::new(),
        }
    }

    /// Begin a run from a clean slate.
    pub fn start(&mut self) -> CoreStep {
        handle_run_start(&mut self.scheduler, &mut self.results)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::StageCompleted { result } => {
                handle_stage_completion(&mut self.scheduler, &mut self.results, result)
            }
            RuntimeEvent::ShutdownRequested => handle_shutdown(&mut self.scheduler, &self.results),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn result_of(&self, stage: &str) -> Option<&StageResult> {
        self.results.get(stage).map(Arc::as_ref)
    }

    pub fn status_table(&self) -> StatusTable {
        StatusTable::new(self.scheduler.statuses())
    }

    pub fn report(&self, project_id: &str) -> MigrationReport {
        MigrationReport::build(project_id, &self.scheduler, &self.results)
    }
}
