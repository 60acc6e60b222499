// src/engine/mod.rs

//! Orchestration engine for migradag.
//!
//! This module ties together:
//! - the DAG scheduler
//! - the stage backend that executes dispatched stages
//! - the status table stages can watch (e.g. anomaly detection waiting on the
//!   migration)
//! - the main runtime event loop that reacts to:
//!   - stage completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]; [`orchestrator`] wires a fresh run together.

use crate::stages::StageResult;

/// Canonical stage name type used throughout the engine.
pub type StageName = String;

/// Events flowing into the runtime from stage tasks and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A dispatched stage finished with a result.
    StageCompleted { result: StageResult },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod backend;
pub mod core;
pub mod event_handlers;
pub mod orchestrator;
pub mod runtime;
pub mod status;

pub use backend::{StageBackend, TaskStageBackend};
pub use self::core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep, DispatchedStage};
pub use orchestrator::Orchestrator;
pub use runtime::Runtime;
pub use status::StatusTable;
