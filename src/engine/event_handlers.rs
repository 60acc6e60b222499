// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::dag::{Scheduler, SchedulerStep};
use crate::engine::StageName;
use crate::stages::StageResult;
use crate::types::StageStatus;

/// A stage to start, with the results of every ancestor that has finished.
#[derive(Debug, Clone)]
pub struct DispatchedStage {
    pub name: StageName,
    pub inputs: BTreeMap<StageName, Arc<StageResult>>,
}

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Start these stages.
    DispatchStages(Vec<DispatchedStage>),
    /// Every stage is terminal; the run is over.
    RunFinished,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Start a run: everything pending, entry stage dispatched.
pub fn handle_run_start(
    scheduler: &mut Scheduler,
    results: &mut BTreeMap<StageName, Arc<StageResult>>,
) -> CoreStep {
    results.clear();
    let step = scheduler.start();
    commands_from_step(scheduler, results, step)
}

/// Handle a stage completion event.
///
/// - The result is stored before dependents are dispatched, so they see it
///   among their inputs.
/// - A fatal result (unknown tool) additionally skips every stage that has
///   not started yet.
/// - Completions for stages that are not running are dropped.
pub fn handle_stage_completion(
    scheduler: &mut Scheduler,
    results: &mut BTreeMap<StageName, Arc<StageResult>>,
    result: StageResult,
) -> CoreStep {
    let name = result.stage().to_string();

    if scheduler.status_of(&name) != Some(StageStatus::Running) {
        warn!(stage = %name, "completion for a stage that is not running; dropping result");
        return CoreStep {
            commands: Vec::new(),
            keep_running: !scheduler.is_finished(),
        };
    }

    let verdict = result.verdict();
    let detail = result.diagnostic().filter(|_| !verdict.is_ok()).map(str::to_string);
    let fatal = result.is_fatal();
    results.insert(name.clone(), Arc::new(result));

    let mut step = scheduler.handle_completion(&name, verdict, detail);

    if fatal {
        warn!(stage = %name, "fatal tool error; aborting remaining stages");
        let aborted = scheduler.abort(&format!("run aborted: fatal error in {name}"));
        step.merge(aborted);
    }

    commands_from_step(scheduler, results, step)
}

/// Handle a shutdown request: stages that have not started are skipped;
/// running stages finish on their own.
pub fn handle_shutdown(
    scheduler: &mut Scheduler,
    results: &BTreeMap<StageName, Arc<StageResult>>,
) -> CoreStep {
    info!("shutdown requested; skipping stages that have not started");
    let step = scheduler.abort("run aborted: shutdown requested");
    commands_from_step(scheduler, results, step)
}

fn commands_from_step(
    scheduler: &Scheduler,
    results: &BTreeMap<StageName, Arc<StageResult>>,
    step: SchedulerStep,
) -> CoreStep {
    let mut commands = Vec::new();

    if !step.newly_scheduled.is_empty() {
        let dispatched = step
            .newly_scheduled
            .into_iter()
            .map(|scheduled| {
                let inputs = scheduler
                    .graph()
                    .ancestors_of(&scheduled.name)
                    .into_iter()
                    .filter_map(|ancestor| {
                        results
                            .get(&ancestor)
                            .map(|result| (ancestor, Arc::clone(result)))
                    })
                    .collect();
                DispatchedStage {
                    name: scheduled.name,
                    inputs,
                }
            })
            .collect();
        commands.push(CoreCommand::DispatchStages(dispatched));
    }

    let finished = scheduler.is_finished();
    if finished {
        commands.push(CoreCommand::RunFinished);
    }

    CoreStep {
        commands,
        keep_running: !finished,
    }
}
