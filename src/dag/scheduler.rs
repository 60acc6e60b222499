// src/dag/scheduler.rs

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use crate::dag::graph::WorkflowGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::stage_info::StageInfo;
use crate::dag::state_manager::StateManager;
use crate::engine::StageName;
use crate::types::{StageStatus, Verdict};

/// Scheduler holds the immutable workflow graph plus mutable per-run state.
///
/// It is responsible for:
/// - deciding when a stage is ready to run (dependencies satisfied)
/// - recording each stage's terminal state
/// - skipping stages whose preconditions can no longer be met
/// - knowing when every stage is terminal
///
/// It performs no IO; the engine feeds it completions and dispatches what it
/// schedules.
#[derive(Debug, Clone)]
pub struct Scheduler {
    graph: WorkflowGraph,
    stages: HashMap<StageName, StageInfo>,
    started: bool,
}

impl Scheduler {
    pub fn new(graph: WorkflowGraph) -> Self {
        let stages = graph
            .stages()
            .map(|name| {
                let info = StageInfo::new(
                    name.to_string(),
                    graph.dependencies_of(name).to_vec(),
                    graph.starts_with_of(name).map(str::to_string),
                );
                (name.to_string(), info)
            })
            .collect();

        Self {
            graph,
            stages,
            started: false,
        }
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    /// Reset every stage to `Pending` and schedule the entry stage.
    pub fn start(&mut self) -> SchedulerStep {
        for info in self.stages.values_mut() {
            info.status = StageStatus::Pending;
            info.detail = None;
        }
        self.started = true;
        debug!(stages = self.stages.len(), "scheduler: starting run");

        self.advance()
    }

    /// Record the verdict of a running stage and schedule or skip whatever
    /// that unblocks.
    ///
    /// Completions for unknown stages, or stages that are not running, are
    /// ignored.
    pub fn handle_completion(
        &mut self,
        stage: &str,
        verdict: Verdict,
        detail: Option<String>,
    ) -> SchedulerStep {
        let Some(info) = self.stages.get_mut(stage) else {
            warn!(stage = %stage, "completion for unknown stage; ignoring");
            return SchedulerStep::default();
        };

        if info.status != StageStatus::Running {
            warn!(
                stage = %stage,
                status = %info.status,
                "completion for a stage that is not running; ignoring"
            );
            return SchedulerStep::default();
        }

        info.status = verdict.into();
        info.detail = detail;

        match verdict {
            Verdict::Ok => debug!(stage = %stage, "stage succeeded"),
            Verdict::Fail => warn!(
                stage = %stage,
                detail = info.detail.as_deref().unwrap_or(""),
                "stage failed; dependents will be skipped"
            ),
        }

        self.advance()
    }

    /// Skip every stage that has not started yet. Running stages are left to
    /// finish.
    pub fn abort(&mut self, reason: &str) -> SchedulerStep {
        let was_finished = self.is_finished();
        let mut manager = StateManager::new(&self.graph, &mut self.stages);
        let newly_skipped = manager.skip_pending(reason);
        let run_just_finished = !was_finished && manager.all_stages_terminal();

        if !newly_skipped.is_empty() {
            info!(%reason, skipped = newly_skipped.len(), "scheduler: run aborted");
        }

        SchedulerStep {
            newly_scheduled: Vec::new(),
            newly_skipped,
            run_just_finished,
        }
    }

    pub fn status_of(&self, stage: &str) -> Option<StageStatus> {
        self.stages.get(stage).map(|info| info.status)
    }

    /// Failure diagnostic or skip reason recorded for `stage`.
    pub fn detail_of(&self, stage: &str) -> Option<&str> {
        self.stages.get(stage).and_then(|info| info.detail.as_deref())
    }

    /// Whether a run was started and every stage reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.started && self.stages.values().all(|info| info.status.is_terminal())
    }

    /// Snapshot of every stage's status.
    pub fn statuses(&self) -> BTreeMap<StageName, StageStatus> {
        self.stages
            .values()
            .map(|info| (info.name.clone(), info.status))
            .collect()
    }

    /// Stage names in topological order.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.graph.stages()
    }

    fn advance(&mut self) -> SchedulerStep {
        let mut manager = StateManager::new(&self.graph, &mut self.stages);
        let (newly_scheduled, newly_skipped) = manager.collect_transitions();
        let run_just_finished = manager.all_stages_terminal();

        if run_just_finished {
            info!("scheduler: all stages terminal; run finished");
        }

        SchedulerStep {
            newly_scheduled,
            newly_skipped,
            run_just_finished,
        }
    }
}
