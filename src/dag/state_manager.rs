// src/dag/state_manager.rs

//! Per-run state transitions for stages in the scheduler.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::WorkflowGraph;
use crate::dag::scheduler_step::SkippedStage;
use crate::dag::stage_info::{ScheduledStage, StageInfo};
use crate::engine::StageName;
use crate::types::StageStatus;

/// What a `Pending` stage may do given its predecessors' states.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Readiness {
    Wait,
    Ready,
    Skip(String),
}

/// Manages per-run state transitions for stages.
pub struct StateManager<'a> {
    graph: &'a WorkflowGraph,
    stages: &'a mut HashMap<StageName, StageInfo>,
}

impl<'a> StateManager<'a> {
    pub fn new(graph: &'a WorkflowGraph, stages: &'a mut HashMap<StageName, StageInfo>) -> Self {
        Self { graph, stages }
    }

    /// Move every `Pending` stage whose predecessors allow it to `Running` or
    /// `Skipped`, repeating until nothing changes (a skip can unblock, and
    /// skip, its own dependents).
    ///
    /// Stages are visited in topological order, so a stage that starts
    /// alongside another is scheduled in the same pass as its lead.
    pub fn collect_transitions(&mut self) -> (Vec<ScheduledStage>, Vec<SkippedStage>) {
        let order: Vec<StageName> = self.graph.stages().map(str::to_string).collect();
        let mut scheduled = Vec::new();
        let mut skipped = Vec::new();

        loop {
            let mut changed = false;

            for name in &order {
                let readiness = match self.stages.get(name) {
                    Some(info) if info.status == StageStatus::Pending => {
                        ReadOnlyStateManager::new(self.stages).readiness(info)
                    }
                    _ => continue,
                };

                let Some(info) = self.stages.get_mut(name) else {
                    continue;
                };

                match readiness {
                    Readiness::Wait => {}
                    Readiness::Ready => {
                        info!(stage = %info.name, "dependencies satisfied; scheduling stage");
                        info.status = StageStatus::Running;
                        scheduled.push(ScheduledStage {
                            name: info.name.clone(),
                        });
                        changed = true;
                    }
                    Readiness::Skip(reason) => {
                        warn!(stage = %info.name, %reason, "skipping stage");
                        info.status = StageStatus::Skipped;
                        info.detail = Some(reason.clone());
                        skipped.push(SkippedStage {
                            name: info.name.clone(),
                            reason,
                        });
                        changed = true;
                    }
                }
            }

            if !changed {
                break;
            }
        }

        (scheduled, skipped)
    }

    /// Mark every stage that has not started yet as `Skipped`.
    pub fn skip_pending(&mut self, reason: &str) -> Vec<SkippedStage> {
        let mut skipped = Vec::new();

        for name in self.graph.stages() {
            if let Some(info) = self.stages.get_mut(name) {
                if info.status == StageStatus::Pending {
                    debug!(stage = %info.name, %reason, "skipping pending stage");
                    info.status = StageStatus::Skipped;
                    info.detail = Some(reason.to_string());
                    skipped.push(SkippedStage {
                        name: info.name.clone(),
                        reason: reason.to_string(),
                    });
                }
            }
        }

        skipped
    }

    /// Check if all stages are in a terminal state.
    pub fn all_stages_terminal(&self) -> bool {
        self.stages.values().all(|info| info.status.is_terminal())
    }
}

/// A read-only view used for deciding readiness.
pub struct ReadOnlyStateManager<'a> {
    stages: &'a HashMap<StageName, StageInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(stages: &'a HashMap<StageName, StageInfo>) -> Self {
        Self { stages }
    }

    /// A stage is decided only once every completion dependency is terminal:
    /// it runs if they all succeeded and is skipped otherwise, with the reason
    /// naming each dependency that did not succeed. A `starts_with` lead only
    /// has to have started.
    fn readiness(&self, info: &StageInfo) -> Readiness {
        let mut unmet = Vec::new();

        for dep_name in &info.deps {
            let Some(dep) = self.stages.get(dep_name) else {
                warn!(stage = %info.name, dep = %dep_name, "dependency missing from stage map");
                return Readiness::Skip(format!("unknown dependency '{dep_name}'"));
            };

            match dep.status {
                StageStatus::Pending | StageStatus::Running => return Readiness::Wait,
                StageStatus::Succeeded => {}
                StageStatus::Failed | StageStatus::Skipped => unmet.push(dep.blocking_reason()),
            }
        }

        if let Some(lead_name) = &info.starts_with {
            match self.stages.get(lead_name).map(|lead| (lead.status, lead)) {
                None => return Readiness::Skip(format!("unknown lead stage '{lead_name}'")),
                Some((StageStatus::Pending, _)) => return Readiness::Wait,
                Some((StageStatus::Skipped, lead)) => unmet.push(lead.blocking_reason()),
                Some(_) => {}
            }
        }

        if unmet.is_empty() {
            Readiness::Ready
        } else {
            Readiness::Skip(format!("precondition unmet: {}", unmet.join("; ")))
        }
    }
}
