// src/engine/status.rs

use std::collections::BTreeMap;

use crate::engine::StageName;
use crate::types::StageStatus;

/// Snapshot of every stage's status, published to running stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTable {
    statuses: BTreeMap<StageName, StageStatus>,
}

impl StatusTable {
    pub fn new(statuses: BTreeMap<StageName, StageStatus>) -> Self {
        Self { statuses }
    }

    pub fn get(&self, stage: &str) -> Option<StageStatus> {
        self.statuses.get(stage).copied()
    }
}
