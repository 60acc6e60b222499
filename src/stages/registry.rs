// src/stages/registry.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::stages::anomaly::AnomalyDetection;
use crate::stages::environment::EnvironmentSetup;
use crate::stages::migration::DataMigration;
use crate::stages::performance::PerformanceOptimization;
use crate::stages::schema::SchemaConversion;
use crate::stages::validation::DataValidation;
use crate::stages::{StageKind, StageLogic};

/// Maps stage names to their executable logic.
#[derive(Clone, Default)]
pub struct StageRegistry {
    logic: HashMap<String, Arc<dyn StageLogic>>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the six migration stages.
    pub fn migration() -> Self {
        let mut registry = Self::new();
        for kind in StageKind::ALL {
            registry.register(kind.name(), logic_for(kind));
        }
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, logic: Arc<dyn StageLogic>) -> &mut Self {
        self.logic.insert(name.into(), logic);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn StageLogic>> {
        self.logic.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.logic.contains_key(name)
    }
}

impl fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.logic.keys().collect();
        names.sort();
        f.debug_struct("StageRegistry").field("stages", &names).finish()
    }
}

fn logic_for(kind: StageKind) -> Arc<dyn StageLogic> {
    match kind {
        StageKind::EnvironmentSetup => Arc::new(EnvironmentSetup),
        StageKind::SchemaConversion => Arc::new(SchemaConversion),
        StageKind::DataMigration => Arc::new(DataMigration),
        StageKind::AnomalyDetection => Arc::new(AnomalyDetection),
        StageKind::DataValidation => Arc::new(DataValidation),
        StageKind::PerformanceOptimization => Arc::new(PerformanceOptimization),
    }
}
