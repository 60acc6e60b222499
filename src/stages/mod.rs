// src/stages/mod.rs

//! The six migration stages and the plumbing they share.
//!
//! Each stage is a [`StageLogic`] that receives a [`StageContext`] (inputs
//! from finished ancestors, a tool invoker, the run's status table) and
//! produces a [`StageResult`]. Stage logic never returns errors: every tool
//! failure is folded into a failed result.

use std::future::Future;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dag::{StageSpec, WorkflowGraph};
use crate::errors::{Result, ToolError};
use crate::tool::ToolName;

pub mod anomaly;
pub mod context;
pub mod environment;
pub mod migration;
pub mod performance;
pub mod registry;
pub mod result;
pub mod schema;
pub mod validation;

pub use context::{StageContext, StageSettings};
pub use registry::StageRegistry;
pub use result::StageResult;

/// Boxed future returned by [`StageLogic::execute`].
pub type StageFuture<'a> = Pin<Box<dyn Future<Output = StageResult> + Send + 'a>>;

/// Executable body of a stage.
pub trait StageLogic: Send + Sync {
    fn execute<'a>(&'a self, ctx: &'a StageContext) -> StageFuture<'a>;
}

/// The stages of a database migration, in the order they are declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    EnvironmentSetup,
    SchemaConversion,
    DataMigration,
    AnomalyDetection,
    DataValidation,
    PerformanceOptimization,
}

impl StageKind {
    pub const ALL: [StageKind; 6] = [
        StageKind::EnvironmentSetup,
        StageKind::SchemaConversion,
        StageKind::DataMigration,
        StageKind::AnomalyDetection,
        StageKind::DataValidation,
        StageKind::PerformanceOptimization,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StageKind::EnvironmentSetup => "environment_setup",
            StageKind::SchemaConversion => "schema_conversion",
            StageKind::DataMigration => "data_migration",
            StageKind::AnomalyDetection => "anomaly_detection",
            StageKind::DataValidation => "data_validation",
            StageKind::PerformanceOptimization => "performance_optimization",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// The fixed migration workflow:
///
/// ```text
/// environment_setup -> schema_conversion -> data_migration ----+-> data_validation -> performance_optimization
///                                              \ (starts with)  |
///                                               anomaly_detection
/// ```
pub fn migration_workflow() -> Result<WorkflowGraph> {
    use StageKind::*;

    WorkflowGraph::new(vec![
        StageSpec::new(EnvironmentSetup.name()),
        StageSpec::new(SchemaConversion.name()).after(EnvironmentSetup.name()),
        StageSpec::new(DataMigration.name()).after(SchemaConversion.name()),
        StageSpec::new(AnomalyDetection.name()).starts_with(DataMigration.name()),
        StageSpec::new(DataValidation.name())
            .after(DataMigration.name())
            .after(AnomalyDetection.name()),
        StageSpec::new(PerformanceOptimization.name()).after(DataValidation.name()),
    ])
}

/// Decode a tool's output into the shape a stage expects.
pub(crate) fn decode_output<T: DeserializeOwned>(
    tool: ToolName,
    output: Value,
) -> std::result::Result<T, ToolError> {
    serde_json::from_value(output).map_err(|e| ToolError::malformed(tool, e.to_string()))
}
