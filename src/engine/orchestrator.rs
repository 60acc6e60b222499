// src/engine/orchestrator.rs

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::dag::{Scheduler, WorkflowGraph};
use crate::engine::backend::TaskStageBackend;
use crate::engine::core::CoreRuntime;
use crate::engine::runtime::Runtime;
use crate::engine::RuntimeEvent;
use crate::errors::{MigradagError, Result};
use crate::report::MigrationReport;
use crate::stages::{StageRegistry, StageSettings, migration_workflow};
use crate::tool::ToolInvoker;

/// Owns the static pieces of a workflow and runs it on demand.
///
/// Every call to [`Orchestrator::run`] builds a fresh scheduler and result
/// store, so runs never share state.
pub struct Orchestrator {
    graph: WorkflowGraph,
    registry: Arc<StageRegistry>,
    invoker: Arc<dyn ToolInvoker>,
    settings: Arc<StageSettings>,
}

impl Orchestrator {
    /// Fails if a stage in the graph has no registered logic.
    pub fn new(
        graph: WorkflowGraph,
        registry: Arc<StageRegistry>,
        invoker: Arc<dyn ToolInvoker>,
        settings: Arc<StageSettings>,
    ) -> Result<Self> {
        if let Some(missing) = graph.stages().find(|name| !registry.contains(name)) {
            return Err(MigradagError::StageNotFound(format!(
                "no logic registered for stage '{missing}'"
            )));
        }

        Ok(Self {
            graph,
            registry,
            invoker,
            settings,
        })
    }

    /// The standard six-stage migration.
    pub fn migration(invoker: Arc<dyn ToolInvoker>, settings: StageSettings) -> Result<Self> {
        Self::new(
            migration_workflow()?,
            Arc::new(StageRegistry::migration()),
            invoker,
            Arc::new(settings),
        )
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn settings(&self) -> &StageSettings {
        &self.settings
    }

    /// Run the workflow to completion.
    pub async fn run(&self) -> Result<MigrationReport> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Run the workflow; when `interrupt` resolves, stages that have not
    /// started are skipped and the run finishes once running stages return.
    pub async fn run_until<F>(&self, interrupt: F) -> Result<MigrationReport>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(
            project_id = %self.settings.project_id,
            stages = self.graph.len(),
            "starting migration run"
        );

        let (runtime_tx, runtime_rx) = mpsc::channel::<RuntimeEvent>(64);
        let core = CoreRuntime::new(Scheduler::new(self.graph.clone()));
        let (status_tx, status_rx) = watch::channel(core.status_table());

        let backend = TaskStageBackend::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.invoker),
            Arc::clone(&self.settings),
            status_rx,
            runtime_tx.clone(),
        );

        let interrupt_tx = runtime_tx;
        let interrupt_watcher = tokio::spawn(async move {
            interrupt.await;
            let _ = interrupt_tx.send(RuntimeEvent::ShutdownRequested).await;
        });

        let outcome = Runtime::new(core, runtime_rx, backend, status_tx).run().await;
        interrupt_watcher.abort();

        let core = outcome?;
        let report = core.report(&self.settings.project_id);
        info!(success = report.success, "migration run finished");
        Ok(report)
    }
}
