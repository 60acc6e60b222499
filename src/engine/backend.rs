// src/engine/backend.rs

//! Pluggable stage backend abstraction.
//!
//! The runtime talks to a `StageBackend` instead of spawning stage tasks
//! itself. Production uses [`TaskStageBackend`], which runs each dispatched
//! stage on its own Tokio task; tests can substitute a backend that completes
//! stages synchronously.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::engine::event_handlers::DispatchedStage;
use crate::engine::status::StatusTable;
use crate::engine::RuntimeEvent;
use crate::errors::Result;
use crate::stages::{StageContext, StageLogic, StageRegistry, StageResult, StageSettings};
use crate::tool::ToolInvoker;

/// Trait abstracting how dispatched stages are executed.
///
/// Implementations must eventually send exactly one
/// `RuntimeEvent::StageCompleted` per dispatched stage.
pub trait StageBackend: Send {
    fn spawn_stages(
        &mut self,
        stages: Vec<DispatchedStage>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Runs every dispatched stage on its own Tokio task.
pub struct TaskStageBackend {
    registry: Arc<StageRegistry>,
    invoker: Arc<dyn ToolInvoker>,
    settings: Arc<StageSettings>,
    status_rx: watch::Receiver<StatusTable>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl TaskStageBackend {
    pub fn new(
        registry: Arc<StageRegistry>,
        invoker: Arc<dyn ToolInvoker>,
        settings: Arc<StageSettings>,
        status_rx: watch::Receiver<StatusTable>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            registry,
            invoker,
            settings,
            status_rx,
            runtime_tx,
        }
    }
}

impl StageBackend for TaskStageBackend {
    fn spawn_stages(
        &mut self,
        stages: Vec<DispatchedStage>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        for stage in stages {
            let ctx = StageContext::new(
                stage.name.clone(),
                stage.inputs,
                Arc::clone(&self.invoker),
                self.status_rx.clone(),
                Arc::clone(&self.settings),
            );
            let logic = self.registry.get(&stage.name);
            tokio::spawn(run_stage(stage.name, logic, ctx, self.runtime_tx.clone()));
        }

        Box::pin(async { Ok(()) })
    }
}

/// Execute one stage and report its result to the runtime.
///
/// The stage body runs on a nested task so a panic becomes a failed result
/// instead of a missing completion.
async fn run_stage(
    name: String,
    logic: Option<Arc<dyn StageLogic>>,
    ctx: StageContext,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let started = Instant::now();
    info!(
        stage = %name,
        inputs = ?ctx.inputs().map(|(input, _)| input).collect::<Vec<_>>(),
        "stage started"
    );

    let result = match logic {
        Some(logic) => {
            let handle = tokio::spawn(async move {
                let result = logic.execute(&ctx).await;
                result.with_tool_calls(ctx.tool_calls())
            });
            match handle.await {
                Ok(result) => result,
                Err(err) => {
                    error!(stage = %name, error = %err, "stage task panicked");
                    StageResult::fail(name.clone(), format!("stage task panicked: {err}"))
                }
            }
        }
        None => {
            error!(stage = %name, "no logic registered for stage");
            StageResult::fail(name.clone(), "no logic registered for stage").mark_fatal()
        }
    };

    info!(
        stage = %name,
        verdict = %result.verdict(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "stage finished"
    );

    if runtime_tx
        .send(RuntimeEvent::StageCompleted { result })
        .await
        .is_err()
    {
        warn!(stage = %name, "runtime stopped before stage result was delivered");
    }
}
