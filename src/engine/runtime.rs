// src/engine/runtime.rs

use std::fmt;

use anyhow::anyhow;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::engine::event_handlers::DispatchedStage;
use crate::engine::status::StatusTable;
use crate::errors::{MigradagError, Result};

use super::backend::StageBackend;
use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Drives the DAG scheduler in response to `RuntimeEvent`s, and delegates
/// stage execution to a `StageBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics. This struct handles async IO: reading events from
/// channels, publishing the status table and dispatching stages.
pub struct Runtime<B: StageBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    backend: B,
    status_tx: watch::Sender<StatusTable>,
}

impl<B: StageBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: StageBackend> Runtime<B> {
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        backend: B,
        status_tx: watch::Sender<StatusTable>,
    ) -> Self {
        Self {
            core,
            event_rx,
            backend,
            status_tx,
        }
    }

    /// Main event loop.
    ///
    /// - Starts the run and dispatches the entry stage.
    /// - Consumes `RuntimeEvent`s from `event_rx` and feeds them into the core.
    /// - Publishes the status table before executing the core's commands, so
    ///   a stage never observes a table older than its own dispatch.
    ///
    /// Returns the core once every stage is terminal.
    pub async fn run(mut self) -> Result<CoreRuntime> {
        info!("migradag runtime started");

        let mut step = self.core.start();

        loop {
            self.publish_status();

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("all stages terminal; stopping runtime");
                break;
            }

            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    return Err(MigradagError::Other(anyhow!(
                        "runtime event channel closed before every stage finished"
                    )));
                }
            };

            if let RuntimeEvent::StageCompleted { result } = &event {
                debug!(stage = %result.stage(), verdict = %result.verdict(), "runtime received completion");
            }

            step = self.core.step(event);
        }

        Ok(self.core)
    }

    fn publish_status(&self) {
        let table = self.core.status_table();
        self.status_tx.send_if_modified(|current| {
            if *current == table {
                false
            } else {
                *current = table;
                true
            }
        });
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchStages(stages) => self.spawn_ready(stages).await,
            CoreCommand::RunFinished => {
                debug!("core issued RunFinished command");
                Ok(())
            }
        }
    }

    async fn spawn_ready(&mut self, stages: Vec<DispatchedStage>) -> Result<()> {
        if stages.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = stages.iter().map(|s| s.name.as_str()).collect();
        debug!(?names, "dispatching ready stages");

        self.backend.spawn_stages(stages).await
    }
}
