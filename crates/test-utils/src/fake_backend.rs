use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use migradag::engine::{DispatchedStage, RuntimeEvent, StageBackend};
use migradag::errors::Result;
use migradag::stages::StageResult;

/// A fake stage backend that:
/// - records which stages were dispatched, and the inputs each one saw
/// - immediately reports a result for each, failing the ones in `failing`.
pub struct FakeBackend {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    dispatched: Arc<Mutex<Vec<DispatchedStage>>>,
    failing: HashSet<String>,
}

impl FakeBackend {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        dispatched: Arc<Mutex<Vec<DispatchedStage>>>,
    ) -> Self {
        Self {
            runtime_tx,
            dispatched,
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, stage: &str) -> Self {
        self.failing.insert(stage.to_string());
        self
    }
}

impl StageBackend for FakeBackend {
    fn spawn_stages(
        &mut self,
        stages: Vec<DispatchedStage>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let dispatched = Arc::clone(&self.dispatched);
        let failing = self.failing.clone();

        Box::pin(async move {
            for stage in stages {
                let result = if failing.contains(&stage.name) {
                    StageResult::fail(stage.name.clone(), "scripted failure")
                } else {
                    StageResult::ok(stage.name.clone())
                };
                dispatched.lock().unwrap().push(stage);

                tx.send(RuntimeEvent::StageCompleted { result })
                    .await
                    .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
