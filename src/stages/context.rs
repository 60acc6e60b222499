// src/stages/context.rs

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use crate::config::{ConfigFile, PerformanceThresholds};
use crate::engine::StageName;
use crate::engine::status::StatusTable;
use crate::errors::ToolError;
use crate::stages::{StageKind, StageResult};
use crate::tool::{RecordingInvoker, ToolCall, ToolInvoker, ToolName};
use crate::types::{PayloadValue, StageStatus};

/// Run-wide settings every stage can read.
#[derive(Debug, Clone)]
pub struct StageSettings {
    pub project_id: String,
    /// Deadline applied to each tool call.
    pub request_timeout: Duration,
    /// Interval between `monitor_logs` polls.
    pub poll_interval: Duration,
    pub performance: PerformanceThresholds,
}

impl StageSettings {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            project_id: cfg.project_id.clone(),
            request_timeout: cfg.collaborator.request_timeout,
            poll_interval: cfg.poll_interval,
            performance: cfg.performance,
        }
    }
}

/// Everything one stage execution may look at.
///
/// `inputs` holds the results of every ancestor that finished before this
/// stage was dispatched; they are never mutated afterwards.
pub struct StageContext {
    stage: StageName,
    inputs: BTreeMap<StageName, Arc<StageResult>>,
    invoker: RecordingInvoker,
    status: watch::Receiver<StatusTable>,
    settings: Arc<StageSettings>,
}

impl StageContext {
    pub fn new(
        stage: StageName,
        inputs: BTreeMap<StageName, Arc<StageResult>>,
        invoker: Arc<dyn ToolInvoker>,
        status: watch::Receiver<StatusTable>,
        settings: Arc<StageSettings>,
    ) -> Self {
        Self {
            stage,
            inputs,
            invoker: RecordingInvoker::new(invoker),
            status,
            settings,
        }
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn settings(&self) -> &StageSettings {
        &self.settings
    }

    pub fn input(&self, stage: &str) -> Option<&StageResult> {
        self.inputs.get(stage).map(Arc::as_ref)
    }

    pub fn inputs(&self) -> impl Iterator<Item = (&str, &StageResult)> {
        self.inputs.iter().map(|(name, result)| (name.as_str(), result.as_ref()))
    }

    /// Invoke a tool with the configured deadline. The call is recorded for
    /// this stage's result.
    pub async fn invoke(&self, call: ToolCall) -> Result<Value, ToolError> {
        debug!(stage = %self.stage, tool = %call.tool, "invoking tool");
        self.invoker.invoke(call, self.settings.request_timeout).await
    }

    /// Tools invoked so far, in call order.
    pub fn tool_calls(&self) -> Vec<ToolName> {
        self.invoker.calls()
    }

    /// Resolve once `stage` is terminal (or unknown to this run).
    pub async fn wait_until_terminal(&self, stage: &str) {
        let mut status = self.status.clone();
        let closed = status
            .wait_for(|table| table.get(stage).is_none_or(StageStatus::is_terminal))
            .await
            .is_err();
        if closed {
            debug!(stage = %self.stage, waiting_on = %stage, "status channel closed");
        }
    }

    /// Infrastructure facts gathered by environment setup.
    pub fn infra_facts(&self) -> Option<&BTreeMap<String, PayloadValue>> {
        self.input(StageKind::EnvironmentSetup.name())
            .map(StageResult::payload)
    }

    /// `project_id` plus every infrastructure fact, as tool arguments.
    pub fn base_args(&self) -> BTreeMap<String, Value> {
        let mut args = self.fact_args();
        args.insert(
            "project_id".to_string(),
            Value::from(self.settings.project_id.clone()),
        );
        args
    }

    /// Infrastructure facts alone, as tool arguments.
    pub fn fact_args(&self) -> BTreeMap<String, Value> {
        self.infra_facts()
            .map(|facts| {
                facts
                    .iter()
                    .map(|(key, value)| (key.clone(), payload_to_json(value)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn payload_to_json(value: &PayloadValue) -> Value {
    match value {
        PayloadValue::Number(n) => Value::from(*n),
        PayloadValue::Text(s) => Value::from(s.clone()),
    }
}
