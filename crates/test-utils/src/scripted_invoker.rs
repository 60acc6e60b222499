use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{Value, json};

use migradag::errors::ToolError;
use migradag::tool::{InvokeFuture, ToolCall, ToolInvoker, ToolName};

type Reply = Result<Value, ToolError>;

/// A tool invoker that replays scripted replies instead of calling out.
///
/// - Each tool has a queue of replies; the last one repeats forever.
/// - Tools with no script answer with a `ToolExecutionError`.
/// - An optional per-tool delay simulates slow tools.
/// - Every call is recorded, in order, with its arguments.
#[derive(Default)]
pub struct ScriptedInvoker {
    replies: Mutex<HashMap<ToolName, VecDeque<Reply>>>,
    delays: Mutex<HashMap<ToolName, Duration>>,
    calls: Mutex<Vec<ToolCall>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every tool succeeds: schema compatible, the given database size, no
    /// anomalies, matching validation, utilization within thresholds.
    pub fn happy_path(size_gb: f64) -> Self {
        Self::new()
            .respond(
                ToolName::TerraformOutput,
                json!({
                    "instance_name": {"value": "target-db"},
                    "region": {"value": "europe-west1"},
                }),
            )
            .respond(ToolName::CompareSchema, json!({"compatible": true, "differences": []}))
            .respond(ToolName::CreateSchema, json!({"created": true}))
            .respond(ToolName::GetDbSize, json!({"size_gb": size_gb}))
            .respond(ToolName::MigrateGcs, json!({"job_id": "job-gcs"}))
            .respond(ToolName::MigrateDms, json!({"job_id": "job-dms"}))
            .respond(ToolName::MigrateMydumper, json!({"job_id": "job-mydumper"}))
            .respond(ToolName::MonitorLogs, json!({"anomalies": []}))
            .respond(ToolName::ValidateRowCounts, json!({"tables_checked": 12, "mismatches": []}))
            .respond(ToolName::ValidateChecksums, json!({"tables_checked": 12, "mismatches": []}))
            .respond(
                ToolName::AnalyzePerformance,
                json!({"cpu_utilization_pct": 45.0, "memory_utilization_pct": 60.0, "instance_tier": "db-custom-4"}),
            )
    }

    /// Replace `tool`'s script with a single repeating successful output.
    pub fn respond(self, tool: ToolName, output: Value) -> Self {
        self.script(tool, vec![Ok(output)])
    }

    /// Replace `tool`'s script with a single repeating business error.
    pub fn fail(self, tool: ToolName, message: &str) -> Self {
        let err = ToolError::ToolExecutionError {
            tool: tool.to_string(),
            message: message.to_string(),
        };
        self.script(tool, vec![Err(err)])
    }

    /// Replace `tool`'s script with the given replies, in order.
    pub fn script(self, tool: ToolName, replies: Vec<Reply>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(tool, replies.into_iter().collect());
        self
    }

    /// Delay every reply of `tool`.
    pub fn delay(self, tool: ToolName, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(tool, delay);
        self
    }

    pub fn calls(&self) -> Vec<ToolName> {
        self.calls.lock().unwrap().iter().map(|c| c.tool).collect()
    }

    /// Arguments of every call made to `tool`.
    pub fn calls_to(&self, tool: ToolName) -> Vec<ToolCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.tool == tool)
            .cloned()
            .collect()
    }

    pub fn count(&self, tool: ToolName) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.tool == tool).count()
    }

    fn next_reply(&self, tool: ToolName) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        match replies.get_mut(&tool) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(ToolError::ToolExecutionError {
                tool: tool.to_string(),
                message: "no scripted reply".to_string(),
            }),
        }
    }
}

impl ToolInvoker for ScriptedInvoker {
    fn invoke(&self, call: ToolCall, _deadline: Duration) -> InvokeFuture<'_> {
        let tool = call.tool;
        self.calls.lock().unwrap().push(call);
        let reply = self.next_reply(tool);
        let delay = self.delays.lock().unwrap().get(&tool).copied();

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            reply
        })
    }
}
