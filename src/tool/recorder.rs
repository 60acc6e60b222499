// src/tool/recorder.rs

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::tool::invoker::{InvokeFuture, ToolInvoker};
use crate::tool::registry::ToolName;
use crate::tool::wire::ToolCall;

/// Wraps an invoker and records, in order, every tool called through it.
///
/// One recorder is created per stage execution so the stage's result can list
/// exactly the tool calls it issued.
pub struct RecordingInvoker {
    inner: Arc<dyn ToolInvoker>,
    calls: Mutex<Vec<ToolName>>,
}

impl RecordingInvoker {
    pub fn new(inner: Arc<dyn ToolInvoker>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ToolName> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl ToolInvoker for RecordingInvoker {
    fn invoke(&self, call: ToolCall, deadline: Duration) -> InvokeFuture<'_> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call.tool);
        self.inner.invoke(call, deadline)
    }
}
