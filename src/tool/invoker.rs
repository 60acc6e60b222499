// src/tool/invoker.rs

//! The seam between stage logic and the remote tools.
//!
//! Production code uses [`HttpToolInvoker`](crate::tool::HttpToolInvoker);
//! tests provide a scripted implementation that never touches the network.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;

use crate::errors::ToolError;
use crate::tool::wire::ToolCall;

pub type InvokeFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + 'a>>;

/// Invoke a named remote tool.
///
/// Implementations own retries and per-call deadlines; callers only see the
/// final output or a [`ToolError`].
pub trait ToolInvoker: Send + Sync {
    fn invoke(&self, call: ToolCall, deadline: Duration) -> InvokeFuture<'_>;
}
