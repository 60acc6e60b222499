// src/tool/http.rs

//! Production tool invoker: POSTs the wire request to the collaborator.
//!
//! Transport failures (connect errors, timeouts, 5xx, 401) surface as
//! `ToolUnreachable` and are retried with exponential backoff. A tool-reported
//! error is returned immediately.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{CollaboratorSettings, RetryPolicy};
use crate::errors::ToolError;
use crate::tool::credentials::Credentials;
use crate::tool::invoker::{InvokeFuture, ToolInvoker};
use crate::tool::registry::ToolName;
use crate::tool::wire::{ToolCall, ToolResponse};

#[derive(Debug, Clone)]
pub struct HttpToolInvoker {
    client: reqwest::Client,
    endpoint: String,
    retry: RetryPolicy,
    credentials: Credentials,
}

impl HttpToolInvoker {
    pub fn new(endpoint: impl Into<String>, retry: RetryPolicy, credentials: Credentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            retry,
            credentials,
        }
    }

    /// Build an invoker from validated collaborator settings.
    pub fn from_settings(settings: &CollaboratorSettings, retry: RetryPolicy) -> Self {
        let credentials = match &settings.token_env {
            Some(var) => Credentials::from_env(var.clone()),
            None => Credentials::none(),
        };
        Self::new(settings.endpoint.clone(), retry, credentials)
    }

    async fn send_once(
        &self,
        tool: ToolName,
        body: &Value,
        deadline: Duration,
    ) -> Result<Value, ToolError> {
        let unreachable = |message: String| ToolError::ToolUnreachable {
            tool: tool.to_string(),
            message,
        };

        let mut req = self.client.post(&self.endpoint).timeout(deadline).json(body);
        if let Some(token) = self.credentials.token() {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(|e| unreachable(e.to_string()))?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            self.credentials.invalidate();
            return Err(unreachable("collaborator rejected credentials (HTTP 401)".to_string()));
        }
        if status.is_server_error() {
            let text = resp.text().await.unwrap_or_default();
            return Err(unreachable(format!("HTTP {}: {}", status.as_u16(), text.trim())));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ToolError::ToolExecutionError {
                tool: tool.to_string(),
                message: format!("HTTP {}: {}", status.as_u16(), text.trim()),
            });
        }

        let text = resp.text().await.map_err(|e| unreachable(e.to_string()))?;
        let envelope: ToolResponse = serde_json::from_str(&text)
            .map_err(|e| ToolError::malformed(tool, format!("invalid response envelope: {e}")))?;

        envelope.into_result(tool)
    }
}

impl ToolInvoker for HttpToolInvoker {
    fn invoke(&self, call: ToolCall, deadline: Duration) -> InvokeFuture<'_> {
        Box::pin(async move {
            let tool = call.tool;
            let body = call.to_wire();
            let mut attempt: u32 = 0;

            loop {
                debug!(tool = %tool, attempt, "invoking tool");

                match self.send_once(tool, &body, deadline).await {
                    Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                        let backoff = self.retry.backoff(attempt);
                        warn!(
                            tool = %tool,
                            attempt = attempt + 1,
                            max_retries = self.retry.max_retries,
                            backoff_ms = backoff.as_millis() as u64,
                            error = %err,
                            "retrying tool call"
                        );
                        tokio::time::sleep(backoff).await;
                        attempt += 1;
                    }
                    other => return other,
                }
            }
        })
    }
}
