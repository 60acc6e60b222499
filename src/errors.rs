// src/errors.rs

//! Crate-wide error types.
//!
//! `MigradagError` covers setup failures (config, graph, health check).
//! `ToolError` is the taxonomy of a single remote tool invocation; stages turn
//! it into a failed `StageResult` rather than propagating it out of a run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigradagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Cycle detected in workflow graph: {0}")]
    DagCycle(String),

    #[error("Invalid workflow graph: {0}")]
    InvalidGraph(String),

    #[error("Stage not found: {0}")]
    StageNotFound(String),

    #[error("Collaborator health check failed: {0}")]
    HealthCheckFailed(String),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of a single tool invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The tool name is not in the registry. Programming error; aborts the run.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Transport failure (connection refused, timeout, 5xx). Retryable.
    #[error("tool '{tool}' unreachable: {message}")]
    ToolUnreachable { tool: String, message: String },

    /// The tool ran and reported a business error. Not retried.
    #[error("tool '{tool}' reported an error: {message}")]
    ToolExecutionError { tool: String, message: String },

    /// The tool answered, but not in the shape the stage expects.
    #[error("tool '{tool}' returned malformed output: {message}")]
    MalformedOutput { tool: String, message: String },
}

impl ToolError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ToolError::ToolUnreachable { .. })
    }

    /// Whether this error must abort the whole run rather than a single stage.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ToolError::UnknownTool(_))
    }

    /// Stable identifier recorded in stage payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::UnknownTool(_) => "unknown_tool",
            ToolError::ToolUnreachable { .. } => "tool_unreachable",
            ToolError::ToolExecutionError { .. } => "tool_execution_error",
            ToolError::MalformedOutput { .. } => "malformed_output",
        }
    }

    pub fn malformed(tool: impl ToString, message: impl Into<String>) -> Self {
        ToolError::MalformedOutput {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MigradagError>;
