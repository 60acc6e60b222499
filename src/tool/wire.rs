// src/tool/wire.rs

//! Request/response shapes exchanged with the tool collaborator.
//!
//! Request:  `{"tool": "get_db_size", "project_id": "p", ...}`
//! Response: `{"status": "success", "output": ...}` or
//!           `{"status": "error", "message": "..."}`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ToolError;
use crate::tool::registry::ToolName;

/// A structured tool request: a registered tool plus named arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub tool: ToolName,
    pub args: BTreeMap<String, Value>,
}

impl ToolCall {
    pub fn new(tool: ToolName) -> Self {
        Self {
            tool,
            args: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn args<I, K>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (k, v) in args {
            self.args.insert(k.into(), v);
        }
        self
    }

    /// JSON body sent to the collaborator. An argument named `tool` cannot
    /// shadow the tool name.
    pub fn to_wire(&self) -> Value {
        let mut body = Map::new();
        body.insert("tool".to_string(), Value::from(self.tool.as_str()));
        for (k, v) in &self.args {
            if k != "tool" {
                body.insert(k.clone(), v.clone());
            }
        }
        Value::Object(body)
    }
}

/// Response envelope returned by the collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolResponse {
    Success {
        #[serde(default)]
        output: Value,
    },
    Error {
        #[serde(default)]
        message: String,
    },
}

impl ToolResponse {
    /// Convert the envelope into the tool's output or a typed error.
    pub fn into_result(self, tool: ToolName) -> Result<Value, ToolError> {
        match self {
            ToolResponse::Success { output } => Ok(output),
            ToolResponse::Error { message } => {
                if let Some(name) = message.trim().strip_prefix("Unknown tool:") {
                    return Err(ToolError::UnknownTool(name.trim().to_string()));
                }
                Err(ToolError::ToolExecutionError {
                    tool: tool.to_string(),
                    message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_flattens_args_next_to_tool() {
        let call = ToolCall::new(ToolName::GetDbSize)
            .arg("project_id", "demo")
            .arg("tool", "sneaky");

        assert_eq!(
            call.to_wire(),
            json!({"tool": "get_db_size", "project_id": "demo"})
        );
    }

    #[test]
    fn decodes_success_and_error_envelopes() {
        let ok: ToolResponse =
            serde_json::from_value(json!({"status": "success", "output": {"size_gb": 250}}))
                .unwrap();
        assert_eq!(
            ok.into_result(ToolName::GetDbSize),
            Ok(json!({"size_gb": 250}))
        );

        let err: ToolResponse =
            serde_json::from_value(json!({"status": "error", "message": "quota exceeded"}))
                .unwrap();
        assert!(matches!(
            err.into_result(ToolName::MigrateDms),
            Err(ToolError::ToolExecutionError { .. })
        ));
    }

    #[test]
    fn remote_unknown_tool_message_maps_to_unknown_tool() {
        let err = ToolResponse::Error {
            message: "Unknown tool: migrate_gcs".to_string(),
        };
        assert_eq!(
            err.into_result(ToolName::MigrateGcs),
            Err(ToolError::UnknownTool("migrate_gcs".to_string()))
        );
    }

    #[test]
    fn unknown_status_is_not_decodable() {
        let res: Result<ToolResponse, _> =
            serde_json::from_value(json!({"status": "pending"}));
        assert!(res.is_err());
    }
}
