// src/types.rs

//! Small shared value types used by the scheduler, stages and report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Verdict a stage reaches when it runs to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Ok,
    Fail,
}

impl Verdict {
    pub fn is_ok(self) -> bool {
        matches!(self, Verdict::Ok)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Ok => f.write_str("ok"),
            Verdict::Fail => f.write_str("fail"),
        }
    }
}

/// Lifecycle of a stage within one migration run.
///
/// `Pending -> Running -> {Succeeded, Failed}`, or `Pending -> Skipped` when a
/// precondition can no longer be met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl StageStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StageStatus::Succeeded | StageStatus::Failed | StageStatus::Skipped
        )
    }
}

impl From<Verdict> for StageStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Ok => StageStatus::Succeeded,
            Verdict::Fail => StageStatus::Failed,
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::Succeeded => "succeeded",
            StageStatus::Failed => "failed",
            StageStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Severity attached to monitoring findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "high",
        }
    }
}

/// A single value in a stage payload: either text or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Number(f64),
    Text(String),
}

impl PayloadValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PayloadValue::Text(s) => Some(s),
            PayloadValue::Number(_) => None,
        }
    }
}

impl fmt::Display for PayloadValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadValue::Number(n) => write!(f, "{n}"),
            PayloadValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(s: &str) -> Self {
        PayloadValue::Text(s.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(s: String) -> Self {
        PayloadValue::Text(s)
    }
}

impl From<f64> for PayloadValue {
    fn from(n: f64) -> Self {
        PayloadValue::Number(n)
    }
}

impl From<u64> for PayloadValue {
    fn from(n: u64) -> Self {
        PayloadValue::Number(n as f64)
    }
}

impl From<usize> for PayloadValue {
    fn from(n: usize) -> Self {
        PayloadValue::Number(n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!StageStatus::Pending.is_terminal());
        assert!(!StageStatus::Running.is_terminal());
        assert!(StageStatus::Succeeded.is_terminal());
        assert!(StageStatus::Failed.is_terminal());
        assert!(StageStatus::Skipped.is_terminal());
    }

    #[test]
    fn payload_values_serialize_untagged() {
        let n = serde_json::to_string(&PayloadValue::from(250.0)).unwrap();
        let s = serde_json::to_string(&PayloadValue::from("dms")).unwrap();
        assert_eq!(n, "250.0");
        assert_eq!(s, "\"dms\"");
    }
}
