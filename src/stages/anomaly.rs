// src/stages/anomaly.rs

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::errors::ToolError;
use crate::stages::{StageContext, StageFuture, StageKind, StageLogic, StageResult, decode_output};
use crate::tool::{ToolCall, ToolName};
use crate::types::Severity;

/// Output of `monitor_logs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitorReport {
    #[serde(default)]
    pub anomalies: Vec<String>,
}

/// Outcome of a single monitoring poll.
enum Poll {
    Clear,
    Anomalies(Vec<String>),
    Failed(ToolError),
}

/// Watches the migration's logs while it runs.
///
/// Polls `monitor_logs` once immediately and then every poll interval until
/// the migration is terminal. The first reported anomaly ends the stage with a
/// failed verdict; otherwise it reports "all clear" once the migration ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnomalyDetection;

impl StageLogic for AnomalyDetection {
    fn execute<'a>(&'a self, ctx: &'a StageContext) -> StageFuture<'a> {
        Box::pin(async move {
            let watched = StageKind::DataMigration.name();
            let result = StageResult::ok(ctx.stage());
            let mut polls: u32 = 0;

            loop {
                // The first poll always runs to completion; later polls race
                // the migration finishing.
                let poll = if polls == 0 {
                    poll_once(ctx).await
                } else {
                    tokio::select! {
                        biased;
                        _ = ctx.wait_until_terminal(watched) => break,
                        poll = poll_once(ctx) => poll,
                    }
                };
                polls += 1;

                match poll {
                    Poll::Clear => debug!(stage = %ctx.stage(), polls, "no anomalies"),
                    Poll::Anomalies(anomalies) => {
                        warn!(stage = %ctx.stage(), count = anomalies.len(), "anomalies detected");
                        return anomalies_found(result, anomalies);
                    }
                    Poll::Failed(err) => return result.from_tool_error("monitor_logs failed", &err),
                }

                tokio::select! {
                    biased;
                    _ = ctx.wait_until_terminal(watched) => break,
                    _ = tokio::time::sleep(ctx.settings().poll_interval) => {}
                }
            }

            info!(stage = %ctx.stage(), polls, "migration finished without anomalies");
            result.with("status", "all clear").with_diagnostic("all clear")
        })
    }
}

async fn poll_once(ctx: &StageContext) -> Poll {
    let call = ToolCall::new(ToolName::MonitorLogs).args(ctx.base_args());
    match ctx
        .invoke(call)
        .await
        .and_then(|out| decode_output::<MonitorReport>(ToolName::MonitorLogs, out))
    {
        Ok(report) if report.anomalies.is_empty() => Poll::Clear,
        Ok(report) => Poll::Anomalies(report.anomalies),
        Err(err) => Poll::Failed(err),
    }
}

fn anomalies_found(result: StageResult, anomalies: Vec<String>) -> StageResult {
    let severity = Severity::High;
    let joined = anomalies.join("; ");
    result
        .with("severity", severity.as_str())
        .with("anomaly_count", anomalies.len())
        .with("anomalies", joined.clone())
        .failed(format!(
            "anomalies detected (severity {}): {}",
            severity.as_str(),
            joined
        ))
}
