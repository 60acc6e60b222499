// src/stages/performance.rs

use serde::Deserialize;
use tracing::info;

use crate::config::PerformanceThresholds;
use crate::errors::ToolError;
use crate::stages::{StageContext, StageFuture, StageLogic, StageResult, decode_output};
use crate::tool::{ToolCall, ToolName};

/// Recommendation recorded when every metric is within its thresholds.
pub const NO_CHANGES: &str = "no changes recommended";

/// Output of `analyze_performance`.
#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceMetrics {
    pub cpu_utilization_pct: f64,
    #[serde(default)]
    pub memory_utilization_pct: Option<f64>,
    #[serde(default)]
    pub instance_tier: Option<String>,
}

fn parse_metrics(output: serde_json::Value) -> Result<PerformanceMetrics, ToolError> {
    let metrics: PerformanceMetrics = decode_output(ToolName::AnalyzePerformance, output)?;
    let valid = |pct: f64| pct.is_finite() && (0.0..=100.0).contains(&pct);

    if !valid(metrics.cpu_utilization_pct) || !metrics.memory_utilization_pct.is_none_or(valid) {
        return Err(ToolError::malformed(
            ToolName::AnalyzePerformance,
            "utilization percentages must be between 0 and 100",
        ));
    }
    Ok(metrics)
}

/// Turn metrics into right-sizing recommendations.
///
/// CPU strictly below the low-water mark suggests downsizing, strictly above
/// the high-water mark suggests upgrading; memory above its high-water mark
/// suggests a higher-memory tier.
pub fn recommendations(metrics: &PerformanceMetrics, thresholds: &PerformanceThresholds) -> Vec<String> {
    let from_tier = metrics
        .instance_tier
        .as_deref()
        .map(|tier| format!(" from {tier}"))
        .unwrap_or_default();
    let cpu = metrics.cpu_utilization_pct;
    let mut out = Vec::new();

    if cpu < thresholds.cpu_low_water {
        out.push(format!(
            "consider downsizing{from_tier}: CPU utilization {cpu:.1}% is below {:.1}%",
            thresholds.cpu_low_water
        ));
    } else if cpu > thresholds.cpu_high_water {
        out.push(format!(
            "consider upgrading{from_tier}: CPU utilization {cpu:.1}% is above {:.1}%",
            thresholds.cpu_high_water
        ));
    }

    if let Some(memory) = metrics.memory_utilization_pct {
        if memory > thresholds.memory_high_water {
            out.push(format!(
                "consider a higher-memory tier: memory utilization {memory:.1}% is above {:.1}%",
                thresholds.memory_high_water
            ));
        }
    }

    out
}

/// Reads utilization of the migrated database and recommends right-sizing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceOptimization;

impl StageLogic for PerformanceOptimization {
    fn execute<'a>(&'a self, ctx: &'a StageContext) -> StageFuture<'a> {
        Box::pin(async move {
            let result = StageResult::ok(ctx.stage());

            let call = ToolCall::new(ToolName::AnalyzePerformance).args(ctx.base_args());
            let metrics = match ctx.invoke(call).await.and_then(parse_metrics) {
                Ok(metrics) => metrics,
                Err(err) => return result.from_tool_error("analyze_performance failed", &err),
            };

            let recs = recommendations(&metrics, &ctx.settings().performance);
            let recommendation = if recs.is_empty() {
                NO_CHANGES.to_string()
            } else {
                recs.join("; ")
            };
            info!(stage = %ctx.stage(), count = recs.len(), "performance analysed");

            let mut result = result
                .with("cpu_utilization_pct", metrics.cpu_utilization_pct)
                .with("recommendation_count", recs.len())
                .with("recommendation", recommendation.clone());
            if let Some(memory) = metrics.memory_utilization_pct {
                result = result.with("memory_utilization_pct", memory);
            }
            if let Some(tier) = metrics.instance_tier {
                result = result.with("instance_tier", tier);
            }
            result.with_diagnostic(recommendation)
        })
    }
}
