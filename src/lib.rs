// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod report;
pub mod stages;
pub mod tool;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, default_config_path, load_and_validate};
use crate::dag::WorkflowGraph;
use crate::engine::Orchestrator;
use crate::stages::{StageSettings, migration_workflow};
use crate::tool::{HealthProbe, HttpToolInvoker, ToolInvoker, ToolName};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the collaborator health check
/// - the HTTP tool invoker
/// - the orchestrator run
/// - Ctrl-C handling
///
/// Returns whether the migration succeeded.
pub async fn run(args: CliArgs) -> Result<bool> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let cfg = load_and_validate(&config_path)?;
    let graph = migration_workflow()?;

    if args.dry_run {
        print_dry_run(&cfg, &graph);
        return Ok(true);
    }

    if args.skip_health_check {
        warn!("skipping collaborator health check");
    } else {
        HealthProbe::new(&cfg.collaborator.health_url, cfg.collaborator.request_timeout)
            .check()
            .await?;
        info!(url = %cfg.collaborator.health_url, "collaborator healthy");
    }

    let invoker: Arc<dyn ToolInvoker> =
        Arc::new(HttpToolInvoker::from_settings(&cfg.collaborator, cfg.retry));
    let orchestrator = Orchestrator::migration(invoker, StageSettings::from_config(&cfg))?;

    // Ctrl-C → skip whatever has not started yet.
    let report = orchestrator
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{report}");
    }

    Ok(report.success)
}

/// Dry-run output: print settings, the stage graph and the tool registry.
fn print_dry_run(cfg: &ConfigFile, graph: &WorkflowGraph) {
    println!("migradag dry-run");
    println!("  project_id = {}", cfg.project_id);
    println!("  collaborator.endpoint = {}", cfg.collaborator.endpoint);
    println!("  collaborator.health_url = {}", cfg.collaborator.health_url);
    println!("  collaborator.request_timeout = {:?}", cfg.collaborator.request_timeout);
    println!("  retry.max_retries = {}", cfg.retry.max_retries);
    println!("  monitor.poll_interval = {:?}", cfg.poll_interval);
    println!();

    println!("stages ({}):", graph.len());
    for name in graph.stages() {
        println!("  - {name}");
        let deps = graph.dependencies_of(name);
        if !deps.is_empty() {
            println!("      after: {deps:?}");
        }
        if let Some(lead) = graph.starts_with_of(name) {
            println!("      starts_with: {lead}");
        }
    }
    println!();

    let tools: Vec<&str> = ToolName::ALL.iter().map(|t| t.as_str()).collect();
    println!("tools: {}", tools.join(", "));

    debug!("dry-run complete (no tool calls)");
}
