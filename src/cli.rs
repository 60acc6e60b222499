// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `migradag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "migradag",
    version,
    about = "Orchestrate a staged database migration against a tool collaborator.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Migradag.toml` in the current working directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MIGRADAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the workflow graph, but don't call any tool.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the final report as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Do not probe the collaborator's health endpoint before starting.
    #[arg(long)]
    pub skip_health_check: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
