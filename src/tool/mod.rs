// src/tool/mod.rs

//! Remote tool invocation.
//!
//! The orchestrator never runs tools itself; it asks a collaborator to run a
//! named tool and reacts to success or failure.
//!
//! - [`registry`] is the fixed set of tool identifiers.
//! - [`wire`] holds the request/response types and their JSON shape.
//! - [`invoker`] defines the `ToolInvoker` trait the stages call through.
//! - [`http`] is the production invoker (HTTP POST, bounded retries).
//! - [`credentials`] caches the collaborator bearer token.
//! - [`health`] probes the collaborator before a run starts.
//! - [`recorder`] wraps an invoker and records which tools a stage called.

pub mod credentials;
pub mod health;
pub mod http;
pub mod invoker;
pub mod recorder;
pub mod registry;
pub mod wire;

pub use credentials::Credentials;
pub use health::HealthProbe;
pub use http::HttpToolInvoker;
pub use invoker::{InvokeFuture, ToolInvoker};
pub use recorder::RecordingInvoker;
pub use registry::ToolName;
pub use wire::{ToolCall, ToolResponse};
