//! ContextGuard: a transparent, in-process security gateway for MCP servers
//! communicating over newline-delimited JSON-RPC 2.0 on stdio.
//!
//! The gateway spawns the real MCP server as a child process, interposes on
//! both directions of the stream, inspects every message, and forwards,
//! rewrites, or replaces it with a synthesized JSON-RPC error according to a
//! configurable policy. See each module for its slice of the design:
//!
//! - [`policy`] — pattern-based inspection, rate limiting, path policy.
//! - [`eventlog`] — the append-only structured event log.
//! - [`framer`] — newline-delimited JSON-RPC framing.
//! - [`message`] — the tagged JSON-RPC envelope.
//! - [`child`] — the child-process supervisor.
//! - [`session`] — shared per-session state (the gateway state machine).
//! - [`interceptor`] — the two directional pipelines.
//! - [`remote`] — the optional remote collaborator adapter.
//! - [`gateway`] — startup/shutdown sequencing that wires the above together.

pub mod child;
pub mod cli;
pub mod config;
pub mod error;
pub mod eventlog;
pub mod framer;
pub mod gateway;
pub mod interceptor;
pub mod message;
pub mod policy;
pub mod remote;
pub mod session;

pub use error::{GatewayError, GatewayResult};
