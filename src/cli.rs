//! Command-line surface: argv parsing for the gateway binary.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{GatewayError, GatewayResult};

/// `contextguard --server "<shell-split command>" [--config <path>]`
#[derive(Parser, Debug, Clone)]
#[command(
    name = "contextguard",
    version,
    about = "Transparent security gateway for MCP servers over stdio",
    long_about = "Spawns an MCP server as a child process, inspects every \
                  JSON-RPC line crossing stdin/stdout in both directions, \
                  and forwards, rewrites, or blocks it per policy."
)]
pub struct Cli {
    /// The child MCP server invocation, split on ASCII whitespace into argv.
    #[arg(long, value_name = "COMMAND")]
    pub server: Option<String>,

    /// Path to a JSON file whose parsed content is a PolicyConfig.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv for trace). Ambient logging
    /// control, not part of the wire-visible protocol.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Tracing level implied by the verbosity count.
    pub fn tracing_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    /// Split `--server "cmd arg1 arg2"` on ASCII whitespace into an argv
    /// vector. Fatal if `--server` was not supplied at all.
    pub fn server_argv(&self) -> GatewayResult<Vec<String>> {
        let raw = self
            .server
            .as_deref()
            .ok_or_else(|| GatewayError::configuration("--server is required"))?;

        let argv: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
        if argv.is_empty() {
            return Err(GatewayError::configuration("--server command is empty"));
        }
        Ok(argv)
    }
}

/// Usage block printed on `--help` or when invoked with no arguments at all.
pub fn usage_block() -> String {
    "contextguard --server \"<shell-split command>\" [--config <path>] [--help]\n\n\
     Options:\n  \
     --server <COMMAND>  The child MCP server invocation (required)\n  \
     --config <PATH>     Path to a JSON PolicyConfig file\n  \
     --help              Print this usage block and exit\n"
        .to_string()
}
