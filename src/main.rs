//! `contextguard` binary entry point: argv parsing, tracing init, and the
//! top-level error-to-exit-code mapping.

use clap::Parser;

use contextguard::cli::{usage_block, Cli};
use contextguard::gateway;

#[tokio::main]
async fn main() {
    let raw_args: Vec<String> = std::env::args().collect();

    // We special-case the truly-empty invocation because `--server` is kept
    // optional in the clap struct (see cli.rs) so we can give it its own
    // exit-code-1 error path instead of clap's default exit code 2.
    if raw_args.len() <= 1 {
        println!("{}", usage_block());
        std::process::exit(0);
    }

    let cli = match Cli::try_parse_from(&raw_args) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    init_tracing(cli.tracing_level());

    if cli.server.is_none() {
        tracing::error!("--server is required");
        std::process::exit(1);
    }

    match gateway::run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            tracing::error!(error = %err.sanitize(), "fatal error, exiting");
            std::process::exit(1);
        }
    }
}

fn init_tracing(level: tracing::Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
