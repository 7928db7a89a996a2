//! Gateway state machine: the startup/shutdown sequencing that wires the
//! child supervisor, the shared session state, the two interceptor
//! pipelines, and the optional remote adapter together.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::Mutex;

use crate::child::ChildSupervisor;
use crate::cli::Cli;
use crate::config::PolicyConfig;
use crate::error::GatewayResult;
use crate::eventlog::{EventType, SecurityEvent, Severity};
use crate::interceptor::{run_client_to_server, run_server_to_client};
use crate::remote::{AgentStatus, RemoteAdapter, RemoteHandle, RemoteSettings};
use crate::session::{derive_session_id, now_ms, SessionState};

/// Run the gateway end-to-end for one child-process lifetime, returning the
/// process exit code the caller should propagate: the child's own exit
/// code, or 0 if it was killed by a signal.
pub async fn run(cli: Cli) -> GatewayResult<i32> {
    let argv = cli.server_argv()?;

    // Step 1: build the policy (local file or defaults).
    let mut config = match &cli.config {
        Some(path) => PolicyConfig::load_from_file(path)?,
        None => PolicyConfig::default(),
    };

    // Step 2: generate the session id, before any remote interaction so a
    // remote handle can be tagged with it from the moment it exists.
    let session_id = derive_session_id(now_ms());

    // Step 3: remote policy bootstrap, if the adapter is enabled via env.
    let remote_adapter = RemoteSettings::from_env().map(RemoteAdapter::new);
    let remote_handle = if let Some(adapter) = remote_adapter {
        match adapter.fetch_policy().await {
            Some(remote_policy) => {
                config = config.merge_remote(remote_policy);
                tracing::info!("loaded policy from remote dashboard");
            }
            None => {
                tracing::warn!("could not load remote policy, using local configuration");
            }
        }
        let handle = RemoteHandle::new(adapter, session_id.clone());
        handle.update_agent_status(AgentStatus::Online);
        Some(handle)
    } else {
        None
    };

    let config = Arc::new(config);
    let session = Arc::new(Mutex::new(SessionState::with_session_id(
        config.log_path.clone(),
        session_id.clone(),
        remote_handle,
    )));

    // Step 4: spawn the child.
    let mut supervisor = match ChildSupervisor::spawn(&argv) {
        Ok(s) => s,
        Err(e) => {
            let mut guard = session.lock().await;
            let sid = guard.session_id.clone();
            guard
                .log_event(SecurityEvent::new(
                    EventType::ServerError,
                    Severity::High,
                    sid,
                    json!({ "phase": "spawn", "error": e.to_string() }),
                ))
                .await;
            return Err(e);
        }
    };

    {
        let mut guard = session.lock().await;
        let sid = guard.session_id.clone();
        guard
            .log_event(SecurityEvent::new(
                EventType::ServerStart,
                Severity::Low,
                sid,
                json!({ "command": argv }),
            ))
            .await;
    }

    let child_stdin = supervisor
        .take_stdin()
        .expect("child was spawned with piped stdin");
    let child_stdout = supervisor
        .take_stdout()
        .expect("child was spawned with piped stdout");

    let client_stdout = Arc::new(Mutex::new(tokio::io::stdout()));

    // Step 5: start the pipelines. Reads from client stdin and child stdout
    // proceed concurrently; the child-exit watcher races them so a dead
    // child does not leave the gateway hung reading forever.
    let c2s = tokio::spawn(run_client_to_server(
        tokio::io::stdin(),
        child_stdin,
        client_stdout.clone(),
        session.clone(),
        config.clone(),
    ));
    let s2c = tokio::spawn(run_server_to_client(
        child_stdout,
        client_stdout.clone(),
        session.clone(),
    ));

    let exit_code = supervisor.wait().await?;

    {
        let mut guard = session.lock().await;
        let sid = guard.session_id.clone();
        guard
            .log_event(SecurityEvent::new(
                EventType::ServerExit,
                Severity::Medium,
                sid,
                json!({ "exitCode": exit_code }),
            ))
            .await;
    }

    c2s.abort();
    s2c.abort();

    print_statistics(&session).await;

    Ok(exit_code)
}

async fn print_statistics(session: &Arc<Mutex<SessionState>>) {
    let stats = session.lock().await.event_stats();
    tracing::info!(total_events = stats.total_events, "session statistics");
    for (event_type, count) in &stats.events_by_type {
        tracing::info!(?event_type, count, "events by type");
    }
    for (severity, count) in &stats.events_by_severity {
        tracing::info!(?severity, count, "events by severity");
    }
}
