//! End-to-end scenarios driven against a real child process (`cat`, which
//! echoes each stdin line back on stdout unchanged) instead of an in-memory
//! `Cursor`. This exercises the actual child-process supervisor and OS
//! pipes, not just the framer/interceptor logic in isolation.

use std::sync::Arc;

use contextguard::child::ChildSupervisor;
use contextguard::config::PolicyConfig;
use contextguard::interceptor::{run_client_to_server, run_server_to_client};
use contextguard::session::SessionState;
use serde_json::{json, Value};
use tokio::sync::Mutex;

fn session(dir: &tempfile::TempDir) -> Arc<Mutex<SessionState>> {
    Arc::new(Mutex::new(SessionState::new(dir.path().join("events.log"))))
}

/// A benign request with no policy hits reaches the real child process and
/// its bytes come back unchanged.
#[tokio::test]
async fn benign_request_round_trips_through_a_real_child_process() {
    let dir = tempfile::tempdir().unwrap();
    let mut supervisor = ChildSupervisor::spawn(&["cat".to_string()]).unwrap();
    let child_stdin = supervisor.take_stdin().unwrap();
    let child_stdout = supervisor.take_stdout().unwrap();

    let client_stdout = Arc::new(Mutex::new(Vec::new()));
    let line = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n".to_vec();

    let c2s = tokio::spawn(run_client_to_server(
        std::io::Cursor::new(line.clone()),
        child_stdin,
        client_stdout.clone(),
        session(&dir),
        Arc::new(PolicyConfig::default()),
    ));
    let s2c = tokio::spawn(run_server_to_client(
        child_stdout,
        client_stdout.clone(),
        session(&dir),
    ));

    c2s.await.unwrap().unwrap();
    // `cat` exits once its stdin (the child's piped end) reaches EOF, which
    // happens once `run_client_to_server`'s reader is exhausted and the
    // writer handle is dropped at the end of that task.
    supervisor.wait().await.unwrap();
    s2c.await.unwrap().unwrap();

    assert_eq!(client_stdout.lock().await.clone(), line);
}

/// A path traversal outside the allowlist is blocked before it ever reaches
/// the child; the child (here, `cat`) never echoes it back.
#[tokio::test]
async fn blocked_request_never_reaches_the_child() {
    let dir = tempfile::tempdir().unwrap();
    let mut supervisor = ChildSupervisor::spawn(&["cat".to_string()]).unwrap();
    let child_stdin = supervisor.take_stdin().unwrap();
    let child_stdout = supervisor.take_stdout().unwrap();

    let mut config = PolicyConfig::default();
    config.allowed_file_paths = vec!["/tmp/safe".to_string()];

    let body = json!({
        "jsonrpc": "2.0",
        "id": 7,
        "method": "tools/call",
        "params": {"name": "read_file", "arguments": {"path": "../../etc/passwd"}},
    });
    let mut line = serde_json::to_vec(&body).unwrap();
    line.push(b'\n');

    let client_stdout = Arc::new(Mutex::new(Vec::new()));
    let shared_session = session(&dir);

    let c2s = tokio::spawn(run_client_to_server(
        std::io::Cursor::new(line),
        child_stdin,
        client_stdout.clone(),
        shared_session.clone(),
        Arc::new(config),
    ));
    let s2c = tokio::spawn(run_server_to_client(
        child_stdout,
        client_stdout.clone(),
        shared_session,
    ));

    c2s.await.unwrap().unwrap();
    supervisor.wait().await.unwrap();
    s2c.await.unwrap().unwrap();

    // Nothing came back from `cat` because nothing was ever sent to it: the
    // only bytes on client stdout are the synthetic block response.
    let response: Value =
        serde_json::from_slice(&client_stdout.lock().await.clone()[..]).unwrap();
    assert_eq!(response["id"], 7);
    assert_eq!(response["error"]["code"], -32000);
}

/// A line that isn't valid JSON is still forwarded byte-for-byte to a real
/// child process, and the child's own echo of it comes back unchanged.
#[tokio::test]
async fn opaque_line_round_trips_through_a_real_child_process() {
    let dir = tempfile::tempdir().unwrap();
    let mut supervisor = ChildSupervisor::spawn(&["cat".to_string()]).unwrap();
    let child_stdin = supervisor.take_stdin().unwrap();
    let child_stdout = supervisor.take_stdout().unwrap();

    let client_stdout = Arc::new(Mutex::new(Vec::new()));
    let line = b"hello world\n".to_vec();
    let shared_session = session(&dir);

    let c2s = tokio::spawn(run_client_to_server(
        std::io::Cursor::new(line.clone()),
        child_stdin,
        client_stdout.clone(),
        shared_session.clone(),
        Arc::new(PolicyConfig::default()),
    ));
    let s2c = tokio::spawn(run_server_to_client(
        child_stdout,
        client_stdout.clone(),
        shared_session,
    ));

    c2s.await.unwrap().unwrap();
    supervisor.wait().await.unwrap();
    s2c.await.unwrap().unwrap();

    assert_eq!(client_stdout.lock().await.clone(), line);
}

/// The gateway never leaves the child running as an orphan: dropping the
/// supervisor without an explicit `wait()` kills it via `kill_on_drop`.
#[tokio::test]
async fn dropping_the_supervisor_does_not_hang() {
    let supervisor = ChildSupervisor::spawn(&["sleep".to_string(), "30".to_string()]).unwrap();
    drop(supervisor);
}
