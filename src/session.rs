//! Shared per-session state: the rate-limit window and the event log,
//! guarded by a single `tokio::sync::Mutex`.
//!
//! A `tokio` mutex, not `std::sync::Mutex`, because the lock is held across
//! the `.await` inside [`EventLog::record`] when a decision is logged.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::eventlog::{EventLog, EventLogStats, SecurityEvent};
use crate::policy;
use crate::remote::RemoteHandle;

/// Mutable state shared between the two interceptor pipelines.
#[derive(Debug)]
pub struct SessionState {
    pub session_id: String,
    tool_call_timestamps: VecDeque<i64>,
    event_log: EventLog,
}

impl SessionState {
    /// Construct a session with a freshly derived session id and no remote
    /// sink. Most tests and the benign hot-path construction go through
    /// this; [`gateway::run`](crate::gateway::run) uses
    /// [`SessionState::with_session_id`] directly because it needs the id
    /// before the remote handle exists.
    pub fn new(log_path: impl Into<std::path::PathBuf>) -> Self {
        Self::with_session_id(log_path, derive_session_id(now_ms()), None)
    }

    pub fn with_session_id(
        log_path: impl Into<std::path::PathBuf>,
        session_id: String,
        remote: Option<RemoteHandle>,
    ) -> Self {
        Self {
            session_id,
            tool_call_timestamps: VecDeque::new(),
            event_log: EventLog::new(log_path).with_remote(remote),
        }
    }

    /// Record a `tools/call` attempt and report whether it should be
    /// admitted under the rolling 60-second window. The timestamp is only
    /// recorded once the call is admitted, so a rejected call never
    /// occupies a slot in the window.
    pub fn check_and_record_rate_limit(&mut self, limit: u32) -> bool {
        let now = now_ms();
        policy::prune_window(&mut self.tool_call_timestamps, now);
        let admitted = policy::check_rate_limit(&self.tool_call_timestamps, limit);
        if admitted {
            self.tool_call_timestamps.push_back(now);
        }
        admitted
    }

    pub async fn log_event(&mut self, event: SecurityEvent) {
        self.event_log.record(event).await;
    }

    pub fn event_stats(&self) -> EventLogStats {
        self.event_log.stats()
    }
}

/// Current wall-clock time in milliseconds since the epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Derive an 8-hex-character session id from the startup timestamp: the
/// first 8 hex characters of `sha256(decimal millisecond timestamp)`.
pub fn derive_session_id(timestamp_ms: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(timestamp_ms.to_string().as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(4).map(|b| format!("{b:02x}")).collect()
}

/// Shared handle type used by both interceptor pipelines.
pub type SharedSession = Arc<Mutex<SessionState>>;
