//! Security event taxonomy and the event log: an in-memory ring buffer plus
//! an append-only JSON-lines file. Logging fails open: a write error here is
//! logged and otherwise swallowed, it never aborts the session or blocks a
//! forwarding decision.

use std::collections::VecDeque;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const RING_CAPACITY: usize = 1000;
const RECENT_WINDOW: usize = 10;

/// The fixed taxonomy of security events. Every variant name is the exact
/// wire-visible `eventType` string, via `SCREAMING_SNAKE_CASE` serde
/// renaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    ServerStart,
    ServerExit,
    ServerError,
    ClientRequest,
    ToolCall,
    RateLimitExceeded,
    SecurityViolation,
    SensitiveDataLeak,
    ServerResponse,
    ParseError,
    ServerParseError,
}

/// Event severity, ordered `Low < Medium < High < Critical` so callers can
/// compare against a threshold (e.g. "HIGH or CRITICAL").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A single logged security event. `severity` is supplied by the caller at
/// construction time rather than derived from `event_type` alone: a
/// `TOOL_CALL`'s severity is conditional on whether any policy violation
/// fired, so only the interceptor (which knows that) can pick it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEvent {
    pub timestamp: String,
    pub event_type: EventType,
    pub severity: Severity,
    pub session_id: String,
    pub details: Value,
}

impl SecurityEvent {
    pub fn new(
        event_type: EventType,
        severity: Severity,
        session_id: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            event_type,
            severity,
            session_id: session_id.into(),
            details,
        }
    }
}

/// Aggregate statistics view materialized on demand from the in-memory ring
/// only, never from the on-disk log.
#[derive(Debug, Clone, Serialize)]
pub struct EventLogStats {
    pub total_events: usize,
    pub events_by_type: Vec<(EventType, usize)>,
    pub events_by_severity: Vec<(Severity, usize)>,
    pub recent_events: Vec<SecurityEvent>,
}

/// In-memory ring buffer plus append-only file sink for security events.
///
/// The file append is a direct `spawn_blocking`-wrapped write rather than a
/// background mpsc task: each event must be durable in the ring at the
/// moment the caller's decision is made, not at some later point a
/// background task gets around to it.
#[derive(Debug)]
pub struct EventLog {
    ring: VecDeque<SecurityEvent>,
    path: PathBuf,
    remote: Option<crate::remote::RemoteHandle>,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            ring: VecDeque::with_capacity(RING_CAPACITY),
            path: path.into(),
            remote: None,
        }
    }

    /// Attach an optional remote sink; events recorded after this call are
    /// additionally dispatched to it, fire-and-forget.
    pub fn with_remote(mut self, remote: Option<crate::remote::RemoteHandle>) -> Self {
        self.remote = remote;
        self
    }

    /// Record an event: push it into the ring (evicting the oldest entry if
    /// full), alert on stderr for HIGH/CRITICAL severities, append it to the
    /// log file, and (if configured) dispatch it to the remote sink.
    pub async fn record(&mut self, event: SecurityEvent) {
        self.alert_if_severe(&event);

        if self.ring.len() == RING_CAPACITY {
            self.ring.pop_front();
        }
        self.ring.push_back(event.clone());

        if let Err(e) = self.append_to_file(&event).await {
            tracing::error!(error = %e, "failed to append security event to log");
        }

        if let Some(remote) = &self.remote {
            remote.report_event(event);
        }
    }

    fn alert_if_severe(&self, event: &SecurityEvent) {
        if event.severity >= Severity::High {
            eprintln!(
                "[SECURITY ALERT] {}: {}",
                event_type_wire_name(event.event_type),
                event.details
            );
        }
    }

    async fn append_to_file(&self, event: &SecurityEvent) -> std::io::Result<()> {
        let line = serde_json::to_string(event)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            use std::io::Write;
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            writeln!(file, "{line}")
        })
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?
    }

    /// Materialize the statistics view from the in-memory ring.
    pub fn stats(&self) -> EventLogStats {
        use std::collections::HashMap;

        let mut by_type: HashMap<EventType, usize> = HashMap::new();
        let mut by_severity: HashMap<Severity, usize> = HashMap::new();
        for event in &self.ring {
            *by_type.entry(event.event_type).or_default() += 1;
            *by_severity.entry(event.severity).or_default() += 1;
        }

        EventLogStats {
            total_events: self.ring.len(),
            events_by_type: by_type.into_iter().collect(),
            events_by_severity: by_severity.into_iter().collect(),
            recent_events: self
                .ring
                .iter()
                .rev()
                .take(RECENT_WINDOW)
                .rev()
                .cloned()
                .collect(),
        }
    }

    pub fn recent(&self) -> impl Iterator<Item = &SecurityEvent> {
        self.ring.iter()
    }
}

/// The exact `eventType` string printed in `[SECURITY ALERT] ...` lines (the
/// same SCREAMING_SNAKE_CASE form used on the wire).
fn event_type_wire_name(event_type: EventType) -> &'static str {
    match event_type {
        EventType::ServerStart => "SERVER_START",
        EventType::ServerExit => "SERVER_EXIT",
        EventType::ServerError => "SERVER_ERROR",
        EventType::ClientRequest => "CLIENT_REQUEST",
        EventType::ToolCall => "TOOL_CALL",
        EventType::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
        EventType::SecurityViolation => "SECURITY_VIOLATION",
        EventType::SensitiveDataLeak => "SENSITIVE_DATA_LEAK",
        EventType::ServerResponse => "SERVER_RESPONSE",
        EventType::ParseError => "PARSE_ERROR",
        EventType::ServerParseError => "SERVER_PARSE_ERROR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_type_serializes_to_wire_taxonomy_names() {
        assert_eq!(
            serde_json::to_string(&EventType::ToolCall).unwrap(),
            "\"TOOL_CALL\""
        );
        assert_eq!(
            serde_json::to_string(&EventType::ServerParseError).unwrap(),
            "\"SERVER_PARSE_ERROR\""
        );
        assert_eq!(
            serde_json::to_string(&EventType::SensitiveDataLeak).unwrap(),
            "\"SENSITIVE_DATA_LEAK\""
        );
    }

    #[tokio::test]
    async fn record_updates_ring() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = EventLog::new(dir.path().join("events.log"));

        log.record(SecurityEvent::new(
            EventType::ServerStart,
            Severity::Low,
            "abc123",
            json!({}),
        ))
        .await;
        log.record(SecurityEvent::new(
            EventType::SecurityViolation,
            Severity::Critical,
            "abc123",
            json!({"method": "tools/call"}),
        ))
        .await;

        let stats = log.stats();
        assert_eq!(stats.total_events, 2);
        assert_eq!(log.recent().count(), 2);
    }

    #[tokio::test]
    async fn record_appends_jsonl_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let mut log = EventLog::new(&path);

        log.record(SecurityEvent::new(
            EventType::ServerStart,
            Severity::Low,
            "s1",
            json!({}),
        ))
        .await;
        log.record(SecurityEvent::new(
            EventType::ServerExit,
            Severity::Medium,
            "s1",
            json!({}),
        ))
        .await;

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: SecurityEvent = serde_json::from_str(line).unwrap();
            assert_eq!(parsed.session_id, "s1");
        }
    }

    #[test]
    fn a_partially_written_json_line_never_appears() {
        // Each append is one `serde_json::to_string` + one `writeln!` on a
        // freshly opened append-mode file descriptor: there is no
        // intermediate state where half a line is visible.
        let event = SecurityEvent::new(EventType::ClientRequest, Severity::Low, "s1", json!({}));
        let line = serde_json::to_string(&event).unwrap();
        assert!(serde_json::from_str::<SecurityEvent>(&line).is_ok());
    }

    #[tokio::test]
    async fn ring_buffer_evicts_oldest_past_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = EventLog::new(dir.path().join("events.log"));

        for i in 0..(RING_CAPACITY + 10) {
            log.record(SecurityEvent::new(
                EventType::ServerStart,
                Severity::Low,
                format!("s{i}"),
                json!({}),
            ))
            .await;
        }

        assert_eq!(log.recent().count(), RING_CAPACITY);
        let first = log.recent().next().unwrap();
        assert_eq!(first.session_id, "s10");
    }

    #[tokio::test]
    async fn stats_recent_events_cap_at_ten() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = EventLog::new(dir.path().join("events.log"));
        for i in 0..25 {
            log.record(SecurityEvent::new(
                EventType::ClientRequest,
                Severity::Low,
                format!("s{i}"),
                json!({}),
            ))
            .await;
        }
        let stats = log.stats();
        assert_eq!(stats.recent_events.len(), RECENT_WINDOW);
        assert_eq!(stats.recent_events.last().unwrap().session_id, "s24");
    }
}
