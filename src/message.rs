//! JSON-RPC message envelope: a tagged variant classified by which fields
//! are present, never a strict schema. Forwarding opaque frames unchanged
//! is a correctness requirement, so `params`/`result` stay as raw
//! [`serde_json::Value`] and are only inspected by name.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request/response/notification id: either a string or an integer, per
/// JSON-RPC 2.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Number(i64),
    String(String),
}

/// The raw JSON-RPC envelope as received on the wire. Every field the core
/// consumes and nothing more; unknown fields are dropped silently since
/// opaque forwarding is handled at the raw-line level, not by
/// re-serializing this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

/// Classification of a parsed envelope.
#[derive(Debug, Clone)]
pub enum Message {
    /// Has both `method` and `id`.
    Request(RawEnvelope),
    /// Has `result` or `error` (a reply to something the client requested).
    Response(RawEnvelope),
    /// Has `method` but no `id` (fire-and-forget).
    Notification(RawEnvelope),
}

impl Message {
    /// Classify a raw envelope into a tagged variant.
    pub fn classify(envelope: RawEnvelope) -> Self {
        if envelope.method.is_some() {
            if envelope.id.is_some() {
                Message::Request(envelope)
            } else {
                Message::Notification(envelope)
            }
        } else {
            Message::Response(envelope)
        }
    }

    /// Parse a single line of text as JSON, then classify it. Returns `None`
    /// if the line is not syntactically valid JSON — the caller is
    /// responsible for treating that as an opaque frame, never a hard error.
    pub fn parse(line: &str) -> Option<Self> {
        serde_json::from_str::<RawEnvelope>(line)
            .ok()
            .map(Message::classify)
    }

    pub fn envelope(&self) -> &RawEnvelope {
        match self {
            Message::Request(e) | Message::Response(e) | Message::Notification(e) => e,
        }
    }

    pub fn method(&self) -> Option<&str> {
        self.envelope().method.as_deref()
    }

    pub fn id(&self) -> Option<&MessageId> {
        self.envelope().id.as_ref()
    }

    pub fn jsonrpc(&self) -> &str {
        self.envelope().jsonrpc.as_deref().unwrap_or("2.0")
    }
}

/// Build a synthetic JSON-RPC error response the gateway sends to the
/// client on behalf of the blocked/filtered server or request. Returns
/// `None` when the original message carried no `id` — a request without an
/// id gets no synthetic reply at all, it is simply dropped.
pub fn synthetic_error(
    jsonrpc: &str,
    id: Option<&MessageId>,
    code: i64,
    message: &str,
    violations: &[String],
) -> Option<String> {
    let id = id?;
    let body = serde_json::json!({
        "jsonrpc": jsonrpc,
        "id": id,
        "error": {
            "code": code,
            "message": message,
            "data": { "violations": violations },
        }
    });
    serde_json::to_string(&body).ok()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_request() {
        let msg = Message::parse(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).unwrap();
        assert!(matches!(msg, Message::Request(_)));
        assert_eq!(msg.method(), Some("tools/list"));
        assert_eq!(msg.id(), Some(&MessageId::Number(1)));
    }

    #[test]
    fn classifies_notification() {
        let msg = Message::parse(r#"{"jsonrpc":"2.0","method":"notifications/ping"}"#).unwrap();
        assert!(matches!(msg, Message::Notification(_)));
        assert_eq!(msg.id(), None);
    }

    #[test]
    fn classifies_response() {
        let msg = Message::parse(r#"{"jsonrpc":"2.0","id":42,"result":{"ok":true}}"#).unwrap();
        assert!(matches!(msg, Message::Response(_)));
        assert_eq!(msg.method(), None);
    }

    #[test]
    fn unparseable_line_returns_none() {
        assert!(Message::parse("hello world").is_none());
    }

    #[test]
    fn string_id_round_trips() {
        let msg = Message::parse(r#"{"jsonrpc":"2.0","id":"abc","method":"x"}"#).unwrap();
        assert_eq!(msg.id(), Some(&MessageId::String("abc".to_string())));
    }
}
