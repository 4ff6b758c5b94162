//! Wire types for the real-time channel
//!
//! Outbound frames are `{"type": <string>, "payload": <object>}`. Inbound
//! frames are JSON objects discriminated by their `type` field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound event type names
pub mod event_type {
    pub const CONNECTION: &str = "connection";
    pub const PONG: &str = "pong";
    pub const STATS: &str = "stats";
    pub const ERROR: &str = "error";
    pub const NEW_EXPENSE: &str = "new_expense";
    pub const EXPENSE_DELETED: &str = "expense_deleted";

    /// `expense_{action}`, e.g. `expense_updated`
    pub fn expense_action(action: &str) -> String {
        format!("expense_{}", action)
    }
}

/// Envelope for every server-to-client frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundEvent<P> {
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: P,
}

impl<P: Serialize> OutboundEvent<P> {
    pub fn new(event_type: impl Into<String>, payload: P) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    pub fn to_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Sent to a user when one of their connections authenticates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomePayload {
    pub message: String,
    pub user_id: String,
}

impl WelcomePayload {
    pub fn new(user_id: &str) -> Self {
        Self {
            message: "Connected to the real-time server".to_string(),
            user_id: user_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PongPayload {
    pub timestamp: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryDeletedPayload {
    pub expense_id: String,
}

/// Client control messages
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Heartbeat; the timestamp is echoed back untouched
    Ping {
        #[serde(default)]
        timestamp: Value,
    },

    /// Request current income/expense totals
    GetStats {
        #[serde(default)]
        start_date: Option<DateTime<Utc>>,
        #[serde(default)]
        end_date: Option<DateTime<Utc>>,
    },

    /// Any other `type`; accepted and ignored
    #[serde(other)]
    Unknown,
}

/// Outcome of decoding one inbound text frame
#[derive(Debug, Clone)]
pub enum Inbound {
    Message(ClientMessage),
    /// Reported back to the client as an `error` event
    Malformed(String),
    /// Object without a string `type`
    Ignored,
}

pub const INVALID_JSON: &str = "Invalid JSON format";
pub const NOT_AN_OBJECT: &str = "Expected a JSON object";

/// Decode an inbound text frame
pub fn parse_client_message(text: &str) -> Inbound {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => return Inbound::Malformed(INVALID_JSON.to_string()),
    };

    let Some(object) = value.as_object() else {
        return Inbound::Malformed(NOT_AN_OBJECT.to_string());
    };

    let Some(kind) = object.get("type").and_then(Value::as_str) else {
        return Inbound::Ignored;
    };
    let kind = kind.to_string();

    match serde_json::from_value::<ClientMessage>(value) {
        Ok(message) => Inbound::Message(message),
        Err(e) => Inbound::Malformed(format!("Invalid '{}' message: {}", kind, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outbound_event_shape() {
        let event = OutboundEvent::new(event_type::PONG, PongPayload { timestamp: json!("T") });
        let value: Value = serde_json::from_str(&event.to_text().unwrap()).unwrap();
        assert_eq!(value, json!({"type": "pong", "payload": {"timestamp": "T"}}));
    }

    #[test]
    fn test_expense_action_name() {
        assert_eq!(event_type::expense_action("updated"), "expense_updated");
    }

    #[test]
    fn test_parse_ping_keeps_timestamp() {
        match parse_client_message(r#"{"type":"ping","timestamp":1712345}"#) {
            Inbound::Message(ClientMessage::Ping { timestamp }) => assert_eq!(timestamp, json!(1712345)),
            other => panic!("unexpected {:?}", other),
        }

        match parse_client_message(r#"{"type":"ping"}"#) {
            Inbound::Message(ClientMessage::Ping { timestamp }) => assert!(timestamp.is_null()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_get_stats_with_range() {
        let text = r#"{"type":"get_stats","start_date":"2024-01-01T00:00:00Z"}"#;
        match parse_client_message(text) {
            Inbound::Message(ClientMessage::GetStats { start_date, end_date }) => {
                assert!(start_date.is_some());
                assert!(end_date.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_type() {
        assert!(matches!(
            parse_client_message(r#"{"type":"subscribe","channel":"x"}"#),
            Inbound::Message(ClientMessage::Unknown)
        ));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(parse_client_message("not json"), Inbound::Malformed(m) if m == INVALID_JSON));
        assert!(matches!(parse_client_message("[1,2]"), Inbound::Malformed(m) if m == NOT_AN_OBJECT));
        assert!(matches!(
            parse_client_message(r#"{"type":"get_stats","start_date":"yesterday"}"#),
            Inbound::Malformed(_)
        ));
    }

    #[test]
    fn test_parse_missing_type_is_ignored() {
        assert!(matches!(parse_client_message(r#"{"hello":"world"}"#), Inbound::Ignored));
        assert!(matches!(parse_client_message(r#"{"type":42}"#), Inbound::Ignored));
    }
}
