//! Decoded RDP messages.
//!
//! Every packet sent by the debugger server decodes into an [`RdpMessage`].
//!
//! # Format
//!
//! ```json
//! {
//!   "from": "server1.conn0.addonsActor2",
//!   "type": "installTemporaryAddon",
//!   "addon": { "id": "ext@id", "actor": "server1.conn0.addon3" }
//! }
//! ```
//!
//! Error replies carry `error` and usually `message`:
//!
//! ```json
//! { "from": "root", "error": "unknownPacketType", "message": "..." }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::ActorId;

// ============================================================================
// RdpMessage
// ============================================================================

/// A message received from the remote debugger server.
///
/// Fields other than `from`, `type` and `error` are kept verbatim in
/// [`RdpMessage::fields`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RdpMessage {
    /// Sending actor. Absent only on transport-level error envelopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ActorId>,

    /// Message type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,

    /// Error name, present on error replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,

    /// Remaining message fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RdpMessage {
    /// Creates a message from `from` with the given type and no extra fields.
    #[must_use]
    pub fn new(from: impl Into<ActorId>, message_type: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            message_type: Some(message_type.into()),
            error: None,
            fields: Map::new(),
        }
    }

    /// Adds an extra field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns the message type, or an empty string when absent.
    #[inline]
    #[must_use]
    pub fn message_type(&self) -> &str {
        self.message_type.as_deref().unwrap_or_default()
    }

    /// Returns `true` if the message carries an `error` field.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Gets an extra field by name.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Gets a string field.
    ///
    /// Returns `None` if the key is missing, null, or not a string.
    #[inline]
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Converts an error reply into [`Error::Remote`].
    ///
    /// Returns `Ok(self)` when the message has no `error` field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the message is an error reply.
    pub fn into_result(self) -> Result<Self> {
        if self.is_error() {
            return Err(Error::remote(self));
        }
        Ok(self)
    }

    /// Deserializes the whole message into a typed response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the message does not match `T`.
    pub fn parse_as<T: DeserializeOwned>(self) -> Result<T> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::from_value(value)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_parse_reply() {
        let json_str = r#"{
            "from": "root",
            "type": "getRoot",
            "addonsActor": "server1.conn0.addonsActor2"
        }"#;

        let message: RdpMessage = serde_json::from_str(json_str).expect("parse");
        assert_eq!(message.from, Some(ActorId::root()));
        assert_eq!(message.message_type(), "getRoot");
        assert!(!message.is_error());
        assert_eq!(
            message.get_str("addonsActor"),
            Some("server1.conn0.addonsActor2")
        );
    }

    #[test]
    fn test_parse_error_envelope_without_sender() {
        let message: RdpMessage =
            serde_json::from_str(r#"{"error": "badFrame", "message": "bad"}"#).expect("parse");

        assert!(message.from.is_none());
        assert!(message.is_error());
        assert_eq!(message.message_type(), "");
    }

    #[test]
    fn test_null_error_is_absent() {
        let message: RdpMessage =
            serde_json::from_str(r#"{"from": "a", "type": "t", "error": null}"#).expect("parse");
        assert!(!message.is_error());
    }

    #[test]
    fn test_into_result_error() {
        let message: RdpMessage = serde_json::from_value(json!({
            "from": "actor1",
            "error": "noSuchActor",
            "message": "No such actor"
        }))
        .expect("parse");

        let err = message.into_result().unwrap_err();
        assert!(err.is_remote_error());
        assert_eq!(err.to_string(), "noSuchActor: No such actor");
    }

    #[test]
    fn test_into_result_keeps_structured_error() {
        let message: RdpMessage = serde_json::from_value(json!({
            "from": "actor1",
            "error": {"name": "installationFailed", "code": 7},
            "message": "bad manifest",
            "fileName": "/ext/manifest.json"
        }))
        .expect("parse");

        match message.into_result().unwrap_err() {
            Error::Remote {
                actor,
                error,
                message,
                reply,
            } => {
                assert_eq!(actor, "actor1");
                assert_eq!(error, json!({"name": "installationFailed", "code": 7}));
                assert_eq!(message, "bad manifest");
                assert_eq!(reply.get_str("fileName"), Some("/ext/manifest.json"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_as_typed() {
        #[derive(Deserialize)]
        struct Reply {
            #[serde(rename = "requestTypes")]
            request_types: Vec<String>,
        }

        let message = RdpMessage::new("addon1", "requestTypes")
            .with_field("requestTypes", json!(["reload", "requestTypes"]));
        let reply: Reply = message.parse_as().expect("typed");
        assert_eq!(reply.request_types, vec!["reload", "requestTypes"]);
    }
}
