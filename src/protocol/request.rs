//! RDP request message type.
//!
//! Every request is addressed to exactly one actor.
//!
//! # Format
//!
//! ```json
//! {
//!   "to": "server1.conn0.addonsActor2",
//!   "type": "installTemporaryAddon",
//!   "addonPath": "/path/to/ext"
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::ActorId;

use super::RequestType;

// ============================================================================
// RdpRequest
// ============================================================================

/// A request from the client to a remote actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RdpRequest {
    /// Target actor.
    pub to: ActorId,

    /// Request type.
    #[serde(rename = "type")]
    pub request_type: String,

    /// Extra request fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RdpRequest {
    /// Creates a request with no extra fields.
    #[inline]
    #[must_use]
    pub fn new(to: impl Into<ActorId>, request_type: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            request_type: request_type.into(),
            fields: Map::new(),
        }
    }

    /// Creates a request addressed to the root actor.
    #[inline]
    #[must_use]
    pub fn root(request_type: impl Into<String>) -> Self {
        Self::new(ActorId::root(), request_type)
    }

    /// Adds an extra field.
    #[inline]
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Checks that the request names a target actor and a type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if `to` or `type` is empty.
    pub fn validate(&self) -> Result<()> {
        if self.to.is_empty() {
            return Err(Error::invalid_request(format!(
                "Unexpected RDP request without target actor: {}",
                self.request_type
            )));
        }
        if self.request_type.is_empty() {
            return Err(Error::invalid_request(format!(
                "Unexpected RDP request without type for actor {}",
                self.to
            )));
        }
        Ok(())
    }
}

impl From<RequestType> for RdpRequest {
    /// Addresses a bare request type to the root actor.
    fn from(request_type: RequestType) -> Self {
        Self::root(request_type.as_str())
    }
}

impl TryFrom<Value> for RdpRequest {
    type Error = Error;

    /// Builds a request from a free-form JSON body.
    ///
    /// Fails before any I/O when `to` or `type` is missing.
    fn try_from(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(Error::invalid_request("request body must be a JSON object"));
        };

        let request_type = match fields.remove("type") {
            Some(Value::String(t)) => t,
            _ => String::new(),
        };

        let to = match fields.remove("to") {
            Some(Value::String(to)) => ActorId::from(to),
            _ => {
                return Err(Error::invalid_request(format!(
                    "Unexpected RDP request without target actor: {request_type}"
                )));
            }
        };

        let request = Self {
            to,
            request_type,
            fields,
        };
        request.validate()?;
        Ok(request)
    }
}

// ============================================================================
// Tests
// ============================================================================
