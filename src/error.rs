//! Error types for the Firefox RDP client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use firefox_rdp::{Result, remote};
//!
//! async fn example() -> Result<()> {
//!     let firefox = remote::connect(6000).await?;
//!     let addon = firefox.install_temporary_addon("/path/to/ext").await?;
//!     firefox.reload_addon(&addon.id).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidArgument`], [`Error::InvalidRequest`] |
//! | Framing | [`Error::Framing`] |
//! | Protocol | [`Error::Protocol`], [`Error::ActorBusy`] |
//! | Connection | [`Error::ConnectionRefused`], [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Capability | [`Error::FeatureUnsupported`], [`Error::AddonNotInstalled`] |
//! | Remote | [`Error::Remote`], [`Error::Operation`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::ChannelClosed`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::{Error as IoError, ErrorKind};
use std::result::Result as StdResult;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;

use crate::identifiers::ActorId;
use crate::protocol::RdpMessage;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when connection options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid argument passed to an operation.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Request rejected before any I/O took place.
    ///
    /// Returned when a request has no target actor or no type.
    #[error("Invalid RDP request: {message}")]
    InvalidRequest {
        /// Description of what is missing.
        message: String,
    },

    // ========================================================================
    // Framing Errors
    // ========================================================================
    /// RDP packet could not be parsed.
    ///
    /// Fatal errors (unparsable length prefix) terminate the connection.
    /// Non-fatal errors (unparsable JSON payload) are reported and skipped.
    #[error("Error parsing RDP packet: {message}")]
    Framing {
        /// Description of the parse failure.
        message: String,
        /// Whether the stream can no longer be framed.
        fatal: bool,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected message.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// A second reply expectation was registered for a busy actor.
    ///
    /// Indicates a programming error in the caller.
    #[error("{actor} does already have an active request")]
    ActorBusy {
        /// The actor with an outstanding request.
        actor: ActorId,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// The debugger server refused the TCP connection.
    ///
    /// This is the only error retried by the connection establisher.
    #[error("Connection refused by {addr}")]
    ConnectionRefused {
        /// Address that refused the connection.
        addr: String,
    },

    /// TCP connection failed for a reason other than refusal.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Timeout waiting for the root greeting.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// RDP connection closed while requests were outstanding.
    #[error("RDP connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Capability Errors
    // ========================================================================
    /// The remote Firefox lacks a capability this client needs.
    ///
    /// Distinct from connection errors so callers can suggest another
    /// Firefox version.
    #[error("{message}")]
    FeatureUnsupported {
        /// Description of the missing feature.
        message: String,
    },

    /// The requested add-on is not installed in the remote Firefox.
    #[error("The remote Firefox does not have your extension installed: {addon_id}")]
    AddonNotInstalled {
        /// The add-on ID that was looked up.
        addon_id: String,
    },

    // ========================================================================
    // Remote Errors
    // ========================================================================
    /// Reply carried an `error` field.
    ///
    /// The whole reply is kept, so structured `error` values and extra
    /// fields stay available to the caller.
    #[error("{}: {message}", value_to_string(.error))]
    Remote {
        /// Actor that produced the error reply.
        actor: ActorId,
        /// Error value reported by the server, usually a name string.
        error: Value,
        /// Error message reported by the server.
        message: String,
        /// The complete error reply.
        reply: Box<RdpMessage>,
    },

    /// Failure of a named higher-level operation.
    #[error("{operation} error: {source}")]
    Operation {
        /// Name of the failing operation.
        operation: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<Error>,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an invalid request error.
    #[inline]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a fatal framing error.
    #[inline]
    pub fn fatal_framing(message: impl Into<String>) -> Self {
        Self::Framing {
            message: message.into(),
            fatal: true,
        }
    }

    /// Creates a non-fatal framing error.
    #[inline]
    pub fn malformed_packet(message: impl Into<String>) -> Self {
        Self::Framing {
            message: message.into(),
            fatal: false,
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an actor busy error.
    #[inline]
    pub fn actor_busy(actor: ActorId) -> Self {
        Self::ActorBusy { actor }
    }

    /// Maps a socket connect failure, keeping refusals distinguishable.
    pub fn from_connect(addr: impl Into<String>, err: IoError) -> Self {
        if err.kind() == ErrorKind::ConnectionRefused {
            Self::ConnectionRefused { addr: addr.into() }
        } else {
            Self::Connection {
                message: format!("{}: {err}", addr.into()),
            }
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a feature unsupported error.
    #[inline]
    pub fn feature_unsupported(message: impl Into<String>) -> Self {
        Self::FeatureUnsupported {
            message: message.into(),
        }
    }

    /// Creates an add-on not installed error.
    #[inline]
    pub fn addon_not_installed(addon_id: impl Into<String>) -> Self {
        Self::AddonNotInstalled {
            addon_id: addon_id.into(),
        }
    }

    /// Creates a remote error from an error reply.
    pub fn remote(reply: RdpMessage) -> Self {
        Self::Remote {
            actor: reply.from.clone().unwrap_or_default(),
            error: reply.error.clone().unwrap_or(Value::Null),
            message: reply.get("message").map(value_to_string).unwrap_or_default(),
            reply: Box::new(reply),
        }
    }

    /// Wraps this error with the name of the operation that failed.
    #[inline]
    #[must_use]
    pub fn during(self, operation: &'static str) -> Self {
        Self::Operation {
            operation,
            source: Box::new(self),
        }
    }
}

/// Renders a JSON value without quoting plain strings.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns the innermost error, looking through [`Error::Operation`].
    #[must_use]
    pub fn innermost(&self) -> &Error {
        let mut current = self;
        while let Self::Operation { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns `true` if the debugger server refused the connection.
    #[inline]
    #[must_use]
    pub fn is_connection_refused(&self) -> bool {
        matches!(self.innermost(), Self::ConnectionRefused { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self.innermost(),
            Self::ConnectionRefused { .. }
                | Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::ChannelClosed(_)
                | Self::Io(_)
        )
    }

    /// Returns `true` if the remote Firefox lacks a needed capability.
    #[inline]
    #[must_use]
    pub fn is_feature_unsupported(&self) -> bool {
        matches!(self.innermost(), Self::FeatureUnsupported { .. })
    }

    /// Returns `true` if the server answered with an error reply.
    #[inline]
    #[must_use]
    pub fn is_remote_error(&self) -> bool {
        matches!(self.innermost(), Self::Remote { .. })
    }

    /// Returns the server's error reply, looking through [`Error::Operation`].
    #[must_use]
    pub fn remote_reply(&self) -> Option<&RdpMessage> {
        match self.innermost() {
            Self::Remote { reply, .. } => Some(reply),
            _ => None,
        }
    }

    /// Returns `true` if this framing error terminated the connection.
    #[inline]
    #[must_use]
    pub fn is_fatal_framing(&self) -> bool {
        matches!(self.innermost(), Self::Framing { fatal: true, .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
