//! Firefox Remote Debugging Protocol message types.
//!
//! This module defines the wire format and message shapes exchanged with
//! the Firefox debugger server.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`RdpRequest`] | Client → Actor | `{to, type, ...}` request |
//! | [`RdpMessage`] | Actor → Client | Reply or unsolicited event |
//!
//! Packets are framed as `BYTE_LENGTH ":" JSON` (see [`frame`]).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Known request types |
//! | `event` | Unsolicited event types |
//! | `frame` | Length-prefixed packet framing |
//! | `message` | Decoded incoming messages |
//! | `request` | Outgoing requests |
//! | `response` | Typed replies |

// ============================================================================
// Submodules
// ============================================================================

/// Known request types.
pub mod command;

/// Unsolicited event types.
pub mod event;

/// Length-prefixed packet framing.
pub mod frame;

/// Decoded incoming messages.
pub mod message;

/// Outgoing request type.
pub mod request;

/// Typed replies.
pub mod response;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::RequestType;
pub use event::{DEFAULT_UNSOLICITED_EVENTS, UnsolicitedEvents};
pub use frame::{ParseOutcome, encode_frame, parse_next};
pub use message::RdpMessage;
pub use request::RdpRequest;
pub use response::{
    Addon, InstallTemporaryAddonResponse, ListAddonsResponse, RequestTypesResponse,
    RootActorsResponse,
};
