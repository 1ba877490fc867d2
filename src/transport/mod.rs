//! RDP transport layer.
//!
//! This module handles the TCP stream to the Firefox debugger server:
//! packet framing, request/reply correlation and event routing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  RdpClient      │                              │  Firefox        │
//! │                 │          TCP (RDP)           │  Debugger       │
//! │  Connection     │◄────────────────────────────►│  Server         │
//! │  → Multiplexer  │      127.0.0.1:PORT          │                 │
//! │                 │                              │  Root actor     │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `RdpClient::connect` - Open the TCP stream
//! 2. `Connection::open` - Spawn the event loop
//! 3. Root actor greeting arrives
//! 4. `RdpClient::request` - Send requests, receive replies and events
//! 5. `RdpClient::disconnect` - Reject pending requests and close
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `client` | Connect handshake and request API |
//! | `connection` | Byte stream and event loop |
//! | `multiplexer` | Per-actor request queue and reply routing |

// ============================================================================
// Submodules
// ============================================================================

/// Connect handshake and request API.
pub mod client;

/// RDP connection and event loop.
pub mod connection;

/// Per-actor request queue and reply routing.
pub mod multiplexer;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::RdpClient;
pub use connection::{Connection, EventHandler, GreetingReceiver, RdpEvent};
pub use multiplexer::{Multiplexer, ReplySender, Routed};
