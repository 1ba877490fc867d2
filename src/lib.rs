//! Firefox RDP - Remote Debugging Protocol client.
//!
//! This library talks to the debugger server Firefox opens with
//! `--start-debugger-server`, primarily to install and reload temporary
//! add-ons.
//!
//! # Architecture
//!
//! The client follows a single-connection model:
//!
//! - **Local End (Rust)**: Sends requests to actors, receives replies and events
//! - **Remote End (Firefox)**: Root actor, add-ons actor, one actor per add-on
//!
//! Key design principles:
//!
//! - Each [`RdpClient`] owns: TCP stream + event loop task
//! - Packets are framed as `BYTE_LENGTH:JSON`
//! - At most one request in flight per actor, queued in call order
//! - Unsolicited events go to a single ordered [`EventHandler`]
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use firefox_rdp::{Result, connect_with_retries};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Wait for Firefox to open its debugger server
//!     let firefox = connect_with_retries(6000, 250, Duration::from_millis(120)).await?;
//!
//!     // Install an unpacked extension for this session
//!     let addon = firefox.install_temporary_addon("/path/to/extension").await?;
//!     println!("Installed {} as {}", addon.id, addon.actor);
//!
//!     firefox.reload_addon(&addon.id).await?;
//!     firefox.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Actor ID wrapper |
//! | [`options`] | Connection options |
//! | [`protocol`] | RDP framing and message types |
//! | [`remote`] | Add-on operations: [`RemoteFirefox`], [`AddonInstaller`] |
//! | [`transport`] | TCP connection and request multiplexing |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifier for remote actors.
pub mod identifiers;

/// Connection options.
pub mod options;

/// RDP framing and message types.
pub mod protocol;

/// Add-on operations on a remote Firefox.
///
/// - [`RemoteFirefox`] - One debugger session
/// - [`AddonInstaller`] - One session per operation
pub mod remote;

/// RDP transport layer.
///
/// Handles the TCP stream, request queueing and event routing.
pub mod transport;

#[cfg(test)]
mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::ActorId;

// Options
pub use options::ConnectOptions;

// Protocol types
pub use protocol::{Addon, RdpMessage, RdpRequest, RequestType, UnsolicitedEvents};

// Remote operations
pub use remote::{
    AddonInstaller, RemoteFirefox, connect, connect_retrying, connect_with_options,
    connect_with_retries, find_free_tcp_port,
};

// Transport types
pub use transport::{EventHandler, RdpClient, RdpEvent};
