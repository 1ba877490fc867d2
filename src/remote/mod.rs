//! Remote Firefox operations.
//!
//! Builds add-on installation and reloading on top of the RDP client.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connect` | Connection establishment with retry |
//! | `firefox` | Add-on operations over one session |
//! | `installer` | One-shot installation helper |

// ============================================================================
// Submodules
// ============================================================================

/// Connection establishment with retry.
pub mod connect;

/// Add-on operations over one session.
pub mod firefox;

/// One-shot installation helper.
pub mod installer;

// ============================================================================
// Re-exports
// ============================================================================

pub use connect::{
    connect, connect_retrying, connect_with_options, connect_with_retries, find_free_tcp_port,
    retry_on_refused,
};
pub use firefox::RemoteFirefox;
pub use installer::AddonInstaller;
