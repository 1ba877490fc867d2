//! One-shot add-on installation.
//!
//! Each call opens its own session, runs one operation and disconnects.

// ============================================================================
// Imports
// ============================================================================

use std::path::Path;

use futures_util::future::try_join_all;
use tracing::debug;

use crate::error::Result;
use crate::options::ConnectOptions;
use crate::protocol::Addon;

use super::connect::connect_with_options;

// ============================================================================
// AddonInstaller
// ============================================================================

/// Installs temporary add-ons into a Firefox debugger server.
#[derive(Debug, Clone)]
pub struct AddonInstaller {
    options: ConnectOptions,
}

impl AddonInstaller {
    /// Creates an installer for the debugger server on `port`.
    #[must_use]
    pub fn new(port: u16) -> Self {
        Self::with_options(ConnectOptions::for_port(port))
    }

    /// Creates an installer with explicit connect options.
    #[must_use]
    pub fn with_options(options: ConnectOptions) -> Self {
        Self { options }
    }

    /// Returns the connect options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    /// Installs one add-on over a fresh session.
    ///
    /// # Errors
    ///
    /// Any connect error, or any
    /// [`RemoteFirefox::install_temporary_addon`](super::RemoteFirefox::install_temporary_addon)
    /// error.
    pub async fn install(&self, path: impl AsRef<Path>) -> Result<Addon> {
        let firefox = connect_with_options(&self.options).await?;
        let result = firefox.install_temporary_addon(path).await;
        firefox.disconnect();
        result
    }

    /// Installs several add-ons concurrently, one session each.
    ///
    /// Returns the add-ons in input order.
    ///
    /// # Errors
    ///
    /// The first install error.
    pub async fn install_all<I, P>(&self, paths: I) -> Result<Vec<Addon>>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let installs: Vec<_> = paths.into_iter().map(|path| self.install(path)).collect();
        debug!(count = installs.len(), port = self.options.port, "Installing add-ons");
        try_join_all(installs).await
    }

    /// Reloads an installed add-on over a fresh session.
    ///
    /// # Errors
    ///
    /// Any connect error, or any
    /// [`RemoteFirefox::reload_addon`](super::RemoteFirefox::reload_addon) error.
    pub async fn reload(&self, addon_id: &str) -> Result<()> {
        let firefox = connect_with_options(&self.options).await?;
        let result = firefox.reload_addon(addon_id).await;
        firefox.disconnect();
        result
    }
}

// ============================================================================
// Tests
// ============================================================================
