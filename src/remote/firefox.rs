//! Add-on operations on a remote Firefox.
//!
//! [`RemoteFirefox`] wraps one [`RdpClient`] and speaks to the root actor,
//! the add-ons actor and individual add-on actors.

// ============================================================================
// Imports
// ============================================================================

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::identifiers::ActorId;
use crate::protocol::{
    Addon, InstallTemporaryAddonResponse, ListAddonsResponse, RdpMessage, RdpRequest,
    RequestType, RequestTypesResponse, RootActorsResponse,
};
use crate::transport::RdpClient;

// ============================================================================
// Constants
// ============================================================================

const NO_ADDONS_ACTOR: &str = "This is an older version of Firefox that does not provide an \
     add-ons actor for remote installation. Try Firefox 49 or higher.";

const NO_ADDON_RELOADING: &str =
    "This Firefox version does not support add-on reloading. Re-run with --no-reload";

// ============================================================================
// RemoteFirefox
// ============================================================================

/// Session with a remote Firefox debugger server.
#[derive(Debug)]
pub struct RemoteFirefox {
    client: RdpClient,
    /// Set once an add-on actor has been seen to accept `reload`.
    checked_for_addon_reloading: AtomicBool,
}

impl RemoteFirefox {
    /// Wraps a connected client.
    #[must_use]
    pub fn new(client: RdpClient) -> Self {
        Self {
            client,
            checked_for_addon_reloading: AtomicBool::new(false),
        }
    }

    /// Returns the underlying client.
    #[inline]
    #[must_use]
    pub fn client(&self) -> &RdpClient {
        &self.client
    }

    /// Closes the connection.
    #[inline]
    pub fn disconnect(&self) {
        self.client.disconnect();
    }

    /// Returns `true` once the connection has closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }
}

// ============================================================================
// RemoteFirefox - Actors
// ============================================================================

impl RemoteFirefox {
    /// Sends a bare request to an add-on's actor.
    ///
    /// # Errors
    ///
    /// Any request failure, wrapped as an `addonRequest` operation error.
    pub async fn addon_request(
        &self,
        addon: &Addon,
        request_type: RequestType,
    ) -> Result<RdpMessage> {
        self.client
            .request(RdpRequest::new(addon.actor.clone(), request_type.as_str()))
            .await
            .map_err(|e| e.during("addonRequest"))
    }

    /// Resolves the add-ons actor.
    ///
    /// Asks `getRoot` first; if that fails or names no add-ons actor,
    /// falls back to `listTabs` for older Firefox releases.
    ///
    /// # Errors
    ///
    /// - `listTabs` request failures, wrapped as a `listTabs` operation error
    /// - [`Error::FeatureUnsupported`] if neither reply names the actor
    pub async fn get_addons_actor(&self) -> Result<ActorId> {
        let root = self
            .client
            .request_root(RequestType::GetRoot)
            .await
            .and_then(RdpMessage::parse_as::<RootActorsResponse>);

        match root {
            Ok(RootActorsResponse {
                addons_actor: Some(actor),
            }) => return Ok(actor),
            Ok(_) => debug!("getRoot reply has no addons actor, falling back to listTabs"),
            Err(e) => debug!(error = %e, "getRoot failed, falling back to listTabs"),
        }

        let tabs = self
            .client
            .request_root(RequestType::ListTabs)
            .await
            .and_then(RdpMessage::parse_as::<RootActorsResponse>)
            .map_err(|e| e.during("listTabs"))?;

        tabs.addons_actor
            .ok_or_else(|| Error::feature_unsupported(NO_ADDONS_ACTOR))
    }

    /// Returns the request types `actor` accepts.
    ///
    /// # Errors
    ///
    /// Any request failure, wrapped as a `requestTypes` operation error.
    pub async fn request_types(&self, actor: &ActorId) -> Result<Vec<String>> {
        let reply: RequestTypesResponse = self
            .client
            .request(RdpRequest::new(actor.clone(), RequestType::RequestTypes.as_str()))
            .await
            .and_then(RdpMessage::parse_as)
            .map_err(|e| e.during("requestTypes"))?;
        Ok(reply.request_types)
    }
}

// ============================================================================
// RemoteFirefox - Add-ons
// ============================================================================

impl RemoteFirefox {
    /// Installs the unpacked extension at `path` as a temporary add-on.
    ///
    /// # Arguments
    ///
    /// * `path` - Extension directory or packaged file, as Firefox sees it
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `path` is not valid UTF-8
    /// - Any [`RemoteFirefox::get_addons_actor`] error
    /// - Install failures, wrapped as an `installTemporaryAddon` operation error
    pub async fn install_temporary_addon(&self, path: impl AsRef<Path>) -> Result<Addon> {
        let path = path.as_ref();
        let addon_path = path.to_str().ok_or_else(|| {
            Error::invalid_argument(format!(
                "add-on path is not valid UTF-8: {}",
                path.display()
            ))
        })?;

        let addons_actor = self.get_addons_actor().await?;
        debug!(actor = %addons_actor, path = addon_path, "Installing temporary add-on");

        let request =
            RdpRequest::new(addons_actor, RequestType::InstallTemporaryAddon.as_str())
                .with_field("addonPath", addon_path);

        let reply: InstallTemporaryAddonResponse = self
            .client
            .request(request)
            .await
            .and_then(RdpMessage::parse_as)
            .map_err(|e| e.during("installTemporaryAddon"))?;

        info!(addon_id = %reply.addon.id, actor = %reply.addon.actor, "Temporary add-on installed");
        Ok(reply.addon)
    }

    /// Lists the installed add-ons.
    ///
    /// # Errors
    ///
    /// Any request failure, wrapped as a `listAddons` operation error.
    pub async fn list_addons(&self) -> Result<Vec<Addon>> {
        let reply: ListAddonsResponse = self
            .client
            .request_root(RequestType::ListAddons)
            .await
            .and_then(RdpMessage::parse_as)
            .map_err(|e| e.during("listAddons"))?;
        Ok(reply.addons)
    }

    /// Finds an installed add-on by ID.
    ///
    /// # Errors
    ///
    /// - Any [`RemoteFirefox::list_addons`] error
    /// - [`Error::AddonNotInstalled`] if no add-on has this ID
    pub async fn get_installed_addon(&self, addon_id: &str) -> Result<Addon> {
        self.list_addons()
            .await?
            .into_iter()
            .find(|addon| addon.id == addon_id)
            .ok_or_else(|| Error::addon_not_installed(addon_id))
    }

    /// Checks that `addon`'s actor accepts `reload`.
    ///
    /// Only the first successful check talks to the server.
    ///
    /// # Errors
    ///
    /// - Request failures, wrapped as an `addonRequest` operation error
    /// - [`Error::FeatureUnsupported`] if `reload` is not accepted
    pub async fn check_for_addon_reloading(&self, addon: &Addon) -> Result<()> {
        if self.checked_for_addon_reloading.load(Ordering::Acquire) {
            return Ok(());
        }

        let reply: RequestTypesResponse = self
            .addon_request(addon, RequestType::RequestTypes)
            .await?
            .parse_as()
            .map_err(|e| e.during("addonRequest"))?;

        if !reply.supports(RequestType::Reload.as_str()) {
            return Err(Error::feature_unsupported(NO_ADDON_RELOADING));
        }

        self.checked_for_addon_reloading
            .store(true, Ordering::Release);
        Ok(())
    }

    /// Reloads an installed add-on.
    ///
    /// # Errors
    ///
    /// - Any [`RemoteFirefox::get_installed_addon`] error
    /// - Any [`RemoteFirefox::check_for_addon_reloading`] error; no
    ///   `reload` is sent in that case
    /// - Reload failures, wrapped as an `addonRequest` operation error
    pub async fn reload_addon(&self, addon_id: &str) -> Result<()> {
        let addon = self.get_installed_addon(addon_id).await?;
        self.check_for_addon_reloading(&addon).await?;
        self.addon_request(&addon, RequestType::Reload).await?;

        info!(addon_id, actor = %addon.actor, "Add-on reloaded");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
