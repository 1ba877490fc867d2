//! Typed replies for the request types in [`super::RequestType`].
//!
//! Each reply is deserialized from a whole [`super::RdpMessage`] with
//! [`super::RdpMessage::parse_as`]; unknown fields are ignored.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::ActorId;

// ============================================================================
// Addon
// ============================================================================

/// An installed add-on as reported by the debugger server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addon {
    /// Add-on ID from the manifest (e.g. `ext@example.com`).
    pub id: String,
    /// Actor controlling this add-on.
    pub actor: ActorId,
}

// ============================================================================
// Replies
// ============================================================================

/// Reply to `getRoot` and `listTabs`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootActorsResponse {
    /// Add-ons actor, when the server exposes one in this reply.
    #[serde(default)]
    pub addons_actor: Option<ActorId>,
}

/// Reply to `installTemporaryAddon`.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallTemporaryAddonResponse {
    /// The installed add-on.
    pub addon: Addon,
}

/// Reply to `listAddons`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListAddonsResponse {
    /// Installed add-ons.
    #[serde(default)]
    pub addons: Vec<Addon>,
}

/// Reply to `requestTypes`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTypesResponse {
    /// Request types the actor accepts.
    #[serde(default)]
    pub request_types: Vec<String>,
}

impl RequestTypesResponse {
    /// Returns `true` if the actor accepts `request_type`.
    #[inline]
    #[must_use]
    pub fn supports(&self, request_type: &str) -> bool {
        self.request_types.iter().any(|t| t == request_type)
    }
}

// ============================================================================
// Tests
// ============================================================================
