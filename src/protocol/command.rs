//! Request types understood by this client.
//!
//! Only the subset needed for add-on installation, listing and reload.
//!
//! | Type | Target | Reply fields |
//! |------|--------|--------------|
//! | `getRoot` | root | `addonsActor?` |
//! | `listTabs` | root | `addonsActor?` |
//! | `listAddons` | root | `addons` |
//! | `installTemporaryAddon` | addons actor | `addon` |
//! | `requestTypes` | any actor | `requestTypes` |
//! | `reload` | add-on actor | – |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// RequestType
// ============================================================================

/// Known RDP request types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestType {
    /// Root actor description. Supported since Firefox 55.
    GetRoot,
    /// Tab listing. Carried `addonsActor` in Firefox 49 to 77.
    ListTabs,
    /// Installed add-on listing.
    ListAddons,
    /// Temporary add-on installation.
    InstallTemporaryAddon,
    /// Request types supported by an actor.
    RequestTypes,
    /// Add-on reload.
    Reload,
}

impl RequestType {
    /// Returns the wire name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetRoot => "getRoot",
            Self::ListTabs => "listTabs",
            Self::ListAddons => "listAddons",
            Self::InstallTemporaryAddon => "installTemporaryAddon",
            Self::RequestTypes => "requestTypes",
            Self::Reload => "reload",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RequestType> for String {
    #[inline]
    fn from(request_type: RequestType) -> Self {
        request_type.as_str().to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_serde() {
        for request_type in [
            RequestType::GetRoot,
            RequestType::ListTabs,
            RequestType::ListAddons,
            RequestType::InstallTemporaryAddon,
            RequestType::RequestTypes,
            RequestType::Reload,
        ] {
            let json = serde_json::to_string(&request_type).expect("serialize");
            assert_eq!(json, format!("\"{}\"", request_type.as_str()));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(RequestType::InstallTemporaryAddon.to_string(), "installTemporaryAddon");
    }
}
