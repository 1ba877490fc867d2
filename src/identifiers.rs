//! Type-safe identifiers for RDP entities.
//!
//! Newtype wrappers keep actor names from being confused with add-on IDs,
//! request types and other free-form strings.

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Well-known name of the root actor.
const ROOT_ACTOR: &str = "root";

// ============================================================================
// ActorId
// ============================================================================

/// Name of a remote actor inside the Firefox debugger server.
///
/// Actors are referenced, never owned: the server decides their lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Creates an actor ID from any string.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the root actor ID.
    ///
    /// The root actor greets every new connection and answers
    /// `getRoot`, `listTabs` and `listAddons`.
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(ROOT_ACTOR.to_string())
    }

    /// Returns `true` if this is the root actor.
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ACTOR
    }

    /// Returns `true` if the name is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the actor name.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    #[inline]
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ActorId {
    #[inline]
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for ActorId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ActorId {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ActorId {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_actor() {
        let root = ActorId::root();
        assert!(root.is_root());
        assert_eq!(root.to_string(), "root");
        assert!(!ActorId::from("server1.conn0.addonsActor2").is_root());
    }

    #[test]
    fn test_serde_transparent() {
        let actor = ActorId::from("actor1");
        let json = serde_json::to_string(&actor).expect("serialize");
        assert_eq!(json, "\"actor1\"");

        let parsed: ActorId = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, actor);
    }

    #[test]
    fn test_str_comparison() {
        let actor = ActorId::new(String::from("actor2"));
        assert_eq!(actor, "actor2");
        assert!(actor.as_str().starts_with("actor"));
    }
}
