//! Unsolicited event types.
//!
//! The debugger server pushes notifications that are not replies to any
//! request (navigation, style changes, network activity). They must never
//! complete a pending request, even when they come from an actor that has
//! one outstanding.
//!
//! The set grows with newer protocol revisions, so it is configuration
//! rather than a compiled-in constant.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashSet;

// ============================================================================
// Constants
// ============================================================================

/// Event types pushed by the server without a request.
pub const DEFAULT_UNSOLICITED_EVENTS: &[&str] = &[
    "tabNavigated",
    "styleApplied",
    "propertyChange",
    "networkEventUpdate",
    "networkEvent",
    "newMutations",
    "frameUpdate",
    "tabListChanged",
];

// ============================================================================
// UnsolicitedEvents
// ============================================================================

/// Set of message types treated as unsolicited events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsolicitedEvents {
    types: FxHashSet<String>,
}

impl Default for UnsolicitedEvents {
    fn default() -> Self {
        Self::from_types(DEFAULT_UNSOLICITED_EVENTS.iter().copied())
    }
}

impl UnsolicitedEvents {
    /// Creates an empty set.
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self {
            types: FxHashSet::default(),
        }
    }

    /// Creates a set from the given message types.
    #[must_use]
    pub fn from_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds a message type.
    #[inline]
    #[must_use]
    pub fn with(mut self, message_type: impl Into<String>) -> Self {
        self.types.insert(message_type.into());
        self
    }

    /// Returns `true` if `message_type` is unsolicited.
    #[inline]
    #[must_use]
    pub fn contains(&self, message_type: &str) -> bool {
        self.types.contains(message_type)
    }

    /// Returns the number of types in the set.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if the set is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
