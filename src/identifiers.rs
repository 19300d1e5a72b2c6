//! Type-safe identifiers for document nodes and realtime entities.
//!
//! Newtype wrappers prevent mixing incompatible identifiers at compile time:
//! a [`NodeId`] can never be passed where a [`RoomId`] is expected, and a
//! [`UserId`] is validated once at the boundary instead of on every use.
//!
//! | Identifier | Origin |
//! |------------|--------|
//! | [`NodeId`] | Allocated by [`Document`](crate::dom::Document) |
//! | [`UserId`] | Credential storage / caller |
//! | [`RoomId`] | Caller (dashboard controllers) |
//! | [`ConnectionId`] | Assigned by the notification server (welcome message) |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// NodeId
// ============================================================================

/// Identifier of a node in a [`Document`](crate::dom::Document) tree.
///
/// Node ids are arena indices allocated by the owning document and are only
/// meaningful for the document that created them. Nodes are never removed
/// from the arena, so a `NodeId` stays valid for the document's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a node id from an arena index.
    #[inline]
    #[must_use]
    pub(crate) const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    #[inline]
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

// ============================================================================
// UserId
// ============================================================================

/// Identifier of a platform user, as sent in the authentication message.
///
/// Serializes as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Creates a user id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the id is empty.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::invalid_argument("user id must not be empty"));
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// RoomId
// ============================================================================

/// Identifier of a notification room (per-project or per-campaign channel).
///
/// Serializes as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    /// Creates a room id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the id is empty.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::invalid_argument("room id must not be empty"));
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// ConnectionId
// ============================================================================

/// Server-assigned identifier for one accepted connection.
///
/// Received in the welcome message and valid until the transport closes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Wraps a server-assigned connection id.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
