//! Wire message types for the notification connection.
//!
//! Outbound messages are a serde-tagged enum ([`ClientMessage`]); inbound
//! traffic arrives as a JSON envelope with a required `type` field
//! ([`ServerMessage`]) that parses into typed variants ([`ParsedMessage`]).
//!
//! # Wire Format
//!
//! | Direction | Type | Shape |
//! |-----------|------|-------|
//! | out | `auth` | `{"type":"auth","user_id":…,"token":…}` |
//! | out | `ping` | `{"type":"ping","timestamp":…}` |
//! | out | `join_room` / `leave_room` | `{"type":…,"room_id":…}` |
//! | out | `subscribe_notifications` | `{"type":"subscribe_notifications"}` |
//! | in | `welcome` | `{"type":"welcome","connection_id":…}` |
//! | in | `auth_success` / `auth_error` / `error` | auth and error surface |
//! | in | `notification` | `{"type":"notification","data":{"message":…}}` |
//! | in | `pending_notifications` | `{"notifications":[…],"count":…}` |
//! | in | `pong` / `room_joined` / `room_left` / `subscribed` | acks |
//!
//! Unrecognized inbound types parse to [`ParsedMessage::Unknown`] so callers
//! can handle forward-compatible traffic via the `unknown_message` listener
//! channel instead of losing it.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{RoomId, UserId};

// ============================================================================
// ClientMessage
// ============================================================================

/// An outbound message from the client to the notification server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Authentication handshake, sent immediately on transport open.
    Auth {
        /// Authenticating user.
        user_id: UserId,
        /// Credential token.
        token: String,
    },

    /// Heartbeat keep-alive, sent every interval while Ready.
    Ping {
        /// Milliseconds since the Unix epoch at send time.
        timestamp: u64,
    },

    /// Join a notification room.
    JoinRoom {
        /// Room to join.
        room_id: RoomId,
    },

    /// Leave a notification room.
    LeaveRoom {
        /// Room to leave.
        room_id: RoomId,
    },

    /// Subscribe to the user's notification feed.
    SubscribeNotifications,
}

// ============================================================================
// ServerMessage
// ============================================================================

/// An inbound message envelope.
///
/// Keeps the full payload object so dispatch can hand listeners the message
/// exactly as received, while [`ServerMessage::parsed`] gives internal
/// handling a typed view.
#[derive(Debug, Clone)]
pub struct ServerMessage {
    /// The `type` discriminator.
    message_type: String,
    /// The complete message object, `type` field included.
    payload: Value,
}

impl ServerMessage {
    /// Parses an inbound text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the frame is not valid JSON
    /// - [`Error::Protocol`] if the frame is not an object with a string
    ///   `type` field
    pub fn parse_str(text: &str) -> Result<Self> {
        let payload: Value = serde_json::from_str(text)?;
        let message_type = payload
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::protocol("inbound message missing string `type` field"))?
            .to_string();

        Ok(Self {
            message_type,
            payload,
        })
    }

    /// Returns the `type` discriminator.
    #[inline]
    #[must_use]
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// Returns the complete message object.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Parses the envelope into a typed variant.
    #[must_use]
    pub fn parsed(&self) -> ParsedMessage {
        match self.message_type.as_str() {
            "welcome" => ParsedMessage::Welcome {
                connection_id: self.get_string("connection_id"),
            },

            "auth_success" => ParsedMessage::AuthSuccess,

            "auth_error" => ParsedMessage::AuthError {
                message: self.get_string("message"),
            },

            "error" => ParsedMessage::Error {
                kind: self.get_optional_string("kind"),
                message: self.get_string("message"),
            },

            "notification" => ParsedMessage::Notification {
                data: self.payload.get("data").cloned().unwrap_or(Value::Null),
            },

            "pending_notifications" => ParsedMessage::PendingNotifications {
                count: self.get_u64("count"),
            },

            "pong" => ParsedMessage::Pong,

            "room_joined" => ParsedMessage::RoomJoined {
                room_id: self.get_string("room_id"),
            },

            "room_left" => ParsedMessage::RoomLeft {
                room_id: self.get_string("room_id"),
            },

            "subscribed" => ParsedMessage::Subscribed,

            _ => ParsedMessage::Unknown {
                message_type: self.message_type.clone(),
            },
        }
    }

    /// Gets a string field from the payload.
    #[inline]
    fn get_string(&self, key: &str) -> String {
        self.payload
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Gets an optional string field from the payload.
    #[inline]
    fn get_optional_string(&self, key: &str) -> Option<String> {
        self.payload
            .get(key)
            .and_then(Value::as_str)
            .map(ToString::to_string)
    }

    /// Gets a u64 field from the payload.
    #[inline]
    fn get_u64(&self, key: &str) -> u64 {
        self.payload
            .get(key)
            .and_then(Value::as_u64)
            .unwrap_or_default()
    }
}

// ============================================================================
// ParsedMessage
// ============================================================================

/// Typed view of an inbound message, for internal handling.
///
/// Listener dispatch uses the raw payload; this enum drives the state
/// machine (auth transitions, connection-id capture, heartbeat acks).
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    /// Connection accepted; the server assigned a connection id.
    Welcome {
        /// Server-assigned connection id.
        connection_id: String,
    },

    /// Authentication succeeded.
    AuthSuccess,

    /// Authentication rejected.
    AuthError {
        /// Server-provided reason.
        message: String,
    },

    /// Generic server error.
    Error {
        /// Error category; `"auth"` marks an authentication problem.
        kind: Option<String>,
        /// Server-provided description.
        message: String,
    },

    /// A single pushed notification.
    Notification {
        /// Notification body; carries at least a human-readable `message`.
        data: Value,
    },

    /// Notifications queued while the client was offline.
    PendingNotifications {
        /// Number of queued notifications.
        count: u64,
    },

    /// Heartbeat acknowledgement.
    Pong,

    /// Room join acknowledged.
    RoomJoined {
        /// Joined room.
        room_id: String,
    },

    /// Room leave acknowledged.
    RoomLeft {
        /// Left room.
        room_id: String,
    },

    /// Notification-feed subscription acknowledged.
    Subscribed,

    /// Unrecognized message type.
    Unknown {
        /// The unrecognized `type` value.
        message_type: String,
    },
}

impl ParsedMessage {
    /// Returns `true` if this message reports an authentication problem.
    ///
    /// Covers the dedicated `auth_error` type and a generic `error` whose
    /// `kind` is `"auth"`.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::AuthError { .. } => true,
            Self::Error { kind, .. } => kind.as_deref() == Some("auth"),
            _ => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
