//! Notification-server wire protocol.
//!
//! This module defines the message format for communication between the
//! client and the platform's notification server.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | [`ClientMessage`] | Client → Server | Auth, heartbeat, room ops |
//! | [`ServerMessage`] | Server → Client | Envelope with `type` field |
//! | [`ParsedMessage`] | — | Typed view of an inbound envelope |
//!
//! Every inbound frame is a JSON object with a required `type` field;
//! everything else is type-specific. Unrecognized types survive parsing as
//! [`ParsedMessage::Unknown`] and reach the `unknown_message` listener
//! channel rather than being dropped.

// ============================================================================
// Submodules
// ============================================================================

/// Outbound and inbound message types.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use message::{ClientMessage, ParsedMessage, ServerMessage};
