//! Pledgeboard client runtime - presentation-state core for the dashboard.
//!
//! This library owns the two stateful subsystems of the Pledgeboard
//! browser-facing layer: accessible modal stacking and the realtime
//! notification connection.
//!
//! # Architecture
//!
//! Two independent components share the page lifecycle:
//!
//! - **[`overlay::ModalStack`]**: append-only stack of overlay surfaces with
//!   focus trapping, body scroll locking, and ARIA dialog semantics. Operates
//!   on the explicit [`dom::Document`] model, so the whole discipline is
//!   testable state, not ambient browser globals.
//! - **[`realtime::RealtimeClient`]**: one persistent WebSocket connection
//!   to the notification server, with auth handshake, heartbeat, per-event
//!   listener dispatch, and generation-counted reconnect backoff.
//!
//! Key design principles:
//!
//! - Explicitly constructed, explicitly owned instances; no ambient globals
//! - Cancellation primitives (`close_all`, `disconnect`) safe at any point
//! - Page-authoring mistakes are logged no-ops, never faults
//!
//! # Quick Start
//!
//! ```
//! use pledgeboard_client::dom::{Document, ElementBuilder};
//! use pledgeboard_client::overlay::{Key, ModalStack};
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let modal = ElementBuilder::new("div")
//!     .attr("id", "donate")
//!     .attr("class", "modal")
//!     .size(480.0, 320.0)
//!     .append_to(&mut doc, body);
//! let _amount = ElementBuilder::new("input")
//!     .size(200.0, 24.0)
//!     .append_to(&mut doc, modal);
//!
//! let mut stack = ModalStack::new();
//! stack.open(&mut doc, "donate");
//! assert_eq!(stack.topmost(), Some(modal));
//!
//! stack.handle_key(&mut doc, Key::Escape);
//! assert!(stack.is_empty());
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`dom`] | In-memory document model (nodes, focus, scroll) |
//! | [`overlay`] | Modal stack, focus trap, legacy class bridge |
//! | [`realtime`] | Notification client, backoff, listeners, credentials |
//! | [`protocol`] | Wire message types (internal shape, public module) |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |

// ============================================================================
// Modules
// ============================================================================

/// In-memory document model.
///
/// The page-state surface the overlay subsystem operates on.
pub mod dom;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for document nodes and realtime entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Accessible overlay stacking.
///
/// Modal stack manager, keyboard contract, and the legacy class bridge.
pub mod overlay;

/// Notification-server wire protocol.
///
/// Message types for the realtime connection.
pub mod protocol;

/// Realtime notification client.
///
/// Connection lifecycle, heartbeat, listener dispatch, reconnect backoff.
pub mod realtime;

// ============================================================================
// Re-exports
// ============================================================================

// Document model types
pub use dom::{Document, ElementBuilder, Node, Overflow, Size};

// Overlay types
pub use overlay::{ClassToggleBridge, Key, KeyDisposition, ModalRecord, ModalStack};

// Realtime types
pub use realtime::{
    ConnectionState, Endpoint, KeyValueStorage, ListenerCallback, ListenerRegistry,
    MemoryStorage, PageOrigin, PageScheme, RealtimeClient, RealtimeClientBuilder,
    ReconnectPolicy, StoredCredentials,
};

// Protocol types
pub use protocol::{ClientMessage, ParsedMessage, ServerMessage};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ConnectionId, NodeId, RoomId, UserId};
