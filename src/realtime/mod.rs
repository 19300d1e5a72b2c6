//! Realtime notification client.
//!
//! Maintains the platform's single live push connection: authentication
//! handshake, heartbeat keep-alive, listener dispatch, and reconnection
//! with exponential backoff.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RealtimeClient`] | Connection owner with explicit lifecycle |
//! | [`ConnectionState`] | Lifecycle states incl. `Reconnecting(attempt)` |
//! | [`ReconnectPolicy`] | Exponential backoff schedule |
//! | [`ListenerRegistry`] | Per-event callback sets, panic-isolated |
//! | [`Endpoint`] / [`PageOrigin`] | Notification endpoint derivation |
//! | [`StoredCredentials`] | Fixed-key credential loading for auto-connect |
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pledgeboard_client::identifiers::UserId;
//! use pledgeboard_client::realtime::{PageOrigin, RealtimeClient};
//!
//! # async fn example() -> pledgeboard_client::Result<()> {
//! let origin = PageOrigin::parse("https://pledgeboard.example")?;
//! let client = RealtimeClient::builder().page_origin(&origin).build()?;
//!
//! client.add_listener("notification", Arc::new(|payload| {
//!     println!("{}", payload["data"]["message"]);
//! }));
//! client.connect(UserId::new("u42")?, "session-token").await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Reconnect backoff policy.
pub mod backoff;

/// Client, builder, and connection event loop.
pub mod client;

/// Credential storage for auto-connect.
pub mod credentials;

/// Notification endpoint derivation.
pub mod endpoint;

/// Per-event listener registry.
pub mod listeners;

/// Connection lifecycle states.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use backoff::ReconnectPolicy;
pub use client::{
    AuthHandler, CONNECTION_FAILED_EVENT, RealtimeClient, RealtimeClientBuilder,
    UNKNOWN_MESSAGE_EVENT,
};
pub use credentials::{
    KeyValueStorage, MemoryStorage, SESSION_TOKEN_KEY, StoredCredentials, USER_ID_KEY,
};
pub use endpoint::{Endpoint, NOTIFICATION_PORT, PageOrigin, PageScheme};
pub use listeners::{ListenerCallback, ListenerRegistry};
pub use state::ConnectionState;
