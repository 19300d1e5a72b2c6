//! Connection lifecycle states.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the notification connection.
///
/// ```text
/// Disconnected ──connect()──▶ Connecting ──open──▶ AwaitingAuth ──auth ok──▶ Ready
///       ▲                                                                      │
///       │                                             unclean close / error    │
///       └──── attempts exhausted ◀── Reconnecting(n) ◀─────────────────────────┘
/// ```
///
/// The attempt counter carried by [`Reconnecting`](Self::Reconnecting) resets
/// to 0 whenever the machine reaches [`Ready`](Self::Ready).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport; nothing scheduled.
    Disconnected,
    /// Transport dial in progress.
    Connecting,
    /// Transport open, auth message sent, waiting for the verdict.
    AwaitingAuth,
    /// Authenticated; heartbeat running.
    Ready,
    /// Unclean loss; a retry is scheduled.
    Reconnecting {
        /// The retry attempt this wait precedes (1-based).
        attempt: u32,
    },
}

impl ConnectionState {
    /// Returns `true` when the connection is authenticated and usable.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns `true` while a retry is pending.
    #[inline]
    #[must_use]
    pub fn is_reconnecting(&self) -> bool {
        matches!(self, Self::Reconnecting { .. })
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting => f.write_str("connecting"),
            Self::AwaitingAuth => f.write_str("awaiting-auth"),
            Self::Ready => f.write_str("ready"),
            Self::Reconnecting { attempt } => write!(f, "reconnecting(attempt={attempt})"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
