//! Per-modal bookkeeping records.

// ============================================================================
// Imports
// ============================================================================

use crate::dom::{BodyStyle, Overflow};
use crate::identifiers::NodeId;

// ============================================================================
// ModalRecord
// ============================================================================

/// Bookkeeping for one open overlay surface.
///
/// Records are created on open and destroyed on close; the stack position
/// decides topmost-ness, so the record itself carries no ordering state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalRecord {
    /// The open surface.
    surface: NodeId,
    /// Element focused immediately before this surface opened.
    previous_focus: Option<NodeId>,
}

impl ModalRecord {
    /// Creates a record for a surface about to open.
    #[inline]
    #[must_use]
    pub(crate) fn new(surface: NodeId, previous_focus: Option<NodeId>) -> Self {
        Self {
            surface,
            previous_focus,
        }
    }

    /// Returns the surface this record tracks.
    #[inline]
    #[must_use]
    pub fn surface(&self) -> NodeId {
        self.surface
    }

    /// Returns the element focused before this surface opened.
    #[inline]
    #[must_use]
    pub fn previous_focus(&self) -> Option<NodeId> {
        self.previous_focus
    }
}

// ============================================================================
// ScrollLock
// ============================================================================

/// Body state saved when the first modal opened, restored when the stack
/// empties.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScrollLock {
    /// Body overflow before locking.
    pub saved_overflow: Overflow,
    /// Body right padding before compensation.
    pub saved_padding_right: f64,
    /// Scroll offset before locking.
    pub saved_scroll: (f64, f64),
    /// Focus target of the first record opened (root of the nesting);
    /// focus returns here when the stack empties, regardless of close order.
    pub root_previous_focus: Option<NodeId>,
}

impl ScrollLock {
    /// Captures the lock state from the current body style.
    pub(crate) fn capture(
        style: BodyStyle,
        scroll: (f64, f64),
        root_previous_focus: Option<NodeId>,
    ) -> Self {
        Self {
            saved_overflow: style.overflow,
            saved_padding_right: style.padding_right,
            saved_scroll: scroll,
            root_previous_focus,
        }
    }
}
