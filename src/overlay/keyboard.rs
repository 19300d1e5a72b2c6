//! Keyboard events consumed by the focus trap.
//!
//! The embedding layer translates raw key events into [`Key`] values and
//! feeds them to [`ModalStack::handle_key`](super::ModalStack::handle_key);
//! the returned [`KeyDisposition`] maps directly onto `preventDefault`.

// ============================================================================
// Key
// ============================================================================

/// The keys the overlay stack reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Escape: closes the topmost modal.
    Escape,
    /// Tab / Shift+Tab: cycles within the topmost modal's focusable set.
    Tab {
        /// `true` for Shift+Tab (backward cycle).
        shift: bool,
    },
}

impl Key {
    /// Forward tab.
    #[inline]
    #[must_use]
    pub const fn tab() -> Self {
        Self::Tab { shift: false }
    }

    /// Backward tab (Shift+Tab).
    #[inline]
    #[must_use]
    pub const fn shift_tab() -> Self {
        Self::Tab { shift: true }
    }
}

// ============================================================================
// KeyDisposition
// ============================================================================

/// Whether the stack consumed a key event.
///
/// `Handled` means the embedding layer must suppress the default action
/// (`preventDefault`); `Ignored` means the event should proceed to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Consumed; suppress the default action.
    Handled,
    /// Not consumed; let the page see it.
    Ignored,
}

impl KeyDisposition {
    /// Returns `true` if the key was consumed.
    #[inline]
    #[must_use]
    pub fn is_handled(self) -> bool {
        matches!(self, Self::Handled)
    }
}

// ============================================================================
// Tests
// ============================================================================
