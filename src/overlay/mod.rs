//! Accessible overlay stacking.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ModalStack`] | Open/close/close_all + focus trap + scroll lock |
//! | [`ModalRecord`] | Per-surface bookkeeping (previous focus target) |
//! | [`Key`] / [`KeyDisposition`] | Keyboard contract of the focus trap |
//! | [`ClassToggleBridge`] | Legacy `class="open"` adapter over the API |
//!
//! # Example
//!
//! ```
//! use pledgeboard_client::dom::{Document, ElementBuilder};
//! use pledgeboard_client::overlay::{Key, ModalStack};
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let _modal = ElementBuilder::new("div")
//!     .attr("id", "share")
//!     .attr("class", "modal")
//!     .size(400.0, 240.0)
//!     .append_to(&mut doc, body);
//!
//! let mut stack = ModalStack::new();
//! stack.open(&mut doc, "share");
//! assert!(stack.scroll_locked());
//! stack.close_all(&mut doc);
//! assert!(!stack.scroll_locked());
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Legacy class-toggle adapter.
pub mod bridge;

/// Keyboard events and dispositions.
pub mod keyboard;

/// Per-modal bookkeeping records.
pub mod record;

/// The modal stack manager.
pub mod stack;

// ============================================================================
// Re-exports
// ============================================================================

pub use bridge::ClassToggleBridge;
pub use keyboard::{Key, KeyDisposition};
pub use record::ModalRecord;
pub use stack::ModalStack;
