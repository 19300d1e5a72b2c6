//! In-memory document model.
//!
//! The overlay subsystem does not talk to a real DOM; it operates on this
//! explicit page model so that focus, scroll, and attribute state are plain
//! data mutated through one surface:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Document`] | Node arena + focus, scroll, body style |
//! | [`Node`] | One element: tag, attributes, layout, links |
//! | [`ElementBuilder`] | Fluent element construction for controllers/tests |
//!
//! The [`query`] submodule holds the overlay surface contract and the
//! focusable-element definition.
//!
//! # Example
//!
//! ```
//! use pledgeboard_client::dom::{Document, ElementBuilder};
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let modal = ElementBuilder::new("div")
//!     .attr("id", "donate")
//!     .attr("class", "modal")
//!     .size(480.0, 320.0)
//!     .append_to(&mut doc, body);
//! assert!(pledgeboard_client::dom::query::is_surface(&doc, modal));
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Document tree, focus, and scroll state.
pub mod document;

/// Nodes and the element builder.
pub mod node;

/// Surface resolution and focusable-element queries.
pub mod query;

// ============================================================================
// Re-exports
// ============================================================================

pub use document::{BodyStyle, Document, Overflow};
pub use node::{ElementBuilder, Node, Size};
