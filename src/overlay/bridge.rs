//! Legacy class-toggle bridge.
//!
//! Older page templates open modals by toggling `class="open"` or
//! `class="active"` directly instead of calling the stack API. This adapter
//! watches for that convention and translates it into the same public
//! [`ModalStack`] operations, so the stack itself stays free of
//! mutation-observation concerns.
//!
//! Two entry points:
//!
//! - [`ClassToggleBridge::note_class_changed`] for targeted notifications
//!   (the embedding layer forwards attribute-change events);
//! - [`ClassToggleBridge::sync`] for a full-document sweep when individual
//!   notifications are unavailable.
//!
//! Opens are deduplicated by surface identity in the stack, so a surface
//! opened both implicitly and explicitly produces exactly one record.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::dom::Document;
use crate::dom::query::{has_class, is_surface};
use crate::identifiers::NodeId;

use super::stack::ModalStack;

// ============================================================================
// Constants
// ============================================================================

/// Class names the legacy convention uses to mark a surface open.
const DEFAULT_OPEN_CLASSES: &[&str] = &["open", "active"];

// ============================================================================
// ClassToggleBridge
// ============================================================================

/// Adapter translating legacy class toggles into stack operations.
///
/// Tracks which surfaces it considers open-by-class so that a class removal
/// maps to exactly one implicit close, and a surface the stack closed by
/// other means (Escape, `close_all`) is not immediately reopened by a sweep.
#[derive(Debug)]
pub struct ClassToggleBridge {
    /// Classes that mark a surface as open.
    open_classes: Vec<String>,
    /// Surfaces currently considered open-by-class.
    tracked: FxHashSet<NodeId>,
}

impl Default for ClassToggleBridge {
    fn default() -> Self {
        Self {
            open_classes: DEFAULT_OPEN_CLASSES.iter().map(ToString::to_string).collect(),
            tracked: FxHashSet::default(),
        }
    }
}

impl ClassToggleBridge {
    /// Creates a bridge watching the default `open`/`active` classes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bridge watching a custom class list.
    #[must_use]
    pub fn with_open_classes(classes: &[&str]) -> Self {
        Self {
            open_classes: classes.iter().map(ToString::to_string).collect(),
            tracked: FxHashSet::default(),
        }
    }

    /// Returns `true` if the node carries any watched open class.
    #[must_use]
    fn has_open_class(&self, doc: &Document, node: NodeId) -> bool {
        self.open_classes.iter().any(|c| has_class(doc, node, c))
    }

    /// Reconciles one node after its `class` attribute changed externally.
    ///
    /// A qualifying surface gaining an open class is an implicit open; a
    /// tracked surface losing it is an implicit close. Returns whether a
    /// stack operation was performed.
    pub fn note_class_changed(
        &mut self,
        stack: &mut ModalStack,
        doc: &mut Document,
        node: NodeId,
    ) -> bool {
        let marked_open = is_surface(doc, node) && self.has_open_class(doc, node);

        if marked_open && !self.tracked.contains(&node) {
            self.tracked.insert(node);
            debug!(surface = %node, "implicit open via class toggle");
            return stack.open_surface(doc, node);
        }
        if !marked_open && self.tracked.remove(&node) {
            debug!(surface = %node, "implicit close via class toggle");
            return stack.close_surface(doc, node);
        }
        false
    }

    /// Sweeps the whole document and reconciles every qualifying surface.
    ///
    /// Returns the number of stack operations performed.
    pub fn sync(&mut self, stack: &mut ModalStack, doc: &mut Document) -> usize {
        let candidates: Vec<NodeId> = doc
            .descendants(doc.body())
            .into_iter()
            .filter(|&n| is_surface(doc, n) || self.tracked.contains(&n))
            .collect();

        let mut operations = 0;
        for node in candidates {
            if self.note_class_changed(stack, doc, node) {
                operations += 1;
            }
        }
        operations
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementBuilder;

    fn page() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let modal_a = ElementBuilder::new("div")
            .attr("id", "donate")
            .attr("class", "modal")
            .size(480.0, 320.0)
            .append_to(&mut doc, body);
        let modal_b = ElementBuilder::new("div")
            .attr("id", "confirm")
            .attr("class", "modal")
            .size(320.0, 200.0)
            .append_to(&mut doc, body);
        (doc, modal_a, modal_b)
    }

    #[test]
    fn test_class_addition_is_implicit_open() {
        let (mut doc, modal_a, _) = page();
        let mut stack = ModalStack::new();
        let mut bridge = ClassToggleBridge::new();

        doc.set_attribute(modal_a, "class", "modal open");
        assert!(bridge.note_class_changed(&mut stack, &mut doc, modal_a));

        assert!(stack.is_open(modal_a));
        assert!(stack.scroll_locked());
        assert_eq!(doc.attribute(modal_a, "aria-hidden"), Some("false"));
    }

    #[test]
    fn test_class_removal_is_implicit_close() {
        let (mut doc, modal_a, _) = page();
        let mut stack = ModalStack::new();
        let mut bridge = ClassToggleBridge::new();

        doc.set_attribute(modal_a, "class", "modal active");
        bridge.note_class_changed(&mut stack, &mut doc, modal_a);
        doc.set_attribute(modal_a, "class", "modal");
        assert!(bridge.note_class_changed(&mut stack, &mut doc, modal_a));

        assert!(!stack.is_open(modal_a));
        assert!(!stack.scroll_locked());
    }

    #[test]
    fn test_double_registration_across_paths_is_deduplicated() {
        let (mut doc, modal_a, _) = page();
        let mut stack = ModalStack::new();
        let mut bridge = ClassToggleBridge::new();

        // Explicit open first, then the legacy toggle fires for the same
        // surface.
        stack.open_surface(&mut doc, modal_a);
        doc.set_attribute(modal_a, "class", "modal open");
        assert!(!bridge.note_class_changed(&mut stack, &mut doc, modal_a));

        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_unchanged_class_is_a_noop() {
        let (mut doc, modal_a, _) = page();
        let mut stack = ModalStack::new();
        let mut bridge = ClassToggleBridge::new();

        doc.set_attribute(modal_a, "class", "modal open");
        assert!(bridge.note_class_changed(&mut stack, &mut doc, modal_a));
        assert!(!bridge.note_class_changed(&mut stack, &mut doc, modal_a));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_sync_reconciles_both_directions() {
        let (mut doc, modal_a, modal_b) = page();
        let mut stack = ModalStack::new();
        let mut bridge = ClassToggleBridge::new();

        doc.set_attribute(modal_a, "class", "modal open");
        doc.set_attribute(modal_b, "class", "modal active");
        assert_eq!(bridge.sync(&mut stack, &mut doc), 2);
        assert!(stack.is_open(modal_a));
        assert!(stack.is_open(modal_b));

        doc.set_attribute(modal_b, "class", "modal");
        assert_eq!(bridge.sync(&mut stack, &mut doc), 1);
        assert!(stack.is_open(modal_a));
        assert!(!stack.is_open(modal_b));
    }

    #[test]
    fn test_sync_does_not_reopen_after_stack_close() {
        let (mut doc, modal_a, _) = page();
        let mut stack = ModalStack::new();
        let mut bridge = ClassToggleBridge::new();

        doc.set_attribute(modal_a, "class", "modal open");
        bridge.sync(&mut stack, &mut doc);

        // The stack closed it (Escape path); the stale class must not
        // reopen it on the next sweep.
        stack.close_surface(&mut doc, modal_a);
        assert_eq!(bridge.sync(&mut stack, &mut doc), 0);
        assert!(!stack.is_open(modal_a));
    }

    #[test]
    fn test_non_surface_class_toggle_ignored() {
        let (mut doc, _, _) = page();
        let body = doc.body();
        let plain = ElementBuilder::new("div")
            .attr("class", "open")
            .append_to(&mut doc, body);
        let mut stack = ModalStack::new();
        let mut bridge = ClassToggleBridge::new();

        assert!(!bridge.note_class_changed(&mut stack, &mut doc, plain));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_custom_open_classes() {
        let (mut doc, modal_a, _) = page();
        let mut stack = ModalStack::new();
        let mut bridge = ClassToggleBridge::with_open_classes(&["visible"]);

        doc.set_attribute(modal_a, "class", "modal open");
        assert!(!bridge.note_class_changed(&mut stack, &mut doc, modal_a));

        doc.set_attribute(modal_a, "class", "modal visible");
        assert!(bridge.note_class_changed(&mut stack, &mut doc, modal_a));
        assert!(stack.is_open(modal_a));
    }
}
