//! The modal stack manager.
//!
//! [`ModalStack`] owns the accessible stacking discipline for overlay
//! surfaces: an append-only stack of [`ModalRecord`]s, a body scroll lock
//! held while any surface is open, ARIA dialog semantics applied on open,
//! and a focus trap on the topmost surface.
//!
//! Invariants:
//!
//! - the scroll lock is active iff the stack is non-empty;
//! - at most one surface (the last record) receives keyboard trapping;
//! - closing a non-topmost record does not reorder the rest and does not
//!   move focus;
//! - when the stack empties, focus returns to the element focused before
//!   the *first* surface opened, and the body style and scroll offset are
//!   restored to their pre-lock values.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, warn};

use crate::dom::query::{focusable_descendants, resolve_surface};
use crate::dom::{Document, Overflow};
use crate::identifiers::NodeId;

use super::keyboard::{Key, KeyDisposition};
use super::record::{ModalRecord, ScrollLock};

// ============================================================================
// ModalStack
// ============================================================================

/// Accessible stacking of overlay surfaces.
///
/// # Example
///
/// ```
/// use pledgeboard_client::dom::{Document, ElementBuilder};
/// use pledgeboard_client::overlay::{Key, ModalStack};
///
/// let mut doc = Document::new();
/// let body = doc.body();
/// let modal = ElementBuilder::new("div")
///     .attr("id", "donate")
///     .attr("class", "modal")
///     .size(480.0, 320.0)
///     .append_to(&mut doc, body);
/// let _input = ElementBuilder::new("input")
///     .size(200.0, 24.0)
///     .append_to(&mut doc, modal);
///
/// let mut stack = ModalStack::new();
/// assert!(stack.open(&mut doc, "donate"));
/// assert!(stack.handle_key(&mut doc, Key::Escape).is_handled());
/// assert!(stack.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ModalStack {
    /// Open surfaces, bottom to top.
    records: Vec<ModalRecord>,
    /// Saved body state, present iff the stack is non-empty.
    scroll_lock: Option<ScrollLock>,
    /// Sequence for generated ARIA label/description ids.
    aria_id_seq: u64,
}

impl ModalStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Returns the number of open surfaces.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no surface is open.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns `true` if the surface is open.
    #[must_use]
    pub fn is_open(&self, surface: NodeId) -> bool {
        self.records.iter().any(|r| r.surface() == surface)
    }

    /// Returns the topmost surface, the one receiving keyboard trapping.
    #[must_use]
    pub fn topmost(&self) -> Option<NodeId> {
        self.records.last().map(ModalRecord::surface)
    }

    /// Returns the open surfaces, bottom to top.
    pub fn surfaces(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.records.iter().map(ModalRecord::surface)
    }

    /// Returns `true` while the body scroll lock is held.
    #[inline]
    #[must_use]
    pub fn scroll_locked(&self) -> bool {
        self.scroll_lock.is_some()
    }

    // ========================================================================
    // Open
    // ========================================================================

    /// Opens the surface resolved from a trigger target (element id or
    /// `data-modal` value).
    ///
    /// An unresolvable target is a page-authoring error: logged and ignored,
    /// never a fault. Returns whether a record was pushed.
    pub fn open(&mut self, doc: &mut Document, target: &str) -> bool {
        let Some(surface) = resolve_surface(doc, target) else {
            warn!(target, "modal surface not found; open ignored");
            return false;
        };
        self.open_surface(doc, surface)
    }

    /// Opens a resolved surface.
    ///
    /// A surface already on the stack is deduplicated: opening it again
    /// (from either the explicit API or the legacy class bridge) is a no-op.
    pub fn open_surface(&mut self, doc: &mut Document, surface: NodeId) -> bool {
        if self.is_open(surface) {
            debug!(%surface, "surface already open; duplicate open ignored");
            return false;
        }

        let previous_focus = doc.active_element();
        if self.records.is_empty() {
            self.lock_scroll(doc, previous_focus);
        }
        self.records.push(ModalRecord::new(surface, previous_focus));

        self.apply_dialog_semantics(doc, surface);
        self.apply_initial_focus(doc, surface);
        debug!(%surface, depth = self.records.len(), "modal opened");
        true
    }

    // ========================================================================
    // Close
    // ========================================================================

    /// Closes the surface resolved from a trigger target.
    ///
    /// Same failure semantics as [`open`](Self::open).
    pub fn close(&mut self, doc: &mut Document, target: &str) -> bool {
        let Some(surface) = resolve_surface(doc, target) else {
            warn!(target, "modal surface not found; close ignored");
            return false;
        };
        self.close_surface(doc, surface)
    }

    /// Closes a surface anywhere in the stack.
    ///
    /// Closing a non-topmost surface preserves the order of the remaining
    /// records and does not move focus. Closing the topmost re-applies the
    /// trap to the new topmost; closing the last record releases the scroll
    /// lock and restores focus to the pre-nesting target.
    pub fn close_surface(&mut self, doc: &mut Document, surface: NodeId) -> bool {
        let Some(position) = self.records.iter().position(|r| r.surface() == surface) else {
            debug!(%surface, "surface not open; close ignored");
            return false;
        };
        let was_topmost = position + 1 == self.records.len();
        let record = self.records.remove(position);

        doc.set_attribute(surface, "aria-hidden", "true");

        if self.records.is_empty() {
            self.unlock_scroll(doc);
        } else if was_topmost {
            self.refocus_topmost(doc, &record);
        }
        debug!(%surface, depth = self.records.len(), "modal closed");
        true
    }

    /// Closes every open surface, topmost first.
    ///
    /// Equivalent to repeated [`close_surface`](Self::close_surface) calls;
    /// leaves focus and body state as if nothing had been opened.
    pub fn close_all(&mut self, doc: &mut Document) {
        while let Some(record) = self.records.last().copied() {
            self.close_surface(doc, record.surface());
        }
    }

    // ========================================================================
    // Triggers
    // ========================================================================

    /// Activates a trigger element (`data-modal-target` /
    /// `data-modal-close`).
    ///
    /// A `data-modal-target` attribute opens the named surface. A
    /// `data-modal-close` attribute closes the named surface, or, when the
    /// value is empty, the nearest enclosing open surface (the dismiss
    /// button inside a dialog). Returns whether a stack operation was
    /// performed.
    pub fn activate_trigger(&mut self, doc: &mut Document, trigger: NodeId) -> bool {
        if let Some(target) = doc.attribute(trigger, "data-modal-target").map(str::to_string) {
            return self.open(doc, &target);
        }
        match doc.attribute(trigger, "data-modal-close").map(str::to_string) {
            Some(target) if !target.is_empty() => self.close(doc, &target),
            Some(_) => match self.enclosing_surface(doc, trigger) {
                Some(surface) => self.close_surface(doc, surface),
                None => {
                    warn!(%trigger, "close trigger outside any open surface; ignored");
                    false
                }
            },
            None => false,
        }
    }

    /// Finds the innermost open surface containing `node`.
    fn enclosing_surface(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        self.records
            .iter()
            .rev()
            .map(ModalRecord::surface)
            .find(|&surface| doc.contains(surface, node))
    }

    // ========================================================================
    // Keyboard contract
    // ========================================================================

    /// Handles a keyboard event against the topmost surface.
    ///
    /// - `Escape` closes only the topmost record.
    /// - `Tab`/`Shift+Tab` cycle within the topmost record's focusable set,
    ///   recomputed on every keypress; the edges wrap. With zero focusable
    ///   descendants the event is consumed without moving focus, so tabbing
    ///   cannot escape into page content.
    ///
    /// Returns [`KeyDisposition::Ignored`] when the stack is empty.
    pub fn handle_key(&mut self, doc: &mut Document, key: Key) -> KeyDisposition {
        let Some(record) = self.records.last().copied() else {
            return KeyDisposition::Ignored;
        };

        match key {
            Key::Escape => {
                self.close_surface(doc, record.surface());
                KeyDisposition::Handled
            }

            Key::Tab { shift } => {
                // Content may have changed since the last keypress; never
                // cache this set.
                let focusables = focusable_descendants(doc, record.surface());
                if focusables.is_empty() {
                    return KeyDisposition::Handled;
                }

                let position = doc
                    .active_element()
                    .and_then(|active| focusables.iter().position(|&n| n == active));
                let next = match (position, shift) {
                    (Some(i), false) if i + 1 == focusables.len() => 0,
                    (Some(i), false) => i + 1,
                    (Some(0), true) => focusables.len() - 1,
                    (Some(i), true) => i - 1,
                    (None, false) => 0,
                    (None, true) => focusables.len() - 1,
                };
                doc.focus(focusables[next]);
                KeyDisposition::Handled
            }
        }
    }

    // ========================================================================
    // Scroll lock
    // ========================================================================

    /// Locks body scroll and saves the state to restore on release.
    fn lock_scroll(&mut self, doc: &mut Document, root_previous_focus: Option<NodeId>) {
        let style = doc.body_style();
        self.scroll_lock = Some(ScrollLock::capture(
            style,
            doc.scroll_offset(),
            root_previous_focus,
        ));
        doc.set_body_overflow(Overflow::Hidden);
        doc.set_body_padding_right(style.padding_right + doc.scrollbar_width());
    }

    /// Restores body style, scroll offset, and the root focus target.
    fn unlock_scroll(&mut self, doc: &mut Document) {
        let Some(lock) = self.scroll_lock.take() else {
            return;
        };
        doc.set_body_overflow(lock.saved_overflow);
        doc.set_body_padding_right(lock.saved_padding_right);
        let (x, y) = lock.saved_scroll;
        doc.set_scroll_offset(x, y);
        match lock.root_previous_focus {
            Some(target) => doc.focus(target),
            None => doc.blur(),
        }
    }

    // ========================================================================
    // ARIA and focus
    // ========================================================================

    /// Applies dialog semantics to a freshly opened surface.
    fn apply_dialog_semantics(&mut self, doc: &mut Document, surface: NodeId) {
        doc.set_attribute(surface, "aria-hidden", "false");
        if doc.attribute(surface, "role").is_none() {
            doc.set_attribute(surface, "role", "dialog");
        }
        doc.set_attribute(surface, "aria-modal", "true");

        if doc.attribute(surface, "aria-labelledby").is_none()
            && let Some(title) = self.find_title(doc, surface)
        {
            let id = self.ensure_element_id(doc, title, "dialog-title");
            doc.set_attribute(surface, "aria-labelledby", &id);
        }
        if doc.attribute(surface, "aria-describedby").is_none()
            && let Some(description) = self.find_description(doc, surface)
        {
            let id = self.ensure_element_id(doc, description, "dialog-desc");
            doc.set_attribute(surface, "aria-describedby", &id);
        }
    }

    /// Finds the surface's title element: an explicit `data-modal-title`
    /// marker or the first heading.
    fn find_title(&self, doc: &Document, surface: NodeId) -> Option<NodeId> {
        doc.descendants(surface).into_iter().find(|&n| {
            doc.node(n).has_attribute("data-modal-title")
                || matches!(doc.node(n).tag(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
        })
    }

    /// Finds the surface's description element: an explicit
    /// `data-modal-description` marker or the first paragraph.
    fn find_description(&self, doc: &Document, surface: NodeId) -> Option<NodeId> {
        doc.descendants(surface).into_iter().find(|&n| {
            doc.node(n).has_attribute("data-modal-description") || doc.node(n).tag() == "p"
        })
    }

    /// Returns the element's id, generating and assigning one if missing.
    fn ensure_element_id(&mut self, doc: &mut Document, node: NodeId, prefix: &str) -> String {
        if let Some(id) = doc.attribute(node, "id") {
            return id.to_string();
        }
        self.aria_id_seq += 1;
        let id = format!("{prefix}-{}", self.aria_id_seq);
        doc.set_attribute(node, "id", &id);
        id
    }

    /// Moves focus into a surface: autofocus marker, else first
    /// input/button, else the surface itself with a `tabindex=-1` fallback.
    fn apply_initial_focus(&self, doc: &mut Document, surface: NodeId) {
        let focusables = focusable_descendants(doc, surface);

        if let Some(&target) = focusables
            .iter()
            .find(|&&n| doc.node(n).has_attribute("autofocus"))
        {
            doc.focus(target);
            return;
        }
        if let Some(&target) = focusables
            .iter()
            .find(|&&n| matches!(doc.node(n).tag(), "input" | "button"))
        {
            doc.focus(target);
            return;
        }
        doc.set_attribute(surface, "tabindex", "-1");
        doc.focus(surface);
    }

    /// Re-applies the trap after the topmost surface closed over a
    /// non-empty stack.
    ///
    /// The closed record's previous-focus target is restored when it still
    /// sits inside the new topmost surface (the common nested case);
    /// otherwise the initial-focus discipline runs on the new topmost.
    fn refocus_topmost(&self, doc: &mut Document, closed: &ModalRecord) {
        let Some(new_top) = self.topmost() else {
            return;
        };
        match closed
            .previous_focus()
            .filter(|&target| doc.contains(new_top, target))
        {
            Some(target) => doc.focus(target),
            None => self.apply_initial_focus(doc, new_top),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
