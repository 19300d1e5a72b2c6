//! Surface resolution and focusable-element queries.
//!
//! Two query families live here:
//!
//! - the overlay surface contract: which elements qualify as modal surfaces
//!   (class `modal`, `role=dialog`, or a `data-modal` attribute) and how a
//!   trigger target string resolves to one;
//! - the focusable-element definition used by the focus trap: interactive
//!   tags and non-negative `tabindex`, filtered to rendered, enabled,
//!   non-`aria-hidden` elements.
//!
//! The focusable set is recomputed on every keypress; surface content may
//! change while a modal is open, so nothing here caches.

// ============================================================================
// Imports
// ============================================================================

use crate::identifiers::NodeId;

use super::Document;

// ============================================================================
// Surface contract
// ============================================================================

/// Returns `true` if `class` appears in the node's whitespace-separated
/// `class` attribute.
#[must_use]
pub fn has_class(doc: &Document, id: NodeId, class: &str) -> bool {
    doc.attribute(id, "class")
        .is_some_and(|value| value.split_ascii_whitespace().any(|c| c == class))
}

/// Returns `true` if the node qualifies as an overlay surface.
///
/// The authoring contract accepts class `modal`, `role=dialog`, or a
/// `data-modal` attribute.
#[must_use]
pub fn is_surface(doc: &Document, id: NodeId) -> bool {
    has_class(doc, id, "modal")
        || doc.attribute(id, "role") == Some("dialog")
        || doc.node(id).has_attribute("data-modal")
}

/// Resolves a trigger target string to a qualifying surface.
///
/// Matches the element `id` attribute first, then the `data-modal` value,
/// in document order. Non-qualifying elements are skipped even on an id
/// match, so a stray `id` collision on ordinary page content cannot hijack
/// a modal trigger.
#[must_use]
pub fn resolve_surface(doc: &Document, target: &str) -> Option<NodeId> {
    let candidates = doc.descendants(doc.body());
    candidates
        .iter()
        .copied()
        .find(|&n| doc.attribute(n, "id") == Some(target) && is_surface(doc, n))
        .or_else(|| {
            candidates
                .iter()
                .copied()
                .find(|&n| doc.attribute(n, "data-modal") == Some(target) && is_surface(doc, n))
        })
}

// ============================================================================
// Focusable elements
// ============================================================================

/// Returns `true` if the node is in the keyboard tab order.
///
/// Interactive tags (`a[href]`, `button`, `input`, `select`, `textarea`),
/// non-negative `tabindex`, and `contenteditable=true` qualify, filtered to
/// elements with non-zero rendered size that are not `disabled` and not
/// inside an `aria-hidden` subtree.
#[must_use]
pub fn is_focusable(doc: &Document, id: NodeId) -> bool {
    let node = doc.node(id);

    let interactive = match node.tag() {
        "button" | "input" | "select" | "textarea" => true,
        "a" => node.has_attribute("href"),
        _ => {
            node.attribute("tabindex")
                .and_then(|t| t.parse::<i32>().ok())
                .is_some_and(|t| t >= 0)
                || node.attribute("contenteditable") == Some("true")
        }
    };

    interactive
        && node.layout().is_visible()
        && !node.has_attribute("disabled")
        && !in_aria_hidden_subtree(doc, id)
}

/// Returns the focusable descendants of `surface` in document order.
///
/// This is the cycle the focus trap walks; callers must not cache it across
/// keypresses.
#[must_use]
pub fn focusable_descendants(doc: &Document, surface: NodeId) -> Vec<NodeId> {
    doc.descendants(surface)
        .into_iter()
        .filter(|&n| is_focusable(doc, n))
        .collect()
}

/// Returns `true` if the node or any ancestor carries `aria-hidden=true`.
fn in_aria_hidden_subtree(doc: &Document, id: NodeId) -> bool {
    let mut current = Some(id);
    while let Some(n) = current {
        if doc.attribute(n, "aria-hidden") == Some("true") {
            return true;
        }
        current = doc.node(n).parent();
    }
    false
}

// ============================================================================
// Tests
// ============================================================================
