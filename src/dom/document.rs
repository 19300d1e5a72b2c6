//! The in-memory document model.
//!
//! [`Document`] is the page-state surface both subsystems operate on: an
//! arena of [`Node`]s rooted at the body, plus the page-global facts the
//! overlay layer needs to own: the active (focused) element, the body
//! scroll offset, and the body style used for scroll locking.
//!
//! The arena never frees nodes, so a [`NodeId`] handed out by a document
//! stays valid for that document's lifetime. Page controllers build the tree
//! once per render and mutate attributes afterwards.

// ============================================================================
// Imports
// ============================================================================

use tracing::trace;

use crate::identifiers::NodeId;

use super::node::{Node, Size};

// ============================================================================
// Overflow
// ============================================================================

/// Body overflow mode, the subset of CSS `overflow` the scroll lock touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    /// Content scrolls normally.
    #[default]
    Visible,
    /// Scrolling suppressed (scroll lock active).
    Hidden,
    /// Scrollbar always reserved.
    Scroll,
    /// Browser decides.
    Auto,
}

// ============================================================================
// BodyStyle
// ============================================================================

/// The body style properties the scroll lock saves and restores.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyStyle {
    /// Current overflow mode.
    pub overflow: Overflow,
    /// Right padding in CSS pixels (scrollbar-width compensation target).
    pub padding_right: f64,
}

// ============================================================================
// Document
// ============================================================================

/// Default scrollbar width used for scroll-lock compensation padding.
const DEFAULT_SCROLLBAR_WIDTH: f64 = 15.0;

/// An in-memory page document.
///
/// Owns the node arena, the focus state, and the body scroll state. All
/// mutation goes through methods; the overlay stack relies on this to keep
/// its invariants (no external mutation of focus or scroll lock behind its
/// back except through the same public surface).
#[derive(Debug)]
pub struct Document {
    /// Node arena; `NodeId` values index into this.
    nodes: Vec<Node>,
    /// Root node (the body).
    body: NodeId,
    /// Currently focused element.
    active_element: Option<NodeId>,
    /// Body scroll offset (x, y).
    scroll_offset: (f64, f64),
    /// Body style touched by the scroll lock.
    body_style: BodyStyle,
    /// Width of the viewport scrollbar in CSS pixels.
    scrollbar_width: f64,
}

impl Document {
    /// Creates an empty document containing only the body.
    #[must_use]
    pub fn new() -> Self {
        Self::with_scrollbar_width(DEFAULT_SCROLLBAR_WIDTH)
    }

    /// Creates an empty document with an explicit scrollbar width metric.
    #[must_use]
    pub fn with_scrollbar_width(scrollbar_width: f64) -> Self {
        let body = Node::new("body");
        Self {
            nodes: vec![body],
            body: NodeId::from_index(0),
            active_element: None,
            scroll_offset: (0.0, 0.0),
            body_style: BodyStyle::default(),
            scrollbar_width,
        }
    }

    /// Returns the body node id.
    #[inline]
    #[must_use]
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Returns the number of nodes in the arena (including the body).
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ========================================================================
    // Tree construction
    // ========================================================================

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId::from_index(self.nodes.len() as u32);
        self.nodes.push(Node::new(tag));
        trace!(node = %id, tag, "element created");
        id
    }

    /// Appends `child` to `parent`'s child list.
    ///
    /// A node already attached elsewhere is not re-parented; attachment is
    /// build-once in this model.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.nodes[child.index()].parent().is_some() {
            trace!(node = %child, "append_child ignored: node already attached");
            return;
        }
        self.nodes[child.index()].set_parent(Some(parent));
        self.nodes[parent.index()].push_child(child);
    }

    // ========================================================================
    // Node access
    // ========================================================================

    /// Returns a node by id.
    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Returns an attribute of a node.
    #[inline]
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).attribute(name)
    }

    /// Sets an attribute on a node.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        self.nodes[id.index()].set_attribute(name, value);
    }

    /// Removes an attribute from a node.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        self.nodes[id.index()].remove_attribute(name);
    }

    /// Sets the rendered size of a node.
    pub fn set_layout(&mut self, id: NodeId, layout: Size) {
        self.nodes[id.index()].set_layout(layout);
    }

    /// Finds the first element (in document order) whose `id` attribute
    /// matches.
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .find(|&n| self.attribute(n, "id") == Some(id))
    }

    /// Returns all descendants of `id` in depth-first document order,
    /// excluding `id` itself.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending: Vec<NodeId> = self.node(id).children().iter().rev().copied().collect();
        while let Some(next) = pending.pop() {
            out.push(next);
            pending.extend(self.node(next).children().iter().rev().copied());
        }
        out
    }

    /// Returns `true` if `node` is `ancestor` or sits anywhere below it.
    #[must_use]
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).parent();
        }
        false
    }

    // ========================================================================
    // Focus
    // ========================================================================

    /// Returns the currently focused element.
    #[inline]
    #[must_use]
    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    /// Moves focus to a node.
    pub fn focus(&mut self, id: NodeId) {
        trace!(node = %id, "focus");
        self.active_element = Some(id);
    }

    /// Clears focus.
    pub fn blur(&mut self) {
        self.active_element = None;
    }

    // ========================================================================
    // Scroll and body style
    // ========================================================================

    /// Returns the body scroll offset (x, y).
    #[inline]
    #[must_use]
    pub fn scroll_offset(&self) -> (f64, f64) {
        self.scroll_offset
    }

    /// Sets the body scroll offset.
    pub fn set_scroll_offset(&mut self, x: f64, y: f64) {
        self.scroll_offset = (x, y);
    }

    /// Returns the body style.
    #[inline]
    #[must_use]
    pub fn body_style(&self) -> BodyStyle {
        self.body_style
    }

    /// Sets the body overflow mode.
    pub fn set_body_overflow(&mut self, overflow: Overflow) {
        self.body_style.overflow = overflow;
    }

    /// Sets the body right padding.
    pub fn set_body_padding_right(&mut self, padding_right: f64) {
        self.body_style.padding_right = padding_right;
    }

    /// Returns the viewport scrollbar width metric.
    #[inline]
    #[must_use]
    pub fn scrollbar_width(&self) -> f64 {
        self.scrollbar_width
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
