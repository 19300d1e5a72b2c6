//! Document nodes and the element builder.
//!
//! A [`Node`] is one element in a [`Document`](super::Document) tree: a tag
//! name, an attribute map, a rendered layout size, and parent/children links.
//! Nodes are created through [`Document::create_element`] or, more
//! conveniently, through the fluent [`ElementBuilder`].

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;

use crate::identifiers::NodeId;

use super::Document;

// ============================================================================
// Size
// ============================================================================

/// Rendered size of a node in CSS pixels.
///
/// Elements start at zero size (not rendered). The focusable-element filter
/// skips zero-sized nodes, mirroring the visible-dimensions check a browser
/// layer performs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    /// Rendered width.
    pub width: f64,
    /// Rendered height.
    pub height: f64,
}

impl Size {
    /// Zero size (element not rendered).
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    /// Creates a size.
    #[inline]
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns `true` if both dimensions are non-zero.
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

// ============================================================================
// Node
// ============================================================================

/// One element in a document tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Lowercase tag name (`div`, `input`, ...).
    tag: String,
    /// Attribute map.
    attributes: FxHashMap<String, String>,
    /// Rendered size.
    layout: Size,
    /// Parent node, `None` for the body and detached nodes.
    parent: Option<NodeId>,
    /// Child nodes in document order.
    children: Vec<NodeId>,
}

impl Node {
    /// Creates a detached node with the given tag.
    pub(crate) fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: FxHashMap::default(),
            layout: Size::ZERO,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Returns the lowercase tag name.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns an attribute value.
    #[inline]
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns `true` if the attribute is present (with any value).
    #[inline]
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Returns the rendered size.
    #[inline]
    #[must_use]
    pub fn layout(&self) -> Size {
        self.layout
    }

    /// Returns the parent node id.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the children in document order.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub(crate) fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    pub(crate) fn remove_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
    }

    pub(crate) fn set_layout(&mut self, layout: Size) {
        self.layout = layout;
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }
}

// ============================================================================
// ElementBuilder
// ============================================================================

/// Fluent builder for creating and attaching elements.
///
/// # Example
///
/// ```
/// use pledgeboard_client::dom::{Document, ElementBuilder};
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
/// ```
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    tag: String,
    attributes: Vec<(String, String)>,
    layout: Size,
}

impl ElementBuilder {
    /// Starts building an element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            layout: Size::ZERO,
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Sets the rendered size.
    #[must_use]
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.layout = Size::new(width, height);
        self
    }

    /// Creates the element and appends it to `parent`.
    pub fn append_to(self, doc: &mut Document, parent: NodeId) -> NodeId {
        let node = doc.create_element(&self.tag);
        for (name, value) in &self.attributes {
            doc.set_attribute(node, name, value);
        }
        doc.set_layout(node, self.layout);
        doc.append_child(parent, node);
        node
    }
}

// ============================================================================
// Tests
// ============================================================================
