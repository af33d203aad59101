//! Configurable pre-order traversal.
//!
//! A [`Traversal`] decides, per node, whether the node's subtree is
//! invisible (`skip_children`) and whether the node itself is invisible
//! while its children are still visited in its place (`skip_self`). The
//! same rules drive flattening a tree into text and walking it during the
//! merge, so both agree on which nodes exist.

use crate::dom::NodeRef;

/// Visibility rules for [`DomIterator`].
pub trait Traversal {
    /// Whether the descendants of `node` are hidden.
    fn skip_children(&self, node: NodeRef<'_>) -> bool;

    /// Whether `node` itself is hidden. Its children are still visited
    /// unless [`Traversal::skip_children`] hides them.
    fn skip_self(&self, node: NodeRef<'_>) -> bool;
}

impl<T: Traversal + ?Sized> Traversal for &T {
    fn skip_children(&self, node: NodeRef<'_>) -> bool {
        (**self).skip_children(node)
    }

    fn skip_self(&self, node: NodeRef<'_>) -> bool {
        (**self).skip_self(node)
    }
}

/// Visits every node.
#[derive(Debug, Clone, Copy, Default)]
pub struct Everything;

impl Traversal for Everything {
    fn skip_children(&self, _node: NodeRef<'_>) -> bool {
        false
    }

    fn skip_self(&self, _node: NodeRef<'_>) -> bool {
        false
    }
}

/// Visits table rows only, without descending into them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rows;

impl Traversal for Rows {
    fn skip_children(&self, node: NodeRef<'_>) -> bool {
        node.is_tag("tr")
    }

    fn skip_self(&self, node: NodeRef<'_>) -> bool {
        !node.is_tag("tr")
    }
}

/// Lazy pre-order iterator over the subtree of a root node.
///
/// The root is subject to the traversal rules like any other node. The
/// iterator is single pass: `fold`, `any`, `for_each` and friends all
/// consume it.
pub struct DomIterator<'a, T> {
    root: NodeRef<'a>,
    next: Option<NodeRef<'a>>,
    traversal: T,
}

impl<'a, T: Traversal> DomIterator<'a, T> {
    pub fn new(root: NodeRef<'a>, traversal: T) -> Self {
        let mut iter = Self {
            root,
            next: None,
            traversal,
        };
        iter.next = if iter.traversal.skip_self(root) {
            iter.next_visible(root)
        } else {
            Some(root)
        };
        iter
    }

    /// The next node in document order after `node`, not descending into
    /// hidden subtrees and never leaving the root.
    fn next_in_order(&self, node: NodeRef<'a>) -> Option<NodeRef<'a>> {
        if !self.traversal.skip_children(node) {
            if let Some(child) = node.first_child() {
                return Some(child);
            }
        }

        let mut current = node;
        while current != self.root {
            if let Some(sibling) = current.next_sibling() {
                return Some(sibling);
            }
            current = current.parent()?;
        }
        None
    }

    fn next_visible(&self, node: NodeRef<'a>) -> Option<NodeRef<'a>> {
        let mut current = node;
        loop {
            current = self.next_in_order(current)?;
            if !self.traversal.skip_self(current) {
                return Some(current);
            }
        }
    }
}

impl<'a, T: Traversal> Iterator for DomIterator<'a, T> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = self.next_visible(node);
        Some(node)
    }
}
