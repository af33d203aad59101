//! Diff configuration.

use std::fmt;
use std::sync::Arc;

use redline_text::Segment;

use crate::dom::NodeRef;
use crate::iter::Traversal;
use crate::stem::Stem;

/// Node predicate that may defer to the built-in rule by returning `None`.
pub type NodePredicate = dyn Fn(NodeRef<'_>) -> Option<bool> + Send + Sync;

/// Pluggable text diff. Equal and deleted segments must concatenate to
/// the old text, equal and inserted segments to the new text.
pub type DiffTextFn = dyn Fn(&str, &str) -> Vec<Segment> + Send + Sync;

/// Options for [`visual_dom_diff`](crate::visual_dom_diff).
///
/// ```
/// use redline::DiffOptions;
///
/// let options = DiffOptions::new()
///     .with_added_class("ins")
///     .skip_modified()
///     .with_skip_self(|node| node.is_tag("font").then_some(true));
/// assert_eq!(options.added_class, "ins");
/// ```
#[derive(Clone)]
pub struct DiffOptions {
    /// Class of insertion markers (default: `vdd-added`)
    pub added_class: Stem,
    /// Class of markers around reformatted text (default: `vdd-modified`)
    pub modified_class: Stem,
    /// Class of deletion markers (default: `vdd-removed`)
    pub removed_class: Stem,
    /// Do not mark reformatted text (default: false)
    pub skip_modified: bool,
    skip_children: Option<Arc<NodePredicate>>,
    skip_self: Option<Arc<NodePredicate>>,
    diff_text: Arc<DiffTextFn>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            added_class: "vdd-added".into(),
            modified_class: "vdd-modified".into(),
            removed_class: "vdd-removed".into(),
            skip_modified: false,
            skip_children: None,
            skip_self: None,
            diff_text: Arc::new(redline_text::diff_text),
        }
    }
}

impl DiffOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_added_class(mut self, class: impl Into<Stem>) -> Self {
        self.added_class = class.into();
        self
    }

    pub fn with_modified_class(mut self, class: impl Into<Stem>) -> Self {
        self.modified_class = class.into();
        self
    }

    pub fn with_removed_class(mut self, class: impl Into<Stem>) -> Self {
        self.removed_class = class.into();
        self
    }

    /// Leave reformatted text unmarked.
    pub fn skip_modified(mut self) -> Self {
        self.skip_modified = true;
        self
    }

    /// Override which nodes hide their subtree. Returning `None` falls back
    /// to the built-in rule. Nodes other than elements and fragments always
    /// hide their (empty) subtree.
    pub fn with_skip_children(
        mut self,
        predicate: impl Fn(NodeRef<'_>) -> Option<bool> + Send + Sync + 'static,
    ) -> Self {
        self.skip_children = Some(Arc::new(predicate));
        self
    }

    /// Override which nodes are transparent. Returning `None` falls back to
    /// the built-in rule. Nodes other than text and elements are always
    /// transparent.
    pub fn with_skip_self(
        mut self,
        predicate: impl Fn(NodeRef<'_>) -> Option<bool> + Send + Sync + 'static,
    ) -> Self {
        self.skip_self = Some(Arc::new(predicate));
        self
    }

    /// Replace the text diff.
    pub fn with_diff_text(
        mut self,
        diff_text: impl Fn(&str, &str) -> Vec<Segment> + Send + Sync + 'static,
    ) -> Self {
        self.diff_text = Arc::new(diff_text);
        self
    }

    pub(crate) fn diff_text(&self, old: &str, new: &str) -> Vec<Segment> {
        (self.diff_text)(old, new)
    }

    /// Whether `node` is an element hidden by [`Traversal::skip_self`],
    /// i.e. inline formatting that gets re-applied around text.
    pub fn is_formatting(&self, node: NodeRef<'_>) -> bool {
        node.is_element() && self.skip_self(node)
    }
}

impl Traversal for DiffOptions {
    fn skip_children(&self, node: NodeRef<'_>) -> bool {
        if !node.is_element() && !node.is_fragment() {
            return true;
        }
        if let Some(result) = self.skip_children.as_ref().and_then(|f| f(node)) {
            return result;
        }
        is_embedded_content(node.name())
    }

    fn skip_self(&self, node: NodeRef<'_>) -> bool {
        if !node.is_text() && !node.is_element() {
            return true;
        }
        if let Some(result) = self.skip_self.as_ref().and_then(|f| f(node)) {
            return result;
        }
        is_inline_formatting(node.name())
    }
}

impl fmt::Debug for DiffOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffOptions")
            .field("added_class", &self.added_class)
            .field("modified_class", &self.modified_class)
            .field("removed_class", &self.removed_class)
            .field("skip_modified", &self.skip_modified)
            .field("skip_children", &self.skip_children.is_some())
            .field("skip_self", &self.skip_self.is_some())
            .finish_non_exhaustive()
    }
}

/// Elements whose content is not diffed.
fn is_embedded_content(tag: &str) -> bool {
    matches!(tag, "img" | "video" | "iframe" | "object" | "svg")
}

/// Inline elements that are transparent to the diff.
fn is_inline_formatting(tag: &str) -> bool {
    matches!(
        tag,
        "bdo"
            | "bdi"
            | "q"
            | "cite"
            | "code"
            | "data"
            | "time"
            | "var"
            | "dfn"
            | "abbr"
            | "strong"
            | "em"
            | "big"
            | "small"
            | "mark"
            | "sub"
            | "sup"
            | "samp"
            | "kbd"
            | "b"
            | "i"
            | "s"
            | "u"
            | "span"
    )
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<DiffOptions>();
    assert_sync::<DiffOptions>();
};
