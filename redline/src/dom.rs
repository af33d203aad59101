//! Arena-based DOM used for both diff inputs and the merged output.
//!
//! - **indextree Arena**: all nodes of a document live in one arena
//! - **NodeRef**: a `Copy` read-only handle (document + id), the only way
//!   the diff engine looks at its inputs
//! - **Cross-document cloning**: output nodes are shallow or deep clones of
//!   input nodes, never the input nodes themselves

use core::fmt;

use indexmap::IndexMap;
use indextree::{Arena, NodeId};

use crate::stem::Stem;

/// Node name used for container roots.
pub const FRAGMENT_NAME: &str = "#document-fragment";
/// Node name used for text nodes.
pub const TEXT_NAME: &str = "#text";
/// Node name used for comments.
pub const COMMENT_NAME: &str = "#comment";

/// Document = Arena + root
#[derive(Debug, Clone)]
pub struct Document {
    /// All nodes of the document, attached or not.
    pub arena: Arena<NodeData>,

    /// Root node, a fragment unless built otherwise.
    pub root: NodeId,
}

/// What goes in each arena slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub kind: NodeKind,
}

/// Node types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Container root without a tag
    Fragment,
    /// Element with tag and attributes
    Element(ElementData),
    /// Text content
    Text(Stem),
    /// Comment, never matched for content
    Comment(Stem),
}

/// Element data (tag + attributes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lower-case tag name
    pub tag: Stem,

    /// Attributes in insertion order. Equality ignores the order.
    pub attrs: IndexMap<Stem, Stem>,
}

impl ElementData {
    pub fn new(tag: impl Into<Stem>) -> Self {
        let tag: Stem = tag.into();
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: IndexMap::new(),
        }
    }

    /// Whether the space-separated `class` attribute contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attrs
            .get("class")
            .is_some_and(|value| value.split_ascii_whitespace().any(|token| token == class))
    }

    /// Add `class` to the `class` attribute unless it is already there.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        match self.attrs.get_mut("class") {
            Some(value) if !value.trim().is_empty() => {
                value.push_str(" ");
                value.push_str(class);
            }
            _ => {
                self.attrs.insert("class".into(), class.into());
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document whose root is a fragment.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NodeData {
            kind: NodeKind::Fragment,
        });
        Self { arena, root }
    }

    /// Create a fragment document and fill it with `build`.
    ///
    /// ```
    /// use redline::Document;
    ///
    /// let doc = Document::fragment(|b| {
    ///     b.element("p", |b| {
    ///         b.text("Hello ");
    ///         b.element("em", |b| {
    ///             b.text("world");
    ///         });
    ///     });
    /// });
    /// assert_eq!(doc.to_html(), "<p>Hello <em>world</em></p>");
    /// ```
    pub fn fragment(build: impl FnOnce(&mut Builder<'_>)) -> Self {
        let mut doc = Self::new();
        let root = doc.root;
        build(&mut Builder {
            doc: &mut doc,
            parent: root,
        });
        doc
    }

    /// Get immutable reference to node data
    pub fn get(&self, id: NodeId) -> &NodeData {
        self.arena[id].get()
    }

    /// Get mutable reference to node data
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.arena[id].get_mut()
    }

    /// Read-only handle to a node.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }

    /// Read-only handle to the root.
    pub fn root_ref(&self) -> NodeRef<'_> {
        self.node(self.root)
    }

    /// Iterate children of a node
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].previous_sibling()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].first_child()
    }

    /// Whether `id` is `ancestor` or one of its descendants.
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        !self.is_removed(id) && id.ancestors(&self.arena).any(|node| node == ancestor)
    }

    /// Whether `id` was removed from the arena. Its slot may since hold
    /// another node.
    pub fn is_removed(&self, id: NodeId) -> bool {
        id.is_removed(&self.arena)
    }

    fn new_node(&mut self, kind: NodeKind) -> NodeId {
        self.arena.new_node(NodeData { kind })
    }

    /// Create a detached fragment node.
    pub fn create_fragment(&mut self) -> NodeId {
        self.new_node(NodeKind::Fragment)
    }

    /// Create a detached element without attributes.
    pub fn create_element(&mut self, tag: impl Into<Stem>) -> NodeId {
        self.new_node(NodeKind::Element(ElementData::new(tag)))
    }

    /// Create a detached element with attributes.
    pub fn create_element_with<K, V>(
        &mut self,
        tag: impl Into<Stem>,
        attrs: impl IntoIterator<Item = (K, V)>,
    ) -> NodeId
    where
        K: Into<Stem>,
        V: Into<Stem>,
    {
        let mut elem = ElementData::new(tag);
        elem.attrs = attrs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.new_node(NodeKind::Element(elem))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<Stem>) -> NodeId {
        self.new_node(NodeKind::Text(text.into()))
    }

    /// Create a detached comment.
    pub fn create_comment(&mut self, text: impl Into<Stem>) -> NodeId {
        self.new_node(NodeKind::Comment(text.into()))
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        parent.append(child, &mut self.arena);
    }

    /// Insert `node` right before `sibling`, detaching it first.
    pub fn insert_before(&mut self, sibling: NodeId, node: NodeId) {
        sibling.insert_before(node, &mut self.arena);
    }

    /// Detach `id` (and its subtree) from its parent. The nodes stay in
    /// the arena.
    pub fn detach(&mut self, id: NodeId) {
        id.detach(&mut self.arena);
    }

    /// Remove `id` and its subtree from the arena.
    pub fn remove_subtree(&mut self, id: NodeId) {
        id.remove_subtree(&mut self.arena);
    }

    /// Remove every child of `id` from the arena.
    pub fn clear_children(&mut self, id: NodeId) {
        while let Some(child) = self.first_child(id) {
            self.remove_subtree(child);
        }
    }

    /// Copy `src` (tag and attributes, or text, no children) into this
    /// document as a detached node.
    pub fn clone_shallow_from(&mut self, src: NodeRef<'_>) -> NodeId {
        self.new_node(src.kind().clone())
    }

    /// Copy `src` and its whole subtree into this document as a detached
    /// node.
    pub fn clone_deep_from(&mut self, src: NodeRef<'_>) -> NodeId {
        let copy = self.clone_shallow_from(src);
        for child in src.children() {
            let child_copy = self.clone_deep_from(child);
            self.append(copy, child_copy);
        }
        copy
    }

    /// Add a class token to an element. Other nodes are left alone.
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let NodeKind::Element(elem) = &mut self.get_mut(id).kind {
            elem.add_class(class);
        }
    }

    /// Serialize the root's content to HTML.
    ///
    /// A fragment root is invisible, any other root is serialized with its
    /// own tags.
    pub fn to_html(&self) -> String {
        let mut output = String::new();
        self.serialize_node(&mut output, self.root);
        output
    }

    /// Serialize one node and its subtree to HTML.
    pub fn node_to_html(&self, id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_node(&mut output, id);
        output
    }

    fn serialize_node(&self, out: &mut String, node_id: NodeId) {
        match &self.get(node_id).kind {
            NodeKind::Fragment => {
                for child_id in node_id.children(&self.arena) {
                    self.serialize_node(out, child_id);
                }
            }
            NodeKind::Element(elem) => {
                self.serialize_element(out, node_id, elem);
            }
            NodeKind::Text(text) => {
                for c in text.chars() {
                    match c {
                        '&' => out.push_str("&amp;"),
                        '<' => out.push_str("&lt;"),
                        '>' => out.push_str("&gt;"),
                        _ => out.push(c),
                    }
                }
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(&text.replace("--", "- -"));
                out.push_str("-->");
            }
        }
    }

    fn serialize_element(&self, out: &mut String, node_id: NodeId, elem: &ElementData) {
        let tag = elem.tag.as_str();

        out.push('<');
        out.push_str(tag);

        for (name, value) in &elem.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            for c in value.chars() {
                match c {
                    '&' => out.push_str("&amp;"),
                    '"' => out.push_str("&quot;"),
                    '<' => out.push_str("&lt;"),
                    '>' => out.push_str("&gt;"),
                    _ => out.push(c),
                }
            }
            out.push('"');
        }

        out.push('>');
        if is_void_element(tag) {
            return;
        }

        for child_id in node_id.children(&self.arena) {
            self.serialize_node(out, child_id);
        }

        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

/// HTML5 void elements that never have closing tags
fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Read-only handle to a node of some [`Document`].
///
/// Two handles are equal when they point at the same node of the same
/// document.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn new(doc: &'a Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    pub fn id(self) -> NodeId {
        self.id
    }

    pub fn document(self) -> &'a Document {
        self.doc
    }

    pub fn kind(self) -> &'a NodeKind {
        &self.doc.get(self.id).kind
    }

    pub fn element(self) -> Option<&'a ElementData> {
        match self.kind() {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn is_text(self) -> bool {
        matches!(self.kind(), NodeKind::Text(_))
    }

    pub fn is_element(self) -> bool {
        matches!(self.kind(), NodeKind::Element(_))
    }

    pub fn is_fragment(self) -> bool {
        matches!(self.kind(), NodeKind::Fragment)
    }

    pub fn is_comment(self) -> bool {
        matches!(self.kind(), NodeKind::Comment(_))
    }

    /// Tag name for elements, `#text`, `#comment` or `#document-fragment`
    /// otherwise.
    pub fn name(self) -> &'a str {
        match self.kind() {
            NodeKind::Fragment => FRAGMENT_NAME,
            NodeKind::Element(elem) => elem.tag.as_str(),
            NodeKind::Text(_) => TEXT_NAME,
            NodeKind::Comment(_) => COMMENT_NAME,
        }
    }

    /// Whether this is an element with the given tag.
    pub fn is_tag(self, tag: &str) -> bool {
        self.element().is_some_and(|elem| elem.tag == tag)
    }

    /// Text of text and comment nodes.
    pub fn text(self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::Text(text) | NodeKind::Comment(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn attr(self, name: &str) -> Option<&'a str> {
        self.element()
            .and_then(|elem| elem.attrs.get(name))
            .map(Stem::as_str)
    }

    pub fn has_class(self, class: &str) -> bool {
        self.element().is_some_and(|elem| elem.has_class(class))
    }

    fn wrap(self, id: Option<NodeId>) -> Option<NodeRef<'a>> {
        id.map(|id| NodeRef { doc: self.doc, id })
    }

    pub fn parent(self) -> Option<NodeRef<'a>> {
        self.wrap(self.doc.arena[self.id].parent())
    }

    pub fn first_child(self) -> Option<NodeRef<'a>> {
        self.wrap(self.doc.arena[self.id].first_child())
    }

    pub fn next_sibling(self) -> Option<NodeRef<'a>> {
        self.wrap(self.doc.arena[self.id].next_sibling())
    }

    pub fn previous_sibling(self) -> Option<NodeRef<'a>> {
        self.wrap(self.doc.arena[self.id].previous_sibling())
    }

    pub fn children(self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        self.id
            .children(&doc.arena)
            .map(move |id| NodeRef { doc, id })
    }

    pub fn child_count(self) -> usize {
        self.id.children(&self.doc.arena).count()
    }

    /// Ancestors of this node, innermost first, up to and including
    /// `root`. Empty when this node is `root`.
    pub fn ancestors_within(self, root: NodeRef<'a>) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        let stop = root.id;
        let start = if self == root { None } else { Some(self.id) };
        start
            .into_iter()
            .flat_map(move |id| id.ancestors(&doc.arena).skip(1))
            .scan(false, move |done, id| {
                if *done {
                    return None;
                }
                *done = id == stop;
                Some(NodeRef { doc, id })
            })
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            NodeKind::Text(text) => write!(f, "#text({:?})", text.as_str()),
            _ => write!(f, "<{}>@{:?}", self.name(), self.id),
        }
    }
}

/// Compares two nodes, possibly from different documents.
///
/// Nodes are equal when they have the same kind and name, the same text
/// (text and comments) or the same attributes regardless of their order
/// (elements). With `deep`, their children must be pairwise equal too.
pub fn nodes_equal(a: NodeRef<'_>, b: NodeRef<'_>, deep: bool) -> bool {
    if a == b {
        return true;
    }

    let same_self = match (a.kind(), b.kind()) {
        (NodeKind::Fragment, NodeKind::Fragment) => true,
        (NodeKind::Text(x), NodeKind::Text(y)) | (NodeKind::Comment(x), NodeKind::Comment(y)) => {
            x == y
        }
        (NodeKind::Element(x), NodeKind::Element(y)) => {
            x.tag == y.tag
                && x.attrs.len() == y.attrs.len()
                && x
                    .attrs
                    .iter()
                    .all(|(name, value)| y.attrs.get(name) == Some(value))
        }
        _ => false,
    };

    if !same_self {
        return false;
    }
    if !deep {
        return true;
    }

    let mut a_children = a.children();
    let mut b_children = b.children();
    loop {
        match (a_children.next(), b_children.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if nodes_equal(x, y, true) => {}
            _ => return false,
        }
    }
}

/// Appends nodes under a parent. See [`Document::fragment`].
pub struct Builder<'d> {
    doc: &'d mut Document,
    parent: NodeId,
}

impl Builder<'_> {
    /// Append an element and fill it with `children`.
    pub fn element(&mut self, tag: &str, children: impl FnOnce(&mut Builder<'_>)) -> &mut Self {
        let id = self.doc.create_element(tag);
        self.push(id, children)
    }

    /// Append an element with attributes and fill it with `children`.
    pub fn element_with(
        &mut self,
        tag: &str,
        attrs: &[(&str, &str)],
        children: impl FnOnce(&mut Builder<'_>),
    ) -> &mut Self {
        let id = self.doc.create_element_with(tag, attrs.iter().copied());
        self.push(id, children)
    }

    /// Append a childless element.
    pub fn empty(&mut self, tag: &str) -> &mut Self {
        self.element(tag, |_| {})
    }

    pub fn text(&mut self, text: &str) -> &mut Self {
        let id = self.doc.create_text(text);
        self.doc.append(self.parent, id);
        self
    }

    pub fn comment(&mut self, text: &str) -> &mut Self {
        let id = self.doc.create_comment(text);
        self.doc.append(self.parent, id);
        self
    }

    fn push(&mut self, id: NodeId, children: impl FnOnce(&mut Builder<'_>)) -> &mut Self {
        self.doc.append(self.parent, id);
        children(&mut Builder {
            doc: &mut *self.doc,
            parent: id,
        });
        self
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<Document>();
    assert_sync::<Document>();
};
