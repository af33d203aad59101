//! Flattening a tree into text for the text diff.
//!
//! Text nodes contribute their text. Every other visited node contributes
//! one node marker derived from its name, so the text diff sees structure
//! as single, atomic characters.

use core::hash::{Hash, Hasher};

use rapidhash::RapidHasher;
use redline_text::node_marker;

use crate::dom::NodeRef;
use crate::iter::{DomIterator, Traversal};

/// Name used when matching and flattening nodes: header cells count as
/// ordinary cells.
pub fn node_name_for_diff(name: &str) -> &str {
    if name == "th" { "td" } else { name }
}

/// The node marker standing for nodes called `name`.
pub fn char_for_node_name(name: &str) -> char {
    let mut hasher = RapidHasher::default();
    name.hash(&mut hasher);
    node_marker(hasher.finish())
}

/// Length of `node` in the flattened text, in bytes.
pub fn unit_len(node: NodeRef<'_>) -> usize {
    match node.text() {
        Some(text) if node.is_text() => text.len(),
        _ => char_for_node_name(node_name_for_diff(node.name())).len_utf8(),
    }
}

/// Flatten the subtree of `root` as seen through `traversal`.
pub fn serialize<T: Traversal>(root: NodeRef<'_>, traversal: T) -> String {
    DomIterator::new(root, traversal).fold(String::new(), |mut text, node| {
        match node.text() {
            Some(data) if node.is_text() => text.push_str(data),
            _ => text.push(char_for_node_name(node_name_for_diff(node.name()))),
        }
        text
    })
}
