//! Visual diffing of document trees.
//!
//! redline takes two versions of a document tree and produces one merged
//! tree that renders like "track changes":
//! - **Shared content** appears once
//! - **Removed content** is wrapped in `<del class="vdd-removed">` (or gets
//!   the class, for elements)
//! - **Added content** is wrapped in `<ins class="vdd-added">`
//! - **Reformatted text** (same text, different inline formatting or
//!   attributes) is wrapped in `<ins class="vdd-modified">`
//!
//! Both trees are flattened into text, where every non-text node becomes a
//! single private-use character, and diffed with [`redline_text`]. The
//! merge engine then rebuilds a tree around that diff, tables are
//! realigned column by column, and markers and inline formatting are
//! applied last.
//!
//! # Example
//!
//! ```rust
//! use redline::{DiffOptions, Document, diff_documents};
//!
//! let old = Document::fragment(|b| {
//!     b.element("p", |b| {
//!         b.text("Hello world");
//!     });
//! });
//! let new = Document::fragment(|b| {
//!     b.element("p", |b| {
//!         b.text("Hello brave world");
//!     });
//! });
//!
//! let diff = diff_documents(&old, &new, &DiffOptions::default()).unwrap();
//! assert_eq!(
//!     diff.to_html(),
//!     r#"<p>Hello <ins class="vdd-added">brave </ins>world</p>"#
//! );
//! ```

mod tracing_macros;

pub mod dom;
mod error;
pub mod iter;
mod markup;
mod merge;
mod options;
pub mod serialize;
mod stem;
mod table;

pub use indextree;
pub use redline_text::{Op, Segment};

pub use dom::{Builder, Document, NodeData, NodeKind, NodeRef, nodes_equal};
pub use error::{DiffError, Result};
pub use iter::{DomIterator, Everything, Rows, Traversal};
pub use markup::{ADDED_TAG, REMOVED_TAG};
pub use options::{DiffOptions, DiffTextFn, NodePredicate};
pub use stem::Stem;

use indextree::NodeId;

/// Diffs the trees under `old` and `new` and returns the merged tree as a
/// fragment document.
///
/// The input trees are only read. The result either is complete or the
/// call fails with a [`DiffError`], which signals a bug (or a custom text
/// diff that does not describe the inputs).
pub fn visual_dom_diff(
    old: NodeRef<'_>,
    new: NodeRef<'_>,
    options: &DiffOptions,
) -> Result<Document> {
    let mut out = Document::new();
    let root = out.root;
    run(&mut out, root, old, new, options)?;
    Ok(out)
}

/// Diffs two documents from their roots. See [`visual_dom_diff`].
pub fn diff_documents(old: &Document, new: &Document, options: &DiffOptions) -> Result<Document> {
    visual_dom_diff(old.root_ref(), new.root_ref(), options)
}

/// Runs the whole pipeline and appends the result to `parent` in `out`.
pub(crate) fn diff_into<'a>(
    out: &mut Document,
    parent: NodeId,
    old: NodeRef<'a>,
    new: NodeRef<'a>,
    options: &'a DiffOptions,
) -> Result<()> {
    let fragment = out.create_fragment();
    run(out, fragment, old, new, options)?;
    let children: Vec<NodeId> = out.children(fragment).collect();
    for child in children {
        out.append(parent, child);
    }
    out.remove_subtree(fragment);
    Ok(())
}

fn run<'a>(
    out: &mut Document,
    output_root: NodeId,
    old: NodeRef<'a>,
    new: NodeRef<'a>,
    options: &'a DiffOptions,
) -> Result<()> {
    let mut marks = merge::merge(out, output_root, old, new, options)?;
    markup::move_removed_before_added(out, &marks);
    table::realign_tables(out, output_root, &mut marks, options)?;
    markup::mark_up_changes(out, &marks, options);
    markup::apply_formatting(out, &marks);
    debug!(
        removed = marks.removed.len(),
        added = marks.added.len(),
        modified = marks.modified.len(),
        "diff done"
    );
    Ok(())
}
