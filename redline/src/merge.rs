//! The merge engine.
//!
//! Both input trees are flattened into text and diffed. The engine then
//! walks the diff segments and the two trees in lockstep, each cursor
//! keeping a byte offset into its current unit (a text node's text, or the
//! node marker of any other node). Every step consumes the longest chunk
//! all involved cursors can agree on:
//!
//! - deleted text comes from the old tree and goes under the *removed*
//!   branch of the old output cursor,
//! - inserted text comes from the new tree and goes under the *added*
//!   branch of the new output cursor,
//! - equal text is shared: one output node is appended once and both
//!   output cursors move into it, unless the two source nodes turn out to
//!   be different things at the same position.
//!
//! The output is one tree; the old and new output cursors are just two
//! positions in it. While no branch is open they point at the same node.

use indexmap::{IndexMap, IndexSet};
use indextree::NodeId;
use rapidhash::RapidHashMap;
use redline_text::{Op, Segment};
use smallvec::SmallVec;

use crate::dom::{Document, NodeRef, nodes_equal};
use crate::error::{DiffError, Result};
use crate::iter::{DomIterator, Traversal};
use crate::options::DiffOptions;
use crate::serialize::{node_name_for_diff, serialize, unit_len};
use crate::{debug, trace};

/// Formatting ancestors of a text node, outermost first.
pub(crate) type Formatting<'a> = SmallVec<[NodeRef<'a>; 4]>;

/// A table that both sides share, with the tables it came from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TablePair<'a> {
    pub output: NodeId,
    pub old: NodeRef<'a>,
    pub new: NodeRef<'a>,
}

/// The source rows of a shared output row.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RowPair<'a> {
    pub old: NodeRef<'a>,
    pub new: NodeRef<'a>,
}

/// Everything the merge records about the output tree for the later
/// passes. Lives for one diff invocation.
#[derive(Debug, Default)]
pub(crate) struct Marks<'a> {
    pub removed: IndexSet<NodeId>,
    pub added: IndexSet<NodeId>,
    pub modified: IndexSet<NodeId>,
    pub formatting: IndexMap<NodeId, Formatting<'a>>,
    pub tables: Vec<TablePair<'a>>,
    pub rows: RapidHashMap<NodeId, RowPair<'a>>,
}

impl Marks<'_> {
    /// Drop every mark recorded for `id`.
    pub fn forget(&mut self, id: NodeId) {
        self.removed.shift_remove(&id);
        self.added.shift_remove(&id);
        self.modified.shift_remove(&id);
        self.formatting.shift_remove(&id);
    }
}

/// One tree being walked, plus where its content goes in the output.
struct Side<'a> {
    name: &'static str,
    root: NodeRef<'a>,
    options: &'a DiffOptions,
    nodes: DomIterator<'a, &'a DiffOptions>,
    /// Current source node, `None` once the tree is exhausted.
    node: Option<NodeRef<'a>>,
    /// Bytes of the current node already consumed.
    offset: usize,
    /// Output node content of this side is appended to.
    output: NodeId,
    /// Depth of `output` below the output root.
    depth: usize,
    /// Root of the open removed (old side) or added (new side) branch.
    branch: Option<NodeId>,
}

impl<'a> Side<'a> {
    fn new(
        name: &'static str,
        root: NodeRef<'a>,
        options: &'a DiffOptions,
        output_root: NodeId,
    ) -> Self {
        let mut side = Self {
            name,
            root,
            options,
            nodes: DomIterator::new(root, options),
            node: None,
            offset: 0,
            output: output_root,
            depth: 0,
            branch: None,
        };
        side.advance();
        side
    }

    /// Move to the next node that has a non-empty flattened form.
    fn advance(&mut self) {
        self.node = self
            .nodes
            .find(|node| !matches!(node.text(), Some("") if node.is_text()));
        self.offset = 0;
    }

    fn current(&self) -> Result<NodeRef<'a>> {
        self.node.ok_or(DiffError::TreeExhausted { side: self.name })
    }

    fn remaining(&self, node: NodeRef<'a>) -> usize {
        unit_len(node) - self.offset
    }

    fn step(&mut self, len: usize) -> Result<()> {
        let unit = unit_len(self.current()?);
        self.offset += len;
        if self.offset == unit {
            self.advance();
            Ok(())
        } else if self.offset > unit {
            Err(DiffError::OffsetOverrun {
                cursor: self.name,
                offset: self.offset,
                len: unit,
            })
        } else {
            Ok(())
        }
    }

    /// Number of visible ancestors of `node`, i.e. how deep its output
    /// counterpart sits below the output root.
    fn depth_of(&self, node: NodeRef<'a>) -> usize {
        node.ancestors_within(self.root)
            .filter(|&ancestor| !self.options.skip_self(ancestor))
            .count()
    }

    fn formatting_of(&self, node: NodeRef<'a>) -> Formatting<'a> {
        let mut formatting: Formatting<'a> = node
            .ancestors_within(self.root)
            .filter(|&ancestor| self.options.is_formatting(ancestor))
            .collect();
        formatting.reverse();
        formatting
    }

    /// Close output nodes until the output cursor sits at the depth of the
    /// current source node. Closing the root of the open branch closes the
    /// branch.
    fn prepare(&mut self, out: &Document) -> Result<()> {
        let depth = self.depth_of(self.current()?);
        while self.depth > depth {
            let parent = out.parent(self.output).ok_or(DiffError::DepthMismatch {
                side: self.name,
                from: self.depth,
                to: depth,
            })?;
            if self.branch == Some(self.output) {
                self.branch = None;
            }
            self.output = parent;
            self.depth -= 1;
        }
        if self.depth != depth {
            return Err(DiffError::DepthMismatch {
                side: self.name,
                from: self.depth,
                to: depth,
            });
        }
        Ok(())
    }

    fn enter(&mut self, id: NodeId) {
        self.output = id;
        self.depth += 1;
    }
}

struct Merge<'a> {
    options: &'a DiffOptions,
    old: Side<'a>,
    new: Side<'a>,
    marks: Marks<'a>,
}

/// Merges the trees under `old_root` and `new_root` into `output_root`.
///
/// Returns what the later passes need to mark the output up.
pub(crate) fn merge<'a>(
    out: &mut Document,
    output_root: NodeId,
    old_root: NodeRef<'a>,
    new_root: NodeRef<'a>,
    options: &'a DiffOptions,
) -> Result<Marks<'a>> {
    let old_text = serialize(old_root, options);
    let new_text = serialize(new_root, options);
    let diff = options.diff_text(&old_text, &new_text);
    debug!(
        old_len = old_text.len(),
        new_len = new_text.len(),
        segments = diff.len(),
        "merging trees"
    );

    let mut merge = Merge {
        options,
        old: Side::new("old", old_root, options, output_root),
        new: Side::new("new", new_root, options, output_root),
        marks: Marks::default(),
    };

    for segment in diff.iter().filter(|segment| !segment.is_empty()) {
        merge.segment(out, segment)?;
    }

    for side in [&merge.old, &merge.new] {
        if side.node.is_some() {
            return Err(DiffError::DiffExhausted { side: side.name });
        }
    }

    Ok(merge.marks)
}

/// The next `len` bytes of `text` starting at `offset`.
fn chunk(text: &str, offset: usize, len: usize) -> Result<&str> {
    text.get(offset..offset + len)
        .ok_or(DiffError::NotCharBoundary {
            offset: offset + len,
        })
}

/// Output node for a chunk of `source`: a text node holding the chunk, or
/// a shallow clone of any other node.
fn materialize(out: &mut Document, source: NodeRef<'_>, text: &str) -> NodeId {
    if source.is_text() {
        out.create_text(text)
    } else {
        out.clone_shallow_from(source)
    }
}

impl<'a> Merge<'a> {
    fn segment(&mut self, out: &mut Document, segment: &Segment) -> Result<()> {
        trace!(op = ?segment.op, text = ?segment.text, "segment");

        let text = segment.text.as_str();
        let mut offset = 0;
        while offset < text.len() {
            let len = match segment.op {
                Op::Delete => {
                    let node = self.old.current()?;
                    self.old.prepare(out)?;
                    let len = (text.len() - offset).min(self.old.remaining(node));
                    let id = materialize(out, node, chunk(text, offset, len)?);
                    self.append_old(out, id, node);
                    self.old.step(len)?;
                    len
                }
                Op::Insert => {
                    let node = self.new.current()?;
                    self.new.prepare(out)?;
                    let len = (text.len() - offset).min(self.new.remaining(node));
                    let id = materialize(out, node, chunk(text, offset, len)?);
                    self.append_new(out, id, node);
                    self.new.step(len)?;
                    len
                }
                Op::Equal => {
                    let old_node = self.old.current()?;
                    let new_node = self.new.current()?;
                    self.old.prepare(out)?;
                    self.new.prepare(out)?;
                    let len = (text.len() - offset)
                        .min(self.old.remaining(old_node))
                        .min(self.new.remaining(new_node));
                    let piece = chunk(text, offset, len)?;

                    if self.old.output == self.new.output && self.mergeable(old_node, new_node) {
                        let id = materialize(out, new_node, piece);
                        self.append_common(out, id, old_node, new_node)?;
                    } else {
                        trace!(?old_node, ?new_node, "same position, different nodes");
                        let old_id = materialize(out, old_node, piece);
                        self.append_old(out, old_id, old_node);
                        let new_id = materialize(out, new_node, piece);
                        self.append_new(out, new_id, new_node);
                    }

                    self.old.step(len)?;
                    self.new.step(len)?;
                    len
                }
            };
            offset += len;
        }
        Ok(())
    }

    /// Whether two nodes found at the same position can share one output
    /// node.
    fn mergeable(&self, old: NodeRef<'a>, new: NodeRef<'a>) -> bool {
        (old.is_text() && new.is_text())
            || (node_name_for_diff(old.name()) == node_name_for_diff(new.name())
                && !self.options.skip_children(old)
                && !self.options.skip_children(new))
            || nodes_equal(old, new, true)
    }

    fn append_common(
        &mut self,
        out: &mut Document,
        id: NodeId,
        old: NodeRef<'a>,
        new: NodeRef<'a>,
    ) -> Result<()> {
        if self.old.output != self.new.output
            || self.old.branch.is_some()
            || self.new.branch.is_some()
        {
            return Err(DiffError::DivergentCommonAppend);
        }

        if new.is_text() {
            let old_formatting = self.old.formatting_of(old);
            let new_formatting = self.new.formatting_of(new);
            let reformatted = old_formatting.len() != new_formatting.len()
                || old_formatting
                    .iter()
                    .zip(&new_formatting)
                    .any(|(&a, &b)| !nodes_equal(a, b, false));
            if reformatted {
                self.marks.modified.insert(id);
            }
            self.marks.formatting.insert(id, new_formatting);
        } else {
            if !nodes_equal(old, new, false) {
                self.marks.modified.insert(id);
            }
            if old.is_tag("table") {
                self.marks.tables.push(TablePair {
                    output: id,
                    old,
                    new,
                });
            } else if old.is_tag("tr") {
                self.marks.rows.insert(id, RowPair { old, new });
            }
        }

        out.append(self.new.output, id);
        self.old.enter(id);
        self.new.enter(id);
        Ok(())
    }

    fn append_old(&mut self, out: &mut Document, id: NodeId, source: NodeRef<'a>) {
        if self.old.branch.is_none() {
            self.old.branch = Some(id);
            self.marks.removed.insert(id);
        }
        if source.is_text() {
            let formatting = self.old.formatting_of(source);
            self.marks.formatting.insert(id, formatting);
        }
        out.append(self.old.output, id);
        self.old.enter(id);
    }

    fn append_new(&mut self, out: &mut Document, id: NodeId, source: NodeRef<'a>) {
        if self.new.branch.is_none() {
            self.new.branch = Some(id);
            self.marks.added.insert(id);
        }
        if source.is_text() {
            let formatting = self.new.formatting_of(source);
            self.marks.formatting.insert(id, formatting);
        }
        out.append(self.new.output, id);
        self.new.enter(id);
    }
}
