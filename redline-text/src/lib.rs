//! # redline-text
//!
//! Character diffing for flattened document trees.
//!
//! A document tree is flattened into a string where text nodes contribute
//! their text and every other node contributes one *node marker*, a code
//! point from the Private Use Area (see [`markers`]). This crate diffs two
//! such strings and cleans the result up so that it reads well to a human
//! while keeping node markers intact:
//!
//! 1. a character-level Myers diff (via [`similar`]),
//! 2. merge clean-up: join runs, factor out shared affixes,
//! 3. semantic clean-up: fold tiny equalities into the surrounding edits
//!    (never equalities holding a node marker), slide edits to word
//!    boundaries, extract overlaps,
//! 4. node-marker clean-up: move a node marker ending both an equality and
//!    the following edit to the front of the edit.
//!
//! ```
//! use redline_text::{Op, Segment, diff_text};
//!
//! let diff = diff_text("Hello world", "Hello brave world");
//! assert_eq!(
//!     diff,
//!     vec![
//!         Segment::new(Op::Equal, "Hello "),
//!         Segment::new(Op::Insert, "brave "),
//!         Segment::new(Op::Equal, "world"),
//!     ]
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]

mod tracing_macros;

pub mod cleanup;
pub mod markers;

use similar::{Algorithm, ChangeTag, TextDiff};

pub use cleanup::{cleanup_merge, cleanup_node_markers, cleanup_semantic};
pub use markers::{NODE_MARKERS, contains_node_marker, is_node_marker, node_marker};

/// What a [`Segment`] does to the old string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Text present in both strings.
    Equal,
    /// Text only present in the new string.
    Insert,
    /// Text only present in the old string.
    Delete,
}

/// One run of a diff.
///
/// Concatenating the `Equal` and `Delete` segments of a diff gives the old
/// string back, concatenating the `Equal` and `Insert` segments gives the
/// new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    /// What happened to `text`.
    pub op: Op,
    /// The affected text.
    pub text: String,
}

impl Segment {
    /// Create a segment.
    pub fn new(op: Op, text: impl Into<String>) -> Self {
        Self {
            op,
            text: text.into(),
        }
    }

    /// Create an `Equal` segment.
    pub fn equal(text: impl Into<String>) -> Self {
        Self::new(Op::Equal, text)
    }

    /// Create an `Insert` segment.
    pub fn insert(text: impl Into<String>) -> Self {
        Self::new(Op::Insert, text)
    }

    /// Create a `Delete` segment.
    pub fn delete(text: impl Into<String>) -> Self {
        Self::new(Op::Delete, text)
    }

    /// Length of the segment text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the segment carries no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl From<ChangeTag> for Op {
    fn from(tag: ChangeTag) -> Self {
        match tag {
            ChangeTag::Equal => Op::Equal,
            ChangeTag::Insert => Op::Insert,
            ChangeTag::Delete => Op::Delete,
        }
    }
}

/// Raw character-level diff, with consecutive changes of the same kind
/// coalesced. No clean-up is applied.
pub fn diff_chars(old: &str, new: &str) -> Vec<Segment> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_chars(old, new);

    let mut segments: Vec<Segment> = Vec::new();
    for change in diff.iter_all_changes() {
        let op = Op::from(change.tag());
        match segments.last_mut() {
            Some(last) if last.op == op => last.text.push_str(change.value()),
            _ => segments.push(Segment::new(op, change.value())),
        }
    }
    segments
}

/// Diffs `old` against `new` and cleans the result up for display.
///
/// The returned segments are never empty.
pub fn diff_text(old: &str, new: &str) -> Vec<Segment> {
    let mut segments = diff_chars(old, new);
    trace!(raw = segments.len(), "character diff done");

    cleanup_merge(&mut segments);
    cleanup_semantic(&mut segments);
    cleanup_node_markers(&mut segments);
    segments.retain(|segment| !segment.is_empty());

    debug!(segments = segments.len(), "text diff done");
    segments
}
