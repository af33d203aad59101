//! Node markers: single code points that stand in for whole tree nodes
//! when a document is flattened into text.
//!
//! Markers are drawn from the Private Use Area of the Basic Multilingual
//! Plane, which ordinary document text does not use. The diff clean-up
//! passes treat them as atomic structural boundaries.

use core::ops::RangeInclusive;

/// The code points reserved for node markers (U+E000..=U+F8FF).
pub const NODE_MARKERS: RangeInclusive<char> = '\u{E000}'..='\u{F8FF}';

/// Number of distinct node markers.
pub const NODE_MARKER_COUNT: u32 = 0xF8FF - 0xE000 + 1;

/// Returns `true` if `c` is a node marker.
#[inline]
pub fn is_node_marker(c: char) -> bool {
    NODE_MARKERS.contains(&c)
}

/// Returns `true` if `text` contains at least one node marker.
pub fn contains_node_marker(text: &str) -> bool {
    text.chars().any(is_node_marker)
}

/// Maps an arbitrary index onto the marker range.
pub fn node_marker(index: u64) -> char {
    // The modulo keeps the value inside the range, so the conversion cannot fail.
    let offset = (index % u64::from(NODE_MARKER_COUNT)) as u32;
    char::from_u32(*NODE_MARKERS.start() as u32 + offset).unwrap_or(*NODE_MARKERS.start())
}
