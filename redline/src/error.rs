//! Errors raised by the diff engine.
//!
//! Every variant is an internal invariant violation: the engine either
//! returns a complete tree or one of these. Inputs the engine cannot diff
//! nicely (odd tables, misaligned rows) are handled by fallbacks instead.

use thiserror::Error;

/// An internal invariant of the diff engine did not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    /// The diff still had segments but a tree had no nodes left.
    #[error("unreachable state: the {side} tree ran out of nodes before the diff ended")]
    TreeExhausted {
        /// `"old"` or `"new"`.
        side: &'static str,
    },

    /// The diff ended but a tree still had nodes.
    #[error("unreachable state: the diff ended before the {side} tree was fully visited")]
    DiffExhausted {
        /// `"old"` or `"new"`.
        side: &'static str,
    },

    /// A cursor moved past the end of its current unit.
    #[error("unreachable state: {cursor} cursor moved to offset {offset} past length {len}")]
    OffsetOverrun {
        /// Which cursor overran.
        cursor: &'static str,
        /// Offset after the step.
        offset: usize,
        /// Length of the unit.
        len: usize,
    },

    /// The output cursor could not be moved to the depth of the source node.
    #[error("unreachable state: cannot move the {side} output from depth {from} to depth {to}")]
    DepthMismatch {
        /// `"old"` or `"new"`.
        side: &'static str,
        /// Output depth when adjustment stopped.
        from: usize,
        /// Depth of the source node.
        to: usize,
    },

    /// A shared node was appended while the sides pointed at different
    /// output nodes, or while a removed/added branch was open.
    #[error("unreachable state: shared node appended while the sides diverge")]
    DivergentCommonAppend,

    /// A chunk boundary fell inside a UTF-8 character.
    #[error("unreachable state: chunk boundary at byte {offset} is not a char boundary")]
    NotCharBoundary {
        /// Offending byte offset into the segment.
        offset: usize,
    },

    /// A table row was rebuilt but nothing recorded where it came from.
    #[error("unreachable state: no source rows recorded for a table row")]
    MissingRowPair,
}

/// Convenience alias for results produced by the diff engine.
pub type Result<T, E = DiffError> = core::result::Result<T, E>;
