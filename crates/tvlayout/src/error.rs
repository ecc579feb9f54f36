//! Error types for tvlayout.
//!
//! Every variant is a contract violation by the caller: the algebra never
//! retries, truncates or substitutes a default.

use thiserror::Error;

use crate::IntTuple;

/// Result type alias using tvlayout's error.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors raised by the layout algebra and the TV mapper.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum LayoutError {
    /// Two tuples that must share nesting structure do not.
    #[error("{what} {rhs} is not congruent with {lhs}")]
    Incongruent {
        /// Which pair was being matched, e.g. "stride" or "coordinate".
        what: &'static str,
        /// The tuple that defines the structure (usually the shape).
        lhs: IntTuple,
        /// The tuple that failed to match it.
        rhs: IntTuple,
    },

    /// Coordinate spaces of different sizes in `crd2crd`.
    #[error("cannot reinterpret a coordinate of size-{src} space in size-{dst} space")]
    SizeMismatch {
        /// Product of the source shape.
        src: i64,
        /// Product of the destination shape.
        dst: i64,
    },

    /// A TV layout maps two (thread, value) pairs onto the same element.
    #[error(
        "element {index} is produced by both (thr {}, val {}) and (thr {}, val {})",
        first.0, first.1, second.0, second.1
    )]
    DuplicateMapping {
        /// The colliding element index.
        index: i64,
        /// `(thr_idx, val_idx)` of the earlier entry.
        first: (i64, i64),
        /// `(thr_idx, val_idx)` of the later entry.
        second: (i64, i64),
    },

    /// The operation only understands a fixed number of modes.
    #[error("{op} is not supported for rank-{rank} layouts")]
    UnsupportedRank {
        /// Operation name.
        op: &'static str,
        /// Rank that was given.
        rank: usize,
    },

    /// Mode index past the end of a layout.
    #[error("mode {mode} out of range for rank-{rank} layout")]
    ModeOutOfRange {
        /// Requested mode.
        mode: usize,
        /// Rank of the layout.
        rank: usize,
    },

    /// A shape leaf that cannot be used as a radix.
    #[error("shape extent {extent} must be positive")]
    InvalidExtent {
        /// The offending extent.
        extent: i64,
    },

    /// An index, extent or stride left the `i64` range.
    #[error("i64 overflow in {op}")]
    Overflow {
        /// Computation that overflowed.
        op: &'static str,
    },

    /// Malformed textual tuple or layout.
    #[error("cannot parse {input:?}: {reason}")]
    Parse {
        /// Input text.
        input: String,
        /// What went wrong.
        reason: String,
    },
}

impl LayoutError {
    pub(crate) fn incongruent(what: &'static str, lhs: &IntTuple, rhs: &IntTuple) -> Self {
        LayoutError::Incongruent {
            what,
            lhs: lhs.clone(),
            rhs: rhs.clone(),
        }
    }

    pub(crate) fn overflow(op: &'static str) -> Self {
        LayoutError::Overflow { op }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::int;

    #[test]
    fn test_duplicate_message_names_both_pairs() {
        let err = LayoutError::DuplicateMapping {
            index: 3,
            first: (0, 1),
            second: (2, 0),
        };
        assert_eq!(
            err.to_string(),
            "element 3 is produced by both (thr 0, val 1) and (thr 2, val 0)"
        );
    }

    #[test]
    fn test_incongruent_message() {
        let err = LayoutError::incongruent("stride", &int!(2, int!(2, 2)), &int!(1, 2, 4));
        assert_eq!(err.to_string(), "stride (1,2,4) is not congruent with (2,(2,2))");
    }

    #[test]
    fn test_overflow_message() {
        assert_eq!(LayoutError::overflow("crd2idx").to_string(), "i64 overflow in crd2idx");
    }
}
