use thiserror::Error;

use crate::kind::{CodeUnitKind, PrimKind};

/// Why a cursor was rejected by a validating operation.
///
/// The panicking entry points (`commit`, `restore`) surface these as
/// contract violations; the `try_` twins return them for callers that
/// prefer to propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CursorError {
    /// The cursor was minted by a different buffer.
    #[error("cursor belongs to a different buffer")]
    ForeignCursor,
    /// The cursor's position lies outside the range the operation accepts.
    #[error("cursor position {pos} outside valid range [{lo}, {hi}]")]
    OutOfRange {
        /// The rejected position.
        pos: u64,
        /// Lowest acceptable position.
        lo: u64,
        /// Highest acceptable position.
        hi: u64,
    },
}

/// Why a builder could not be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The requested code-unit kind is not backed by the element type.
    #[error("code unit kind {kind:?} is not backed by primitive {expected:?}")]
    KindMismatch {
        /// The kind that was requested.
        kind: CodeUnitKind,
        /// The primitive the element type actually backs.
        expected: PrimKind,
    },
}
