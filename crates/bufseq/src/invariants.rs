//! Debug assertion macros for buffer and ring invariants.
//!
//! Active only in debug builds (`debug_assert!`), so release builds pay
//! nothing. Used by `IoBuf` and the channel's tri-region ring.

/// Assert the tri-region ordering of the ring's linear positions.
///
/// Invariant: `head <= mid <= tail` (readable precedes written precedes
/// the write end).
macro_rules! debug_assert_region_order {
    ($head:expr, $mid:expr, $tail:expr) => {
        debug_assert!(
            $head <= $mid && $mid <= $tail,
            "region order violated: head {} mid {} tail {}",
            $head,
            $mid,
            $tail
        )
    };
}

/// Assert that the live element count never exceeds capacity.
///
/// Invariant: `tail - head <= capacity`.
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "bounded count violated: {} live elements exceed capacity {}",
            $count,
            $capacity
        )
    };
}

/// Assert that a linear position only moves forward.
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "monotonic progress violated: {} decreased from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

/// Assert that a cursor index stays within a buffer's populated range.
macro_rules! debug_assert_cursor_in_range {
    ($pos:expr, $len:expr) => {
        debug_assert!(
            $pos <= $len,
            "cursor position {} beyond buffer length {}",
            $pos,
            $len
        )
    };
}

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_cursor_in_range;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_region_order;
