//! Typed storage back-ends.
//!
//! A [`Transport`] is a stateless capability that performs every read,
//! write, copy, grow, freeze, and release on behalf of a buffer. Buffers
//! never touch their storage directly; they hold a transport and pass the
//! storage to it. This keeps one buffer implementation working over
//! reference cells, packed primitives, and bit-packed booleans alike.
//!
//! Three families are provided:
//! - [`RefTransport`] -- nullable owning reference cells.
//! - [`ValueTransport`] -- packed primitive values, one cell per element.
//! - [`BitTransport`] -- booleans packed eight per byte, MSB-first.

mod bits;
mod refs;
mod value;

pub use bits::{BitStore, BitTransport, FrozenBits};
pub use refs::RefTransport;
pub use value::{Unit, ValueTransport};

/// Storage capability for one element family.
///
/// All operations are total with respect to their storage argument and keep
/// no state in the transport itself. Index preconditions are enforced with
/// assertions: handing a transport an out-of-range index is a bug in the
/// caller, not a recoverable condition. Growth is the only operation that
/// allocates.
pub trait Transport {
    /// The element type handed to and from callers.
    type Elem: Clone;
    /// Mutable storage: growable, truncatable.
    type Mut;
    /// Immutable storage produced by [`Transport::freeze`].
    type Imu;

    /// Returns a fresh, empty mutable storage.
    fn create_storage(&self) -> Self::Mut;

    /// Grows the storage to hold at least `want` elements, doubling so that
    /// repeated appends stay amortized O(1). Idempotent when already large
    /// enough. Returns the resulting capacity.
    fn ensure_capacity(&self, store: &mut Self::Mut, want: usize) -> usize;

    /// Current capacity in elements.
    fn capacity(&self, store: &Self::Mut) -> usize;

    /// Populated length of mutable storage.
    fn len(&self, store: &Self::Mut) -> usize;

    /// Returns true if the mutable storage holds no elements.
    fn is_empty(&self, store: &Self::Mut) -> bool {
        self.len(store) == 0
    }

    /// Populated length of immutable storage.
    fn frozen_len(&self, store: &Self::Imu) -> usize;

    /// Truncates or extends to `new_len`. Extension zero-initializes packed
    /// values and installs the null element in reference storage.
    fn set_len(&self, store: &mut Self::Mut, new_len: usize);

    /// Reads one element. `index` must be below the populated length.
    fn read(&self, store: &Self::Mut, index: usize) -> Self::Elem;

    /// Reads one element from immutable storage.
    fn read_frozen(&self, store: &Self::Imu, index: usize) -> Self::Elem;

    /// Writes one element at `index <= len`. Writing at `len` grows the
    /// storage by one; anything below overwrites in place.
    fn write(&self, store: &mut Self::Mut, index: usize, value: Self::Elem);

    /// Inserts `src[from..to]` at `index <= len`, shifting the tail right.
    /// Returns the number of elements inserted.
    fn insert(
        &self,
        store: &mut Self::Mut,
        index: usize,
        src: &[Self::Elem],
        from: usize,
        to: usize,
    ) -> usize;

    /// Writes `src[from..to]` starting at `index <= len`, overwriting what
    /// is there and appending the remainder. The length grows to
    /// `max(len, index + (to - from))`.
    fn write_slice(
        &self,
        store: &mut Self::Mut,
        index: usize,
        src: &[Self::Elem],
        from: usize,
        to: usize,
    );

    /// Copies up to `want` elements starting at `from` into `dest` at
    /// offset `at`, clamped by both the populated length and the space left
    /// in `dest`. Returns the count copied.
    fn read_slice(
        &self,
        store: &Self::Mut,
        from: usize,
        dest: &mut [Self::Elem],
        at: usize,
        want: usize,
    ) -> usize;

    /// [`Transport::read_slice`] over immutable storage.
    fn read_frozen_slice(
        &self,
        store: &Self::Imu,
        from: usize,
        dest: &mut [Self::Elem],
        at: usize,
        want: usize,
    ) -> usize;

    /// Copies `count` elements from immutable storage into mutable storage,
    /// extending the destination if it is shorter than `at + count`.
    /// Returns the count copied (clamped by the source length).
    fn copy_frozen(
        &self,
        src: &Self::Imu,
        from: usize,
        dest: &mut Self::Mut,
        at: usize,
        count: usize,
    ) -> usize;

    /// Copies `count` elements between two distinct mutable storages,
    /// extending the destination if needed. Returns the count copied.
    fn copy(
        &self,
        src: &Self::Mut,
        from: usize,
        dest: &mut Self::Mut,
        at: usize,
        count: usize,
    ) -> usize;

    /// Copies `count` elements within one storage. Overlapping ranges are
    /// handled like `memmove`. Both ranges must lie inside the populated
    /// length. Returns `count`.
    fn copy_within(&self, store: &mut Self::Mut, from: usize, at: usize, count: usize) -> usize;

    /// Produces a fresh, exactly-sized immutable copy of `[from, to)`.
    /// The result shares nothing with the source.
    fn freeze(&self, store: &Self::Mut, from: usize, to: usize) -> Self::Imu;

    /// Nulls out reference cells in `[from, to)` so their referents can be
    /// reclaimed. No-op for packed value storage.
    fn release(&self, store: &mut Self::Mut, from: usize, to: usize);

    /// Whether distinct element indices occupy disjoint memory. False only
    /// for bit-packed storage, where neighbouring cells share a byte; the
    /// channel keeps such cells under its lock instead of touching them
    /// concurrently from both sides.
    fn cells_independent(&self) -> bool {
        true
    }
}
