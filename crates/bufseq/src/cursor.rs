use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::order::CursorOrder;
use crate::tri::Tri;

/// Process-unique identity of one buffer.
///
/// Cursors carry the id of the buffer that minted them; every operation
/// that accepts a cursor checks the id so a cursor can never act on a
/// buffer it does not belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

impl BufferId {
    /// Mints a fresh id. Relaxed is enough: only uniqueness matters.
    pub(crate) fn next() -> Self {
        BufferId(NEXT_BUFFER_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

/// An opaque position within a buffer.
///
/// Cursors are immutable value types; advancing yields a new cursor.
/// The position is linear and never wraps: for plain buffers it is the
/// element index, for channels it is `cycle * capacity + index`, so a
/// position uniquely names a cell across ring wrap-arounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    owner: BufferId,
    pos: u64,
}

impl Cursor {
    pub(crate) fn new(owner: BufferId, pos: u64) -> Self {
        Self { owner, pos }
    }

    /// The linear position within the owning buffer.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    #[inline]
    pub(crate) fn belongs_to(&self, id: BufferId) -> bool {
        self.owner == id
    }

    pub(crate) fn advanced(&self, by: u64) -> Cursor {
        Cursor { owner: self.owner, pos: self.pos + by }
    }

    /// Partial comparison: positions order cursors of the same buffer;
    /// cursors of different buffers are [`CursorOrder::Unrelated`].
    pub fn compare(&self, other: &Cursor) -> CursorOrder {
        if self.owner != other.owner {
            return CursorOrder::Unrelated;
        }
        CursorOrder::from(self.pos.cmp(&other.pos))
    }

    /// Number of elements between `self` and a later cursor `other`, or
    /// `None` when the cursors are unrelated or out of order.
    pub fn count_between(&self, other: &Cursor) -> Option<u64> {
        if self.owner != other.owner || other.pos < self.pos {
            return None;
        }
        Some(other.pos - self.pos)
    }

    /// Asks whether at least `n` elements lie between `self` and `other`.
    ///
    /// Answers [`Tri::Fail`] when the question is ill-posed: the cursors
    /// belong to different buffers, or `other` precedes `self`.
    pub fn span_exceeds(&self, other: &Cursor, n: u64) -> Tri {
        match self.count_between(other) {
            None => Tri::Fail,
            Some(between) => Tri::from(between >= n),
        }
    }
}

impl PartialOrd for Cursor {
    /// `None` for cursors of different buffers.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other).to_ordering()
    }
}

/// The readable side of a sequence: cursor-addressed, non-destructive.
///
/// `start`/`end` sample the currently readable region; `advance` walks a
/// cursor forward and yields `None` past the readable end; `read` and
/// `read_into` fetch elements at a cursor without consuming them. For
/// channels, `read` and `read_into` may block until data is published or
/// the channel closes.
pub trait SeqSource {
    /// Element type produced by reads.
    type Elem;

    /// Cursor at the first readable element.
    fn start(&self) -> Cursor;

    /// Cursor one past the last readable element (the end sentinel).
    fn end(&self) -> Cursor;

    /// A new cursor `by` elements further on, or `None` if that would pass
    /// the end of the readable region.
    ///
    /// # Panics
    ///
    /// Panics if the cursor belongs to a different buffer.
    fn advance(&self, cur: Cursor, by: u64) -> Option<Cursor>;

    /// The element at the cursor, or `None` at the end of the sequence.
    ///
    /// # Panics
    ///
    /// Panics if the cursor belongs to a different buffer.
    fn read(&self, cur: Cursor) -> Option<Self::Elem>;

    /// Copies up to `want` elements starting at the cursor into `dest` at
    /// offset `at`. Returns the count copied, clamped by the readable
    /// region and the destination space. Never mutates the sequence.
    fn read_into(&self, cur: Cursor, dest: &mut [Self::Elem], at: usize, want: usize) -> usize;

    /// [`Cursor::span_exceeds`] of two cursors of this sequence.
    fn span_exceeds(&self, from: Cursor, to: Cursor, n: u64) -> Tri {
        from.span_exceeds(&to, n)
    }
}

/// The writable side of a sequence: append-only with snapshot/rollback.
pub trait SeqSink {
    /// Element type accepted by writes.
    type Elem;

    /// Appends one element. For channels this blocks while the ring is
    /// full and silently does nothing once the channel is closed.
    fn append(&mut self, value: Self::Elem);

    /// Appends `src[from..to]`. Returns the count actually appended, which
    /// may fall short for a channel that fills up after partial progress.
    fn append_slice(&mut self, src: &[Self::Elem], from: usize, to: usize) -> usize;

    /// Capacity hint. Plain buffers grow their backing storage and return
    /// the resulting capacity; channels wait for at least one free cell
    /// and return the free count (zero once closed).
    fn need_capacity(&mut self, want: usize) -> usize;

    /// Cursor marking the current write position.
    fn snapshot(&self) -> Cursor;

    /// Rolls back to a previously snapshotted cursor, discarding
    /// everything appended (and, for channels, not yet committed) since.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is foreign or outside the restorable range.
    fn restore(&mut self, cur: Cursor);
}
