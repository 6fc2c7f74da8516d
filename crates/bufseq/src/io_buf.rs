use crate::cursor::{BufferId, Cursor, SeqSink, SeqSource};
use crate::error::CursorError;
use crate::invariants::debug_assert_cursor_in_range;
use crate::ro_buf::RoBuf;
use crate::transport::Transport;

/// An append-only buffer with snapshot/rollback.
///
/// Elements are appended at the end; a snapshot captures the current end
/// as a cursor and [`restore`](IoBuf::restore) truncates back to it,
/// discarding everything appended since. This is the rollback primitive
/// for speculative computations: take a snapshot, try a branch, and on
/// failure restore so no partial output leaks.
///
/// [`freeze`](IoBuf::freeze) consumes the buffer by move and yields a
/// [`RoBuf`] over a fresh immutable copy, so a frozen buffer cannot be
/// touched again by construction.
pub struct IoBuf<Tr: Transport> {
    transport: Tr,
    store: Tr::Mut,
    id: BufferId,
}

impl<Tr: Transport> IoBuf<Tr> {
    pub(crate) fn from_parts(transport: Tr, store: Tr::Mut) -> Self {
        Self { transport, store, id: BufferId::next() }
    }

    /// Number of elements currently in the buffer.
    pub fn len(&self) -> usize {
        self.transport.len(&self.store)
    }

    /// Returns true if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current capacity of the backing storage.
    pub fn capacity(&self) -> usize {
        self.transport.capacity(&self.store)
    }

    /// Grows the backing storage to hold at least `want` elements without
    /// changing the length. Returns the resulting capacity.
    pub fn ensure_capacity(&mut self, want: usize) -> usize {
        self.transport.ensure_capacity(&mut self.store, want)
    }

    /// Rolls back to `cur`, reporting instead of panicking on a bad cursor.
    pub fn try_restore(&mut self, cur: Cursor) -> Result<(), CursorError> {
        if !cur.belongs_to(self.id) {
            return Err(CursorError::ForeignCursor);
        }
        let len = self.len() as u64;
        if cur.position() > len {
            return Err(CursorError::OutOfRange { pos: cur.position(), lo: 0, hi: len });
        }
        // Truncation drops reference cells, releasing their referents.
        self.transport.set_len(&mut self.store, cur.position() as usize);
        Ok(())
    }

    /// Freezes the buffer into a read-only view over a fresh, exactly
    /// sized immutable copy. Consumes the buffer; the mutable storage is
    /// dropped here.
    pub fn freeze(self) -> RoBuf<Tr> {
        let len = self.len();
        let frozen = self.transport.freeze(&self.store, 0, len);
        RoBuf::from_frozen(self.transport, frozen)
    }

    fn check_owner(&self, cur: Cursor) {
        assert!(cur.belongs_to(self.id), "cursor belongs to a different buffer");
        debug_assert_cursor_in_range!(cur.position(), self.len() as u64);
    }
}

impl<Tr: Transport> SeqSource for IoBuf<Tr> {
    type Elem = Tr::Elem;

    fn start(&self) -> Cursor {
        Cursor::new(self.id, 0)
    }

    /// A fresh cursor sampling the current length.
    fn end(&self) -> Cursor {
        Cursor::new(self.id, self.len() as u64)
    }

    fn advance(&self, cur: Cursor, by: u64) -> Option<Cursor> {
        self.check_owner(cur);
        if cur.position() + by > self.len() as u64 {
            return None;
        }
        Some(cur.advanced(by))
    }

    fn read(&self, cur: Cursor) -> Option<Tr::Elem> {
        self.check_owner(cur);
        let pos = cur.position() as usize;
        if pos >= self.len() {
            return None;
        }
        Some(self.transport.read(&self.store, pos))
    }

    fn read_into(&self, cur: Cursor, dest: &mut [Tr::Elem], at: usize, want: usize) -> usize {
        self.check_owner(cur);
        self.transport.read_slice(&self.store, cur.position() as usize, dest, at, want)
    }
}

impl<Tr: Transport> SeqSink for IoBuf<Tr> {
    type Elem = Tr::Elem;

    fn append(&mut self, value: Tr::Elem) {
        let len = self.len();
        self.transport.write(&mut self.store, len, value);
    }

    fn append_slice(&mut self, src: &[Tr::Elem], from: usize, to: usize) -> usize {
        let len = self.len();
        self.transport.write_slice(&mut self.store, len, src, from, to);
        to - from
    }

    fn need_capacity(&mut self, want: usize) -> usize {
        self.ensure_capacity(want)
    }

    /// The current end; restoring to it later undoes whatever was
    /// appended in between.
    fn snapshot(&self) -> Cursor {
        self.end()
    }

    fn restore(&mut self, cur: Cursor) {
        if let Err(err) = self.try_restore(cur) {
            panic!("restore: {err}");
        }
    }
}
