use crate::cursor::{BufferId, Cursor, SeqSource};
use crate::invariants::debug_assert_cursor_in_range;
use crate::transport::Transport;

/// A read-only sequence over frozen storage.
///
/// Produced by [`IoBuf::freeze`](crate::IoBuf::freeze) or built directly
/// from seed elements. Owns its immutable storage exclusively; cursors are
/// plain `(identity, index)` pairs with `index == len()` as the end
/// sentinel.
pub struct RoBuf<Tr: Transport> {
    transport: Tr,
    store: Tr::Imu,
    id: BufferId,
}

impl<Tr: Transport> RoBuf<Tr> {
    pub(crate) fn from_frozen(transport: Tr, store: Tr::Imu) -> Self {
        Self { transport, store, id: BufferId::next() }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.transport.frozen_len(&self.store)
    }

    /// Returns true if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cursor at the current end; symmetric with the writable buffers.
    pub fn snapshot(&self) -> Cursor {
        self.end()
    }

    /// Accepts a cursor this buffer emitted and does nothing: a frozen
    /// sequence has no position to roll back.
    ///
    /// # Panics
    ///
    /// Panics if the cursor belongs to a different buffer.
    pub fn restore(&mut self, cur: Cursor) {
        assert!(cur.belongs_to(self.id), "cursor belongs to a different buffer");
    }

    fn check_owner(&self, cur: Cursor) {
        assert!(cur.belongs_to(self.id), "cursor belongs to a different buffer");
        debug_assert_cursor_in_range!(cur.position(), self.len() as u64);
    }
}

impl<Tr: Transport> SeqSource for RoBuf<Tr> {
    type Elem = Tr::Elem;

    fn start(&self) -> Cursor {
        Cursor::new(self.id, 0)
    }

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
        Some(self.transport.read_frozen(&self.store, pos))
    }

    fn read_into(&self, cur: Cursor, dest: &mut [Tr::Elem], at: usize, want: usize) -> usize {
        self.check_owner(cur);
        self.transport.read_frozen_slice(&self.store, cur.position() as usize, dest, at, want)
    }
}
