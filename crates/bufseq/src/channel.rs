use std::cell::UnsafeCell;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crossbeam_utils::CachePadded;

use crate::cursor::{BufferId, Cursor, SeqSink, SeqSource};
use crate::error::CursorError;
use crate::invariants::{
    debug_assert_bounded_count, debug_assert_monotonic, debug_assert_region_order,
};
use crate::transport::Transport;

// =============================================================================
// TRI-REGION RING PROTOCOL
// =============================================================================
//
// The channel is a bounded SPSC ring whose cells fall into three circular
// regions: readable, written-but-uncommitted, and free. The bookkeeping is
// three unbounded u64 positions guarded by one mutex:
//
//     head <= mid <= tail <= head + capacity
//
// - `head`  -- start of the readable region (the consumer's committed mark)
// - `mid`   -- end of readable / start of written (the producer's committed
//             mark; data becomes visible to the consumer only here)
// - `tail`  -- end of written (the producer's write position)
//
// Positions never wrap; a cell index is `position % capacity`, and the
// cycle count some callers care about is `position / capacity`. Unbounded
// positions make cursor comparison trivial and rule out the ambiguity a
// wrapped index would have after the ring cycles.
//
// ## Region ownership
//
// Cell stores happen OUTSIDE the critical section, which is sound because
// ownership of a cell follows its region and regions never overlap:
//
// - The producer writes only cells in [mid, tail), which it alone extends.
// - The consumer reads only cells in [head, mid), bounds it observed while
//   holding the lock.
// - Free cells [tail, head + capacity) are touched by nobody.
//
// The lock's release/acquire pairing orders the producer's cell stores
// (before its commit) with the consumer's loads (after observing the new
// `mid`), so published cells are fully visible.
//
// The one exception is bit-packed storage, where neighbouring cells share
// a byte and the region argument breaks down at the byte boundary; those
// transports report `cells_independent() == false` and all cell access
// stays under the lock.
//
// ## Blocking
//
// Two condition variables hang off the mutex: the consumer waits on
// `read_monitor` (signalled by commits and close), the producer waits on
// `write_monitor` (signalled by reader commits and close). Every waiter
// re-checks state on wakeup, and close broadcasts both monitors, so a
// blocked side always terminates promptly once the channel closes.
//
// =============================================================================

struct RingState {
    head: u64,
    mid: u64,
    tail: u64,
    closed: bool,
}

impl RingState {
    #[inline]
    fn live(&self) -> u64 {
        self.tail - self.head
    }
}

struct RingShared<Tr: Transport> {
    transport: Tr,
    capacity: usize,
    id: BufferId,
    state: Mutex<RingState>,
    /// Consumer waits here; producer-side mutations of `mid` signal it.
    read_monitor: Condvar,
    /// Producer waits here; consumer-side mutations of `head` signal it.
    write_monitor: Condvar,
    /// Cell storage, pre-sized to `capacity` and never resized after.
    /// Padded so cell traffic does not false-share with the lock word.
    cells: CachePadded<UnsafeCell<Tr::Mut>>,
}

// SAFETY: all state mutations happen under the mutex; cell access follows
// the region-ownership protocol documented above, which gives every cell
// exactly one accessor at a time. Tr::Mut carries the elements, so its
// Send bound is what actually moves data across threads.
unsafe impl<Tr: Transport + Send> Send for RingShared<Tr>
where
    Tr::Mut: Send,
    Tr::Elem: Send,
{
}
unsafe impl<Tr: Transport + Send> Sync for RingShared<Tr>
where
    Tr::Mut: Send,
    Tr::Elem: Send,
{
}

impl<Tr: Transport> RingShared<Tr> {
    fn lock(&self) -> MutexGuard<'_, RingState> {
        // A panicking holder cannot leave the tuple torn: every mutation
        // section completes its position update in a single store.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_read<'a>(&self, guard: MutexGuard<'a, RingState>) -> MutexGuard<'a, RingState> {
        self.read_monitor.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_write<'a>(&self, guard: MutexGuard<'a, RingState>) -> MutexGuard<'a, RingState> {
        self.write_monitor.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes one element into cell `index`.
    ///
    /// SAFETY: caller must own the cell per the region protocol (a
    /// written-region cell claimed by the producer), or hold the lock for
    /// a transport whose cells share memory.
    unsafe fn write_cell(&self, index: usize, value: Tr::Elem) {
        let cells = &mut *self.cells.get();
        self.transport.write(cells, index, value);
    }

    /// Writes `src[from..to]` into contiguous cells starting at `index`.
    ///
    /// SAFETY: as for `write_cell`; the whole range must be claimed.
    unsafe fn write_cells(&self, index: usize, src: &[Tr::Elem], from: usize, to: usize) {
        let cells = &mut *self.cells.get();
        self.transport.write_slice(cells, index, src, from, to);
    }

    /// Reads one element from cell `index`.
    ///
    /// SAFETY: the cell must lie in the readable region as observed under
    /// the lock, or the lock must still be held for shared-cell transports.
    unsafe fn read_cell(&self, index: usize) -> Tr::Elem {
        let cells = &*self.cells.get();
        self.transport.read(cells, index)
    }

    /// Reads contiguous cells starting at `index` into `dest`.
    ///
    /// SAFETY: as for `read_cell`; the whole range must be readable.
    unsafe fn read_cells(&self, index: usize, dest: &mut [Tr::Elem], at: usize, want: usize) {
        let cells = &*self.cells.get();
        self.transport.read_slice(cells, index, dest, at, want);
    }

    /// Nulls the cells for linear positions `[from_pos, to_pos)`, splitting
    /// at the ring seam.
    ///
    /// SAFETY: the caller must own the whole range per the region protocol.
    unsafe fn release_cells(&self, from_pos: u64, to_pos: u64) {
        let cells = &mut *self.cells.get();
        let capacity = self.capacity as u64;
        let mut pos = from_pos;
        while pos < to_pos {
            let index = (pos % capacity) as usize;
            let count = (to_pos - pos).min(capacity - index as u64) as usize;
            self.transport.release(cells, index, index + count);
            pos += count as u64;
        }
    }
}

/// Wires up a channel over `transport` with the given capacity; `seed`
/// elements are preloaded as already-committed readable content.
pub(crate) fn channel<Tr: Transport>(
    transport: Tr,
    capacity: usize,
    seed: &[Tr::Elem],
) -> (ChannelWriter<Tr>, ChannelReader<Tr>) {
    assert!(capacity >= 2, "channel capacity must be at least 2");
    assert!(seed.len() <= capacity, "seed of {} exceeds capacity {}", seed.len(), capacity);

    let mut cells = transport.create_storage();
    transport.ensure_capacity(&mut cells, capacity);
    transport.set_len(&mut cells, capacity);
    transport.write_slice(&mut cells, 0, seed, 0, seed.len());

    let shared = Arc::new(RingShared {
        transport,
        capacity,
        id: BufferId::next(),
        state: Mutex::new(RingState {
            head: 0,
            mid: seed.len() as u64,
            tail: seed.len() as u64,
            closed: false,
        }),
        read_monitor: Condvar::new(),
        write_monitor: Condvar::new(),
        cells: CachePadded::new(UnsafeCell::new(cells)),
    });

    (ChannelWriter { shared: Arc::clone(&shared) }, ChannelReader { shared })
}

/// Producer half of a channel.
///
/// Appends stage elements into the written region; nothing becomes visible
/// to the reader until [`commit`](ChannelWriter::commit) publishes a prefix
/// of it. [`restore`](SeqSink::restore) rolls the written region back to a
/// snapshot instead, which is how speculative producers abandon a branch
/// without the consumer ever observing it.
///
/// Dropping the writer closes the channel so a blocked reader drains and
/// terminates.
pub struct ChannelWriter<Tr: Transport> {
    shared: Arc<RingShared<Tr>>,
}

// Note: the channel halves intentionally do NOT implement Clone. A second
// writer would break the single-producer region ownership that lets cell
// stores happen outside the lock.

impl<Tr: Transport> ChannelWriter<Tr> {
    /// Ring capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Returns true once the channel is closed.
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Number of appended-but-uncommitted elements.
    pub fn uncommitted(&self) -> usize {
        let st = self.shared.lock();
        (st.tail - st.mid) as usize
    }

    /// Cursor at the write end (one past the last appended element).
    pub fn end(&self) -> Cursor {
        Cursor::new(self.shared.id, self.shared.lock().tail)
    }

    /// Publishes everything appended up to `cur`: the written prefix
    /// `[write start, cur)` moves into the readable region and the reader
    /// monitor is signalled. No-op once the channel is closed.
    ///
    /// # Panics
    ///
    /// Panics if `cur` is foreign or outside the written region.
    pub fn commit(&mut self, cur: Cursor) {
        if let Err(err) = self.try_commit(cur) {
            panic!("commit: {err}");
        }
    }

    /// [`commit`](ChannelWriter::commit) that reports instead of panicking.
    pub fn try_commit(&mut self, cur: Cursor) -> Result<(), CursorError> {
        let shared = &*self.shared;
        let mut st = shared.lock();
        if !cur.belongs_to(shared.id) {
            return Err(CursorError::ForeignCursor);
        }
        if st.closed {
            return Ok(());
        }
        let pos = cur.position();
        if pos < st.mid || pos > st.tail {
            return Err(CursorError::OutOfRange { pos, lo: st.mid, hi: st.tail });
        }
        debug_assert_monotonic!("mid", st.mid, pos);
        st.mid = pos;
        debug_assert_region_order!(st.head, st.mid, st.tail);
        drop(st);
        shared.read_monitor.notify_one();
        Ok(())
    }

    /// [`restore`](SeqSink::restore) that reports instead of panicking.
    pub fn try_restore(&mut self, cur: Cursor) -> Result<(), CursorError> {
        let shared = &*self.shared;
        let mut st = shared.lock();
        if !cur.belongs_to(shared.id) {
            return Err(CursorError::ForeignCursor);
        }
        if st.closed {
            return Ok(());
        }
        let pos = cur.position();
        if pos < st.mid || pos > st.tail {
            return Err(CursorError::OutOfRange { pos, lo: st.mid, hi: st.tail });
        }
        let old_tail = st.tail;
        st.tail = pos;
        // SAFETY: [pos, old_tail) was the rolled-back tail of the written
        // region; it belongs to this producer and the consumer never reads
        // past `mid`.
        unsafe { shared.release_cells(pos, old_tail) };
        // No writer-monitor signal: the only producer is the caller.
        Ok(())
    }

    /// Closes the channel. Uncommitted elements are discarded and their
    /// cells released; both monitors are woken so blocked threads observe
    /// the close. Idempotent.
    pub fn close(&mut self) {
        let shared = &*self.shared;
        let mut st = shared.lock();
        st.closed = true;
        let old_tail = st.tail;
        st.tail = st.mid;
        if old_tail > st.mid {
            // SAFETY: the discarded range is the written region, which
            // only this producer touches.
            unsafe { shared.release_cells(st.mid, old_tail) };
        }
        drop(st);
        shared.read_monitor.notify_all();
        shared.write_monitor.notify_all();
    }
}

impl<Tr: Transport> SeqSink for ChannelWriter<Tr> {
    type Elem = Tr::Elem;

    /// Appends one element, waiting while the ring is full. Once the
    /// channel is closed this silently does nothing.
    fn append(&mut self, value: Tr::Elem) {
        let shared = &*self.shared;
        let capacity = shared.capacity as u64;
        let mut st = shared.lock();
        loop {
            if st.closed {
                return;
            }
            if st.live() < capacity {
                break;
            }
            st = shared.wait_write(st);
        }
        let index = (st.tail % capacity) as usize;
        st.tail += 1;
        debug_assert_region_order!(st.head, st.mid, st.tail);
        debug_assert_bounded_count!(st.live(), capacity);
        if shared.transport.cells_independent() {
            drop(st);
        }
        // SAFETY: the cell at `index` was just claimed into the written
        // region; only this producer writes written cells, and the consumer
        // cannot observe them until a later commit moves `mid` past here.
        // For shared-cell transports the lock is still held.
        unsafe { shared.write_cell(index, value) };
        shared.read_monitor.notify_one();
    }

    /// Appends `src[from..to]` in contiguous runs. Blocks only while
    /// nothing has been appended yet; once the ring fills after partial
    /// progress the count so far is returned.
    fn append_slice(&mut self, src: &[Tr::Elem], from: usize, to: usize) -> usize {
        let shared = &*self.shared;
        let capacity = shared.capacity as u64;
        let want = to - from;
        let mut written = 0;
        while written < want {
            let mut st = shared.lock();
            let (index, take) = loop {
                if st.closed {
                    return written;
                }
                let free = capacity - st.live();
                if free > 0 {
                    let index = (st.tail % capacity) as usize;
                    let contiguous = (shared.capacity - index).min(free as usize);
                    break (index, contiguous.min(want - written));
                }
                if written > 0 {
                    return written;
                }
                st = shared.wait_write(st);
            };
            st.tail += take as u64;
            debug_assert_region_order!(st.head, st.mid, st.tail);
            debug_assert_bounded_count!(st.live(), capacity);
            if shared.transport.cells_independent() {
                drop(st);
            }
            // SAFETY: `[index, index + take)` was claimed into the written
            // region above; same ownership argument as `append`.
            unsafe { shared.write_cells(index, src, from + written, from + written + take) };
            written += take;
            shared.read_monitor.notify_one();
        }
        written
    }

    /// Waits until at least one free cell exists and returns the free
    /// count; returns 0 once the channel is closed.
    fn need_capacity(&mut self, _want: usize) -> usize {
        let shared = &*self.shared;
        let capacity = shared.capacity as u64;
        let mut st = shared.lock();
        loop {
            if st.closed {
                return 0;
            }
            let free = capacity - st.live();
            if free > 0 {
                return free as usize;
            }
            st = shared.wait_write(st);
        }
    }

    fn snapshot(&self) -> Cursor {
        self.end()
    }

    /// Rolls the written region back to `cur`, discarding everything
    /// appended but not committed since that snapshot.
    fn restore(&mut self, cur: Cursor) {
        if let Err(err) = self.try_restore(cur) {
            panic!("restore: {err}");
        }
    }
}

impl<Tr: Transport> Drop for ChannelWriter<Tr> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Consumer half of a channel.
///
/// Cursors address committed elements; `read`/`read_into` block while the
/// readable region is empty and the channel is open. Consumed elements are
/// handed back to the free region with [`commit`](ChannelReader::commit),
/// which also nulls reference cells so a long-lived ring does not pin
/// referents.
///
/// Dropping the reader closes the channel so a blocked writer terminates.
pub struct ChannelReader<Tr: Transport> {
    shared: Arc<RingShared<Tr>>,
}

impl<Tr: Transport> ChannelReader<Tr> {
    /// Ring capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Returns true once the channel is closed.
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Number of committed elements waiting to be read.
    pub fn available(&self) -> usize {
        let st = self.shared.lock();
        (st.mid - st.head) as usize
    }

    /// Cursor at the reader's current start; the position consumed up to.
    pub fn snapshot(&self) -> Cursor {
        self.start()
    }

    /// Accepts a cursor this reader emitted and does nothing: consumption
    /// cannot be rolled back.
    ///
    /// # Panics
    ///
    /// Panics if the cursor belongs to a different channel.
    pub fn restore(&mut self, cur: Cursor) {
        assert!(cur.belongs_to(self.shared.id), "cursor belongs to a different buffer");
    }

    /// Releases the readable prefix `[start, cur)` back to the free region
    /// and signals a waiting producer.
    ///
    /// # Panics
    ///
    /// Panics if `cur` is foreign or outside the readable region.
    pub fn commit(&mut self, cur: Cursor) {
        if let Err(err) = self.try_commit(cur) {
            panic!("commit: {err}");
        }
    }

    /// [`commit`](ChannelReader::commit) that reports instead of panicking.
    pub fn try_commit(&mut self, cur: Cursor) -> Result<(), CursorError> {
        let shared = &*self.shared;
        let mut st = shared.lock();
        if !cur.belongs_to(shared.id) {
            return Err(CursorError::ForeignCursor);
        }
        let pos = cur.position();
        if pos < st.head || pos > st.mid {
            return Err(CursorError::OutOfRange { pos, lo: st.head, hi: st.mid });
        }
        // SAFETY: [head, pos) is still consumer-owned until `head` moves;
        // nulling it here cannot race with the producer, which only claims
        // cells the consumer has already given up.
        unsafe { shared.release_cells(st.head, pos) };
        debug_assert_monotonic!("head", st.head, pos);
        st.head = pos;
        debug_assert_region_order!(st.head, st.mid, st.tail);
        drop(st);
        shared.write_monitor.notify_one();
        Ok(())
    }

    /// Closes the channel, committing the reader's end so any still
    /// buffered content stops being retained. Idempotent.
    pub fn close(&mut self) {
        let shared = &*self.shared;
        let mut st = shared.lock();
        st.closed = true;
        let (head, mid) = (st.head, st.mid);
        // SAFETY: the readable region is consumer-owned.
        unsafe { shared.release_cells(head, mid) };
        st.head = mid;
        drop(st);
        shared.read_monitor.notify_all();
        shared.write_monitor.notify_all();
    }
}

impl<Tr: Transport> SeqSource for ChannelReader<Tr> {
    type Elem = Tr::Elem;

    fn start(&self) -> Cursor {
        Cursor::new(self.shared.id, self.shared.lock().head)
    }

    /// Cursor at the current read end (exclusive); equal to `start` while
    /// nothing is committed.
    fn end(&self) -> Cursor {
        Cursor::new(self.shared.id, self.shared.lock().mid)
    }

    fn advance(&self, cur: Cursor, by: u64) -> Option<Cursor> {
        let shared = &*self.shared;
        assert!(cur.belongs_to(shared.id), "cursor belongs to a different buffer");
        let st = shared.lock();
        if cur.position() + by > st.mid {
            return None;
        }
        Some(cur.advanced(by))
    }

    /// The element at the cursor. Waits while the cursor sits at the read
    /// end of an open channel; returns `None` once the channel is closed
    /// and drained past the cursor.
    fn read(&self, cur: Cursor) -> Option<Tr::Elem> {
        let shared = &*self.shared;
        assert!(cur.belongs_to(shared.id), "cursor belongs to a different buffer");
        let capacity = shared.capacity as u64;
        let pos = cur.position();
        let mut st = shared.lock();
        loop {
            assert!(pos >= st.head, "cursor position {pos} was already committed past");
            if pos < st.mid {
                let index = (pos % capacity) as usize;
                if shared.transport.cells_independent() {
                    drop(st);
                }
                // SAFETY: `pos` was observed inside the readable region
                // under the lock; readable cells are not mutated until this
                // side commits past them. For shared-cell transports the
                // lock is still held.
                return Some(unsafe { shared.read_cell(index) });
            }
            if st.closed {
                return None;
            }
            st = shared.wait_read(st);
        }
    }

    /// Copies up to `want` elements starting at the cursor into `dest` at
    /// offset `at`, taking the largest contiguous readable run each pass
    /// (a wrap is two passes). Waits only while nothing has been read yet
    /// and the channel is open. Does not consume; commit separately.
    fn read_into(&self, cur: Cursor, dest: &mut [Tr::Elem], at: usize, want: usize) -> usize {
        let shared = &*self.shared;
        assert!(cur.belongs_to(shared.id), "cursor belongs to a different buffer");
        let capacity = shared.capacity as u64;
        let want = want.min(dest.len().saturating_sub(at));
        let mut pos = cur.position();
        let mut n_read = 0;
        while n_read < want {
            let mut st = shared.lock();
            let (index, take) = loop {
                assert!(pos >= st.head, "cursor position {pos} was already committed past");
                let avail = st.mid - pos;
                if avail > 0 {
                    let index = (pos % capacity) as usize;
                    let contiguous = (shared.capacity - index).min(avail as usize);
                    break (index, contiguous.min(want - n_read));
                }
                if n_read > 0 || st.closed {
                    return n_read;
                }
                st = shared.wait_read(st);
            };
            if shared.transport.cells_independent() {
                drop(st);
            }
            // SAFETY: `[index, index + take)` was observed inside the
            // readable region under the lock; same argument as `read`.
            unsafe { shared.read_cells(index, dest, at + n_read, take) };
            n_read += take;
            pos += take as u64;
        }
        n_read
    }
}

impl<Tr: Transport> Drop for ChannelReader<Tr> {
    fn drop(&mut self) {
        self.close();
    }
}
