//! Append-only sequence buffers with a cursor-based access protocol.
//!
//! Three container kinds share one discipline of opaque cursors,
//! snapshot/rollback, and commit:
//!
//! - [`RoBuf`] -- a frozen view over immutable storage.
//! - [`IoBuf`] -- an append-only buffer; a snapshot cursor can be restored
//!   later to truncate away everything appended since, and freezing yields
//!   a [`RoBuf`] while consuming the buffer.
//! - A bounded SPSC channel ([`ChannelWriter`]/[`ChannelReader`]) -- a
//!   tri-region ring where appends stay private until the producer commits
//!   them, and consumed cells return to the free region when the consumer
//!   commits.
//!
//! Storage concerns live behind the [`Transport`] trait: one back-end per
//! element family (owning references, packed primitives, bit-packed
//! booleans), selected through the [`builder`] factories.
//!
//! # Example
//!
//! ```
//! use bufseq_rs::{builder, SeqSink, SeqSource};
//!
//! // Rollback: a failed branch leaves no trace.
//! let mut buf = builder::for_chars().build_read_write();
//! buf.append_slice(&[b'a' as u16, b'b' as u16], 0, 2);
//! let mark = buf.snapshot();
//! buf.append(b'!' as u16);
//! buf.restore(mark);
//! assert_eq!(buf.len(), 2);
//!
//! // Commit publishes, in FIFO order, across threads if desired.
//! let (mut tx, rx) = builder::for_ints().build_channel(8);
//! tx.append(1);
//! tx.append(2);
//! tx.commit(tx.end());
//! let cur = rx.start();
//! assert_eq!(rx.read(cur), Some(1));
//! let cur = rx.advance(cur, 1).unwrap();
//! assert_eq!(rx.read(cur), Some(2));
//! ```

pub mod builder;
mod channel;
mod cursor;
mod error;
mod invariants;
mod io_buf;
mod kind;
mod order;
mod ro_buf;
mod transport;
mod tri;

pub use builder::Builder;
pub use channel::{ChannelReader, ChannelWriter};
pub use cursor::{BufferId, Cursor, SeqSink, SeqSource};
pub use error::{BuildError, CursorError};
pub use io_buf::IoBuf;
pub use kind::{CodeUnitKind, PrimKind};
pub use order::CursorOrder;
pub use ro_buf::RoBuf;
pub use transport::{
    BitStore, BitTransport, FrozenBits, RefTransport, Transport, Unit, ValueTransport,
};
pub use tri::Tri;
