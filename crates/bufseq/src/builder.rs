//! Factories that tie a transport to storage and materialize a buffer.
//!
//! A [`Builder`] carries one transport and optional seed elements, and
//! builds exactly one of the three sequence kinds: a frozen [`RoBuf`], an
//! append-only [`IoBuf`], or a channel pair. One factory function exists
//! per element family; [`for_values`] is the generic entry point that
//! checks the kind against the element type.

use crate::channel::{self, ChannelReader, ChannelWriter};
use crate::error::BuildError;
use crate::io_buf::IoBuf;
use crate::kind::CodeUnitKind;
use crate::ro_buf::RoBuf;
use crate::transport::{BitTransport, RefTransport, Transport, Unit, ValueTransport};

/// Factory for one buffer over one transport.
#[derive(Debug)]
pub struct Builder<Tr: Transport> {
    transport: Tr,
    initial: Vec<Tr::Elem>,
}

impl<Tr: Transport> Builder<Tr> {
    /// Creates a builder over `transport` with no seed elements.
    pub fn new(transport: Tr) -> Self {
        Self { transport, initial: Vec::new() }
    }

    /// Seeds the buffer-to-be with `items`.
    pub fn with_initial(mut self, items: &[Tr::Elem]) -> Self {
        self.initial = items.to_vec();
        self
    }

    /// Builds a frozen read-only buffer holding the seed elements.
    pub fn build_read_only(self) -> RoBuf<Tr> {
        let mut store = self.transport.create_storage();
        self.transport.write_slice(&mut store, 0, &self.initial, 0, self.initial.len());
        let frozen = self.transport.freeze(&store, 0, self.initial.len());
        RoBuf::from_frozen(self.transport, frozen)
    }

    /// Builds an append-only buffer starting with the seed elements.
    pub fn build_read_write(self) -> IoBuf<Tr> {
        let mut store = self.transport.create_storage();
        self.transport.write_slice(&mut store, 0, &self.initial, 0, self.initial.len());
        IoBuf::from_parts(self.transport, store)
    }

    /// Builds a channel of the given capacity. Seed elements are preloaded
    /// as already-committed readable content.
    ///
    /// # Panics
    ///
    /// Panics if `capacity < 2` or the seed does not fit.
    pub fn build_channel(self, capacity: usize) -> (ChannelWriter<Tr>, ChannelReader<Tr>) {
        channel::channel(self.transport, capacity, &self.initial)
    }
}

/// Builder over nullable owning references.
pub fn for_refs<R: Clone>() -> Builder<RefTransport<R>> {
    Builder::new(RefTransport::new())
}

/// Builder over bit-packed booleans.
pub fn for_bits() -> Builder<BitTransport> {
    Builder::new(BitTransport::new())
}

/// Builder over octets.
pub fn for_bytes() -> Builder<ValueTransport<u8>> {
    Builder::new(ValueTransport::new(CodeUnitKind::BYTE))
}

/// Builder over UTF-16 code units.
pub fn for_chars() -> Builder<ValueTransport<u16>> {
    Builder::new(ValueTransport::new(CodeUnitKind::UTF16))
}

/// Builder over signed 16-bit integers.
pub fn for_shorts() -> Builder<ValueTransport<i16>> {
    Builder::new(ValueTransport::new(CodeUnitKind::INT16))
}

/// Builder over signed 32-bit integers.
pub fn for_ints() -> Builder<ValueTransport<i32>> {
    Builder::new(ValueTransport::new(CodeUnitKind::INT32))
}

/// Builder over unsigned 32-bit integers.
pub fn for_uints() -> Builder<ValueTransport<u32>> {
    Builder::new(ValueTransport::new(CodeUnitKind::INT32))
}

/// Builder over signed 64-bit integers.
pub fn for_longs() -> Builder<ValueTransport<i64>> {
    Builder::new(ValueTransport::new(CodeUnitKind::INT64))
}

/// Builder over single-precision floats.
pub fn for_floats() -> Builder<ValueTransport<f32>> {
    Builder::new(ValueTransport::new(CodeUnitKind::FLOAT32))
}

/// Builder over double-precision floats.
pub fn for_doubles() -> Builder<ValueTransport<f64>> {
    Builder::new(ValueTransport::new(CodeUnitKind::FLOAT64))
}

/// Generic entry point: builder over packed values of `kind`, checked
/// against the element type `P`.
pub fn for_values<P: Unit>(kind: CodeUnitKind) -> Result<Builder<ValueTransport<P>>, BuildError> {
    if kind.prim() != P::PRIM {
        return Err(BuildError::KindMismatch { kind, expected: P::PRIM });
    }
    Ok(Builder::new(ValueTransport::new(kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::SeqSource;
    use crate::kind::PrimKind;

    #[test]
    fn test_for_values_checks_kind() {
        assert!(for_values::<u16>(CodeUnitKind::UTF16).is_ok());
        assert_eq!(
            for_values::<i64>(CodeUnitKind::UTF16).unwrap_err(),
            BuildError::KindMismatch { kind: CodeUnitKind::UTF16, expected: PrimKind::Int64 }
        );
    }

    #[test]
    fn test_read_only_from_seed() {
        let buf = for_bytes().with_initial(b"xyz").build_read_only();
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.read(buf.start()), Some(b'x'));
    }

    #[test]
    fn test_ref_builder_holds_handles() {
        use std::sync::Arc;
        let seed: Vec<Option<Arc<str>>> = vec![Some(Arc::from("a")), None];
        let buf = for_refs::<Arc<str>>().with_initial(&seed).build_read_only();
        assert_eq!(buf.read(buf.start()).unwrap().as_deref(), Some("a"));
        assert_eq!(buf.read(buf.advance(buf.start(), 1).unwrap()), Some(None));
    }

    #[test]
    #[should_panic(expected = "capacity must be at least 2")]
    fn test_channel_capacity_floor() {
        let _ = for_ints().build_channel(1);
    }

    #[test]
    #[should_panic(expected = "exceeds capacity")]
    fn test_channel_seed_must_fit() {
        let _ = for_ints().with_initial(&[1, 2, 3]).build_channel(2);
    }
}
