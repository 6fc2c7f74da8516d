use std::marker::PhantomData;

use super::Transport;
use crate::kind::{CodeUnitKind, PrimKind};

/// Marker for primitives that can live in packed storage.
///
/// Each implementor names the [`PrimKind`] it backs so a transport can be
/// checked against the code-unit kind it was built for.
pub trait Unit: Copy + Default + PartialEq + Send + Sync + std::fmt::Debug + 'static {
    /// The primitive family this type backs.
    const PRIM: PrimKind;
}

impl Unit for u8 {
    const PRIM: PrimKind = PrimKind::Byte;
}

impl Unit for u16 {
    const PRIM: PrimKind = PrimKind::Char16;
}

impl Unit for i16 {
    const PRIM: PrimKind = PrimKind::Short;
}

impl Unit for i32 {
    const PRIM: PrimKind = PrimKind::Int32;
}

impl Unit for u32 {
    const PRIM: PrimKind = PrimKind::Int32;
}

impl Unit for i64 {
    const PRIM: PrimKind = PrimKind::Int64;
}

impl Unit for f32 {
    const PRIM: PrimKind = PrimKind::Float32;
}

impl Unit for f64 {
    const PRIM: PrimKind = PrimKind::Float64;
}

/// Transport over packed primitive values.
///
/// Storage is a contiguous native array of `P` plus its length; freezing
/// copies the requested range into an exactly-sized immutable array. The
/// transport records the [`CodeUnitKind`] it was built for so frozen
/// storage stays correctly typed.
#[derive(Debug, Clone, Copy)]
pub struct ValueTransport<P: Unit> {
    kind: CodeUnitKind,
    _marker: PhantomData<fn() -> P>,
}

impl<P: Unit> ValueTransport<P> {
    /// Creates a value transport for `kind`.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is not backed by `P`.
    pub fn new(kind: CodeUnitKind) -> Self {
        assert!(
            kind.prim() == P::PRIM,
            "code unit kind {:?} is not backed by {:?}",
            kind,
            P::PRIM
        );
        Self { kind, _marker: PhantomData }
    }

    /// The code-unit kind this transport stores.
    #[inline]
    pub fn kind(&self) -> CodeUnitKind {
        self.kind
    }
}

impl<P: Unit> Transport for ValueTransport<P> {
    type Elem = P;
    type Mut = Vec<P>;
    type Imu = Box<[P]>;

    fn create_storage(&self) -> Self::Mut {
        Vec::new()
    }

    fn ensure_capacity(&self, store: &mut Self::Mut, want: usize) -> usize {
        let cap = store.capacity();
        if cap < want {
            let target = want.max(cap * 2);
            store.reserve_exact(target - store.len());
        }
        store.capacity()
    }

    fn capacity(&self, store: &Self::Mut) -> usize {
        store.capacity()
    }

    fn len(&self, store: &Self::Mut) -> usize {
        store.len()
    }

    fn frozen_len(&self, store: &Self::Imu) -> usize {
        store.len()
    }

    fn set_len(&self, store: &mut Self::Mut, new_len: usize) {
        if new_len <= store.len() {
            store.truncate(new_len);
        } else {
            store.resize(new_len, P::default());
        }
    }

    fn read(&self, store: &Self::Mut, index: usize) -> P {
        store[index]
    }

    fn read_frozen(&self, store: &Self::Imu, index: usize) -> P {
        store[index]
    }

    fn write(&self, store: &mut Self::Mut, index: usize, value: P) {
        assert!(index <= store.len(), "write index {index} out of range");
        if index == store.len() {
            store.push(value);
        } else {
            store[index] = value;
        }
    }

    fn insert(&self, store: &mut Self::Mut, index: usize, src: &[P], from: usize, to: usize) -> usize {
        assert!(index <= store.len(), "insert index {index} out of range");
        store.splice(index..index, src[from..to].iter().copied());
        to - from
    }

    fn write_slice(&self, store: &mut Self::Mut, index: usize, src: &[P], from: usize, to: usize) {
        assert!(index <= store.len(), "write index {index} out of range");
        let count = to - from;
        let in_place = count.min(store.len() - index);
        store[index..index + in_place].copy_from_slice(&src[from..from + in_place]);
        store.extend_from_slice(&src[from + in_place..to]);
    }

    fn read_slice(
        &self,
        store: &Self::Mut,
        from: usize,
        dest: &mut [P],
        at: usize,
        want: usize,
    ) -> usize {
        let avail = store.len().saturating_sub(from);
        let space = dest.len().saturating_sub(at);
        let count = want.min(avail).min(space);
        dest[at..at + count].copy_from_slice(&store[from..from + count]);
        count
    }

    fn read_frozen_slice(
        &self,
        store: &Self::Imu,
        from: usize,
        dest: &mut [P],
        at: usize,
        want: usize,
    ) -> usize {
        let avail = store.len().saturating_sub(from);
        let space = dest.len().saturating_sub(at);
        let count = want.min(avail).min(space);
        dest[at..at + count].copy_from_slice(&store[from..from + count]);
        count
    }

    fn copy_frozen(
        &self,
        src: &Self::Imu,
        from: usize,
        dest: &mut Self::Mut,
        at: usize,
        count: usize,
    ) -> usize {
        let count = count.min(src.len().saturating_sub(from));
        if dest.len() < at + count {
            dest.resize(at + count, P::default());
        }
        dest[at..at + count].copy_from_slice(&src[from..from + count]);
        count
    }

    fn copy(
        &self,
        src: &Self::Mut,
        from: usize,
        dest: &mut Self::Mut,
        at: usize,
        count: usize,
    ) -> usize {
        let count = count.min(src.len().saturating_sub(from));
        if dest.len() < at + count {
            dest.resize(at + count, P::default());
        }
        dest[at..at + count].copy_from_slice(&src[from..from + count]);
        count
    }

    fn copy_within(&self, store: &mut Self::Mut, from: usize, at: usize, count: usize) -> usize {
        assert!(from + count <= store.len() && at + count <= store.len());
        store.copy_within(from..from + count, at);
        count
    }

    fn freeze(&self, store: &Self::Mut, from: usize, to: usize) -> Self::Imu {
        store[from..to].to_vec().into_boxed_slice()
    }

    fn release(&self, _store: &mut Self::Mut, _from: usize, _to: usize) {
        // Packed values hold no references; nothing to reclaim.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints() -> ValueTransport<i32> {
        ValueTransport::new(CodeUnitKind::INT32)
    }

    #[test]
    #[should_panic(expected = "not backed")]
    fn test_kind_mismatch_panics() {
        let _ = ValueTransport::<i64>::new(CodeUnitKind::INT32);
    }

    #[test]
    fn test_ensure_capacity_exact_then_doubles() {
        let tr = ints();
        let mut store = tr.create_storage();
        assert_eq!(tr.ensure_capacity(&mut store, 5), 5);
        // Already large enough: no change.
        assert_eq!(tr.ensure_capacity(&mut store, 3), 5);
        // Growth at least doubles.
        assert!(tr.ensure_capacity(&mut store, 6) >= 10);
    }

    #[test]
    fn test_set_len_zero_fills() {
        let tr = ints();
        let mut store = tr.create_storage();
        tr.write(&mut store, 0, 7);
        tr.set_len(&mut store, 3);
        assert_eq!(store, vec![7, 0, 0]);
        tr.set_len(&mut store, 1);
        assert_eq!(store, vec![7]);
    }

    #[test]
    fn test_write_slice_grows_length() {
        let tr = ints();
        let mut store = vec![1, 2, 3];
        tr.write_slice(&mut store, 2, &[9, 8, 7], 0, 3);
        assert_eq!(store, vec![1, 2, 9, 8, 7]);
    }

    #[test]
    fn test_insert_returns_count() {
        let tr = ints();
        let mut store = vec![1, 4];
        assert_eq!(tr.insert(&mut store, 1, &[0, 2, 3, 0], 1, 3), 2);
        assert_eq!(store, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_copy_within_memmove() {
        let tr = ints();
        let mut store = vec![1, 2, 3, 4, 5];
        tr.copy_within(&mut store, 0, 2, 3);
        assert_eq!(store, vec![1, 2, 1, 2, 3]);
    }

    #[test]
    fn test_copy_extends_destination() {
        let tr = ints();
        let src = vec![1, 2, 3];
        let mut dest = vec![9];
        assert_eq!(tr.copy(&src, 1, &mut dest, 2, 2), 2);
        assert_eq!(dest, vec![9, 0, 2, 3]);
    }

    #[test]
    fn test_copy_frozen_extends_destination() {
        let tr = ints();
        let frozen = tr.freeze(&vec![1, 2, 3, 4], 1, 4);
        let mut dest = vec![9];
        assert_eq!(tr.copy_frozen(&frozen, 0, &mut dest, 2, 5), 3);
        assert_eq!(dest, vec![9, 0, 2, 3, 4]);
    }

    #[test]
    fn test_freeze_round_trip() {
        let tr = ints();
        let store = vec![10, 11, 12];
        let frozen = tr.freeze(&store, 0, 3);
        let mut out = vec![-1; 3];
        assert_eq!(tr.read_frozen_slice(&frozen, 0, &mut out, 0, 3), 3);
        assert_eq!(out, vec![10, 11, 12]);
    }
}
