use std::marker::PhantomData;

use super::Transport;

/// Transport over nullable owning reference cells.
///
/// Each cell is an `Option<R>`; the null element is `None`. `R` is
/// typically a shared handle (`Arc<T>`, `Rc<T>`) so that cloning a cell
/// bumps a count rather than copying a value, and
/// [`release`](Transport::release) overwrites cells with `None` so the
/// referents can be reclaimed while the storage itself lives on.
pub struct RefTransport<R> {
    _marker: PhantomData<fn() -> R>,
}

impl<R> RefTransport<R> {
    /// Creates the reference transport.
    pub const fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<R> Default for RefTransport<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for RefTransport<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for RefTransport<R> {}

impl<R> std::fmt::Debug for RefTransport<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RefTransport")
    }
}

impl<R: Clone> Transport for RefTransport<R> {
    type Elem = Option<R>;
    type Mut = Vec<Option<R>>;
    type Imu = Box<[Option<R>]>;

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
            // Truncation drops the tail cells, releasing their referents.
            store.truncate(new_len);
        } else {
            store.resize(new_len, None);
        }
    }

    fn read(&self, store: &Self::Mut, index: usize) -> Self::Elem {
        store[index].clone()
    }

    fn read_frozen(&self, store: &Self::Imu, index: usize) -> Self::Elem {
        store[index].clone()
    }

    fn write(&self, store: &mut Self::Mut, index: usize, value: Self::Elem) {
        assert!(index <= store.len(), "write index {index} out of range");
        if index == store.len() {
            store.push(value);
        } else {
            store[index] = value;
        }
    }

    fn insert(
        &self,
        store: &mut Self::Mut,
        index: usize,
        src: &[Self::Elem],
        from: usize,
        to: usize,
    ) -> usize {
        assert!(index <= store.len(), "insert index {index} out of range");
        store.splice(index..index, src[from..to].iter().cloned());
        to - from
    }

    fn write_slice(
        &self,
        store: &mut Self::Mut,
        index: usize,
        src: &[Self::Elem],
        from: usize,
        to: usize,
    ) {
        assert!(index <= store.len(), "write index {index} out of range");
        let count = to - from;
        let in_place = count.min(store.len() - index);
        store[index..index + in_place].clone_from_slice(&src[from..from + in_place]);
        store.extend(src[from + in_place..to].iter().cloned());
    }

    fn read_slice(
        &self,
        store: &Self::Mut,
        from: usize,
        dest: &mut [Self::Elem],
        at: usize,
        want: usize,
    ) -> usize {
        let avail = store.len().saturating_sub(from);
        let space = dest.len().saturating_sub(at);
        let count = want.min(avail).min(space);
        dest[at..at + count].clone_from_slice(&store[from..from + count]);
        count
    }

    fn read_frozen_slice(
        &self,
        store: &Self::Imu,
        from: usize,
        dest: &mut [Self::Elem],
        at: usize,
        want: usize,
    ) -> usize {
        let avail = store.len().saturating_sub(from);
        let space = dest.len().saturating_sub(at);
        let count = want.min(avail).min(space);
        dest[at..at + count].clone_from_slice(&store[from..from + count]);
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
            dest.resize(at + count, None);
        }
        dest[at..at + count].clone_from_slice(&src[from..from + count]);
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
            dest.resize(at + count, None);
        }
        dest[at..at + count].clone_from_slice(&src[from..from + count]);
        count
    }

    fn copy_within(&self, store: &mut Self::Mut, from: usize, at: usize, count: usize) -> usize {
        assert!(from + count <= store.len() && at + count <= store.len());
        if from >= at {
            for k in 0..count {
                store[at + k] = store[from + k].clone();
            }
        } else {
            for k in (0..count).rev() {
                store[at + k] = store[from + k].clone();
            }
        }
        count
    }

    fn freeze(&self, store: &Self::Mut, from: usize, to: usize) -> Self::Imu {
        store[from..to].to_vec().into_boxed_slice()
    }

    fn release(&self, store: &mut Self::Mut, from: usize, to: usize) {
        for cell in &mut store[from..to] {
            *cell = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn seeded(items: &[&str]) -> (RefTransport<Arc<str>>, Vec<Option<Arc<str>>>) {
        let tr = RefTransport::new();
        let mut store = tr.create_storage();
        for (i, item) in items.iter().enumerate() {
            tr.write(&mut store, i, Some(Arc::from(*item)));
        }
        (tr, store)
    }

    #[test]
    fn test_write_appends_and_overwrites() {
        let (tr, mut store) = seeded(&["a", "b"]);
        assert_eq!(tr.len(&store), 2);

        tr.write(&mut store, 0, Some(Arc::from("x")));
        assert_eq!(tr.read(&store, 0).as_deref(), Some("x"));
        assert_eq!(tr.len(&store), 2);

        tr.write(&mut store, 2, Some(Arc::from("c")));
        assert_eq!(tr.len(&store), 3);
    }

    #[test]
    fn test_insert_shifts_tail() {
        let (tr, mut store) = seeded(&["a", "d"]);
        let src = vec![Some(Arc::from("b")), Some(Arc::from("c"))];
        let n = tr.insert(&mut store, 1, &src, 0, 2);
        assert_eq!(n, 2);
        let got: Vec<_> = (0..4).map(|i| tr.read(&store, i).unwrap().to_string()).collect();
        assert_eq!(got, ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_write_slice_overwrites_then_appends() {
        let (tr, mut store) = seeded(&["a", "b"]);
        let src: Vec<Option<Arc<str>>> =
            ["x", "y", "z"].iter().map(|s| Some(Arc::from(*s))).collect();
        tr.write_slice(&mut store, 1, &src, 0, 3);
        assert_eq!(tr.len(&store), 4);
        assert_eq!(tr.read(&store, 1).as_deref(), Some("x"));
        assert_eq!(tr.read(&store, 3).as_deref(), Some("z"));
    }

    #[test]
    fn test_read_slice_clamps() {
        let (tr, store) = seeded(&["a", "b", "c"]);
        let mut dest: Vec<Option<Arc<str>>> = vec![None; 5];
        assert_eq!(tr.read_slice(&store, 1, &mut dest, 0, 10), 2);
        assert_eq!(dest[0].as_deref(), Some("b"));
        assert_eq!(dest[1].as_deref(), Some("c"));
        assert_eq!(dest[2], None);
        // Past the end reads nothing.
        assert_eq!(tr.read_slice(&store, 3, &mut dest, 0, 4), 0);
    }

    #[test]
    fn test_release_drops_referents() {
        let (tr, mut store) = seeded(&["a", "b", "c"]);
        let held = tr.read(&store, 1).unwrap();
        assert_eq!(Arc::strong_count(&held), 2);
        tr.release(&mut store, 0, 3);
        assert_eq!(Arc::strong_count(&held), 1);
        assert_eq!(tr.read(&store, 1), None);
        assert_eq!(tr.len(&store), 3);
    }

    #[test]
    fn test_freeze_is_disjoint() {
        let (tr, mut store) = seeded(&["a", "b", "c"]);
        let frozen = tr.freeze(&store, 1, 3);
        assert_eq!(tr.frozen_len(&frozen), 2);
        tr.release(&mut store, 0, 3);
        assert_eq!(tr.read_frozen(&frozen, 0).as_deref(), Some("b"));
    }

    #[test]
    fn test_copy_within_overlapping() {
        let (tr, mut store) = seeded(&["a", "b", "c", "d"]);
        tr.copy_within(&mut store, 0, 1, 3);
        let got: Vec<_> = (0..4).map(|i| tr.read(&store, i).unwrap().to_string()).collect();
        assert_eq!(got, ["a", "a", "b", "c"]);
    }

    #[test]
    fn test_set_len_extends_with_null() {
        let (tr, mut store) = seeded(&["a"]);
        tr.set_len(&mut store, 3);
        assert_eq!(tr.read(&store, 2), None);
        tr.set_len(&mut store, 0);
        assert_eq!(tr.len(&store), 0);
    }
}
