use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::FernError;
use crate::list::List;
use crate::seq::Seq;
use crate::value::{value_hash, Value};

/// Bucket count is prime so key hashes spread evenly.
pub(crate) const NUM_BUCKETS: usize = 17;
pub(crate) const BUCKET_SIZE: usize = 23;
pub(crate) const BUCKET_GROWTH_FACTOR: usize = 2;

/// One stored entry of a hashed structure.
pub(crate) trait HashedEntry: Clone + Send + Sync + 'static {
    fn key(&self) -> &Value;
    fn value(&self) -> &Value;
    /// Snapshot form of the entry: the bare key for sets, a `[key, value]`
    /// list for maps.
    fn materialize(&self) -> Value;
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Collect {
    Keys,
    Vals,
    Entries,
}

impl Collect {
    fn take<E: HashedEntry>(&self, entry: &E) -> Value {
        match self {
            Collect::Keys => entry.key().clone(),
            Collect::Vals => entry.value().clone(),
            Collect::Entries => entry.materialize(),
        }
    }
}

/// Lock-striped bucket engine shared by `Set` and `Map`.
///
/// Single-key operations touch exactly one bucket lock. The top lock is held
/// only around bucket-shape changes (first allocation, capacity growth) and
/// ordered before any bucket lock; full-snapshot capture is the one
/// operation that takes every bucket lock, always in ascending index order.
pub(crate) struct HashedCore<E> {
    buckets: Vec<Mutex<Vec<E>>>,
    top_lock: Mutex<()>,
    size: AtomicUsize,
    snapshot_entries: Mutex<Option<List>>,
    snapshot_keys: Mutex<Option<List>>,
    snapshot_vals: Mutex<Option<List>>,
    quick_array: Mutex<Option<Arc<[Value]>>>,
}

impl<E: HashedEntry> HashedCore<E> {
    pub(crate) fn new() -> Self {
        HashedCore {
            buckets: (0..NUM_BUCKETS).map(|_| Mutex::new(Vec::new())).collect(),
            top_lock: Mutex::new(()),
            size: AtomicUsize::new(0),
            snapshot_entries: Mutex::new(None),
            snapshot_keys: Mutex::new(None),
            snapshot_vals: Mutex::new(None),
            quick_array: Mutex::new(None),
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    pub(crate) fn increment_size(&self) {
        self.size.fetch_add(1, Ordering::AcqRel);
    }

    fn bucket_idx(&self, key: &Value) -> usize {
        (value_hash(key) % NUM_BUCKETS as u64) as usize
    }

    /// Run `f` against the key's bucket with capacity already ensured.
    /// The top lock covers only the shape check, never `f` itself.
    pub(crate) fn with_bucket<R>(&self, key: &Value, f: impl FnOnce(&mut Vec<E>) -> R) -> R {
        let idx = self.bucket_idx(key);
        let top = self.top_lock.lock().unwrap();
        let mut bucket = self.buckets[idx].lock().unwrap();
        if bucket.capacity() == 0 {
            bucket.reserve_exact(BUCKET_SIZE);
        } else if bucket.len() == bucket.capacity() {
            tracing::trace!(bucket = idx, capacity = bucket.capacity(), "growing bucket");
            let additional = bucket.capacity() * (BUCKET_GROWTH_FACTOR - 1);
            bucket.reserve_exact(additional);
        }
        drop(top);
        f(&mut bucket)
    }

    pub(crate) fn find_key(&self, key: &Value) -> Option<E> {
        let idx = self.bucket_idx(key);
        let top = self.top_lock.lock().unwrap();
        let bucket = self.buckets[idx].lock().unwrap();
        drop(top);
        bucket.iter().find(|entry| entry.key() == key).cloned()
    }

    /// Drop derived views after a mutation. Entry and flattened-array caches
    /// always go; key/value caches only when the mutation affected them.
    pub(crate) fn invalidate(&self, keys: bool, vals: bool) {
        *self.snapshot_entries.lock().unwrap() = None;
        *self.quick_array.lock().unwrap() = None;
        if keys {
            *self.snapshot_keys.lock().unwrap() = None;
        }
        if vals {
            *self.snapshot_vals.lock().unwrap() = None;
        }
    }

    /// Memoized point-in-time view over all buckets.
    pub(crate) fn snapshot(&self, collect: Collect) -> List {
        let cell = match collect {
            Collect::Keys => &self.snapshot_keys,
            Collect::Vals => &self.snapshot_vals,
            Collect::Entries => &self.snapshot_entries,
        };
        let mut cached = cell.lock().unwrap();
        if let Some(list) = cached.as_ref() {
            return list.clone();
        }
        let list = {
            let _top = self.top_lock.lock().unwrap();
            let guards: Vec<_> = self.buckets.iter().map(|b| b.lock().unwrap()).collect();
            tracing::trace!(kind = ?collect, size = self.size(), "capturing snapshot");
            let mut out = Vec::with_capacity(self.size());
            for bucket in &guards {
                for entry in bucket.iter() {
                    out.push(collect.take(entry));
                }
            }
            List::from_values(out)
        };
        *cached = Some(list.clone());
        list
    }

    /// Memoized flattened-array view; `compute` runs at most once per
    /// mutation generation.
    pub(crate) fn quick_array(
        &self,
        compute: impl FnOnce() -> Result<Arc<[Value]>, FernError>,
    ) -> Result<Arc<[Value]>, FernError> {
        let mut cached = self.quick_array.lock().unwrap();
        if let Some(array) = cached.as_ref() {
            return Ok(array.clone());
        }
        let array = compute()?;
        *cached = Some(array.clone());
        Ok(array)
    }

    /// Structural hash over the sorted entries, so equal structures hash
    /// equal regardless of bucket placement.
    pub(crate) fn sorted_items_hash(&self) -> u64 {
        let items = self.snapshot(Collect::Entries);
        let mut hashes: Vec<u64> = match items.to_vec() {
            Ok(values) => values.iter().map(value_hash).collect(),
            Err(_) => Vec::new(),
        };
        hashes.sort_unstable();
        let mut result: u64 = 1;
        for h in hashes {
            result = result.wrapping_mul(31).wrapping_add(h);
        }
        result
    }
}
