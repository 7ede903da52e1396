use std::fmt;
use std::sync::Arc;

use crate::error::FernError;
use crate::hashed::{Collect, HashedCore, HashedEntry};
use crate::list::List;
use crate::seq::{Assoc, Comparator, Hashed, Invocable, Seq};
use crate::value::Value;

#[derive(Clone)]
struct MapEntry {
    key: Value,
    val: Value,
}

impl HashedEntry for MapEntry {
    fn key(&self) -> &Value {
        &self.key
    }

    fn value(&self) -> &Value {
        &self.val
    }

    fn materialize(&self) -> Value {
        Value::List(List::from_values([self.key.clone(), self.val.clone()]))
    }
}

/// Persistent hashed map over the striped-bucket engine.
///
/// `assoc` is hybrid by contract: a fresh key is stored in place and the
/// same handle comes back as [`Assoc::Grew`]; updating an existing key
/// builds a replacement map, [`Assoc::Replaced`]. Entries materialize in
/// snapshots as two-element `[key, value]` lists, which is how the map
/// reuses every sequence-level algorithm.
#[derive(Clone)]
pub struct Map {
    core: Arc<HashedCore<MapEntry>>,
}

impl Map {
    /// Builds a map from alternating `key, value` arguments.
    pub fn from_pairs<I>(key_val_pairs: I) -> Result<Self, FernError>
    where
        I: IntoIterator<Item = Value>,
    {
        let flat: Vec<Value> = key_val_pairs.into_iter().collect();
        if flat.len() % 2 != 0 {
            return Err(FernError::illegal(
                "even number of args required: (key, val)*",
            ));
        }
        let map = Map {
            core: Arc::new(HashedCore::new()),
        };
        for pair in flat.chunks(2) {
            map.store(pair[0].clone(), pair[1].clone());
        }
        Ok(map)
    }

    pub fn empty() -> Self {
        Map {
            core: Arc::new(HashedCore::new()),
        }
    }

    pub fn same_handle(&self, other: &Map) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }

    pub fn structural_hash(&self) -> u64 {
        self.core.sorted_items_hash()
    }

    pub fn len(&self) -> usize {
        self.core.size()
    }

    fn store(&self, key: Value, val: Value) {
        let inserted = self.core.with_bucket(&key, |bucket| {
            if let Some(entry) = bucket.iter_mut().find(|entry| entry.key == key) {
                entry.val = val.clone();
                false
            } else {
                bucket.push(MapEntry {
                    key: key.clone(),
                    val: val.clone(),
                });
                true
            }
        });
        if inserted {
            self.core.increment_size();
        }
        // A new key changes the key view too; an update only values/entries.
        self.core.invalidate(inserted, true);
    }
}

impl Invocable for Map {
    /// One argument, a key: returns the associated value, or nil.
    fn invoke(&self, args: &[Value]) -> Result<Value, FernError> {
        if args.len() != 1 {
            return Err(FernError::illegal(
                "only one arg is allowed, a key, to return its associated value",
            ));
        }
        self.get(&args[0])
    }
}

impl Seq for Map {
    fn size(&self) -> Result<usize, FernError> {
        Ok(self.core.size())
    }

    fn is_empty(&self) -> bool {
        self.core.size() == 0
    }

    fn first(&self) -> Result<Value, FernError> {
        self.core.snapshot(Collect::Entries).first()
    }

    fn last(&self) -> Result<Value, FernError> {
        self.core.snapshot(Collect::Entries).last()
    }

    fn nth(&self, n: usize) -> Result<Value, FernError> {
        self.core.snapshot(Collect::Entries).nth(n)
    }

    fn rest(&self) -> Result<Value, FernError> {
        self.core.snapshot(Collect::Entries).rest()
    }

    fn items(&self) -> Result<Value, FernError> {
        Ok(Value::List(self.core.snapshot(Collect::Entries)))
    }

    fn cons(&self, e: Value) -> Result<Value, FernError> {
        match e.as_seq() {
            Some(entry) if entry.size()? == 2 => {
                let key = entry.first()?;
                let val = entry.last()?;
                Ok(self.assoc(key, val)?.into_value())
            }
            _ => Err(FernError::illegal(format!(
                "expected a two-element sequence entry, got: {}",
                e
            ))),
        }
    }

    fn cone(&self, e: Value) -> Result<Value, FernError> {
        self.cons(e)
    }

    fn sorted_by(&self, cmp: &Comparator) -> Result<Value, FernError> {
        self.core.snapshot(Collect::Entries).sorted_by(cmp)
    }

    /// Flattened `[k1, v1, k2, v2, ...]` view, computed once per mutation
    /// generation.
    fn to_vec(&self) -> Result<Arc<[Value]>, FernError> {
        self.core.quick_array(|| {
            let entries = self.core.snapshot(Collect::Entries);
            let mut flat = Vec::with_capacity(entries.len() * 2);
            for entry in entries.iter_values()? {
                let pair = entry
                    .as_seq()
                    .ok_or_else(|| FernError::unsupported("map entry is not a sequence"))?;
                flat.push(pair.first()?);
                flat.push(pair.last()?);
            }
            Ok(Arc::from(flat))
        })
    }
}

impl Hashed for Map {
    fn keys(&self) -> Result<Value, FernError> {
        Ok(Value::List(self.core.snapshot(Collect::Keys)))
    }

    fn values(&self) -> Result<Value, FernError> {
        Ok(Value::List(self.core.snapshot(Collect::Vals)))
    }

    fn get(&self, key: &Value) -> Result<Value, FernError> {
        Ok(self
            .core
            .find_key(key)
            .map(|entry| entry.val)
            .unwrap_or(Value::Nil))
    }

    fn contains(&self, key: &Value) -> bool {
        self.core.find_key(key).is_some()
    }

    fn assoc(&self, key: Value, val: Value) -> Result<Assoc, FernError> {
        if self.core.find_key(&key).is_none() {
            self.store(key, val);
            return Ok(Assoc::Grew(Value::Map(self.clone())));
        }
        let entries = self.core.snapshot(Collect::Entries);
        let replacement = Map::empty();
        replacement.store(key.clone(), val);
        for entry in entries.iter_values()? {
            let pair = entry
                .as_seq()
                .ok_or_else(|| FernError::unsupported("map entry is not a sequence"))?;
            let entry_key = pair.first()?;
            if entry_key != key {
                replacement.store(entry_key, pair.last()?);
            }
        }
        Ok(Assoc::Replaced(Value::Map(replacement)))
    }

    fn assoc_key(&self, _key: Value) -> Result<Assoc, FernError> {
        Err(FernError::access_denied(
            "a map does not support single-argument association",
        ))
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        if self.core.size() != other.core.size() {
            return false;
        }
        let lhs = self.core.snapshot(Collect::Entries).sorted();
        let rhs = other.core.snapshot(Collect::Entries).sorted();
        matches!((lhs, rhs), (Ok(a), Ok(b)) if a == b)
    }
}

impl Eq for Map {}

impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.core.snapshot(Collect::Entries);
        write!(f, "{{")?;
        for (idx, entry) in entries.iter_values().into_iter().flatten().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", entry)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
