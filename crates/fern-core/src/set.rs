use std::fmt;
use std::sync::Arc;

use crate::error::FernError;
use crate::hashed::{Collect, HashedCore, HashedEntry};
use crate::seq::{Assoc, Comparator, Hashed, Invocable, Seq};
use crate::value::Value;

#[derive(Clone)]
struct SetEntry {
    key: Value,
}

impl HashedEntry for SetEntry {
    fn key(&self) -> &Value {
        &self.key
    }

    fn value(&self) -> &Value {
        &self.key
    }

    fn materialize(&self) -> Value {
        self.key.clone()
    }
}

/// Persistent hashed set over the striped-bucket engine.
///
/// `assoc_key` follows the hybrid contract: inserting a fresh key grows the
/// set in place ([`Assoc::Grew`], same handle), re-associating an existing
/// key yields a rebuilt set ([`Assoc::Replaced`]).
#[derive(Clone)]
pub struct Set {
    core: Arc<HashedCore<SetEntry>>,
}

impl Set {
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let set = Set {
            core: Arc::new(HashedCore::new()),
        };
        for entry in entries {
            set.store(entry);
        }
        set
    }

    pub fn empty() -> Self {
        Self::from_entries(std::iter::empty())
    }

    pub fn same_handle(&self, other: &Set) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }

    pub fn structural_hash(&self) -> u64 {
        self.core.sorted_items_hash()
    }

    pub fn len(&self) -> usize {
        self.core.size()
    }

    fn store(&self, key: Value) {
        let inserted = self.core.with_bucket(&key, |bucket| {
            if bucket.iter().any(|entry| entry.key == key) {
                false
            } else {
                bucket.push(SetEntry { key: key.clone() });
                true
            }
        });
        if inserted {
            self.core.increment_size();
            self.core.invalidate(true, true);
        }
    }
}

impl Invocable for Set {
    /// One argument, a key: returns the stored key, or nil when absent.
    fn invoke(&self, args: &[Value]) -> Result<Value, FernError> {
        if args.len() != 1 {
            return Err(FernError::illegal(
                "only one arg is allowed, a key, to return its associated value",
            ));
        }
        self.get(&args[0])
    }
}

impl Seq for Set {
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
        Ok(self.assoc_key(e)?.into_value())
    }

    fn cone(&self, e: Value) -> Result<Value, FernError> {
        self.cons(e)
    }

    fn sorted_by(&self, cmp: &Comparator) -> Result<Value, FernError> {
        self.core.snapshot(Collect::Entries).sorted_by(cmp)
    }

    fn to_vec(&self) -> Result<Arc<[Value]>, FernError> {
        self.core
            .quick_array(|| self.core.snapshot(Collect::Entries).to_vec())
    }
}

impl Hashed for Set {
    fn keys(&self) -> Result<Value, FernError> {
        self.items()
    }

    fn values(&self) -> Result<Value, FernError> {
        self.items()
    }

    fn get(&self, key: &Value) -> Result<Value, FernError> {
        Ok(self
            .core
            .find_key(key)
            .map(|entry| entry.key)
            .unwrap_or(Value::Nil))
    }

    fn contains(&self, key: &Value) -> bool {
        self.core.find_key(key).is_some()
    }

    fn assoc(&self, _key: Value, _val: Value) -> Result<Assoc, FernError> {
        Err(FernError::access_denied(
            "a set does not support key/value association",
        ))
    }

    fn assoc_key(&self, key: Value) -> Result<Assoc, FernError> {
        if self.core.find_key(&key).is_none() {
            self.store(key);
            return Ok(Assoc::Grew(Value::Set(self.clone())));
        }
        let entries = self.core.snapshot(Collect::Entries);
        let replacement = Set::from_entries(std::iter::once(key.clone()));
        for entry in entries.iter_values()? {
            if entry != key {
                replacement.store(entry);
            }
        }
        Ok(Assoc::Replaced(Value::Set(replacement)))
    }
}

impl PartialEq for Set {
    fn eq(&self, other: &Self) -> bool {
        if self.core.size() != other.core.size() {
            return false;
        }
        let lhs = self.core.snapshot(Collect::Entries).sorted();
        let rhs = other.core.snapshot(Collect::Entries).sorted();
        matches!((lhs, rhs), (Ok(a), Ok(b)) if a == b)
    }
}

impl Eq for Set {}

impl fmt::Display for Set {
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

impl fmt::Debug for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
