use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::FernError;
use crate::value::Value;

/// Element ordering used by `sorted`.
pub type Comparator = dyn Fn(&Value, &Value) -> Ordering + Send + Sync;

/// Ordering of last resort: nil sorts first, everything else by its
/// rendered form.
pub fn default_compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Nil, Value::Nil) => Ordering::Equal,
        (Value::Nil, _) => Ordering::Less,
        (_, Value::Nil) => Ordering::Greater,
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Anything callable with zero-or-more arguments.
pub trait Invocable: Send + Sync {
    fn invoke(&self, args: &[Value]) -> Result<Value, FernError>;
}

/// Uniform read/construction interface over ordered contents.
///
/// Implemented by [`crate::list::List`] directly and by the hashed
/// structures through their entries snapshot. Operations that need contents
/// fail with [`FernError::Unsupported`] on the NIL singleton.
pub trait Seq: Invocable {
    fn size(&self) -> Result<usize, FernError>;
    fn is_empty(&self) -> bool;

    fn first(&self) -> Result<Value, FernError>;
    fn last(&self) -> Result<Value, FernError>;
    fn nth(&self, n: usize) -> Result<Value, FernError>;
    fn rest(&self) -> Result<Value, FernError>;
    /// Entries snapshot. Only hashed structures support this; a plain list
    /// has no separate entries view.
    fn items(&self) -> Result<Value, FernError>;

    fn cons(&self, e: Value) -> Result<Value, FernError>;
    fn cone(&self, e: Value) -> Result<Value, FernError>;

    fn sorted(&self) -> Result<Value, FernError> {
        self.sorted_by(&default_compare)
    }
    fn sorted_by(&self, cmp: &Comparator) -> Result<Value, FernError>;

    /// Materialized contents, computed once and cached by implementations.
    fn to_vec(&self) -> Result<Arc<[Value]>, FernError>;

    fn iter_values(&self) -> Result<Box<dyn Iterator<Item = Value>>, FernError> {
        let items = self.to_vec()?;
        Ok(Box::new(items.to_vec().into_iter()))
    }
}

/// Key-based lookup over a sequence-compatible structure.
pub trait Hashed: Seq {
    fn keys(&self) -> Result<Value, FernError>;
    fn values(&self) -> Result<Value, FernError>;
    /// The value stored under `key`, or `Value::Nil` when absent.
    fn get(&self, key: &Value) -> Result<Value, FernError>;
    fn contains(&self, key: &Value) -> bool;

    /// Key/value association (maps). Sets reject this arm.
    fn assoc(&self, key: Value, val: Value) -> Result<Assoc, FernError>;
    /// Single-argument association (sets). Maps reject this arm with an
    /// access-denied signal.
    fn assoc_key(&self, key: Value) -> Result<Assoc, FernError>;
}

/// Outcome of a hashed association.
///
/// Inserting a fresh key mutates the structure in place and hands back the
/// same handle; updating an existing key builds a replacement. Callers that
/// only want the resulting structure use [`Assoc::into_value`]; the
/// discriminant is part of the contract, not an implementation accident.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Assoc {
    /// The structure grew in place; the carried value is the original handle.
    Grew(Value),
    /// An existing key was updated; the carried value is a new structure.
    Replaced(Value),
}

impl Assoc {
    pub fn into_value(self) -> Value {
        match self {
            Assoc::Grew(v) | Assoc::Replaced(v) => v,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Assoc::Grew(v) | Assoc::Replaced(v) => v,
        }
    }

    pub fn grew_in_place(&self) -> bool {
        matches!(self, Assoc::Grew(_))
    }
}
