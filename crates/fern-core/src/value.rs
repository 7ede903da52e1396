use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::func::Func;
use crate::list::List;
use crate::map::Map;
use crate::seq::Seq;
use crate::set::Set;

/// The uniform dynamic datum flowing through the runtime: collection
/// elements, function arguments and results.
///
/// `Nil` is the null datum (what an empty list's `first` yields). The empty
/// *sequence* singleton is a flagged [`List`], see [`crate::list::nil`].
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    List(List),
    Set(Set),
    Map(Map),
    Func(Arc<Func>),
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Nil => TypeTag::Any,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::Str(_) => TypeTag::Str,
            Value::List(_) => TypeTag::List,
            Value::Set(_) => TypeTag::Set,
            Value::Map(_) => TypeTag::Map,
            Value::Func(_) => TypeTag::Fn,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_tag().name()
    }

    /// View as a sequence, when the value is one.
    pub fn as_seq(&self) -> Option<&dyn Seq> {
        match self {
            Value::List(l) => Some(l),
            Value::Set(s) => Some(s),
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_seq(&self) -> bool {
        self.as_seq().is_some()
    }

    /// Handle identity for the shared-structure variants. Non-handle values
    /// are never identical, only equal.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => a.same_value(b),
            (Value::Set(a), Value::Set(b)) => a.same_handle(b),
            (Value::Map(a), Value::Map(b)) => a.same_handle(b),
            (Value::Func(a), Value::Func(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Nil => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::List(l) => l.structural_hash().hash(state),
            Value::Set(s) => s.structural_hash().hash(state),
            Value::Map(m) => m.structural_hash().hash(state),
            Value::Func(f) => f.unique_seq().hash(state),
        }
    }
}

/// One stable hash for a value, used for bucket placement and element-wise
/// sequence hashes.
pub fn value_hash(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(l) => write!(f, "{}", l),
            Value::Set(s) => write!(f, "{}", s),
            Value::Map(m) => write!(f, "{}", m),
            Value::Func(func) => write!(f, "{}", func),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s.as_str()))
    }
}

impl From<List> for Value {
    fn from(l: List) -> Self {
        Value::List(l)
    }
}

impl From<Set> for Value {
    fn from(s: Set) -> Self {
        Value::Set(s)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

impl From<Arc<Func>> for Value {
    fn from(f: Arc<Func>) -> Self {
        Value::Func(f)
    }
}

/// Parameter/return type tags for function signatures.
///
/// `Any` accepts everything; `Seq` accepts any of the sequence kinds. A
/// closed set is enough for signature rendering and eager composition
/// checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Any,
    Bool,
    Int,
    Float,
    Str,
    Seq,
    List,
    Set,
    Map,
    Fn,
}

impl TypeTag {
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Any => "Any",
            TypeTag::Bool => "Bool",
            TypeTag::Int => "Int",
            TypeTag::Float => "Float",
            TypeTag::Str => "Str",
            TypeTag::Seq => "Seq",
            TypeTag::List => "List",
            TypeTag::Set => "Set",
            TypeTag::Map => "Map",
            TypeTag::Fn => "Fn",
        }
    }

    /// Assignability lattice used by eager compose checking.
    pub fn is_assignable_from(&self, other: TypeTag) -> bool {
        match self {
            TypeTag::Any => true,
            TypeTag::Seq => matches!(
                other,
                TypeTag::Seq | TypeTag::List | TypeTag::Set | TypeTag::Map
            ),
            tag => *tag == other,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
