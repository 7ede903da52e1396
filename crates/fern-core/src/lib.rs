//! Runtime core for a small functional language: persistent, structurally
//! shared collections, fixed and variadic function signatures with
//! stack-safe tail recursion, a namespace registry, and a higher-order
//! library over both.

pub mod args;
pub mod error;
pub mod func;
pub mod higher;
pub mod list;
pub mod map;
pub mod ns;
pub mod seq;
pub mod set;
pub mod stack;
pub mod value;

mod hashed;

pub use args::ArgDefs;
pub use error::FernError;
pub use func::{defargs, defn, defn_named, defpred, defvarargs, FnScope, Func};
pub use list::List;
pub use map::Map;
pub use seq::{Assoc, Hashed, Invocable, Seq};
pub use set::Set;
pub use value::{TypeTag, Value};

/// Builds a [`List`] value out of anything convertible into [`Value`].
#[macro_export]
macro_rules! list {
    () => {
        $crate::List::empty()
    };
    ($($x:expr),+ $(,)?) => {
        $crate::List::from_values(vec![$($crate::Value::from($x)),+])
    };
}
