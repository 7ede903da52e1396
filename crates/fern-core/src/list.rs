use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use once_cell::sync::Lazy;

use crate::error::FernError;
use crate::seq::{Comparator, Invocable, Seq};
use crate::value::{value_hash, Value};

/// Head/tail slack added when a backing array has to be reallocated, so that
/// repeated cons/cone from the new value can claim adjacent cells in O(1).
const RESIZE_EXTRA_SLOTS: usize = 15;

/// Shared backing storage for one or more list values.
///
/// An unset cell is an available slot; claiming one is a set-once write
/// performed under the matching narrow
/// claim lock, which is scoped to this storage array. Cells inside any
/// list's window are always initialized.
struct Storage {
    cells: Box<[OnceLock<Value>]>,
    head_claim: Mutex<()>,
    tail_claim: Mutex<()>,
}

impl Storage {
    fn with_cells(cells: Vec<OnceLock<Value>>) -> Arc<Self> {
        Arc::new(Storage {
            cells: cells.into_boxed_slice(),
            head_claim: Mutex::new(()),
            tail_claim: Mutex::new(()),
        })
    }
}

struct ListMeta {
    hash: u64,
    nil: bool,
    quick_str: OnceLock<String>,
    quick_rest: OnceLock<Value>,
    quick_vec: OnceLock<Arc<[Value]>>,
}

impl ListMeta {
    fn new(hash: u64, nil: bool) -> Arc<Self> {
        Arc::new(ListMeta {
            hash,
            nil,
            quick_str: OnceLock::new(),
            quick_rest: OnceLock::new(),
            quick_vec: OnceLock::new(),
        })
    }
}

/// Ordered persistent sequence: a `[start, end)` window over shared storage.
///
/// Every mutating-looking operation yields a new `List` value, possibly
/// sharing the same backing storage. Cloning is cheap (two `Arc` bumps).
#[derive(Clone)]
pub struct List {
    storage: Arc<Storage>,
    start: usize,
    end: usize,
    meta: Arc<ListMeta>,
}

static NIL: Lazy<List> = Lazy::new(|| {
    let storage = Storage::with_cells(Vec::new());
    List {
        storage,
        start: 0,
        end: 0,
        meta: ListMeta::new(0, true),
    }
});

/// The process-wide empty-sequence singleton.
pub fn nil() -> List {
    NIL.clone()
}

pub fn nil_value() -> Value {
    Value::List(nil())
}

pub fn is_nil(value: &Value) -> bool {
    matches!(value, Value::List(l) if l.is_nil())
}

impl List {
    pub fn from_values<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let cells: Vec<OnceLock<Value>> = elements
            .into_iter()
            .map(|v| {
                let cell = OnceLock::new();
                let _ = cell.set(v);
                cell
            })
            .collect();
        let end = cells.len();
        Self::from_window(Storage::with_cells(cells), 0, end)
    }

    pub fn empty() -> Self {
        Self::from_values(std::iter::empty())
    }

    fn from_window(storage: Arc<Storage>, start: usize, end: usize) -> Self {
        debug_assert!(start <= end && end <= storage.cells.len());
        let mut hash: u64 = 11;
        for idx in start..end {
            hash = hash
                .wrapping_mul(31)
                .wrapping_add(value_hash(window_cell(&storage, idx)));
        }
        List {
            storage,
            start,
            end,
            meta: ListMeta::new(hash, false),
        }
    }

    pub fn is_nil(&self) -> bool {
        self.meta.nil
    }

    /// Same logical value, not merely equal contents.
    pub fn same_value(&self, other: &List) -> bool {
        Arc::ptr_eq(&self.meta, &other.meta)
    }

    pub fn structural_hash(&self) -> u64 {
        self.meta.hash
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    fn cell(&self, idx: usize) -> &Value {
        window_cell(&self.storage, idx)
    }

    fn fail_nil(&self, op: &str) -> Result<(), FernError> {
        if self.is_nil() {
            Err(FernError::unsupported(format!("{} on NIL", op)))
        } else {
            Ok(())
        }
    }

    /// Claim the cell just ahead of the window head, if still available.
    fn claim_head(&self, e: &Value) -> bool {
        if self.start == 0 {
            return false;
        }
        let cell = &self.storage.cells[self.start - 1];
        let _guard = self.storage.head_claim.lock().unwrap();
        if cell.get().is_none() {
            let _ = cell.set(e.clone());
            true
        } else {
            false
        }
    }

    /// Claim the cell just past the window end, if still available.
    fn claim_tail(&self, e: &Value) -> bool {
        if self.end == self.storage.cells.len() {
            return false;
        }
        let cell = &self.storage.cells[self.end];
        let _guard = self.storage.tail_claim.lock().unwrap();
        if cell.get().is_none() {
            let _ = cell.set(e.clone());
            true
        } else {
            false
        }
    }
}

fn window_cell(storage: &Arc<Storage>, idx: usize) -> &Value {
    storage.cells[idx]
        .get()
        .expect("cells inside a list window are initialized")
}

fn fresh_cells(len: usize) -> Vec<OnceLock<Value>> {
    std::iter::repeat_with(OnceLock::new).take(len).collect()
}

impl Invocable for List {
    /// One argument: the window-relative position of the first equal
    /// element, or nil when absent.
    fn invoke(&self, args: &[Value]) -> Result<Value, FernError> {
        self.fail_nil("invoke")?;
        if args.len() != 1 {
            return Err(FernError::illegal(
                "only one arg is allowed, to return its position if found, or nil",
            ));
        }
        for idx in self.start..self.end {
            if *self.cell(idx) == args[0] {
                return Ok(Value::Int((idx - self.start) as i64));
            }
        }
        Ok(Value::Nil)
    }
}

impl Seq for List {
    fn size(&self) -> Result<usize, FernError> {
        self.fail_nil("size")?;
        Ok(self.len())
    }

    fn is_empty(&self) -> bool {
        // NIL is empty by definition; a regular list checks its window.
        self.len() == 0
    }

    fn first(&self) -> Result<Value, FernError> {
        self.fail_nil("first")?;
        Ok(if self.len() == 0 {
            Value::Nil
        } else {
            self.cell(self.start).clone()
        })
    }

    fn last(&self) -> Result<Value, FernError> {
        self.fail_nil("last")?;
        Ok(if self.len() == 0 {
            Value::Nil
        } else {
            self.cell(self.end - 1).clone()
        })
    }

    fn nth(&self, n: usize) -> Result<Value, FernError> {
        self.fail_nil("nth")?;
        let offset = self.start + n;
        if offset < self.end {
            Ok(self.cell(offset).clone())
        } else {
            Err(FernError::out_of_bounds(format!(
                "nth({}) on list of size {}",
                n,
                self.len()
            )))
        }
    }

    fn rest(&self) -> Result<Value, FernError> {
        self.fail_nil("rest")?;
        Ok(self
            .meta
            .quick_rest
            .get_or_init(|| {
                if self.len() <= 1 {
                    nil_value()
                } else {
                    Value::List(List::from_window(
                        self.storage.clone(),
                        self.start + 1,
                        self.end,
                    ))
                }
            })
            .clone())
    }

    fn items(&self) -> Result<Value, FernError> {
        Err(FernError::unsupported("a list has no entries view"))
    }

    fn cons(&self, e: Value) -> Result<Value, FernError> {
        self.fail_nil("cons")?;
        if self.claim_head(&e) {
            return Ok(Value::List(List::from_window(
                self.storage.clone(),
                self.start - 1,
                self.end,
            )));
        }
        // No adjacent slot: reallocate with head slack, element at its edge.
        let size = self.len();
        let cells = fresh_cells(RESIZE_EXTRA_SLOTS + size);
        let _ = cells[RESIZE_EXTRA_SLOTS - 1].set(e);
        for (offset, idx) in (self.start..self.end).enumerate() {
            let _ = cells[RESIZE_EXTRA_SLOTS + offset].set(self.cell(idx).clone());
        }
        let len = cells.len();
        Ok(Value::List(List::from_window(
            Storage::with_cells(cells),
            RESIZE_EXTRA_SLOTS - 1,
            len,
        )))
    }

    fn cone(&self, e: Value) -> Result<Value, FernError> {
        self.fail_nil("cone")?;
        if self.claim_tail(&e) {
            return Ok(Value::List(List::from_window(
                self.storage.clone(),
                self.start,
                self.end + 1,
            )));
        }
        let size = self.len();
        let cells = fresh_cells(size + RESIZE_EXTRA_SLOTS);
        for (offset, idx) in (self.start..self.end).enumerate() {
            let _ = cells[offset].set(self.cell(idx).clone());
        }
        let _ = cells[size].set(e);
        Ok(Value::List(List::from_window(
            Storage::with_cells(cells),
            0,
            size + 1,
        )))
    }

    fn sorted_by(&self, cmp: &Comparator) -> Result<Value, FernError> {
        self.fail_nil("sorted")?;
        let mut els: Vec<Value> = (self.start..self.end).map(|i| self.cell(i).clone()).collect();
        els.sort_by(|a, b| cmp(a, b));
        Ok(Value::List(List::from_values(els)))
    }

    fn to_vec(&self) -> Result<Arc<[Value]>, FernError> {
        self.fail_nil("to_vec")?;
        Ok(self
            .meta
            .quick_vec
            .get_or_init(|| {
                (self.start..self.end)
                    .map(|i| self.cell(i).clone())
                    .collect()
            })
            .clone())
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        if self.is_nil() || other.is_nil() {
            return self.is_nil() && other.is_nil();
        }
        if self.len() != other.len() {
            return false;
        }
        (0..self.len()).all(|i| self.cell(self.start + i) == other.cell(other.start + i))
    }
}

impl Eq for List {}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            return write!(f, "NIL");
        }
        let rendered = self.meta.quick_str.get_or_init(|| {
            let mut out = String::from("[");
            for idx in self.start..self.end {
                if idx > self.start {
                    out.push_str(", ");
                }
                out.push_str(&self.cell(idx).to_string());
            }
            out.push(']');
            out
        });
        write!(f, "{}", rendered)
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(values: &[i64]) -> List {
        List::from_values(values.iter().map(|&n| Value::Int(n)))
    }

    #[test]
    fn window_sharing_after_cons() {
        let a = list(&[1, 2, 3]);
        let b = match a.cons(Value::Int(0)).unwrap() {
            Value::List(l) => l,
            other => panic!("expected list, got {}", other),
        };
        assert_eq!(b.len(), 4);
        assert_eq!(b.first().unwrap(), Value::Int(0));
        // a is untouched
        assert_eq!(a.len(), 3);
        assert_eq!(a.first().unwrap(), Value::Int(1));
    }

    #[test]
    fn adjacent_slot_claimed_once() {
        let a = match list(&[1]).cons(Value::Int(0)).unwrap() {
            Value::List(l) => l,
            _ => unreachable!(),
        };
        // First cons onto the reallocated list claims the adjacent slot...
        let b = a.cons(Value::Int(-1)).unwrap();
        // ...so the second must reallocate rather than overwrite it.
        let c = a.cons(Value::Int(-2)).unwrap();
        assert_eq!(b, Value::List(list(&[-1, 0, 1])));
        assert_eq!(c, Value::List(list(&[-2, 0, 1])));
    }

    #[test]
    fn nil_is_a_singleton() {
        assert!(nil().same_value(&nil()));
        assert!(nil().is_empty());
        assert!(nil() != List::empty());
        assert!(nil().first().is_err());
        assert!(nil().size().is_err());
    }

    #[test]
    fn invoke_finds_window_relative_position() {
        let l = list(&[5, 6, 7]);
        let tail = match l.rest().unwrap() {
            Value::List(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(tail.invoke(&[Value::Int(7)]).unwrap(), Value::Int(1));
        assert_eq!(tail.invoke(&[Value::Int(5)]).unwrap(), Value::Nil);
    }
}
