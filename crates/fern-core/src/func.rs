use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::args::ArgDefs;
use crate::error::FernError;
use crate::list::List;
use crate::seq::Invocable;
use crate::stack::{Frame, FrameStack};
use crate::value::{TypeTag, Value};

/// Documented arity cap for a single signature.
const MAX_ARGS: usize = 254;
const UNDOCUMENTED: &str = "No documentation available";
const ANONYMOUS_FN_NAME: &str = "ANONYMOUS";

static UNIQUE_FN_ID: AtomicU64 = AtomicU64::new(0);

/// Per-thread invocation state for one function body: its frame stack, the
/// tail-recursion request flag, and the previous round's memoized result.
struct BodyState {
    frames: FrameStack,
    recur_requested: bool,
    last_result: Value,
}

impl Default for BodyState {
    fn default() -> Self {
        BodyState {
            frames: FrameStack::new(),
            recur_requested: false,
            last_result: Value::Nil,
        }
    }
}

thread_local! {
    // Keyed by function id: two threads invoking the same function never
    // observe each other's frames or recursion flags.
    static BODY_STATES: RefCell<HashMap<u64, BodyState>> = RefCell::new(HashMap::new());
}

fn with_state<R>(id: u64, f: impl FnOnce(&mut BodyState) -> R) -> R {
    BODY_STATES.with(|cell| f(cell.borrow_mut().entry(id).or_default()))
}

/// Pops the pushed frame on every exit path, normal or failing, and drops
/// the thread's state entry once the outermost frame is gone.
struct FrameGuard {
    id: u64,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        BODY_STATES.with(|cell| {
            let mut states = cell.borrow_mut();
            if let Some(state) = states.get_mut(&self.id) {
                state.frames.pop();
                state.recur_requested = false;
                if state.frames.is_empty() {
                    states.remove(&self.id);
                }
            }
        });
    }
}

pub type BodyFn = dyn Fn(&FnScope) -> Result<Value, FernError> + Send + Sync;

/// The view a function body gets of its own invocation: positional and
/// variadic argument access against the current thread's top frame, plus
/// the tail-recursion entry point.
pub struct FnScope<'a> {
    func: &'a Func,
}

impl FnScope<'_> {
    pub fn arity(&self) -> usize {
        self.func.defs.size()
    }

    pub fn is_vararg(&self) -> bool {
        self.func.defs.is_vararg()
    }

    fn top_frame(&self) -> Result<Frame, FernError> {
        with_state(self.func.seq, |state| state.frames.top().cloned())
            .ok_or_else(|| FernError::illegal("no active call frame on this thread"))
    }

    pub fn arglen(&self) -> Result<usize, FernError> {
        Ok(self.top_frame()?.len())
    }

    pub fn vararglen(&self) -> Result<usize, FernError> {
        if !self.is_vararg() {
            return Ok(0);
        }
        Ok(self.top_frame()?.len() - self.arity().saturating_sub(1))
    }

    /// The whole argument frame.
    pub fn args(&self) -> Result<Vec<Value>, FernError> {
        self.top_frame()
    }

    /// 1-based positional access; index 0 yields all arguments as a list.
    pub fn arg(&self, idx: usize) -> Result<Value, FernError> {
        let frame = self.top_frame()?;
        if idx == 0 {
            return Ok(Value::List(List::from_values(frame)));
        }
        frame.get(idx - 1).cloned().ok_or_else(|| {
            FernError::out_of_bounds(format!("arg {} of {}", idx, frame.len()))
        })
    }

    /// The variadic tail of the frame.
    pub fn varargs(&self) -> Result<Vec<Value>, FernError> {
        if !self.is_vararg() {
            return Err(FernError::out_of_bounds("no varargs on a fixed-arity body"));
        }
        let frame = self.top_frame()?;
        Ok(frame[self.arity().saturating_sub(1)..].to_vec())
    }

    /// 1-based variadic-tail access; index 0 yields the whole tail as a list.
    pub fn vararg(&self, idx: usize) -> Result<Value, FernError> {
        let varargs = self.varargs()?;
        if idx == 0 {
            return Ok(Value::List(List::from_values(varargs)));
        }
        varargs.get(idx - 1).cloned().ok_or_else(|| {
            FernError::out_of_bounds(format!("vararg {} of {}", idx, varargs.len()))
        })
    }

    /// String-named accessor sugar: `$#` (argument count), `$N`, `$$#`
    /// (variadic count), `$$N`.
    pub fn arg_named(&self, name: &str) -> Result<Value, FernError> {
        match name {
            "$#" => return Ok(Value::Int(self.arglen()? as i64)),
            "$$#" => return Ok(Value::Int(self.vararglen()? as i64)),
            _ => {}
        }
        let (digits, variadic) = match name.strip_prefix("$$") {
            Some(rest) => (rest, true),
            None => match name.strip_prefix('$') {
                Some(rest) => (rest, false),
                None => return Err(FernError::illegal(format!("bad accessor: {}", name))),
            },
        };
        let idx: usize = digits
            .parse()
            .map_err(|_| FernError::illegal(format!("bad accessor: {}", name)))?;
        if variadic {
            self.vararg(idx)
        } else {
            self.arg(idx)
        }
    }

    /// Request another pass of the trampoline driver loop against `args`.
    ///
    /// Does not re-enter the body: it flags the request, swaps the current
    /// thread's top frame, and returns the previous round's memoized result
    /// (nil on the first pass). The body is expected to return this value;
    /// the driver discards it and loops.
    pub fn tail_recur(&self, args: Vec<Value>) -> Value {
        with_state(self.func.seq, |state| {
            state.recur_requested = true;
            state.frames.replace_top(args);
            state.last_result.clone()
        })
    }

    /// Ordinary (stack-growing) self-recursion.
    pub fn call_self(&self, args: &[Value]) -> Result<Value, FernError> {
        self.func.invoke(args)
    }
}

/// An invocable function: argument signature, body, return tag, and a
/// stable unique identity.
pub struct Func {
    seq: u64,
    unique_id: String,
    name: String,
    doc: String,
    defs: ArgDefs,
    ret: TypeTag,
    body: Box<BodyFn>,
    quick_str: OnceLock<String>,
}

impl Func {
    pub fn new(
        name: Option<&str>,
        doc: Option<&str>,
        defs: ArgDefs,
        ret: TypeTag,
        body: Box<BodyFn>,
    ) -> Result<Arc<Func>, FernError> {
        if defs.size() > MAX_ARGS {
            return Err(FernError::illegal(format!("max arity {} exceeded", MAX_ARGS)));
        }
        let seq = UNIQUE_FN_ID.fetch_add(1, Ordering::Relaxed);
        let name = name.unwrap_or(ANONYMOUS_FN_NAME).to_string();
        let unique_id = format!("fn-{} {} [{}] => {}", seq, name, defs.moniker(), ret);
        Ok(Arc::new(Func {
            seq,
            unique_id,
            name,
            doc: doc.unwrap_or(UNDOCUMENTED).to_string(),
            defs,
            ret,
            body,
            quick_str: OnceLock::new(),
        }))
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub(crate) fn unique_seq(&self) -> u64 {
        self.seq
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn arg_defs(&self) -> &ArgDefs {
        &self.defs
    }

    pub fn return_tag(&self) -> TypeTag {
        self.ret
    }

    fn check_arity(&self, args: &[Value]) -> Result<(), FernError> {
        let arity = self.defs.size();
        if self.defs.is_vararg() {
            if args.len() + 1 < arity {
                return Err(FernError::arity(format!(
                    "{} needs at least {} args ({}), got {}",
                    self.name,
                    arity - 1,
                    self.defs.moniker(),
                    args.len()
                )));
            }
        } else if args.len() != arity {
            return Err(FernError::arity(format!(
                "{} needs {} args ({}), got {}",
                self.name,
                arity,
                self.defs.moniker(),
                args.len()
            )));
        }
        Ok(())
    }

    /// Trampoline driver: rerun the body for as long as it keeps flagging
    /// tail-recursion requests, then hand the final result out.
    fn run_body(&self) -> Result<Value, FernError> {
        let scope = FnScope { func: self };
        loop {
            let result = (self.body)(&scope)?;
            let recurred = with_state(self.seq, |state| {
                state.last_result = result.clone();
                std::mem::take(&mut state.recur_requested)
            });
            if !recurred {
                return Ok(result);
            }
        }
    }
}

impl Invocable for Func {
    fn invoke(&self, args: &[Value]) -> Result<Value, FernError> {
        self.check_arity(args)?;
        with_state(self.seq, |state| state.frames.push(args.to_vec()));
        let _guard = FrameGuard { id: self.seq };
        self.run_body()
    }
}

impl PartialEq for Func {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for Func {}

impl fmt::Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.quick_str.get_or_init(|| {
            format!(
                "fn/{} {} ({}) -> {}\n{}",
                self.defs.size(),
                self.name,
                self.defs,
                self.ret,
                self.doc
            )
        });
        write!(f, "{}", rendered)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.unique_id)
    }
}

// Factory surface: the construction vocabulary bodies are written against.

pub fn defargs(tags: &[TypeTag]) -> ArgDefs {
    ArgDefs::fixed(tags)
}

pub fn defvarargs(tags: &[TypeTag]) -> ArgDefs {
    ArgDefs::variadic(tags)
}

pub fn defn<F>(defs: ArgDefs, ret: TypeTag, body: F) -> Result<Arc<Func>, FernError>
where
    F: Fn(&FnScope) -> Result<Value, FernError> + Send + Sync + 'static,
{
    Func::new(None, None, defs, ret, Box::new(body))
}

pub fn defn_named<F>(
    name: &str,
    doc: Option<&str>,
    defs: ArgDefs,
    ret: TypeTag,
    body: F,
) -> Result<Arc<Func>, FernError>
where
    F: Fn(&FnScope) -> Result<Value, FernError> + Send + Sync + 'static,
{
    Func::new(Some(name), doc, defs, ret, Box::new(body))
}

/// A predicate: variadic over anything, returning `Bool`.
pub fn defpred<F>(body: F) -> Result<Arc<Func>, FernError>
where
    F: Fn(&FnScope) -> Result<Value, FernError> + Send + Sync + 'static,
{
    Func::new(
        None,
        None,
        ArgDefs::variadic(&[TypeTag::Any]),
        TypeTag::Bool,
        Box::new(body),
    )
}
