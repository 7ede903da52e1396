//! Higher-order library over invocables and sequences: composition,
//! currying, folds, mapping, filtering, cartesian generation and the
//! slicing family.

use std::sync::Arc;

use crate::error::FernError;
use crate::func::{defn, Func};
use crate::list::{self, List};
use crate::seq::{Invocable, Seq};
use crate::value::Value;

fn as_seq(value: &Value) -> Result<&dyn Seq, FernError> {
    value
        .as_seq()
        .ok_or_else(|| FernError::type_mismatch("Seq", value.type_tag().name()))
}

/// Invokes a predicate and demands a boolean back.
pub fn is_true(pred: &Func, args: &[Value]) -> Result<bool, FernError> {
    match pred.invoke(args)? {
        Value::Bool(b) => Ok(b),
        other => Err(FernError::type_mismatch("Bool", other.type_tag().name())),
    }
}

/// Builds the left-to-right pipeline of `stages`: the result takes the
/// first stage's signature, threads each result into the next stage, and
/// reports the final stage's return tag.
///
/// Signature compatibility is checked eagerly: every stage past the first
/// must take exactly one argument assignable from its predecessor's
/// return tag.
pub fn compose(stages: &[Arc<Func>]) -> Result<Arc<Func>, FernError> {
    let first = stages
        .first()
        .ok_or_else(|| FernError::illegal("at least 1 fn is required"))?;
    let mut prev_ret = first.return_tag();
    for stage in &stages[1..] {
        if stage.arg_defs().size() != 1 {
            return Err(FernError::illegal(format!(
                "expected fn/1 in pipeline, got: {:?}",
                stage
            )));
        }
        let accepts = stage.arg_defs().get(0)?;
        if !accepts.is_assignable_from(prev_ret) {
            return Err(FernError::type_mismatch(
                accepts.name(),
                prev_ret.name(),
            ));
        }
        prev_ret = stage.return_tag();
    }
    let stages: Vec<Arc<Func>> = stages.to_vec();
    defn(first.arg_defs().clone(), prev_ret, move |scope| {
        let mut result = stages[0].invoke(&scope.args()?)?;
        for stage in &stages[1..] {
            result = stage.invoke(&[result])?;
        }
        Ok(result)
    })
}

/// Invokes `func` with a sequence's elements as its argument frame.
pub fn apply(func: &Func, args: &Value) -> Result<Value, FernError> {
    func.invoke(&as_seq(args)?.to_vec()?)
}

/// Partial application: binds the leading arguments now and returns a
/// function over the remaining tail of the signature.
pub fn curry(func: &Arc<Func>, bound: &[Value]) -> Result<Arc<Func>, FernError> {
    if bound.is_empty() {
        return Ok(Arc::clone(func));
    }
    if !func.arg_defs().is_vararg() && bound.len() > func.arg_defs().size() {
        return Err(FernError::illegal(format!(
            "too many args ({}) for fn: {:?}",
            bound.len(),
            func
        )));
    }
    let tail_defs = func.arg_defs().from(bound.len())?;
    let inner = Arc::clone(func);
    let bound: Vec<Value> = bound.to_vec();
    defn(tail_defs, func.return_tag(), move |scope| {
        let mut full = bound.clone();
        full.extend(scope.args()?);
        inner.invoke(&full)
    })
}

/// Folds a sequence with its own first element as the seed.
pub fn reduce(func: &Func, vals: &Value) -> Result<Value, FernError> {
    let seq = as_seq(vals)?;
    reduce_init(func, seq.first()?, &seq.rest()?)
}

/// Folds a sequence left to right with `func`, which must be a two-argument
/// reducer. An empty (or nil) sequence folds to `init` untouched.
pub fn reduce_init(func: &Func, init: Value, vals: &Value) -> Result<Value, FernError> {
    if func.arg_defs().size() != 2 {
        return Err(FernError::illegal(format!("expected fn/2, got: {:?}", func)));
    }
    if list::is_nil(vals) {
        return Ok(init);
    }
    let mut acc = init;
    for item in as_seq(vals)?.to_vec()?.iter() {
        acc = func.invoke(&[acc, item.clone()])?;
    }
    Ok(acc)
}

fn check_seq_arity(func: &Func, nseqs: usize) -> Result<(), FernError> {
    let arity = func.arg_defs().size();
    if (arity == 1 && func.arg_defs().is_vararg()) || arity == nseqs {
        return Ok(());
    }
    Err(FernError::arity(format!(
        "{:?} incompatible with {} sequences",
        func, nseqs
    )))
}

/// Zips `seqs` positionally and invokes `func` once per index, up to the
/// shortest sequence's length.
pub fn map(func: &Func, seqs: &[Value]) -> Result<Value, FernError> {
    let views: Vec<&dyn Seq> = seqs
        .iter()
        .map(as_seq)
        .collect::<Result<_, _>>()?;
    let rounds = views
        .iter()
        .map(|s| s.size())
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .min()
        .unwrap_or(0);
    if rounds == 0 {
        return Ok(Value::List(List::empty()));
    }
    check_seq_arity(func, views.len())?;
    let mut results = Vec::with_capacity(rounds);
    let mut args = vec![Value::Nil; views.len()];
    for idx in 0..rounds {
        for (slot, view) in args.iter_mut().zip(&views) {
            *slot = view.nth(idx)?;
        }
        results.push(func.invoke(&args)?);
    }
    Ok(Value::List(List::from_values(results)))
}

/// Keeps the elements `pred` accepts. Extra arguments ride along after the
/// element under test.
pub fn filter(pred: &Func, seq: &Value, xargs: &[Value]) -> Result<Value, FernError> {
    if list::is_nil(seq) || as_seq(seq)?.is_empty() {
        return Ok(Value::List(List::empty()));
    }
    let mut extended = vec![Value::Nil];
    extended.extend_from_slice(xargs);
    let mut kept = Vec::new();
    for item in as_seq(seq)?.to_vec()?.iter() {
        extended[0] = item.clone();
        if is_true(pred, &extended)? {
            kept.push(item.clone());
        }
    }
    Ok(Value::List(List::from_values(kept)))
}

/// Cartesian product driver: runs `func` over every combination drawn from
/// `seqs`, the rightmost sequence varying fastest, keeping the argument
/// order of `seqs`. An optional predicate gates each combination before
/// the invocation happens.
pub fn generator(
    func: &Func,
    pred: Option<&Func>,
    seqs: &[Value],
) -> Result<Value, FernError> {
    if seqs.is_empty() {
        return Ok(Value::List(List::empty()));
    }
    check_seq_arity(func, seqs.len())?;
    let views: Vec<&dyn Seq> = seqs.iter().map(as_seq).collect::<Result<_, _>>()?;
    let sizes = views
        .iter()
        .map(|s| s.size())
        .collect::<Result<Vec<_>, _>>()?;
    if sizes.iter().any(|&s| s == 0) {
        return Ok(Value::List(List::empty()));
    }
    let mut results = Vec::with_capacity(sizes.iter().product());
    let mut idxs = vec![0usize; views.len()];
    let mut args = vec![Value::Nil; views.len()];
    'combos: loop {
        for i in 0..views.len() {
            args[i] = views[i].nth(idxs[i])?;
        }
        if pred.map_or(Ok(true), |p| is_true(p, &args))? {
            results.push(func.invoke(&args)?);
        }
        // Odometer step from the rightmost digit.
        let mut pos = idxs.len();
        loop {
            if pos == 0 {
                break 'combos;
            }
            pos -= 1;
            idxs[pos] += 1;
            if idxs[pos] < sizes[pos] {
                continue 'combos;
            }
            idxs[pos] = 0;
        }
    }
    Ok(Value::List(List::from_values(results)))
}

/// Splices sequence arguments and keeps scalar arguments as-is; nil
/// contributes nothing.
pub fn concat(items: &[Value]) -> Result<Value, FernError> {
    let mut out = Vec::new();
    for item in items {
        if list::is_nil(item) {
            continue;
        }
        match item.as_seq() {
            Some(seq) => out.extend(seq.to_vec()?.iter().cloned()),
            None => out.push(item.clone()),
        }
    }
    Ok(Value::List(List::from_values(out)))
}

/// First element `pred` accepts, nil when none does. An empty or nil input
/// comes back unchanged.
pub fn some(pred: &Func, seq: &Value, xargs: &[Value]) -> Result<Value, FernError> {
    if list::is_nil(seq) || as_seq(seq)?.is_empty() {
        return Ok(seq.clone());
    }
    let mut extended = vec![Value::Nil];
    extended.extend_from_slice(xargs);
    for item in as_seq(seq)?.to_vec()?.iter() {
        extended[0] = item.clone();
        if is_true(pred, &extended)? {
            return Ok(item.clone());
        }
    }
    Ok(list::nil_value())
}

/// `[0, end)` stepping by one.
pub fn range_to(end: i64) -> Result<Value, FernError> {
    range(0, end, 1)
}

/// `[start, end)` stepping by one toward `end`.
pub fn range_between(start: i64, end: i64) -> Result<Value, FernError> {
    range(start, end, if start < end { 1 } else { -1 })
}

/// Half-open integer range `[start, end)`. The step must move `start`
/// toward `end`.
pub fn range(start: i64, end: i64, step: i64) -> Result<Value, FernError> {
    if start == end {
        return Ok(Value::List(List::empty()));
    }
    if !((start < end && step > 0) || (start > end && step < 0)) {
        return Err(FernError::illegal(format!(
            "start:{}, end:{}, step:{}",
            start, end, step
        )));
    }
    let mut out = Vec::new();
    let mut i = start;
    if step > 0 {
        while i < end {
            out.push(Value::Int(i));
            i += step;
        }
    } else {
        while i > end {
            out.push(Value::Int(i));
            i += step;
        }
    }
    Ok(Value::List(List::from_values(out)))
}

/// First `n` elements. Taking at least the whole sequence hands the same
/// handle back.
pub fn take(n: i64, seq: &Value) -> Result<Value, FernError> {
    if n < 0 {
        return Err(FernError::illegal("n cannot be negative"));
    }
    if list::is_nil(seq) {
        return Ok(seq.clone());
    }
    let view = as_seq(seq)?;
    let n = n as usize;
    if n == 0 {
        return Ok(Value::List(List::empty()));
    }
    if n >= view.size()? {
        return Ok(seq.clone());
    }
    let items = view.to_vec()?;
    Ok(Value::List(List::from_values(items[..n].iter().cloned())))
}

/// Longest prefix `pred` accepts.
pub fn takewhile(pred: &Func, seq: &Value, xargs: &[Value]) -> Result<Value, FernError> {
    if list::is_nil(seq) || as_seq(seq)?.is_empty() {
        return Ok(seq.clone());
    }
    let mut extended = vec![Value::Nil];
    extended.extend_from_slice(xargs);
    let items = as_seq(seq)?.to_vec()?;
    let mut offset = 0;
    for item in items.iter() {
        extended[0] = item.clone();
        if !is_true(pred, &extended)? {
            break;
        }
        offset += 1;
    }
    Ok(Value::List(List::from_values(
        items[..offset].iter().cloned(),
    )))
}

/// Everything past the first `n` elements. Dropping nothing hands the same
/// handle back.
pub fn drop(n: i64, seq: &Value) -> Result<Value, FernError> {
    if n < 0 {
        return Err(FernError::illegal("n cannot be negative"));
    }
    if n == 0 || list::is_nil(seq) {
        return Ok(seq.clone());
    }
    let view = as_seq(seq)?;
    let n = n as usize;
    if n >= view.size()? {
        return Ok(Value::List(List::empty()));
    }
    let items = view.to_vec()?;
    Ok(Value::List(List::from_values(items[n..].iter().cloned())))
}

/// Everything past the longest accepted prefix. An all-rejecting predicate
/// hands the same handle back.
pub fn dropwhile(pred: &Func, seq: &Value, xargs: &[Value]) -> Result<Value, FernError> {
    if list::is_nil(seq) || as_seq(seq)?.is_empty() {
        return Ok(seq.clone());
    }
    let mut extended = vec![Value::Nil];
    extended.extend_from_slice(xargs);
    let items = as_seq(seq)?.to_vec()?;
    let mut offset = 0;
    for item in items.iter() {
        extended[0] = item.clone();
        if !is_true(pred, &extended)? {
            break;
        }
        offset += 1;
    }
    if offset == 0 {
        return Ok(seq.clone());
    }
    Ok(Value::List(List::from_values(
        items[offset..].iter().cloned(),
    )))
}
