use fern_core::{
    defargs, defn, defn_named, defpred, defvarargs, higher, Invocable, List, Seq, TypeTag, Value,
};

fn int(v: &Value) -> i64 {
    match v {
        Value::Int(n) => *n,
        other => panic!("expected int, got {}", other),
    }
}

#[test]
fn fixed_arity_is_enforced() {
    let add = defn(defargs(&[TypeTag::Int, TypeTag::Int]), TypeTag::Int, |scope| {
        Ok(Value::Int(int(&scope.arg(1)?) + int(&scope.arg(2)?)))
    })
    .unwrap();
    assert_eq!(add.invoke(&[Value::Int(2), Value::Int(3)]).unwrap(), Value::Int(5));
    assert!(add.invoke(&[Value::Int(2)]).is_err());
    assert!(add.invoke(&[]).is_err());
}

#[test]
fn variadic_arity_is_a_lower_bound() {
    let sum = defn(defvarargs(&[TypeTag::Int]), TypeTag::Int, |scope| {
        let mut total = 0;
        for v in scope.varargs()? {
            total += int(&v);
        }
        Ok(Value::Int(total))
    })
    .unwrap();
    assert_eq!(sum.invoke(&[]).unwrap(), Value::Int(0));
    assert_eq!(
        sum.invoke(&[Value::Int(1), Value::Int(2), Value::Int(3)]).unwrap(),
        Value::Int(6)
    );
}

#[test]
fn variadic_tail_follows_fixed_slots() {
    let f = defn(
        defvarargs(&[TypeTag::Str, TypeTag::Int]),
        TypeTag::Int,
        |scope| {
            assert_eq!(scope.arity(), 2);
            let head = scope.arg(1)?;
            assert!(matches!(head, Value::Str(_)));
            let mut total = 0;
            for i in 1..=scope.vararglen()? {
                total += int(&scope.vararg(i)?);
            }
            Ok(Value::Int(total))
        },
    )
    .unwrap();
    // One fixed arg, tail may be empty.
    assert_eq!(f.invoke(&[Value::from("x")]).unwrap(), Value::Int(0));
    assert_eq!(
        f.invoke(&[Value::from("x"), Value::Int(4), Value::Int(5)]).unwrap(),
        Value::Int(9)
    );
    assert!(f.invoke(&[]).is_err());
}

#[test]
fn named_accessors() {
    let f = defn(defvarargs(&[TypeTag::Int, TypeTag::Any]), TypeTag::Any, |scope| {
        assert_eq!(scope.arg_named("$#")?, Value::Int(3));
        assert_eq!(scope.arg_named("$$#")?, Value::Int(2));
        assert_eq!(scope.arg_named("$1")?, Value::Int(10));
        assert_eq!(scope.arg_named("$$1")?, Value::Int(20));
        assert_eq!(scope.arg_named("$$2")?, Value::Int(30));
        assert!(scope.arg_named("$x").is_err());
        assert!(scope.arg_named("nope").is_err());
        scope.arg_named("$$2")
    })
    .unwrap();
    let out = f
        .invoke(&[Value::Int(10), Value::Int(20), Value::Int(30)])
        .unwrap();
    assert_eq!(out, Value::Int(30));
}

#[test]
fn varargs_refused_on_fixed_bodies() {
    let f = defn(defargs(&[TypeTag::Int]), TypeTag::Any, |scope| {
        assert!(scope.varargs().is_err());
        assert_eq!(scope.vararglen()?, 0);
        scope.arg(1)
    })
    .unwrap();
    assert_eq!(f.invoke(&[Value::Int(1)]).unwrap(), Value::Int(1));
}

#[test]
fn tail_recursion_runs_in_constant_stack() {
    let countdown = defn(defargs(&[TypeTag::Int]), TypeTag::Int, |scope| {
        let n = int(&scope.arg(1)?);
        if n == 0 {
            Ok(Value::Int(0))
        } else {
            Ok(scope.tail_recur(vec![Value::Int(n - 1)]))
        }
    })
    .unwrap();
    assert_eq!(countdown.invoke(&[Value::Int(1_000_000)]).unwrap(), Value::Int(0));
}

#[test]
fn tail_recursion_threads_an_accumulator() {
    let sum_to = defn(defargs(&[TypeTag::Int, TypeTag::Int]), TypeTag::Int, |scope| {
        let n = int(&scope.arg(1)?);
        let acc = int(&scope.arg(2)?);
        if n == 0 {
            Ok(Value::Int(acc))
        } else {
            Ok(scope.tail_recur(vec![Value::Int(n - 1), Value::Int(acc + n)]))
        }
    })
    .unwrap();
    let out = sum_to.invoke(&[Value::Int(100_000), Value::Int(0)]).unwrap();
    assert_eq!(out, Value::Int(100_000 * 100_001 / 2));
}

#[test]
fn plain_self_recursion_still_works() {
    let fact = defn(defargs(&[TypeTag::Int]), TypeTag::Int, |scope| {
        let n = int(&scope.arg(1)?);
        if n <= 1 {
            Ok(Value::Int(1))
        } else {
            let prev = int(&scope.call_self(&[Value::Int(n - 1)])?);
            Ok(Value::Int(n * prev))
        }
    })
    .unwrap();
    assert_eq!(fact.invoke(&[Value::Int(10)]).unwrap(), Value::Int(3_628_800));
}

#[test]
fn predicates_answer_in_booleans() {
    let even = defpred(|scope| Ok(Value::Bool(int(&scope.arg(1)?) % 2 == 0))).unwrap();
    assert_eq!(even.invoke(&[Value::Int(4)]).unwrap(), Value::Bool(true));
    assert_eq!(even.invoke(&[Value::Int(5)]).unwrap(), Value::Bool(false));
    assert_eq!(even.return_tag(), TypeTag::Bool);
}

#[test]
fn identity_and_rendering() {
    let a = defn_named(
        "double",
        Some("doubles its argument"),
        defargs(&[TypeTag::Int]),
        TypeTag::Int,
        |scope| Ok(Value::Int(int(&scope.arg(1)?) * 2)),
    )
    .unwrap();
    let b = defn(defargs(&[TypeTag::Int]), TypeTag::Int, |scope| scope.arg(1)).unwrap();
    assert_ne!(a.unique_id(), b.unique_id());
    assert!(a.unique_id().contains("double"));
    assert!(b.unique_id().contains("ANONYMOUS"));
    let rendered = a.to_string();
    assert!(rendered.contains("double"));
    assert!(rendered.contains("doubles its argument"));
}

#[test]
fn signatures_are_capped() {
    let too_many = vec![TypeTag::Any; 255];
    assert!(defn(defargs(&too_many), TypeTag::Any, |_| Ok(Value::Nil)).is_err());
}

#[test]
fn quicksort_out_of_self_recursion_and_concat() {
    let qsort = defn(defargs(&[TypeTag::List]), TypeTag::List, |scope| {
        let l = match scope.arg(1)? {
            Value::List(l) => l,
            other => panic!("expected list, got {}", other),
        };
        if l.size()? <= 1 {
            return Ok(Value::List(l));
        }
        let items = l.to_vec()?;
        let pivot = int(&items[0]);
        let mut below = Vec::new();
        let mut above = Vec::new();
        for v in items[1..].iter() {
            if int(v) < pivot {
                below.push(v.clone());
            } else {
                above.push(v.clone());
            }
        }
        let below = scope.call_self(&[Value::List(List::from_values(below))])?;
        let above = scope.call_self(&[Value::List(List::from_values(above))])?;
        higher::concat(&[below, Value::Int(pivot), above])
    })
    .unwrap();

    let shuffled = List::from_values([5, 3, 8, 1, 9, 2, 7, 4, 6, 0].map(Value::Int));
    let sorted = List::from_values((0..10).map(Value::Int));
    assert_eq!(
        qsort.invoke(&[Value::List(shuffled)]).unwrap(),
        Value::List(sorted)
    );
}

#[test]
fn whole_frame_via_arg_zero() {
    let f = defn(defargs(&[TypeTag::Int, TypeTag::Int]), TypeTag::List, |scope| {
        scope.arg(0)
    })
    .unwrap();
    match f.invoke(&[Value::Int(1), Value::Int(2)]).unwrap() {
        Value::List(l) => assert_eq!(l.to_string(), "[1, 2]"),
        other => panic!("expected list, got {}", other),
    }
}
