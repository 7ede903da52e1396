use fern_core::{Assoc, Hashed, Invocable, List, Map, Seq, Set, Value};

fn set_of(values: &[i64]) -> Set {
    Set::from_entries(values.iter().map(|&n| Value::Int(n)))
}

fn pairs(kvs: &[(&str, i64)]) -> Map {
    Map::from_pairs(kvs.iter().flat_map(|&(k, v)| [Value::from(k), Value::Int(v)]))
        .unwrap()
}

#[test]
fn set_membership() {
    let s = set_of(&[1, 2, 3]);
    assert_eq!(s.len(), 3);
    assert!(s.contains(&Value::Int(2)));
    assert!(!s.contains(&Value::Int(9)));
    assert_eq!(s.get(&Value::Int(2)).unwrap(), Value::Int(2));
    assert_eq!(s.get(&Value::Int(9)).unwrap(), Value::Nil);
}

#[test]
fn set_deduplicates_on_build() {
    assert_eq!(set_of(&[1, 1, 2, 2, 2]).len(), 2);
}

#[test]
fn set_invoked_as_lookup() {
    let s = set_of(&[7]);
    assert_eq!(s.invoke(&[Value::Int(7)]).unwrap(), Value::Int(7));
    assert_eq!(s.invoke(&[Value::Int(8)]).unwrap(), Value::Nil);
}

#[test]
fn set_grows_in_place_for_a_new_key() {
    let s = set_of(&[1, 2]);
    let out = s.assoc_key(Value::Int(3)).unwrap();
    assert!(out.grew_in_place());
    // Same handle: the original observes the addition.
    match out.value() {
        Value::Set(grown) => assert!(grown.same_handle(&s)),
        other => panic!("expected set, got {}", other),
    }
    assert_eq!(s.len(), 3);
}

#[test]
fn set_rebuilds_for_an_existing_key() {
    let s = set_of(&[1, 2]);
    let out = s.assoc_key(Value::Int(2)).unwrap();
    assert!(matches!(&out, Assoc::Replaced(_)));
    match out.value() {
        Value::Set(rebuilt) => {
            assert!(!rebuilt.same_handle(&s));
            assert_eq!(rebuilt.len(), 2);
        }
        other => panic!("expected set, got {}", other),
    }
}

#[test]
fn set_refuses_two_argument_association() {
    assert!(set_of(&[1]).assoc(Value::Int(1), Value::Int(2)).is_err());
}

#[test]
fn map_lookup_and_views() {
    let m = pairs(&[("a", 1), ("b", 2)]);
    assert_eq!(m.len(), 2);
    assert_eq!(m.get(&Value::from("a")).unwrap(), Value::Int(1));
    assert_eq!(m.get(&Value::from("zz")).unwrap(), Value::Nil);
    assert_eq!(m.invoke(&[Value::from("b")]).unwrap(), Value::Int(2));

    let keys = match m.keys().unwrap() {
        Value::List(l) => l,
        _ => unreachable!(),
    };
    let vals = match m.values().unwrap() {
        Value::List(l) => l,
        _ => unreachable!(),
    };
    assert_eq!(keys.size().unwrap(), 2);
    assert_eq!(vals.size().unwrap(), 2);
}

#[test]
fn map_from_odd_pair_stream_fails() {
    assert!(Map::from_pairs([Value::from("a")]).is_err());
}

#[test]
fn map_grows_in_place_for_a_new_key() {
    let m = pairs(&[("a", 1)]);
    let out = m.assoc(Value::from("b"), Value::Int(2)).unwrap();
    assert!(out.grew_in_place());
    match out.value() {
        Value::Map(grown) => assert!(grown.same_handle(&m)),
        other => panic!("expected map, got {}", other),
    }
    assert_eq!(m.get(&Value::from("b")).unwrap(), Value::Int(2));
}

#[test]
fn map_rebuilds_for_an_existing_key() {
    let m = pairs(&[("a", 1), ("b", 2)]);
    let out = m.assoc(Value::from("a"), Value::Int(99)).unwrap();
    assert!(matches!(&out, Assoc::Replaced(_)));
    let rebuilt = match out.into_value() {
        Value::Map(r) => r,
        other => panic!("expected map, got {}", other),
    };
    assert!(!rebuilt.same_handle(&m));
    assert_eq!(rebuilt.get(&Value::from("a")).unwrap(), Value::Int(99));
    assert_eq!(rebuilt.get(&Value::from("b")).unwrap(), Value::Int(2));
    // The original keeps its binding.
    assert_eq!(m.get(&Value::from("a")).unwrap(), Value::Int(1));
}

#[test]
fn map_refuses_single_argument_association() {
    assert!(pairs(&[("a", 1)]).assoc_key(Value::from("b")).is_err());
}

#[test]
fn map_cons_takes_a_key_value_pair() {
    let m = pairs(&[("a", 1)]);
    let pair = Value::List(List::from_values([Value::from("b"), Value::Int(2)]));
    let out = m.cons(pair).unwrap();
    match out {
        Value::Map(grown) => {
            assert_eq!(grown.get(&Value::from("b")).unwrap(), Value::Int(2))
        }
        other => panic!("expected map, got {}", other),
    }
    assert!(m.cons(Value::Int(3)).is_err());
}

#[test]
fn hashed_equality_ignores_insertion_order() {
    let a = pairs(&[("a", 1), ("b", 2), ("c", 3)]);
    let b = pairs(&[("c", 3), ("a", 1), ("b", 2)]);
    assert_eq!(a, b);
    assert_eq!(a.structural_hash(), b.structural_hash());

    let s1 = set_of(&[1, 2, 3]);
    let s2 = set_of(&[3, 2, 1]);
    assert_eq!(s1, s2);
    assert_eq!(s1.structural_hash(), s2.structural_hash());
}

#[test]
fn growth_past_a_bucket_keeps_every_entry() {
    // Push enough colliding entries through to force bucket reallocation.
    let m = Map::empty();
    for i in 0..2_000_i64 {
        m.assoc(Value::Int(i), Value::Int(i * 2)).unwrap();
    }
    assert_eq!(m.len(), 2_000);
    for i in (0..2_000_i64).step_by(97) {
        assert_eq!(m.get(&Value::Int(i)).unwrap(), Value::Int(i * 2));
    }
}

#[test]
fn snapshots_are_reused_until_invalidated() {
    let s = set_of(&[1, 2, 3]);
    let first = s.items().unwrap();
    let again = s.items().unwrap();
    assert!(first.ptr_eq(&again));

    s.assoc_key(Value::Int(4)).unwrap();
    let after = s.items().unwrap();
    assert!(!first.ptr_eq(&after));
    match after {
        Value::List(l) => assert_eq!(l.size().unwrap(), 4),
        _ => unreachable!(),
    }
}
