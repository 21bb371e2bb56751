//! End-to-end tests for the tuple module as the host sees it
//!
//! Every tuple here is built through the exported constructor and every
//! operation goes through host dispatch (`==`, `+`, indexing, iteration,
//! stringification, method calls), the same path a script takes.

use std::rc::Rc;
use tuplex::{MODULE_LOADER, TUPLE_NAME, as_tuple, live_tuple_count};
use tuplex_core::{
    NativeFunction, RuntimeConfig, RuntimeError, State, Value, generic_equals, generic_stringify,
    take_runtime_error,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("tuplex=trace,tuplex_core=debug")
        .with_test_writer()
        .try_init();
}

fn load(state: &mut State) -> NativeFunction {
    init_tracing();
    match state.call(&MODULE_LOADER, Vec::new()).unwrap().as_slice() {
        [Value::Function(f)] => *f,
        other => panic!("Expected the constructor, got {:?}", other),
    }
}

fn setup() -> (State, NativeFunction) {
    let mut state = State::new();
    let new = load(&mut state);
    (state, new)
}

fn tuple(state: &mut State, new: &NativeFunction, items: Vec<Value>) -> Value {
    state.call_one(new, items).unwrap()
}

/// `(0,)` wrapped in `depth` further single-element tuples
fn nested(state: &mut State, new: &NativeFunction, depth: usize) -> Value {
    let mut t = tuple(state, new, vec![Value::Int(0)]);
    for _ in 0..depth {
        t = tuple(state, new, vec![t]);
    }
    t
}

fn ints(v: &Value) -> Vec<i64> {
    as_tuple(v)
        .expect("a tuple")
        .iter()
        .map(|v| v.as_int().expect("an int"))
        .collect()
}

fn method(state: &mut State, receiver: &Value, name: &str, args: Vec<Value>) -> Value {
    state
        .call_method(receiver, name, args)
        .unwrap()
        .into_iter()
        .next()
        .unwrap_or(Value::Undef)
}

#[test]
fn test_construct_then_read_back() {
    let (mut state, new) = setup();
    let items = vec![
        Value::Int(1),
        Value::str("two"),
        Value::Float(3.5),
        Value::Bool(true),
        Value::Undef,
    ];
    let t = tuple(&mut state, &new, items);

    assert_eq!(state.len_of(&t).unwrap(), 5);
    assert_eq!(state.index(&t, Value::Int(0)).unwrap().as_int(), Some(1));
    assert_eq!(state.index(&t, Value::Int(1)).unwrap().as_str(), Some("two"));
    assert!(matches!(state.index(&t, Value::Int(2)).unwrap(), Value::Float(f) if f == 3.5));
    assert_eq!(state.index(&t, Value::Int(3)).unwrap().as_bool(), Some(true));
    assert!(matches!(state.index(&t, Value::Int(4)).unwrap(), Value::Undef));
    assert_eq!(t.type_name(), TUPLE_NAME);
    assert_eq!(state.stack_len(), 0);
}

#[test]
fn test_construct_empty() {
    let (mut state, new) = setup();
    let t = tuple(&mut state, &new, vec![]);
    assert_eq!(state.len_of(&t).unwrap(), 0);
    assert_eq!(generic_stringify(&mut state, &t, None).unwrap(), "tuple()");
}

#[test]
fn test_construct_rejects_mutable_values() {
    let (mut state, new) = setup();
    let before = live_tuple_count();
    let list = Value::list(vec![Value::Int(1)]);
    let Value::List(list_rc) = &list else {
        unreachable!()
    };
    let list_rc = Rc::clone(list_rc);

    let err = state
        .call(&new, vec![Value::Int(1), list, Value::Int(2)])
        .unwrap_err();
    assert!(matches!(err, RuntimeError::TypeError(_)));
    assert_eq!(
        take_runtime_error().as_deref(),
        Some("TypeError: Tuples may only contain immutable values.")
    );
    assert_eq!(live_tuple_count(), before);
    assert_eq!(Rc::strong_count(&list_rc), 1);
    assert_eq!(state.stack_len(), 0);

    let err = state.call(&new, vec![Value::table()]).unwrap_err();
    assert!(matches!(err, RuntimeError::TypeError(_)));
}

#[test]
fn test_index_out_of_range() {
    let (mut state, new) = setup();
    let t = tuple(&mut state, &new, vec![Value::Int(1), Value::Int(2)]);

    let err = state.index(&t, Value::Int(2)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "ValueError: unable to index tuple of length 2 with index 2."
    );
    let err = state.index(&t, Value::Int(-3)).unwrap_err();
    assert!(matches!(err, RuntimeError::ValueError(_)));
}

#[test]
fn test_equality_is_structural() {
    let (mut state, new) = setup();
    let a = tuple(&mut state, &new, vec![Value::Int(1), Value::str("a")]);
    let b = tuple(&mut state, &new, vec![Value::Int(1), Value::str("a")]);
    let short = tuple(&mut state, &new, vec![Value::Int(1), Value::Int(2)]);
    let long = tuple(&mut state, &new, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    let other = tuple(&mut state, &new, vec![Value::Int(1), Value::Int(3)]);

    assert!(generic_equals(&mut state, &a, &a).unwrap());
    assert!(generic_equals(&mut state, &a, &b).unwrap());
    assert!(generic_equals(&mut state, &b, &a).unwrap());
    assert!(!generic_equals(&mut state, &short, &long).unwrap());
    assert!(!generic_equals(&mut state, &long, &short).unwrap());
    assert!(!generic_equals(&mut state, &short, &other).unwrap());
    assert!(!generic_equals(&mut state, &a, &Value::Int(1)).unwrap());
}

#[test]
fn test_equality_recurses_into_nested_tuples() {
    let (mut state, new) = setup();
    let inner_a = tuple(&mut state, &new, vec![Value::Int(2), Value::Int(3)]);
    let inner_b = tuple(&mut state, &new, vec![Value::Int(2), Value::Int(3)]);
    let inner_c = tuple(&mut state, &new, vec![Value::Int(2), Value::Int(4)]);
    let a = tuple(&mut state, &new, vec![Value::Int(1), inner_a]);
    let b = tuple(&mut state, &new, vec![Value::Int(1), inner_b]);
    let c = tuple(&mut state, &new, vec![Value::Int(1), inner_c]);

    assert!(generic_equals(&mut state, &a, &b).unwrap());
    assert!(!generic_equals(&mut state, &a, &c).unwrap());
}

#[test]
fn test_concatenation() {
    let (mut state, new) = setup();
    let a = tuple(&mut state, &new, vec![Value::Int(1), Value::Int(2)]);
    let b = tuple(&mut state, &new, vec![Value::Int(3), Value::Int(4)]);

    let c = state.add(&a, &b).unwrap();
    assert_eq!(ints(&c), vec![1, 2, 3, 4]);
    assert_eq!(ints(&a), vec![1, 2]);
    assert_eq!(ints(&b), vec![3, 4]);

    let expected = tuple(
        &mut state,
        &new,
        vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)],
    );
    assert!(generic_equals(&mut state, &c, &expected).unwrap());

    let err = state.add(&a, &Value::Int(3)).unwrap_err();
    assert!(matches!(err, RuntimeError::TypeError(_)));
}

#[test]
fn test_flatten() {
    let (mut state, new) = setup();
    let inner = tuple(&mut state, &new, vec![Value::Int(2), Value::Int(3)]);
    let t = tuple(&mut state, &new, vec![Value::Int(1), inner, Value::Int(4)]);

    let flat = method(&mut state, &t, "flatten", vec![]);
    assert_eq!(ints(&flat), vec![1, 2, 3, 4]);

    let again = method(&mut state, &flat, "flatten", vec![]);
    assert!(generic_equals(&mut state, &flat, &again).unwrap());
    match (&flat, &again) {
        (Value::UserData(x), Value::UserData(y)) => assert!(!Rc::ptr_eq(x, y)),
        _ => unreachable!(),
    }
}

#[test]
fn test_flatten_is_associative_over_nesting() {
    let (mut state, new) = setup();
    // ((1, 2), 3) and (1, (2, 3)) flatten to the same thing
    let left_inner = tuple(&mut state, &new, vec![Value::Int(1), Value::Int(2)]);
    let left = tuple(&mut state, &new, vec![left_inner, Value::Int(3)]);
    let right_inner = tuple(&mut state, &new, vec![Value::Int(2), Value::Int(3)]);
    let right = tuple(&mut state, &new, vec![Value::Int(1), right_inner]);

    let l = method(&mut state, &left, "flatten", vec![]);
    let r = method(&mut state, &right, "flatten", vec![]);
    assert!(generic_equals(&mut state, &l, &r).unwrap());
}

#[test]
#[should_panic(expected = "tuple nesting exceeds 2 levels")]
fn test_flatten_respects_configured_depth() {
    let mut state = State::with_config(RuntimeConfig {
        max_call_depth: 2,
        max_nesting_depth: 2,
        ..RuntimeConfig::default()
    });
    let new = load(&mut state);
    let t = nested(&mut state, &new, 3);
    method(&mut state, &t, "flatten", vec![]);
}

#[test]
fn test_flatten_accepts_every_depth_equality_and_rendering_accept() {
    let config =
        RuntimeConfig::from_toml_str("max_call_depth = 8\nmax_nesting_depth = 8").unwrap();
    let mut state = State::with_config(config);
    let new = load(&mut state);

    let mut deepest_walked = None;
    for depth in 0..16 {
        let a = nested(&mut state, &new, depth);
        let b = nested(&mut state, &new, depth);
        let equal = generic_equals(&mut state, &a, &b);
        let rendered = generic_stringify(&mut state, &a, None);
        if let (Ok(equal), Ok(_)) = (equal, rendered) {
            assert!(equal);
            let flat = method(&mut state, &a, "flatten", vec![]);
            assert_eq!(ints(&flat), vec![0]);
            deepest_walked = Some(depth);
        }
    }
    let _ = take_runtime_error();

    // deeper tuples were built, and equality gave up on them without aborting
    assert_eq!(deepest_walked, Some(7));
}

#[test]
fn test_default_config_flattens_deep_tuples() {
    let (mut state, new) = setup();
    let t = nested(&mut state, &new, 300);
    let flat = method(&mut state, &t, "flatten", vec![]);
    assert_eq!(ints(&flat), vec![0]);
    assert!(generic_stringify(&mut state, &t, None).is_ok());
}

#[test]
fn test_copy_returns_same_value() {
    let (mut state, new) = setup();
    let t = tuple(&mut state, &new, vec![Value::Int(1)]);
    let copy = method(&mut state, &t, "copy", vec![]);
    match (&t, &copy) {
        (Value::UserData(x), Value::UserData(y)) => assert!(Rc::ptr_eq(x, y)),
        _ => panic!("Expected tuples, got {:?}", copy),
    }
}

#[test]
fn test_rendering() {
    let (mut state, new) = setup();
    let t = tuple(&mut state, &new, vec![Value::Int(1), Value::str("x")]);
    assert_eq!(generic_stringify(&mut state, &t, None).unwrap(), "tuple(1, x)");

    let inner = tuple(&mut state, &new, vec![Value::Float(2.0), Value::Undef]);
    let nested = tuple(&mut state, &new, vec![Value::Bool(false), inner]);
    assert_eq!(
        generic_stringify(&mut state, &nested, None).unwrap(),
        "tuple(false, tuple(2.0, undef))"
    );

    let hex = tuple(&mut state, &new, vec![Value::Int(255)]);
    let out = method(&mut state, &hex, "tostr", vec![Value::str("x")]);
    assert_eq!(out.as_str(), Some("tuple(ff)"));
}

#[test]
fn test_tolist_and_spread_share_elements() {
    let (mut state, new) = setup();
    let s: Rc<str> = Rc::from("shared");
    let t = tuple(&mut state, &new, vec![Value::Str(Rc::clone(&s)), Value::Int(2)]);
    assert_eq!(Rc::strong_count(&s), 2);

    let list = method(&mut state, &t, "tolist", vec![]);
    assert_eq!(Rc::strong_count(&s), 3);
    match &list {
        Value::List(items) => {
            let items = items.borrow();
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].as_str(), Some("shared"));
        }
        other => panic!("Expected list, got {:?}", other),
    }

    let spread = state.call_method(&t, "spread", vec![]).unwrap();
    assert_eq!(spread.len(), 2);
    assert_eq!(spread[1].as_int(), Some(2));

    drop(spread);
    drop(list);
    assert_eq!(Rc::strong_count(&s), 2);
}

#[test]
fn test_iteration_protocol() {
    let (mut state, new) = setup();
    let t = tuple(
        &mut state,
        &new,
        vec![Value::str("a"), Value::str("b"), Value::str("c")],
    );

    for _ in 0..3 {
        let seen = state.iterate(&t).unwrap();
        let seen: Vec<_> = seen.iter().filter_map(Value::as_str).collect();
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    let empty = tuple(&mut state, &new, vec![]);
    assert!(state.iterate(&empty).unwrap().is_empty());
}

#[test]
fn test_interleaved_iterations() {
    let (mut state, new) = setup();
    let t = tuple(&mut state, &new, vec![Value::Int(10), Value::Int(20)]);

    let setup_a = state.call_method(&t, "__iter", vec![]).unwrap();
    let setup_b = state.call_method(&t, "__iter", vec![]).unwrap();
    let Value::Function(next) = setup_a[0] else {
        panic!("Expected a continuation, got {:?}", setup_a[0]);
    };

    let a0 = state.call(&next, vec![t.clone(), setup_a[1].clone()]).unwrap();
    let b0 = state.call(&next, vec![t.clone(), setup_b[1].clone()]).unwrap();
    assert_eq!(a0[1].as_int(), Some(10));
    assert_eq!(b0[1].as_int(), Some(10));

    let a1 = state.call(&next, vec![t.clone(), a0[0].clone()]).unwrap();
    assert_eq!(a1[1].as_int(), Some(20));
    let a2 = state.call(&next, vec![t.clone(), a1[0].clone()]).unwrap();
    assert_eq!(a2.len(), 1);
    assert_eq!(a2[0].as_bool(), Some(false));

    let b1 = state.call(&next, vec![t, b0[0].clone()]).unwrap();
    assert_eq!(b1[1].as_int(), Some(20));
}

#[test]
fn test_methods_reject_non_tuple_receiver() {
    let (mut state, new) = setup();
    let t = tuple(&mut state, &new, vec![Value::Int(1)]);
    let mt = state.load_metatable(TUPLE_NAME).unwrap();
    let eq = *mt.get("__eq").unwrap();

    let err = state.call(&eq, vec![t, Value::Int(1)]).unwrap_err();
    assert_eq!(
        err.message(),
        "tuple.__eq expected arg in position 1 to be of type tuple, got arg of type int."
    );
}

#[test]
fn test_claims_balanced_across_operations() {
    let (mut state, new) = setup();
    let before = live_tuple_count();
    let s: Rc<str> = Rc::from("claimed");
    let leaf = || Value::Str(Rc::clone(&s));

    {
        let a = tuple(&mut state, &new, vec![leaf(), Value::Int(1)]);
        assert_eq!(Rc::strong_count(&s), 2);

        let b = tuple(&mut state, &new, vec![leaf(), a.clone()]);
        assert_eq!(Rc::strong_count(&s), 3);

        let c = state.add(&a, &b).unwrap();
        // one new claim per copied element; the nested `a` is claimed, not its contents
        assert_eq!(Rc::strong_count(&s), 5);

        let flat = method(&mut state, &c, "flatten", vec![]);
        assert_eq!(state.len_of(&flat).unwrap(), 5);
        assert_eq!(Rc::strong_count(&s), 8);

        assert_eq!(live_tuple_count(), before + 4);
    }

    assert_eq!(live_tuple_count(), before);
    assert_eq!(Rc::strong_count(&s), 1);
    assert_eq!(state.stack_len(), 0);
}
