//! Tuple storage
//!
//! A `Tuple` is a length-fixed, immutable run of values. It holds exactly
//! one reference-count claim on each element for its whole lifetime: a
//! value moved in transfers its claim, a value cloned in takes a new one,
//! and dropping the tuple releases every claim before the storage goes.
//!
//! Tuples reach scripts as userdata tagged [`TUPLE_NAME`]. The host invokes
//! [`tuple_free`] when the last claim on that userdata is released.

use crate::metatable::tuple_metatable;
use std::any::Any;
use std::cell::Cell;
use std::ops::Deref;
use std::rc::Rc;
use tracing::{trace, warn};
use tuplex_core::{RuntimeError, RuntimeResult, State, UserData, Value};

/// Type tag carried by every tuple userdata
pub const TUPLE_NAME: &str = "tuple";

thread_local! {
    /// Tuples allocated on this thread and not yet freed
    static LIVE_TUPLES: Cell<usize> = const { Cell::new(0) };
}

/// Number of tuples allocated on this thread that have not been freed
pub fn live_tuple_count() -> usize {
    LIVE_TUPLES.with(|n| n.get())
}

/// A fixed-length run of immutable values, one claim held per element
///
/// Built through [`Tuple::allocate`] or [`Tuple::from_values`]; counted in
/// [`live_tuple_count`] from `finish` until dropped.
#[derive(Debug)]
pub struct Tuple {
    items: Box<[Value]>,
}

impl Tuple {
    /// Reserve storage for exactly `len` elements
    pub fn allocate(len: usize) -> TupleBuilder {
        TupleBuilder {
            items: Vec::with_capacity(len),
            len,
        }
    }

    /// Build a tuple that takes over the claims held by `items`
    pub fn from_values(items: Vec<Value>) -> Tuple {
        let mut builder = Tuple::allocate(items.len());
        for item in items {
            builder.push(item);
        }
        builder.finish()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// Wrap as an opaque host value with the shared tuple metatable attached
    pub fn into_value(self) -> Value {
        let ud = UserData::new(TUPLE_NAME, Box::new(self), tuple_free);
        ud.set_metatable(tuple_metatable());
        Value::UserData(Rc::new(ud))
    }
}

impl Drop for Tuple {
    fn drop(&mut self) {
        LIVE_TUPLES.with(|n| n.set(n.get().saturating_sub(1)));
        trace!(len = self.items.len(), "freeing tuple");
    }
}

impl<'a> IntoIterator for &'a Tuple {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A tuple under construction: exactly `len` slots, filled in order
#[derive(Debug)]
pub struct TupleBuilder {
    items: Vec<Value>,
    len: usize,
}

impl TupleBuilder {
    /// Store `value` in the next free slot, taking over its claim
    pub fn push(&mut self, value: Value) {
        assert!(
            self.items.len() < self.len,
            "tuple of length {} is already full",
            self.len
        );
        self.items.push(value);
    }

    fn remaining(&self) -> usize {
        self.len - self.items.len()
    }

    pub fn finish(self) -> Tuple {
        assert!(
            self.remaining() == 0,
            "tuple of length {} finished with {} slots filled",
            self.len,
            self.items.len()
        );
        LIVE_TUPLES.with(|n| n.set(n.get() + 1));
        trace!(len = self.len, "allocated tuple");
        Tuple {
            items: self.items.into_boxed_slice(),
        }
    }
}

/// Destructor registered with every tuple userdata
///
/// Dropping the tuple releases one claim on every element.
pub fn tuple_free(payload: Box<dyn Any>) {
    if payload.downcast::<Tuple>().is_err() {
        warn!("tuple_free called on a non-tuple payload");
    }
}

/// Borrow the tuple inside `value`, if it is one
pub fn as_tuple(value: &Value) -> Option<&Tuple> {
    match value {
        Value::UserData(ud) if ud.tag() == TUPLE_NAME => ud.downcast_ref::<Tuple>(),
        _ => None,
    }
}

/// A claim on tuple userdata, dereferencing to the `Tuple` inside
#[derive(Debug, Clone)]
pub struct TupleHandle(Rc<UserData>);

impl TupleHandle {
    pub fn new(ud: Rc<UserData>) -> Option<TupleHandle> {
        ud.downcast_ref::<Tuple>()?;
        Some(TupleHandle(ud))
    }

    pub fn to_value(&self) -> Value {
        Value::UserData(Rc::clone(&self.0))
    }
}

impl Deref for TupleHandle {
    type Target = Tuple;

    fn deref(&self) -> &Tuple {
        self.0
            .downcast_ref::<Tuple>()
            .expect("payload checked in TupleHandle::new")
    }
}

/// Argument `n` of the running entry point must be a tuple
pub fn check_tuple(state: &State, fn_name: &str, n: usize) -> RuntimeResult<TupleHandle> {
    let ud = state.check_userdata(TUPLE_NAME, fn_name, n)?;
    TupleHandle::new(ud).ok_or_else(|| {
        RuntimeError::type_error(format!(
            "{} expected arg in position {} to be of type {}, got foreign userdata.",
            fn_name, n, TUPLE_NAME
        ))
    })
}

/// Push `tuple` onto the exchange surface as an opaque tuple value
pub fn push_tuple(state: &mut State, tuple: Tuple) -> RuntimeResult<()> {
    state.push_userdata(Box::new(tuple), TUPLE_NAME, tuple_free);
    state.set_metatable(tuple_metatable())
}
