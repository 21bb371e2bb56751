//! Tuple construction
//!
//! The constructor is variadic: the caller pushes `N` values left to right,
//! so popping them yields the rightmost first. Every value must be an
//! immutable primitive or another tuple; anything else aborts construction
//! before a tuple exists.

use crate::store::{TUPLE_NAME, Tuple, push_tuple};
use tuplex_core::{RuntimeError, RuntimeResult, State, Value};

/// Whether `value` may be stored in a tuple
pub fn is_tuple_element(value: &Value) -> bool {
    value.is_primitive_immutable() || value.is_userdata_of(TUPLE_NAME)
}

/// Create a tuple from the pending variadic arguments
///
/// Stack effect: ( v0 v1 ... vN-1 -- tuple )
pub fn tuple_new(state: &mut State) -> RuntimeResult<usize> {
    let count = state.peek_vargs_count();
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        let value = state.pop()?;
        if !is_tuple_element(&value) {
            return Err(RuntimeError::type_error(
                "Tuples may only contain immutable values.",
            ));
        }
        items.push(value);
    }
    // popped right to left
    items.reverse();

    push_tuple(state, Tuple::from_values(items))?;
    Ok(1)
}
