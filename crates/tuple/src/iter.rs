//! Iteration protocol
//!
//! `__iter` hands back a continuation and a starting position. The caller
//! owns all iteration state: each continuation call gets the tuple and the
//! position explicitly and either reports exhaustion with a lone `false`
//! or returns `(position + 1, element, true)`. Nothing persists between
//! calls, so any number of iterations over one tuple can be interleaved.

use crate::store::check_tuple;
use tracing::trace;
use tuplex_core::{Arity, NativeFunction, RuntimeResult, State};

/// Continuation returned by `__iter`
pub const TUPLE_NEXT: NativeFunction =
    NativeFunction::new("tuple.__next", tuple_next, Arity::Fixed(2));

/// Stack effect: ( tuple -- next Int )
pub fn tuple_iter(state: &mut State) -> RuntimeResult<usize> {
    check_tuple(state, "tuple.__iter", 0)?;
    state.push_function(TUPLE_NEXT);
    state.push_int(0);
    Ok(2)
}

/// Stack effect: ( tuple Int -- Int Value true ) or ( tuple Int -- false )
pub fn tuple_next(state: &mut State) -> RuntimeResult<usize> {
    let tuple = check_tuple(state, "tuple.__next", 0)?;
    let position = state.check_int("tuple.__next", 1)?;

    let item = usize::try_from(position).ok().and_then(|i| tuple.get(i));
    match item {
        Some(item) => {
            trace!(position, len = tuple.len(), "tuple iteration step");
            state.push_int(position + 1);
            state.push(item.clone());
            state.push_bool(true);
            Ok(3)
        }
        None => {
            state.push_bool(false);
            Ok(1)
        }
    }
}
