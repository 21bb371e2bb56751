//! Read-only views of a tuple: length, indexing, list conversion,
//! spreading onto the exchange surface and rendering to text.

use crate::store::check_tuple;
use tuplex_core::{RuntimeError, RuntimeResult, State, generic_stringify};

/// Stack effect: ( tuple -- Int )
pub fn tuple_len(state: &mut State) -> RuntimeResult<usize> {
    let tuple = check_tuple(state, "tuple.__len", 0)?;
    state.push_int(tuple.len() as i64);
    Ok(1)
}

/// Element at an index in `0..len`
///
/// Stack effect: ( tuple Int -- Value )
pub fn tuple_get(state: &mut State) -> RuntimeResult<usize> {
    let tuple = check_tuple(state, "tuple.__get", 0)?;
    let n = state.check_int("tuple.__get", 1)?;

    let item = usize::try_from(n)
        .ok()
        .and_then(|i| tuple.get(i))
        .ok_or_else(|| {
            RuntimeError::value(format!(
                "unable to index tuple of length {} with index {}.",
                tuple.len(),
                n
            ))
        })?;

    state.push(item.clone());
    Ok(1)
}

/// Render as `tuple(e0, e1, ...)`, each element through the host stringifier
///
/// Stack effect: ( tuple [format] -- Str )
pub fn tuple_tostr(state: &mut State) -> RuntimeResult<usize> {
    let tuple = check_tuple(state, "tuple.tostr", 0)?;
    let format = state.opt_str("tuple.tostr", 1)?;

    if tuple.is_empty() {
        state.push_str("tuple()");
        return Ok(1);
    }

    let mut buffer = String::from("tuple(");
    for (i, item) in tuple.iter().enumerate() {
        if i > 0 {
            buffer.push_str(", ");
        }
        buffer.push_str(&generic_stringify(state, item, format.as_deref())?);
    }
    buffer.push(')');

    state.push_str(&buffer);
    Ok(1)
}

/// New mutable list sharing the tuple's elements
///
/// Stack effect: ( tuple -- List )
pub fn tuple_tolist(state: &mut State) -> RuntimeResult<usize> {
    let tuple = check_tuple(state, "tuple.tolist", 0)?;

    state.push_list();
    for item in tuple.iter() {
        state.push(item.clone());
        state.list_push()?;
    }
    Ok(1)
}

/// Every element as a separate result
///
/// Stack effect: ( tuple -- v0 v1 ... vN-1 )
pub fn tuple_spread(state: &mut State) -> RuntimeResult<usize> {
    let tuple = check_tuple(state, "tuple.spread", 0)?;

    for item in tuple.iter() {
        state.push(item.clone());
    }
    Ok(tuple.len())
}
