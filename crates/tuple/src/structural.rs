//! Operations over whole tuples: equality, concatenation, flattening
//!
//! None of these touch their inputs. Concatenation and flattening allocate
//! a new tuple and take a fresh claim on every element they copy.

use crate::store::{Tuple, TupleBuilder, as_tuple, check_tuple, push_tuple};
use tuplex_core::{RuntimeResult, State, generic_equals};

impl Tuple {
    /// `self` followed by `other`, in order
    pub fn concat(&self, other: &Tuple) -> Tuple {
        let mut builder = Tuple::allocate(self.len() + other.len());
        for item in self.iter().chain(other.iter()) {
            builder.push(item.clone());
        }
        builder.finish()
    }

    /// Number of non-tuple leaves reachable from `self`
    ///
    /// # Panics
    /// Panics if tuples are nested more than `max_depth` levels deep.
    pub fn flattened_len(&self, max_depth: usize) -> usize {
        self.flattened_len_at(0, max_depth)
    }

    fn flattened_len_at(&self, depth: usize, max_depth: usize) -> usize {
        assert!(
            depth <= max_depth,
            "tuple nesting exceeds {} levels",
            max_depth
        );
        self.iter()
            .map(|item| match as_tuple(item) {
                Some(inner) => inner.flattened_len_at(depth + 1, max_depth),
                None => 1,
            })
            .sum()
    }

    /// Depth-first, left-to-right copy of every non-tuple leaf
    ///
    /// Sized in a first pass, filled in a second. An already-flat tuple
    /// comes back as a copy.
    ///
    /// # Panics
    /// Panics if tuples are nested more than `max_depth` levels deep.
    pub fn flatten(&self, max_depth: usize) -> Tuple {
        let mut builder = Tuple::allocate(self.flattened_len(max_depth));
        self.flatten_into(&mut builder);
        builder.finish()
    }

    fn flatten_into(&self, dest: &mut TupleBuilder) {
        for item in self.iter() {
            match as_tuple(item) {
                Some(inner) => inner.flatten_into(dest),
                None => dest.push(item.clone()),
            }
        }
    }
}

/// Element-wise equality through the host's generic `==`
///
/// Lengths are compared first; elements are compared in order and the
/// first unequal pair ends the comparison.
pub fn tuple_equals(state: &mut State, left: &Tuple, right: &Tuple) -> RuntimeResult<bool> {
    if left.len() != right.len() {
        return Ok(false);
    }
    for (a, b) in left.iter().zip(right.iter()) {
        if !generic_equals(state, a, b)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Stack effect: ( tuple tuple -- Bool )
pub fn tuple_eq(state: &mut State) -> RuntimeResult<usize> {
    let left = check_tuple(state, "tuple.__eq", 0)?;
    let right = check_tuple(state, "tuple.__eq", 1)?;

    let equal = tuple_equals(state, &left, &right)?;
    state.push_bool(equal);
    Ok(1)
}

/// Stack effect: ( tuple tuple -- tuple )
pub fn tuple_add(state: &mut State) -> RuntimeResult<usize> {
    let left = check_tuple(state, "tuple.__add", 0)?;
    let right = check_tuple(state, "tuple.__add", 1)?;

    push_tuple(state, left.concat(&right))?;
    Ok(1)
}

/// Stack effect: ( tuple -- tuple )
pub fn tuple_flatten(state: &mut State) -> RuntimeResult<usize> {
    let tuple = check_tuple(state, "tuple.flatten", 0)?;
    let max_depth = state.config().max_nesting_depth;

    push_tuple(state, tuple.flatten(max_depth))?;
    Ok(1)
}

/// Tuples are immutable, so a copy is the same value
///
/// Stack effect: ( tuple -- tuple )
pub fn tuple_copy(state: &mut State) -> RuntimeResult<usize> {
    let tuple = check_tuple(state, "tuple.copy", 0)?;
    state.push(tuple.to_value());
    Ok(1)
}
