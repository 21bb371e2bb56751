//! The tuple behavior table and the module entry point
//!
//! One table is built the first time any tuple needs it and then shared
//! by every tuple instance. `load` registers it with the host and returns
//! the variadic constructor as the module's only export.

use crate::construct::tuple_new;
use crate::iter::tuple_iter;
use crate::projection::{tuple_get, tuple_len, tuple_spread, tuple_tolist, tuple_tostr};
use crate::store::TUPLE_NAME;
use crate::structural::{tuple_add, tuple_copy, tuple_eq, tuple_flatten};
use std::sync::{Arc, LazyLock};
use tracing::debug;
use tuplex_core::{Arity, MetaTable, NativeFunction, RuntimeResult, State};

static TUPLE_METATABLE: LazyLock<Arc<MetaTable>> = LazyLock::new(|| {
    debug!("building tuple metatable");
    Arc::new(
        MetaTable::new(TUPLE_NAME)
            .with("__get", "tuple.__get", tuple_get, Arity::Fixed(2))
            .with("__len", "tuple.__len", tuple_len, Arity::Fixed(1))
            .with("flatten", "tuple.flatten", tuple_flatten, Arity::Fixed(1))
            .with("copy", "tuple.copy", tuple_copy, Arity::Fixed(1))
            .with("tostr", "tuple.tostr", tuple_tostr, Arity::Fixed(2))
            .with("tolist", "tuple.tolist", tuple_tolist, Arity::Fixed(1))
            .with("__eq", "tuple.__eq", tuple_eq, Arity::Fixed(2))
            .with("__add", "tuple.__add", tuple_add, Arity::Fixed(2))
            .with("__iter", "tuple.__iter", tuple_iter, Arity::Fixed(1))
            .with("spread", "tuple.spread", tuple_spread, Arity::Fixed(1)),
    )
});

/// The shared tuple behavior table
pub fn tuple_metatable() -> Arc<MetaTable> {
    Arc::clone(&TUPLE_METATABLE)
}

/// The constructor exported to scripts as `tuple(...)`
pub const TUPLE_NEW: NativeFunction = NativeFunction::new("tuple", tuple_new, Arity::Variadic);

/// Module entry point, called once by the host's module loader
///
/// Stack effect: ( -- constructor )
pub fn load(state: &mut State) -> RuntimeResult<usize> {
    debug!("loading tuple module");
    state.register_metatable(TUPLE_NAME, tuple_metatable());
    state.push_function(TUPLE_NEW);
    Ok(1)
}

/// `load` packaged as a callable for hosts that load modules through `State::call`
pub const MODULE_LOADER: NativeFunction = NativeFunction::new("tuple.load", load, Arity::Fixed(0));
