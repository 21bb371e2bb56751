//! Tuplex: an immutable, fixed-arity tuple type for the tuplex host
//!
//! Tuples hold booleans, numbers, strings, `undef` and other tuples, never
//! mutable containers. They are opaque userdata to the host; every
//! operator and method is dispatched through one shared metatable.
//!
//! # Modules
//!
//! - `store`: Tuple storage, claims and the userdata destructor
//! - `construct`: The variadic constructor and element validation
//! - `projection`: `__len`, `__get`, `tolist`, `spread`, `tostr`
//! - `structural`: `__eq`, `__add`, `flatten`, `copy`
//! - `iter`: The `__iter` / continuation protocol
//! - `metatable`: The shared behavior table and module entry point
//!
//! # Example
//!
//! ```
//! use tuplex::{MODULE_LOADER, as_tuple};
//! use tuplex_core::{State, Value};
//!
//! let mut state = State::new();
//! let exports = state.call(&MODULE_LOADER, Vec::new()).unwrap();
//! let Value::Function(new_tuple) = &exports[0] else { unreachable!() };
//!
//! let t = state
//!     .call_one(new_tuple, vec![Value::Int(1), Value::str("x")])
//!     .unwrap();
//! assert_eq!(as_tuple(&t).map(|t| t.len()), Some(2));
//! ```

pub mod construct;
pub mod iter;
pub mod metatable;
pub mod projection;
pub mod store;
pub mod structural;

pub use construct::{is_tuple_element, tuple_new};
pub use iter::{TUPLE_NEXT, tuple_iter, tuple_next};
pub use metatable::{MODULE_LOADER, TUPLE_NEW, load, tuple_metatable};
pub use projection::{tuple_get, tuple_len, tuple_spread, tuple_tolist, tuple_tostr};
pub use store::{
    TUPLE_NAME, Tuple, TupleBuilder, TupleHandle, as_tuple, check_tuple, live_tuple_count,
    push_tuple, tuple_free,
};
pub use structural::{tuple_add, tuple_copy, tuple_eq, tuple_equals, tuple_flatten};
