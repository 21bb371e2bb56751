//! Tuplex Core: the host surface extensions are written against
//!
//! This crate provides the single-threaded runtime primitives that native
//! extension modules (such as the `tuplex` tuple type) consume.
//!
//! Key design principles:
//! - Value: What scripts talk about (Int, Str, List, UserData, etc.)
//! - State: The exchange surface; arguments arrive pushed, results are pushed back
//! - UserData + MetaTable: opaque extension values with shared behavior tables
//!
//! # Modules
//!
//! - `error`: Typed runtime errors plus thread-local last-error tracking
//! - `config`: TOML-backed runtime limits
//! - `value`: Core Value enum and native function values
//! - `userdata`: Tagged opaque values with destructor callbacks
//! - `metatable`: Shared name → entry point dispatch tables
//! - `stack`: The exchange surface and call/dispatch machinery
//! - `ops`: Generic equality and stringification

pub mod config;
pub mod error;
pub mod metatable;
pub mod ops;
pub mod stack;
pub mod userdata;
pub mod value;

// Re-export key types and functions
pub use config::{CONFIG_ENV_VAR, RuntimeConfig};
pub use error::{
    RuntimeError, RuntimeResult, clear_runtime_error, has_runtime_error, set_runtime_error,
    take_runtime_error,
};
pub use metatable::MetaTable;
pub use ops::{generic_equals, generic_stringify};
pub use stack::State;
pub use userdata::{Destructor, UserData};
pub use value::{Arity, NativeFn, NativeFunction, TableKey, Value};
