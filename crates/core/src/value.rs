use crate::error::RuntimeResult;
use crate::stack::State;
use crate::userdata::UserData;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Signature of every native entry point.
///
/// Arguments are already on the exchange surface when the function runs.
/// The function pushes its results and returns how many it pushed.
pub type NativeFn = fn(&mut State) -> RuntimeResult<usize>;

/// How many arguments a native function takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many; missing arguments become `Undef`, extras are dropped
    Fixed(usize),
    /// Any number; the count is available through `State::peek_vargs_count`
    Variadic,
}

/// A native function value, as stored in metatables and on the stack
#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub func: NativeFn,
    pub arity: Arity,
}

impl NativeFunction {
    pub const fn new(name: &'static str, func: NativeFn, arity: Arity) -> Self {
        Self { name, func, arity }
    }

    /// Identity comparison on the entry point
    pub fn same_entry(&self, other: &NativeFunction) -> bool {
        std::ptr::fn_addr_eq(self.func, other.func)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// TableKey: Hashable subset of Value for use as table keys
///
/// Only types that can be meaningfully hashed are allowed as table keys:
/// Int, Str, Bool. Float is excluded due to NaN equality issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableKey {
    Int(i64),
    Str(Rc<str>),
    Bool(bool),
}

impl Hash for TableKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Discriminant for type safety
        std::mem::discriminant(self).hash(state);
        match self {
            TableKey::Int(n) => n.hash(state),
            TableKey::Str(s) => s.hash(state),
            TableKey::Bool(b) => b.hash(state),
        }
    }
}

impl TableKey {
    /// Try to convert a Value to a TableKey
    /// Returns None for non-hashable types (Float, List, Table, UserData, ...)
    pub fn from_value(value: &Value) -> Option<TableKey> {
        match value {
            Value::Int(n) => Some(TableKey::Int(*n)),
            Value::Str(s) => Some(TableKey::Str(Rc::clone(s))),
            Value::Bool(b) => Some(TableKey::Bool(*b)),
            _ => None,
        }
    }

    /// Convert TableKey back to Value
    pub fn to_value(&self) -> Value {
        match self {
            TableKey::Int(n) => Value::Int(*n),
            TableKey::Str(s) => Value::Str(Rc::clone(s)),
            TableKey::Bool(b) => Value::Bool(*b),
        }
    }
}

pub type TableData = HashMap<TableKey, Value>;

/// Value: What scripts talk about
///
/// Heap-backed variants hold an `Rc`, so cloning a Value takes one
/// reference-count claim and dropping it releases one. The host is
/// single-threaded; nothing here is `Send`.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absence-value
    Undef,

    Bool(bool),

    Int(i64),

    /// IEEE 754 double precision
    Float(f64),

    /// Immutable text, shared by reference count
    Str(Rc<str>),

    /// Mutable dynamic list
    List(Rc<RefCell<Vec<Value>>>),

    /// Mutable map keyed by Int, Str or Bool
    Table(Rc<RefCell<TableData>>),

    /// Opaque value owned by an extension (type tag + destructor)
    UserData(Rc<UserData>),

    Function(NativeFunction),
}

impl Value {
    pub fn str(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn table() -> Value {
        Value::Table(Rc::new(RefCell::new(HashMap::new())))
    }

    /// User-facing type name, as used in error messages
    pub fn type_name(&self) -> &str {
        match self {
            Value::Undef => "undef",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Table(_) => "table",
            Value::UserData(ud) => ud.tag(),
            Value::Function(_) => "fn",
        }
    }

    /// True for the primitive values that can never change after creation
    pub fn is_primitive_immutable(&self) -> bool {
        matches!(
            self,
            Value::Undef | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_)
        )
    }

    pub fn is_userdata_of(&self, tag: &str) -> bool {
        matches!(self, Value::UserData(ud) if ud.tag() == tag)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_userdata(&self) -> Option<&Rc<UserData>> {
        match self {
            Value::UserData(ud) => Some(ud),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}
