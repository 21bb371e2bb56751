//! Evaluation exchange surface
//!
//! `State` owns a single value stack shared by caller and callee. A native
//! call gets a frame starting at `base`: argument `n` lives at `base + n`,
//! results are pushed on top and the callee returns how many it pushed.
//! `State::call` copies the results out and unwinds the frame on both the
//! success and error paths, so a failing entry point cannot leak values.

use crate::config::RuntimeConfig;
use crate::error::{RuntimeError, RuntimeResult, set_runtime_error};
use crate::metatable::MetaTable;
use crate::userdata::{Destructor, UserData};
use crate::value::{Arity, NativeFunction, Value};
use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, Default)]
struct Frame {
    base: usize,
    vargs: usize,
}

#[derive(Debug, Default)]
pub struct State {
    stack: Vec<Value>,
    frame: Frame,
    depth: usize,
    metatables: HashMap<String, Arc<MetaTable>>,
    config: RuntimeConfig,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Total number of values on the stack, across all frames
    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    // ------------------------------------------------------------------
    // Push / pop
    // ------------------------------------------------------------------

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn push_bool(&mut self, b: bool) {
        self.push(Value::Bool(b));
    }

    pub fn push_int(&mut self, n: i64) {
        self.push(Value::Int(n));
    }

    pub fn push_str(&mut self, s: &str) {
        self.push(Value::str(s));
    }

    /// Push a new, empty list
    pub fn push_list(&mut self) {
        self.push(Value::list(Vec::new()));
    }

    /// Pop the top value and append it to the list just below it
    pub fn list_push(&mut self) -> RuntimeResult<()> {
        let value = self.pop()?;
        match self.peek() {
            Some(Value::List(list)) => {
                list.borrow_mut().push(value);
                Ok(())
            }
            Some(other) => Err(RuntimeError::type_error(format!(
                "list_push expected a list below the pushed value, got {}.",
                other.type_name()
            ))),
            None => Err(RuntimeError::StackUnderflow(
                "list_push on an empty frame".to_string(),
            )),
        }
    }

    pub fn push_function(&mut self, function: NativeFunction) {
        self.push(Value::Function(function));
    }

    /// Wrap `payload` as an opaque value and push it
    pub fn push_userdata(
        &mut self,
        payload: Box<dyn Any>,
        tag: &'static str,
        destructor: Destructor,
    ) -> Rc<UserData> {
        let ud = Rc::new(UserData::new(tag, payload, destructor));
        self.push(Value::UserData(Rc::clone(&ud)));
        ud
    }

    /// Pop the top value of the current frame
    pub fn pop(&mut self) -> RuntimeResult<Value> {
        if self.stack.len() <= self.frame.base {
            return Err(RuntimeError::StackUnderflow(
                "pop from an empty frame".to_string(),
            ));
        }
        self.stack
            .pop()
            .ok_or_else(|| RuntimeError::StackUnderflow("pop from an empty stack".to_string()))
    }

    /// Top of the current frame
    pub fn peek(&self) -> Option<&Value> {
        if self.stack.len() > self.frame.base {
            self.stack.last()
        } else {
            None
        }
    }

    /// Argument `n` of the current frame
    pub fn arg(&self, n: usize) -> Option<&Value> {
        self.stack.get(self.frame.base + n)
    }

    /// Number of arguments passed to the running variadic function
    pub fn peek_vargs_count(&self) -> usize {
        self.frame.vargs
    }

    // ------------------------------------------------------------------
    // Argument checks
    // ------------------------------------------------------------------

    fn arg_type_error(fn_name: &str, n: usize, expected: &str, got: &str) -> RuntimeError {
        RuntimeError::type_error(format!(
            "{} expected arg in position {} to be of type {}, got arg of type {}.",
            fn_name, n, expected, got
        ))
    }

    /// Argument `n` must be userdata tagged `tag`
    pub fn check_userdata(
        &self,
        tag: &str,
        fn_name: &str,
        n: usize,
    ) -> RuntimeResult<Rc<UserData>> {
        match self.arg(n) {
            Some(Value::UserData(ud)) if ud.tag() == tag => Ok(Rc::clone(ud)),
            Some(other) => Err(Self::arg_type_error(fn_name, n, tag, other.type_name())),
            None => Err(Self::arg_type_error(fn_name, n, tag, "undef")),
        }
    }

    pub fn check_int(&self, fn_name: &str, n: usize) -> RuntimeResult<i64> {
        match self.arg(n) {
            Some(Value::Int(i)) => Ok(*i),
            Some(other) => Err(Self::arg_type_error(fn_name, n, "int", other.type_name())),
            None => Err(Self::arg_type_error(fn_name, n, "int", "undef")),
        }
    }

    /// Argument `n` may be a str or undef
    pub fn opt_str(&self, fn_name: &str, n: usize) -> RuntimeResult<Option<Rc<str>>> {
        match self.arg(n) {
            None | Some(Value::Undef) => Ok(None),
            Some(Value::Str(s)) => Ok(Some(Rc::clone(s))),
            Some(other) => Err(Self::arg_type_error(fn_name, n, "str", other.type_name())),
        }
    }

    // ------------------------------------------------------------------
    // Metatables
    // ------------------------------------------------------------------

    pub fn register_metatable(&mut self, name: &str, mt: Arc<MetaTable>) {
        debug!(name, entries = mt.len(), "registering metatable");
        self.metatables.insert(name.to_string(), mt);
    }

    pub fn load_metatable(&self, name: &str) -> Option<Arc<MetaTable>> {
        self.metatables.get(name).cloned()
    }

    /// Attach `mt` to the userdata on top of the frame
    pub fn set_metatable(&mut self, mt: Arc<MetaTable>) -> RuntimeResult<()> {
        match self.peek() {
            Some(Value::UserData(ud)) => {
                ud.set_metatable(mt);
                Ok(())
            }
            Some(other) => Err(RuntimeError::type_error(format!(
                "cannot set metatable on value of type {}.",
                other.type_name()
            ))),
            None => Err(RuntimeError::StackUnderflow(
                "set_metatable on an empty frame".to_string(),
            )),
        }
    }

    pub fn metatable_of(&self, value: &Value) -> Option<Arc<MetaTable>> {
        match value {
            Value::UserData(ud) => ud.metatable(),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    /// Call a native function with `args`, returning everything it pushed
    pub fn call(
        &mut self,
        function: &NativeFunction,
        mut args: Vec<Value>,
    ) -> RuntimeResult<Vec<Value>> {
        if self.depth >= self.config.max_call_depth {
            return Err(self.fail(
                function,
                RuntimeError::StackOverflow(format!(
                    "maximum call depth {} exceeded calling {}.",
                    self.config.max_call_depth, function.name
                )),
            ));
        }
        let vargs = match function.arity {
            Arity::Fixed(n) => {
                args.resize(n, Value::Undef);
                0
            }
            Arity::Variadic => args.len(),
        };
        if self.stack.len() + args.len() > self.config.max_stack_size {
            return Err(self.fail(function, self.stack_overflow(function)));
        }

        let saved = self.frame;
        let base = self.stack.len();
        self.stack.extend(args);
        self.frame = Frame { base, vargs };
        self.depth += 1;
        trace!(function = function.name, base, vargs, "native call");

        let outcome = (function.func)(self);

        self.depth -= 1;
        let outcome = outcome.and_then(|count| {
            if self.stack.len() > self.config.max_stack_size {
                return Err(self.stack_overflow(function));
            }
            let start = self.stack.len().saturating_sub(count).max(base);
            Ok(self.stack.split_off(start))
        });
        self.stack.truncate(base);
        self.frame = saved;

        outcome.map_err(|e| self.fail(function, e))
    }

    fn stack_overflow(&self, function: &NativeFunction) -> RuntimeError {
        RuntimeError::StackOverflow(format!(
            "maximum stack size {} exceeded calling {}.",
            self.config.max_stack_size, function.name
        ))
    }

    fn fail(&self, function: &NativeFunction, error: RuntimeError) -> RuntimeError {
        warn!(function = function.name, error = %error, "native call failed");
        set_runtime_error(error.to_string());
        error
    }

    /// Call and keep only the first result (`Undef` if there was none)
    pub fn call_one(&mut self, function: &NativeFunction, args: Vec<Value>) -> RuntimeResult<Value> {
        Ok(self
            .call(function, args)?
            .into_iter()
            .next()
            .unwrap_or(Value::Undef))
    }

    /// Look up `name` in the receiver's metatable and call it with the
    /// receiver as argument 0
    pub fn call_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: Vec<Value>,
    ) -> RuntimeResult<Vec<Value>> {
        let function = self
            .metatable_of(receiver)
            .and_then(|mt| mt.get(name).copied())
            .ok_or_else(|| {
                RuntimeError::type_error(format!(
                    "value of type {} has no method {}.",
                    receiver.type_name(),
                    name
                ))
            })?;
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(receiver.clone());
        full.extend(args);
        self.call(&function, full)
    }

    /// Operator-style indexing: `value[index]`
    pub fn index(&mut self, value: &Value, index: Value) -> RuntimeResult<Value> {
        match value {
            Value::List(list) => {
                let Value::Int(i) = index else {
                    return Err(RuntimeError::type_error(format!(
                        "cannot index list with value of type {}.",
                        index.type_name()
                    )));
                };
                let list = list.borrow();
                match usize::try_from(i).ok().and_then(|n| list.get(n)) {
                    Some(item) => Ok(item.clone()),
                    None => Err(RuntimeError::value(format!(
                        "unable to index list of length {} with index {}.",
                        list.len(),
                        i
                    ))),
                }
            }
            Value::UserData(_) => Ok(self
                .call_method(value, "__get", vec![index])?
                .into_iter()
                .next()
                .unwrap_or(Value::Undef)),
            _ => Err(RuntimeError::type_error(format!(
                "cannot index value of type {} with value of type {}.",
                value.type_name(),
                index.type_name()
            ))),
        }
    }

    /// Operator-style length: `len value`
    pub fn len_of(&mut self, value: &Value) -> RuntimeResult<i64> {
        match value {
            Value::Str(s) => Ok(s.len() as i64),
            Value::List(list) => Ok(list.borrow().len() as i64),
            Value::Table(table) => Ok(table.borrow().len() as i64),
            Value::UserData(_) => {
                let results = self.call_method(value, "__len", Vec::new())?;
                results.first().and_then(Value::as_int).ok_or_else(|| {
                    RuntimeError::type_error("__len must return an int.".to_string())
                })
            }
            other => Err(RuntimeError::type_error(format!(
                "len not supported for value of type {}.",
                other.type_name()
            ))),
        }
    }

    /// Operator-style addition: `a + b`
    pub fn add(&mut self, a: &Value, b: &Value) -> RuntimeResult<Value> {
        match (a, b) {
            (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x.wrapping_add(*y))),
            (Value::Float(x), Value::Float(y)) => Ok(Value::Float(x + y)),
            (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => {
                Ok(Value::Float(*x as f64 + y))
            }
            (Value::UserData(_), _) => Ok(self
                .call_method(a, "__add", vec![b.clone()])?
                .into_iter()
                .next()
                .unwrap_or(Value::Undef)),
            _ => Err(RuntimeError::type_error(format!(
                "+ not supported for operands of types {} and {}.",
                a.type_name(),
                b.type_name()
            ))),
        }
    }

    /// Drive a `for` loop over `value` to completion, collecting each bound value
    ///
    /// Userdata iterate through the `__iter` protocol: `__iter` returns a
    /// continuation and an initial state; the continuation returns either a
    /// lone `false`, or `(next_state, value, true)`.
    pub fn iterate(&mut self, value: &Value) -> RuntimeResult<Vec<Value>> {
        match value {
            Value::List(list) => Ok(list.borrow().clone()),
            Value::UserData(_) => {
                let mut setup = self.call_method(value, "__iter", Vec::new())?.into_iter();
                let next = match setup.next() {
                    Some(Value::Function(f)) => f,
                    _ => {
                        return Err(RuntimeError::type_error(
                            "__iter must return a function.".to_string(),
                        ));
                    }
                };
                let mut cursor = setup.next().unwrap_or(Value::Undef);
                let mut out = Vec::new();
                loop {
                    let step = self.call(&next, vec![value.clone(), cursor])?;
                    match step.as_slice() {
                        [Value::Bool(false)] => return Ok(out),
                        [state, item, Value::Bool(true)] => {
                            out.push(item.clone());
                            cursor = state.clone();
                        }
                        _ => {
                            return Err(RuntimeError::type_error(
                                "iterator continuation returned an invalid result.".to_string(),
                            ));
                        }
                    }
                }
            }
            other => Err(RuntimeError::type_error(format!(
                "cannot iterate over value of type {}.",
                other.type_name()
            ))),
        }
    }
}
