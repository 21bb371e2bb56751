//! Behavior tables
//!
//! A `MetaTable` maps method and operator names (`__eq`, `__add`, `tostr`, ...)
//! to native entry points. Tables are immutable once built and shared by
//! `Arc` between every instance of a type, so one table can be built at
//! module-load time and attached to each new value.

use crate::value::{Arity, NativeFn, NativeFunction};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct MetaTable {
    name: &'static str,
    entries: HashMap<&'static str, NativeFunction>,
}

impl MetaTable {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: HashMap::new(),
        }
    }

    /// Builder-style registration of one entry
    pub fn with(
        mut self,
        key: &'static str,
        qualified_name: &'static str,
        func: NativeFn,
        arity: Arity,
    ) -> Self {
        self.entries
            .insert(key, NativeFunction::new(qualified_name, func, arity));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self, key: &str) -> Option<&NativeFunction> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names, sorted for stable output
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.entries.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}
