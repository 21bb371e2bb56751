//! Opaque values owned by extensions
//!
//! A `UserData` is a boxed payload tagged with a type name and a destructor.
//! The host never looks inside the payload. When the last `Rc<UserData>`
//! claim is released the destructor runs, exactly once, and receives the
//! payload by value.

use crate::metatable::MetaTable;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

/// Destructor callback invoked when an opaque value's last claim is released
pub type Destructor = fn(Box<dyn Any>);

pub struct UserData {
    tag: &'static str,
    payload: Option<Box<dyn Any>>,
    destructor: Destructor,
    metatable: RefCell<Option<Arc<MetaTable>>>,
}

impl UserData {
    pub fn new(tag: &'static str, payload: Box<dyn Any>, destructor: Destructor) -> Self {
        Self {
            tag,
            payload: Some(payload),
            destructor,
            metatable: RefCell::new(None),
        }
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Borrow the payload as `T`, if that is what it holds
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.payload.as_ref()?.downcast_ref::<T>()
    }

    pub fn metatable(&self) -> Option<Arc<MetaTable>> {
        self.metatable.borrow().clone()
    }

    pub fn set_metatable(&self, mt: Arc<MetaTable>) {
        *self.metatable.borrow_mut() = Some(mt);
    }
}

impl Drop for UserData {
    fn drop(&mut self) {
        if let Some(payload) = self.payload.take() {
            (self.destructor)(payload);
        }
    }
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserData")
            .field("tag", &self.tag)
            .field(
                "metatable",
                &self.metatable.borrow().as_ref().map(|mt| mt.name()),
            )
            .finish()
    }
}
