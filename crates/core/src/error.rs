//! Runtime Error Handling
//!
//! Native entry points report failures by returning a [`RuntimeError`].
//! The host additionally records the rendered message in thread-local
//! state when a native call fails, so embedders can inspect the last
//! error without threading the `Result` through their own code.
//!
//! # Usage
//!
//! Entry points propagate with `?`:
//! ```ignore
//! let n = state.check_int("tuple.__get", 1)?;
//! if n < 0 {
//!     return Err(RuntimeError::value("index out of range"));
//! }
//! ```
//!
//! Callers can check for errors after a failed call:
//! ```ignore
//! if has_runtime_error() {
//!     let error = take_runtime_error();
//!     // Handle error...
//! }
//! ```

use std::cell::RefCell;
use std::fmt;

thread_local! {
    /// Thread-local storage for the last runtime error message
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Errors a native entry point can raise back into the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// An argument had the wrong type
    TypeError(String),
    /// An argument had the right type but an unacceptable value
    ValueError(String),
    /// The exchange surface or call depth exceeded the configured limit
    StackOverflow(String),
    /// A pop reached below the current call frame
    StackUnderflow(String),
    /// Configuration could not be read or parsed
    Config(String),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

impl RuntimeError {
    pub fn type_error(msg: impl Into<String>) -> Self {
        RuntimeError::TypeError(msg.into())
    }

    pub fn value(msg: impl Into<String>) -> Self {
        RuntimeError::ValueError(msg.into())
    }

    /// Short kind name, as shown before the message
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::TypeError(_) => "TypeError",
            RuntimeError::ValueError(_) => "ValueError",
            RuntimeError::StackOverflow(_) => "StackOverflow",
            RuntimeError::StackUnderflow(_) => "StackUnderflow",
            RuntimeError::Config(_) => "ConfigError",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RuntimeError::TypeError(m)
            | RuntimeError::ValueError(m)
            | RuntimeError::StackOverflow(m)
            | RuntimeError::StackUnderflow(m)
            | RuntimeError::Config(m) => m,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message())
    }
}

impl std::error::Error for RuntimeError {}

/// Set the last runtime error message
pub fn set_runtime_error(msg: impl Into<String>) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = Some(msg.into());
    });
}

/// Take (and clear) the last runtime error message
pub fn take_runtime_error() -> Option<String> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}

/// Check if there's a pending runtime error
pub fn has_runtime_error() -> bool {
    LAST_ERROR.with(|e| e.borrow().is_some())
}

/// Clear any pending runtime error
pub fn clear_runtime_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}
