//! Runtime configuration
//!
//! Limits for the host exchange surface and for recursive operations over
//! nested values. Every field has a default, so an empty TOML document is
//! a valid configuration.
//!
//! # Example
//!
//! ```toml
//! max_stack_size = 4096
//! max_call_depth = 256
//! max_nesting_depth = 256
//! ```

use crate::error::{RuntimeError, RuntimeResult};
use serde::Deserialize;
use std::path::Path;

/// Environment variable naming a TOML config file
pub const CONFIG_ENV_VAR: &str = "TUPLEX_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Maximum number of values on the exchange surface
    pub max_stack_size: usize,

    /// Maximum depth of nested native calls
    pub max_call_depth: usize,

    /// Maximum nesting depth walked by recursive value operations
    ///
    /// Never below `max_call_depth`: any value that recursive calls such as
    /// `__eq` and `tostr` can walk is also walkable by the non-call walkers.
    pub max_nesting_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_stack_size: 1 << 16,
            max_call_depth: 512,
            max_nesting_depth: 512,
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(source: &str) -> RuntimeResult<Self> {
        let config: RuntimeConfig =
            toml::from_str(source).map_err(|e| RuntimeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> RuntimeResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }

    /// Load from the file named by `TUPLEX_CONFIG`, or defaults when unset
    pub fn from_env() -> RuntimeResult<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> RuntimeResult<()> {
        if self.max_stack_size == 0 {
            return Err(RuntimeError::Config(
                "max_stack_size must be greater than zero".to_string(),
            ));
        }
        if self.max_call_depth == 0 {
            return Err(RuntimeError::Config(
                "max_call_depth must be greater than zero".to_string(),
            ));
        }
        if self.max_nesting_depth < self.max_call_depth {
            return Err(RuntimeError::Config(format!(
                "max_nesting_depth ({}) must be at least max_call_depth ({})",
                self.max_nesting_depth, self.max_call_depth
            )));
        }
        Ok(())
    }
}
