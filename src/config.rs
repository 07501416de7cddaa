//! # Configuration
//!
//! Two layers, later ones winning:
//!
//! 1. [`ServiceConfig`] loaded from a YAML file (`--config`), defaults when absent
//! 2. [`RuntimeConfig`] from environment variables
//!
//! The CLI applies its own flags on top.
//!
//! ## Environment Variables
//!
//! ### `QUERYBIND_STACK_SIZE`
//!
//! Stack size for connection coroutines. Accepts decimal (`16384`) or hexadecimal
//! (`0x4000`). Default: `0x4000` (16 KB).
//!
//! ### `QUERYBIND_ADDR`
//!
//! Address to bind, e.g. `0.0.0.0:8080`.
//!
//! ## Example file
//!
//! ```yaml
//! addr: 0.0.0.0:8080
//! stack_size: 32768
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

pub const DEFAULT_STACK_SIZE: usize = 0x4000;
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Parse a stack size given in decimal or `0x` hexadecimal.
#[must_use]
pub fn parse_stack_size(value: &str) -> Option<usize> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub stack_size: Option<usize>,
    pub addr: Option<String>,
}

impl RuntimeConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            stack_size: lookup("QUERYBIND_STACK_SIZE").and_then(|v| parse_stack_size(&v)),
            addr: lookup("QUERYBIND_ADDR").filter(|v| !v.trim().is_empty()),
        }
    }
}

/// Service settings from the YAML config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub addr: String,
    pub stack_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl ServiceConfig {
    /// Load from a YAML file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not a valid config document.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Overlay environment settings on top of the file settings.
    #[must_use]
    pub fn with_runtime(mut self, runtime: &RuntimeConfig) -> Self {
        if let Some(stack_size) = runtime.stack_size {
            self.stack_size = stack_size;
        }
        if let Some(addr) = &runtime.addr {
            self.addr = addr.clone();
        }
        self
    }
}
