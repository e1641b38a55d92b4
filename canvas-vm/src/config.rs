//! Toolchain configuration

use crate::error::{self, Result};
use crate::stack::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest string literal the one-byte length prefix can describe
pub const MAX_STRING_LEN: usize = u8::MAX as usize;

/// Largest accepted interpreter stack capacity
pub const MAX_STACK_CAPACITY: usize = 1 << 16;

/// How the compiler hands out variable keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    /// 0, 1, 2, ... within one compile; never collides
    #[default]
    Sequential,
    /// Independent random non-negative keys; two names may collide
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Interpreter stack capacity
    pub stack_capacity: usize,
    pub key_strategy: KeyStrategy,
    /// Directory for diagnostic artifacts; kept in memory when unset
    pub dump_dir: Option<PathBuf>,
    /// Write `tokens.log` on every run
    pub dump_tokens: bool,
    /// Write `bytecode.bin` on every run
    pub dump_bytecode: bool,
    pub max_string_len: usize,
    /// Still interpret when lexing or parsing reported errors
    pub interpret_on_compile_error: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_capacity: DEFAULT_CAPACITY,
            key_strategy: KeyStrategy::Sequential,
            dump_dir: None,
            dump_tokens: false,
            dump_bytecode: false,
            max_string_len: MAX_STRING_LEN,
            interpret_on_compile_error: true,
        }
    }
}

impl VmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            error::io_error(format!("failed to read {}: {}", path.display(), e)).set_source(e)
        })?;
        let config: VmConfig = serde_json::from_str(&content).map_err(|e| {
            error::config_invalid(format!("{}: {}", path.display(), e)).set_source(e)
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stack_capacity == 0 {
            return Err(error::config_invalid("stack_capacity must be at least 1"));
        }
        if self.stack_capacity > MAX_STACK_CAPACITY {
            return Err(error::config_invalid(format!(
                "stack_capacity cannot exceed {}",
                MAX_STACK_CAPACITY
            )));
        }
        if self.max_string_len > MAX_STRING_LEN {
            return Err(error::config_invalid(format!(
                "max_string_len cannot exceed {}",
                MAX_STRING_LEN
            )));
        }
        Ok(())
    }
}
