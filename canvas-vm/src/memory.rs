//! # Variable table
//!
//! Maps synthetic integer keys to values for the lifetime of an
//! interpreter. Keys come from the compiled bytecode; source identifiers
//! never reach this layer.

use crate::error::{self, Result};
use crate::value::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Variables {
    slots: HashMap<i32, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: i32) -> bool {
        self.slots.contains_key(&key)
    }

    pub fn read(&self, key: i32) -> Result<&Value> {
        self.slots.get(&key).ok_or_else(|| error::unknown_variable(key))
    }

    /// Bind `key`, replacing any previous value
    pub fn write(&mut self, key: i32, value: Value) {
        self.slots.insert(key, value);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &Value)> {
        self.slots.iter().map(|(k, v)| (*k, v))
    }
}
