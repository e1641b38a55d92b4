//! Runtime value representation
//!
//! Exactly one variant is active. Values are copied, never shared.

use crate::color::Color;
use crate::error::{self, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// 32-bit signed integer
    Integer(i32),

    /// ARGB colour
    Color(Color),

    /// ASCII byte string
    String(Vec<u8>),
}

impl Value {
    /// Build a string value, replacing non-ASCII characters with `?`
    pub fn string(text: &str) -> Self {
        Value::String(ascii_bytes(text))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Color(_) => "Color",
            Value::String(_) => "String",
        }
    }

    pub fn as_integer(&self) -> Result<i32> {
        match self {
            Value::Integer(i) => Ok(*i),
            other => Err(error::type_mismatch("Integer", other.type_name())),
        }
    }

    pub fn as_color(&self) -> Result<Color> {
        match self {
            Value::Color(c) => Ok(*c),
            other => Err(error::type_mismatch("Color", other.type_name())),
        }
    }

    pub fn as_text(&self) -> Result<String> {
        match self {
            Value::String(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
            other => Err(error::type_mismatch("String", other.type_name())),
        }
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i)
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Value::Color(c)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Color(c) => write!(f, "{}", c),
            Value::String(bytes) => write!(f, "\"{}\"", String::from_utf8_lossy(bytes)),
        }
    }
}

/// ASCII encoding with `?` for anything outside the 7-bit range
pub fn ascii_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect()
}
