//! Pipeline stage that produced an error

use std::fmt;

/// Which stage of the toolchain reported an error.
///
/// Lex and parse errors are tolerant (the stage keeps going and may report
/// more), runtime errors abort the current interpretation, host errors come
/// from the surroundings (files, configuration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Lex,
    Parse,
    Runtime,
    Host,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Lex => "lex",
            Stage::Parse => "parse",
            Stage::Runtime => "runtime",
            Stage::Host => "host",
        }
    }

    /// Whether an error of this stage stops the current interpretation
    pub fn is_fatal(&self) -> bool {
        matches!(self, Stage::Runtime)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
