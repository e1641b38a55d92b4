//! The main Error type for the canvas toolchain

use crate::{ErrorKind, Stage};
use std::fmt;

/// Error raised anywhere in the toolchain.
///
/// `kind` classifies the failure and picks the default `stage`. The
/// `message` is the user-facing text printed in reports; `operation` and
/// `context` locate the failure for logs, and `source` keeps a wrapped
/// lower-level error.
///
/// # Example
///
/// ```rust
/// use canvas_error::{Error, ErrorKind, Stage};
///
/// let err = Error::new(ErrorKind::TypeMismatch, "expected Integer, found Color")
///     .with_operation("interpreter::step")
///     .with_context("byte", "12")
///     .with_context("opcode", "SET_PIXEL");
///
/// assert_eq!(err.kind(), ErrorKind::TypeMismatch);
/// assert_eq!(err.stage(), Stage::Runtime);
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    stage: Stage,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Error of `kind`, reported by the kind's default stage
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stage: kind.default_stage(),
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Context pairs in insertion order
    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// First context value stored under `key`
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn source_ref(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    /// Override the reporting stage
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    /// Record the operation that failed. A previously recorded operation is
    /// kept in context under "called".
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Wrap the lower-level cause. Setting it twice is a bug (debug assert).
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(source.into());
        self
    }

    /// Whether this error ends the current interpretation
    pub fn is_fatal(&self) -> bool {
        self.stage.is_fatal()
    }
}

// `Kind (stage) at op, context { k: v } => message`

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.stage)?;
        if !self.operation.is_empty() {
            write!(f, " at {}", self.operation)?;
        }

        if !self.context.is_empty() {
            write!(f, ", context {{ ")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", key, value)?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}


impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) at {}", self.kind, self.stage, self.operation)?;

        if !self.message.is_empty() {
            writeln!(f)?;
            writeln!(f, "    message: {}", self.message)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "    context:")?;
            for (key, value) in &self.context {
                writeln!(f, "      {} = {}", key, value)?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "    caused by: {:?}", source)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::IoFailed, err.to_string())
            .with_operation("std::io")
            .set_source(err)
    }
}

// Shared constructors; stage-specific ones live next to their callers

impl Error {
    /// Push onto a stack holding `capacity` values
    pub fn stack_overflow(capacity: usize) -> Self {
        Self::new(ErrorKind::StackOverflow, "stack is full")
            .with_context("capacity", capacity.to_string())
    }

    /// Pop or peek on an empty stack
    pub fn stack_underflow() -> Self {
        Self::new(ErrorKind::StackUnderflow, "empty stack")
    }

    /// A value of type `found` where `expected` was required
    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("type mismatch: expected {}, found {}", expected, found),
        )
        .with_context("expected", expected)
        .with_context("found", found)
    }

    /// Recognised operation with no implementation
    pub fn not_implemented(feature: impl Into<String>) -> Self {
        let name = feature.into();
        Self::new(ErrorKind::NotImplemented, format!("'{}' is not implemented", name))
            .with_context("feature", name)
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }
}
