//! # Diagnostics
//!
//! Located error records collected per compile / interpret call. Each
//! toolchain instance keeps its own collection; nothing is process-wide.

use crate::error::{Error, ErrorKind, Stage};
use crate::opcode::Opcode;
use std::fmt;

/// One reported error with its location
#[derive(Debug)]
pub struct Diagnostic {
    error: Error,
    /// Source line for lex / parse errors
    line: Option<usize>,
    /// Byte cursor for runtime errors
    position: Option<usize>,
    /// Raw opcode byte at `position`
    opcode: Option<u8>,
    /// Unix timestamp in milliseconds
    reported_at: u64,
}

impl Diagnostic {
    /// Lex or parse error at a source line
    pub fn at_line(line: usize, error: Error) -> Self {
        Self {
            error: error.with_context("line", line.to_string()),
            line: Some(line),
            position: None,
            opcode: None,
            reported_at: current_timestamp(),
        }
    }

    /// Runtime error at a byte cursor
    pub fn at_byte(position: usize, opcode: u8, error: Error) -> Self {
        Self {
            error: error.with_context("cursor", position.to_string()),
            line: None,
            position: Some(position),
            opcode: Some(opcode),
            reported_at: current_timestamp(),
        }
    }

    /// Error without a source location (files, configuration)
    pub fn host(error: Error) -> Self {
        Self {
            error: error.with_stage(Stage::Host),
            line: None,
            position: None,
            opcode: None,
            reported_at: current_timestamp(),
        }
    }

    pub fn error(&self) -> &Error {
        &self.error
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn stage(&self) -> Stage {
        self.error.stage()
    }

    pub fn message(&self) -> &str {
        self.error.message()
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn opcode(&self) -> Option<u8> {
        self.opcode
    }

    pub fn reported_at(&self) -> u64 {
        self.reported_at
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.position) {
            (Some(line), _) => write!(f, "[line {}] Error: {}", line, self.message()),
            (None, Some(position)) => {
                let name = match self.opcode.and_then(Opcode::from_u8) {
                    Some(op) => op.name().to_string(),
                    None => format!("0x{:02X}", self.opcode.unwrap_or_default()),
                };
                write!(f, "[byte {}] {} Runtime Error: {}", position, name, self.message())
            }
            (None, None) => write!(f, "Error: {}", self.message()),
        }
    }
}

/// Ordered collection of diagnostics
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it
    pub fn report(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            stage = %diagnostic.stage(),
            kind = %diagnostic.kind(),
            "{}",
            diagnostic
        );
        self.entries.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Diagnostics reported by one stage
    pub fn of_stage(&self, stage: Stage) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.stage() == stage)
    }

    /// Kinds in report order
    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.entries.iter().map(|d| d.kind()).collect()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
