//! Error kinds for canvas toolchain operations

use crate::Stage;
use std::fmt;

/// What went wrong.
///
/// Matches the lex / parse / runtime taxonomy of the toolchain so callers
/// (and tests) can tell a malformed program from a recognised but
/// unimplemented operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// Anything the other kinds do not cover
    Unexpected,

    /// Configuration file or value rejected
    ConfigInvalid,

    /// IO operation failed (dump files, script files)
    IoFailed,

    // =========================================================================
    // Lex errors
    // =========================================================================
    /// Character that starts no token
    UnexpectedCharacter,

    /// String literal without a closing quote
    UnterminatedString,

    /// Colour literal that is neither 3 nor 6 hex digits
    InvalidColor,

    /// Number literal whose full text does not convert to a 32-bit integer
    InvalidNumber,

    // =========================================================================
    // Parse errors
    // =========================================================================
    /// Token that does not fit the statement being parsed
    UnexpectedToken,

    /// Call to a name missing from the built-in function table
    UndefinedFunction,

    /// Identifier used as an argument before any `var` declared it
    UninitialisedVariable,

    /// Right-hand side on another line, or neither a literal nor a call
    InvalidAssignment,

    /// String literal longer than the one-byte length prefix allows
    StringTooLong,

    // =========================================================================
    // Runtime errors
    // =========================================================================
    /// Push onto a full value stack
    StackOverflow,

    /// Pop or peek on an empty value stack
    StackUnderflow,

    /// Value variant differs from the one the instruction expects
    TypeMismatch,

    /// Byte that is not an opcode
    InvalidOpcode,

    /// Operand runs past the end of the buffer
    TruncatedBytecode,

    /// READ of a key that was never written
    UnknownVariable,

    /// Opcode is recognised but has no implementation
    NotImplemented,
}

impl ErrorKind {
    /// Variant name, used in logs and `Display`
    pub fn as_str(&self) -> &'static str {
        match self {
            // General
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::IoFailed => "IoFailed",

            // Lex
            ErrorKind::UnexpectedCharacter => "UnexpectedCharacter",
            ErrorKind::UnterminatedString => "UnterminatedString",
            ErrorKind::InvalidColor => "InvalidColor",
            ErrorKind::InvalidNumber => "InvalidNumber",

            // Parse
            ErrorKind::UnexpectedToken => "UnexpectedToken",
            ErrorKind::UndefinedFunction => "UndefinedFunction",
            ErrorKind::UninitialisedVariable => "UninitialisedVariable",
            ErrorKind::InvalidAssignment => "InvalidAssignment",
            ErrorKind::StringTooLong => "StringTooLong",

            // Runtime
            ErrorKind::StackOverflow => "StackOverflow",
            ErrorKind::StackUnderflow => "StackUnderflow",
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::InvalidOpcode => "InvalidOpcode",
            ErrorKind::TruncatedBytecode => "TruncatedBytecode",
            ErrorKind::UnknownVariable => "UnknownVariable",
            ErrorKind::NotImplemented => "NotImplemented",
        }
    }

    /// The stage that reports this kind unless told otherwise
    pub fn default_stage(&self) -> Stage {
        match self {
            ErrorKind::UnexpectedCharacter
            | ErrorKind::UnterminatedString
            | ErrorKind::InvalidColor
            | ErrorKind::InvalidNumber => Stage::Lex,

            ErrorKind::UnexpectedToken
            | ErrorKind::UndefinedFunction
            | ErrorKind::UninitialisedVariable
            | ErrorKind::InvalidAssignment
            | ErrorKind::StringTooLong => Stage::Parse,

            ErrorKind::StackOverflow
            | ErrorKind::StackUnderflow
            | ErrorKind::TypeMismatch
            | ErrorKind::InvalidOpcode
            | ErrorKind::TruncatedBytecode
            | ErrorKind::UnknownVariable
            | ErrorKind::NotImplemented => Stage::Runtime,

            ErrorKind::Unexpected | ErrorKind::ConfigInvalid | ErrorKind::IoFailed => Stage::Host,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
