//! Toolchain error types
//!
//! Re-exports canvas-error and provides stage-specific constructors.

pub use canvas_error::{Error, ErrorKind, Result, Stage};

// =============================================================================
// Lex / parse constructors
// =============================================================================

/// Create an UnexpectedCharacter error
pub fn unexpected_character(c: char) -> Error {
    Error::new(ErrorKind::UnexpectedCharacter, "Unexpected character.")
        .with_context("character", c.to_string())
}

/// Create an UnterminatedString error
pub fn unterminated_string() -> Error {
    Error::new(ErrorKind::UnterminatedString, "Unterminated string.")
}

/// Create an InvalidColor error
pub fn invalid_color(lexeme: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidColor, "Invalid Color.").with_context("lexeme", lexeme)
}

/// Create an InvalidNumber error
pub fn invalid_number(lexeme: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidNumber, "Invalid Number.").with_context("lexeme", lexeme)
}

/// Create an UnexpectedToken error
pub fn unexpected_token(lexeme: impl Into<String>) -> Error {
    Error::new(ErrorKind::UnexpectedToken, "Unexpected token.").with_context("lexeme", lexeme)
}

/// Create an UndefinedFunction error
pub fn undefined_function(name: impl Into<String>) -> Error {
    let name = name.into();
    Error::new(
        ErrorKind::UndefinedFunction,
        format!("The function '{}' is not defined.", name),
    )
    .with_context("function", name)
}

/// Create an UninitialisedVariable error
pub fn uninitialised_variable(name: impl Into<String>) -> Error {
    Error::new(ErrorKind::UninitialisedVariable, "Uninitialised Variable.")
        .with_context("variable", name)
}

/// Create an InvalidAssignment error
pub fn invalid_assignment(name: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidAssignment, "Invalid assignment.").with_context("variable", name)
}

/// Create a StringTooLong error
pub fn string_too_long(len: usize, max: usize) -> Error {
    Error::new(
        ErrorKind::StringTooLong,
        format!("String is too long (max {}).", max),
    )
    .with_context("length", len.to_string())
}

// =============================================================================
// Runtime constructors
// =============================================================================

/// Create a StackOverflow error
pub fn stack_overflow(capacity: usize) -> Error {
    Error::stack_overflow(capacity)
}

/// Create a StackUnderflow error
pub fn stack_underflow() -> Error {
    Error::stack_underflow()
}

/// Create a TypeMismatch error
pub fn type_mismatch(expected: &'static str, found: &'static str) -> Error {
    Error::type_mismatch(expected, found)
}

/// Create an InvalidOpcode error
pub fn invalid_opcode(byte: u8, position: usize) -> Error {
    Error::new(ErrorKind::InvalidOpcode, "Unexpected Instruction.")
        .with_context("byte", format!("0x{:02X}", byte))
        .with_context("position", position.to_string())
}

/// Create a TruncatedBytecode error
pub fn truncated_bytecode(position: usize, needed: usize, available: usize) -> Error {
    Error::new(
        ErrorKind::TruncatedBytecode,
        format!("operand needs {} bytes, {} left", needed, available),
    )
    .with_context("position", position.to_string())
}

/// Create an UnknownVariable error
pub fn unknown_variable(key: i32) -> Error {
    Error::new(ErrorKind::UnknownVariable, format!("no value bound to key {}", key))
        .with_context("key", key.to_string())
}

/// Create a NotImplemented error
pub fn not_implemented(feature: impl Into<String>) -> Error {
    Error::not_implemented(feature)
}

// =============================================================================
// Host constructors
// =============================================================================

/// Create an IoFailed error
pub fn io_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::IoFailed, message)
}

/// Create a ConfigInvalid error
pub fn config_invalid(message: impl Into<String>) -> Error {
    Error::config_invalid(message)
}
