//! # canvas-error
//!
//! Unified error handling for the canvas toolchain.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what went wrong (e.g. InvalidColor, StackUnderflow)
//! - **Stage**: Know which pipeline stage reported it (lex, parse, runtime, host)
//! - **Error Context**: Locate the cause with key-value context (line, byte, opcode)
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use canvas_error::{Error, ErrorKind, Stage};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::UndefinedFunction, "the function 'blur' is not defined")
//!         .with_operation("parser::call")
//!         .with_context("line", "3"))
//! }
//!
//! let err = example().unwrap_err();
//! assert_eq!(err.stage(), Stage::Parse);
//! ```
//!
//! ## Principles
//!
//! - All fallible toolchain functions return `Result<T, canvas_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error reported once, callers only append context

mod error;
mod kind;
mod stage;

pub use error::Error;
pub use kind::ErrorKind;
pub use stage::Stage;

/// Result type alias using the canvas Error
pub type Result<T> = std::result::Result<T, Error>;
