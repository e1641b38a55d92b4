//! # Canvas VM
//!
//! Toolchain for a small drawing language: statements such as
//! `var c = #ff8800; setrect(0, 0, getwidth(), 10, c)` are scanned into
//! tokens, compiled in a single pass into compact bytecode, and run on a
//! stack interpreter that talks to a drawing surface through [`Runtime`].
//!
//! ## Core Concepts
//! - **Lexer**: source text to tokens, one diagnostic per bad character
//! - **Parser**: tokens to bytecode with compile-time variable keys
//! - **Interpreter**: bounded value stack, keyed variables, abort on first fault
//! - **Runtime**: capability trait for drawing and canvas queries
//! - **Dumps**: diagnostic artifacts kept in memory or on disk
//!
//! ```
//! use canvas_vm::{RecordingRuntime, VirtualMachine, VmConfig};
//!
//! let mut vm = VirtualMachine::new(VmConfig::default()).unwrap();
//! let mut canvas = RecordingRuntime::new(64, 64);
//! let report = vm.run("fill(#ff0000)", &mut canvas);
//! assert!(report.is_success());
//! assert_eq!(report.bytecode, vec![0x11, 0xFF, 0x00, 0x00, 0xFF, 0x20]);
//! ```

pub mod color;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod machine;
pub mod memory;
pub mod opcode;
pub mod parser;
pub mod runtime;
pub mod stack;
pub mod storage;
pub mod token;
pub mod value;

pub use color::Color;
pub use config::{KeyStrategy, VmConfig, MAX_STRING_LEN};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{Error, ErrorKind, Result, Stage};
pub use interpreter::{Interpreter, Outcome};
pub use lexer::{scan, Lexer};
pub use machine::{Compilation, RunReport, VirtualMachine};
pub use memory::Variables;
pub use opcode::{decode, decode_at, disassemble, Instruction, Opcode};
pub use parser::{compile, Compiled, Parser, SymbolTable};
pub use runtime::{Call, RecordingRuntime, Runtime};
pub use stack::Stack;
pub use storage::{DumpStore, FileDumps, MemoryDumps, ABORT_DUMP, BYTECODE_DUMP, TOKENS_DUMP};
pub use token::{Literal, Token, TokenKind};
pub use value::Value;
