//! # Interpreter
//!
//! Single left-to-right pass over a bytecode buffer. Each instruction pops
//! its arguments (last pushed first), talks to the [`Runtime`], and may
//! push a result. The first failing instruction aborts the run: nothing
//! after it executes, the failure is reported with its byte cursor and
//! opcode, and the raw buffer is written to the dump store. The runtime is
//! asked to redraw exactly once per call, however the run ends.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{self, ErrorKind, Result};
use crate::memory::Variables;
use crate::opcode::{decode_at, Instruction, Opcode};
use crate::runtime::Runtime;
use crate::stack::{Stack, DEFAULT_CAPACITY};
use crate::storage::{DumpStore, MemoryDumps, ABORT_DUMP};
use crate::value::Value;

/// How an interpretation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every instruction ran
    Completed,
    /// A recognised opcode with no implementation was reached
    Unsupported { position: usize, opcode: Opcode },
    /// Malformed bytecode or a failing instruction
    Aborted {
        position: usize,
        byte: u8,
        kind: ErrorKind,
    },
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed)
    }

    /// Byte cursor of the instruction that stopped the run
    pub fn position(&self) -> Option<usize> {
        match self {
            Outcome::Completed => None,
            Outcome::Unsupported { position, .. } | Outcome::Aborted { position, .. } => {
                Some(*position)
            }
        }
    }
}

pub struct Interpreter {
    stack: Stack<Value>,
    variables: Variables,
    dumps: Box<dyn DumpStore>,
}

impl Interpreter {
    pub fn new(stack_capacity: usize) -> Self {
        Self::with_dumps(stack_capacity, Box::new(MemoryDumps::new()))
    }

    pub fn with_dumps(stack_capacity: usize, dumps: Box<dyn DumpStore>) -> Self {
        Self {
            stack: Stack::new(stack_capacity),
            variables: Variables::new(),
            dumps,
        }
    }

    /// Forget every value and binding
    pub fn reset(&mut self) {
        self.stack = Stack::new(self.stack.capacity());
        self.variables.clear();
    }

    pub fn stack(&self) -> &Stack<Value> {
        &self.stack
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn dumps(&self) -> &dyn DumpStore {
        self.dumps.as_ref()
    }

    pub fn dumps_mut(&mut self) -> &mut dyn DumpStore {
        self.dumps.as_mut()
    }

    pub fn interpret(
        &mut self,
        bytecode: &[u8],
        runtime: &mut dyn Runtime,
        diagnostics: &mut Diagnostics,
    ) -> Outcome {
        let outcome = self.execute_all(bytecode, runtime, diagnostics);
        if !outcome.is_completed() {
            if let Err(e) = self.dumps.write(ABORT_DUMP, bytecode) {
                diagnostics.report(Diagnostic::host(e.with_operation("interpreter::dump")));
            }
        }
        runtime.request_redraw();
        outcome
    }

    fn execute_all(
        &mut self,
        bytecode: &[u8],
        runtime: &mut dyn Runtime,
        diagnostics: &mut Diagnostics,
    ) -> Outcome {
        let mut position = 0;
        while position < bytecode.len() {
            let byte = bytecode[position];

            if let Some(opcode) = Opcode::from_u8(byte).filter(|op| !op.is_implemented()) {
                diagnostics.report(Diagnostic::at_byte(
                    position,
                    byte,
                    error::not_implemented(opcode.name()).with_operation("interpreter::step"),
                ));
                return Outcome::Unsupported { position, opcode };
            }

            match self.step(bytecode, position, runtime) {
                Ok(next) => position = next,
                Err(e) => {
                    let kind = e.kind();
                    diagnostics.report(Diagnostic::at_byte(
                        position,
                        byte,
                        e.with_operation("interpreter::step"),
                    ));
                    return Outcome::Aborted {
                        position,
                        byte,
                        kind,
                    };
                }
            }
        }
        Outcome::Completed
    }

    /// Execute the instruction at `position` and return the next cursor
    fn step(&mut self, bytecode: &[u8], position: usize, runtime: &mut dyn Runtime) -> Result<usize> {
        let (instruction, next) = decode_at(bytecode, position)?;
        tracing::trace!(position, instruction = %instruction, "execute");

        match instruction {
            Instruction::Integer(i) => self.stack.push(Value::Integer(i))?,
            Instruction::Color(c) => self.stack.push(Value::Color(c))?,
            Instruction::String(bytes) => self.stack.push(Value::String(bytes))?,
            Instruction::Op(op) => self.execute(op, runtime)?,
        }

        Ok(next)
    }

    fn execute(&mut self, op: Opcode, runtime: &mut dyn Runtime) -> Result<()> {
        match op {
            Opcode::Read => {
                let key = self.pop_integer()?;
                let value = self.variables.read(key)?.clone();
                self.stack.push(value)?;
            }
            Opcode::Write => {
                let value = self.stack.pop()?;
                let key = self.pop_integer()?;
                self.variables.write(key, value);
            }
            Opcode::Dup => self.stack.dup()?,

            Opcode::Fill => {
                let color = self.stack.pop()?.as_color()?;
                runtime.fill(color);
            }
            Opcode::SetPixel => {
                let color = self.stack.pop()?.as_color()?;
                let y = self.pop_integer()?;
                let x = self.pop_integer()?;
                runtime.draw_pixel(x, y, color);
            }
            Opcode::SetRect => {
                let color = self.stack.pop()?.as_color()?;
                let h = self.pop_integer()?;
                let w = self.pop_integer()?;
                let y = self.pop_integer()?;
                let x = self.pop_integer()?;
                runtime.draw_rect(x, y, w, h, color);
            }
            Opcode::WriteText => {
                let color = self.stack.pop()?.as_color()?;
                let text = self.stack.pop()?.as_text()?;
                let size = self.pop_integer()?;
                let y = self.pop_integer()?;
                let x = self.pop_integer()?;
                runtime.write_text(x, y, size, &text, color);
            }

            Opcode::GetPixel => {
                let y = self.pop_integer()?;
                let x = self.pop_integer()?;
                self.stack.push(Value::Color(runtime.get_pixel(x, y)))?;
            }
            Opcode::GetNoise => {
                let y = self.pop_integer()?;
                let x = self.pop_integer()?;
                self.stack.push(Value::Integer(runtime.noise(x, y)))?;
            }
            Opcode::GetWidth => self.stack.push(Value::Integer(runtime.width()))?,
            Opcode::GetHeight => self.stack.push(Value::Integer(runtime.height()))?,
            Opcode::GetRand => {
                let max = self.pop_integer()?;
                let min = self.pop_integer()?;
                self.stack.push(Value::Integer(runtime.random(min, max)))?;
            }

            Opcode::Rgb | Opcode::Cmyk | Opcode::Hsv | Opcode::Lab => {
                return Err(error::not_implemented(op.name()));
            }

            // decoded into Instruction literals before reaching here
            Opcode::IntegerLiteral | Opcode::ColorLiteral | Opcode::StringLiteral => {
                return Err(error::invalid_opcode(op.as_u8(), 0));
            }
        }
        Ok(())
    }

    fn pop_integer(&mut self) -> Result<i32> {
        self.stack.pop()?.as_integer()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
