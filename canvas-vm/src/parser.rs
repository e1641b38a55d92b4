//! # Parser / compiler
//!
//! Recursive descent over the token list, emitting bytecode directly.
//!
//! ```text
//! statement   := var_decl | call_stmt
//! var_decl    := "var" IDENT "=" (literal | call_stmt)
//! call_stmt   := IDENT "(" [ arg ("," arg)* ] ")"
//! arg         := literal | IDENT | call_stmt
//! ```
//!
//! Errors are reported and parsing moves on; any reported error makes the
//! returned bytecode unreliable.

use crate::config::{KeyStrategy, VmConfig};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{self, Error};
use crate::opcode::{Instruction, Opcode};
use crate::token::{Literal, Token, TokenKind};
use crate::value::ascii_bytes;
use rand::Rng;
use std::collections::HashMap;

/// Identifier -> key mapping for one compile unit
#[derive(Debug, Clone)]
pub struct SymbolTable {
    keys: HashMap<String, i32>,
    strategy: KeyStrategy,
    next: i32,
}

impl SymbolTable {
    pub fn new(strategy: KeyStrategy) -> Self {
        Self {
            keys: HashMap::new(),
            strategy,
            next: 0,
        }
    }

    /// Bind `name` to a fresh key. Redeclaring a name rebinds it.
    pub fn declare(&mut self, name: &str) -> i32 {
        let key = match self.strategy {
            KeyStrategy::Sequential => {
                let key = self.next;
                self.next += 1;
                key
            }
            KeyStrategy::Random => rand::thread_rng().gen_range(0..=i32::MAX),
        };
        self.keys.insert(name.to_string(), key);
        key
    }

    pub fn lookup(&self, name: &str) -> Option<i32> {
        self.keys.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Result of compiling one token list
#[derive(Debug)]
pub struct Compiled {
    pub bytecode: Vec<u8>,
    pub symbols: SymbolTable,
}

pub struct Parser<'t, 'd> {
    tokens: &'t [Token],
    current: usize,
    bytecode: Vec<u8>,
    symbols: SymbolTable,
    max_string_len: usize,
    diagnostics: &'d mut Diagnostics,
    eof: Token,
}

impl<'t, 'd> Parser<'t, 'd> {
    pub fn new(tokens: &'t [Token], config: &VmConfig, diagnostics: &'d mut Diagnostics) -> Self {
        let last_line = tokens.last().map(|t| t.line).unwrap_or(1);
        Self {
            tokens,
            current: 0,
            bytecode: Vec::new(),
            symbols: SymbolTable::new(config.key_strategy),
            max_string_len: config.max_string_len,
            diagnostics,
            eof: Token::eof(last_line),
        }
    }

    pub fn parse(mut self) -> Compiled {
        self.optimise_tokens();

        while !self.is_at_end() {
            self.statement();
        }

        self.optimise_bytecode();

        tracing::debug!(
            bytes = self.bytecode.len(),
            variables = self.symbols.len(),
            "compiled"
        );
        Compiled {
            bytecode: self.bytecode,
            symbols: self.symbols,
        }
    }

    fn statement(&mut self) {
        let token = self.advance();
        match token.kind {
            TokenKind::Var => self.variable(),
            TokenKind::Identifier => self.call(&token),
            TokenKind::Semicolon | TokenKind::Eof => {}
            _ => self.error(token.line, error::unexpected_token(&token.lexeme)),
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn variable(&mut self) {
        let identifier = self.advance();
        if identifier.kind != TokenKind::Identifier || self.peek().kind != TokenKind::Equal {
            self.error(identifier.line, error::unexpected_token(&identifier.lexeme));
            return;
        }
        self.advance();

        let value = self.advance();
        if value.line != identifier.line {
            self.error(identifier.line, error::invalid_assignment(&identifier.lexeme));
            return;
        }

        if value.kind == TokenKind::Identifier && self.peek().kind == TokenKind::LeftParen {
            let key = self.symbols.declare(&identifier.lexeme);
            self.emit(Instruction::Integer(key));
            self.call(&value);
            self.emit(Instruction::Op(Opcode::Write));
        } else if value.kind.is_literal() {
            let key = self.symbols.declare(&identifier.lexeme);
            self.emit(Instruction::Integer(key));
            self.literal(&value);
            self.emit(Instruction::Op(Opcode::Write));
        } else {
            self.error(identifier.line, error::invalid_assignment(&identifier.lexeme));
        }
    }

    /// `name` has been consumed; the cursor is on the opening paren
    fn call(&mut self, name: &Token) {
        let open = self.advance();
        if open.kind != TokenKind::LeftParen {
            self.error(open.line, error::unexpected_token(&open.lexeme));
            return;
        }

        if self.peek().kind == TokenKind::RightParen {
            let close = self.advance();
            self.function(name, close.line);
            return;
        }

        if !self.peek().kind.is_parameter() {
            let token = self.peek().clone();
            self.error(token.line, error::unexpected_token(&token.lexeme));
            return;
        }

        let mut current = self.advance();
        while current.kind != TokenKind::RightParen {
            match current.kind {
                kind if kind.is_literal() => self.literal(&current),
                TokenKind::Identifier if self.peek().kind == TokenKind::LeftParen => {
                    self.call(&current);
                }
                TokenKind::Identifier => match self.symbols.lookup(&current.lexeme) {
                    Some(key) => {
                        self.emit(Instruction::Integer(key));
                        self.emit(Instruction::Op(Opcode::Read));
                    }
                    None => {
                        self.error(current.line, error::uninitialised_variable(&current.lexeme));
                        return;
                    }
                },
                TokenKind::Comma => {}
                _ => {
                    self.error(current.line, error::unexpected_token(&current.lexeme));
                    return;
                }
            }
            current = self.advance();
        }

        self.function(name, current.line);
    }

    fn function(&mut self, name: &Token, line: usize) {
        match Opcode::from_function_name(&name.lexeme) {
            Some(op) => self.emit(Instruction::Op(op)),
            None => self.error(line, error::undefined_function(&name.lexeme)),
        }
    }

    fn literal(&mut self, token: &Token) {
        match &token.literal {
            Some(Literal::Number(n)) => self.emit(Instruction::Integer(*n)),
            Some(Literal::Color(c)) => self.emit(Instruction::Color(*c)),
            Some(Literal::String(s)) => {
                let bytes = ascii_bytes(s);
                if bytes.len() > self.max_string_len {
                    self.error(token.line, error::string_too_long(bytes.len(), self.max_string_len));
                    return;
                }
                self.emit(Instruction::String(bytes));
            }
            None => self.error(token.line, error::unexpected_token(&token.lexeme)),
        }
    }

    // =========================================================================
    // Optimisation passes
    // =========================================================================

    /// Hook for token-level passes: unused variable elimination, hoisting
    /// declarations, pre-folding colour literals. Currently a no-op.
    fn optimise_tokens(&mut self) {}

    /// Hook for replacing a repeated literal push with DUP. Currently a no-op.
    fn optimise_bytecode(&mut self) {}

    // =========================================================================
    // Cursor
    // =========================================================================

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    /// Next token; keeps returning EOF once the list is exhausted
    fn advance(&mut self) -> Token {
        match self.tokens.get(self.current) {
            Some(token) => {
                self.current += 1;
                token.clone()
            }
            None => self.eof.clone(),
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.current).unwrap_or(&self.eof)
    }

    fn emit(&mut self, instruction: Instruction) {
        instruction.encode(&mut self.bytecode);
    }

    fn error(&mut self, line: usize, error: Error) {
        self.diagnostics.report(Diagnostic::at_line(line, error));
    }
}

/// Compile a token list with the default configuration
pub fn compile(tokens: &[Token]) -> (Vec<u8>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let compiled = Parser::new(tokens, &VmConfig::default(), &mut diagnostics).parse();
    (compiled.bytecode, diagnostics)
}
