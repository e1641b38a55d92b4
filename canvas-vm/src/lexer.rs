//! # Lexer
//!
//! Turns source text into tokens. Never fails: bad input is reported to the
//! diagnostics sink and scanning resumes at the next character, so one pass
//! can surface several errors. The token list always ends with EOF.

use crate::color::Color;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{self, Error};
use crate::token::{Literal, Token, TokenKind};

const KEYWORD_VAR: &str = "var";

pub struct Lexer<'d> {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    diagnostics: &'d mut Diagnostics,
}

impl<'d> Lexer<'d> {
    pub fn new(source: &str, diagnostics: &'d mut Diagnostics) -> Self {
        Self {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            diagnostics,
        }
    }

    pub fn scan_tokens(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }

        self.tokens.push(Token::eof(self.line));
        tracing::debug!(count = self.tokens.len(), "scanned tokens");
        self.tokens
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            '(' => self.add_token(TokenKind::LeftParen, None),
            ')' => self.add_token(TokenKind::RightParen, None),
            ',' => self.add_token(TokenKind::Comma, None),
            ';' => self.add_token(TokenKind::Semicolon, None),
            '=' => self.add_token(TokenKind::Equal, None),
            '#' => {
                if self.peek().is_ascii_hexdigit() {
                    self.color();
                } else {
                    // comment runs to the end of the line
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if is_alpha(c) => self.identifier(),
            c => self.error(error::unexpected_character(c)),
        }
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.source.get(self.current + 1).copied().unwrap_or('\0')
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    fn add_token(&mut self, kind: TokenKind, literal: Option<Literal>) {
        let token = Token::new(kind, self.lexeme(), literal, self.line);
        self.tokens.push(token);
    }

    fn error(&mut self, error: Error) {
        self.diagnostics.report(Diagnostic::at_line(self.line, error));
    }

    // =========================================================================
    // Literals
    // =========================================================================

    fn identifier(&mut self) {
        while is_alpha_numeric(self.peek()) {
            self.advance();
        }

        let kind = if self.lexeme() == KEYWORD_VAR {
            TokenKind::Var
        } else {
            TokenKind::Identifier
        };
        self.add_token(kind, None);
    }

    fn color(&mut self) {
        while self.peek().is_ascii_hexdigit() {
            self.advance();
        }

        let text = self.lexeme();
        match Color::from_hex(&text) {
            Some(color) => self.add_token(TokenKind::Color, Some(Literal::Color(color))),
            None => self.error(error::invalid_color(text)),
        }
    }

    /// Digits with an optional fractional part. The value is the integer
    /// conversion of the whole matched text, so `1.5` is reported as an
    /// invalid number rather than rounded.
    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text = self.lexeme();
        match text.parse::<i32>() {
            Ok(n) => self.add_token(TokenKind::Number, Some(Literal::Number(n))),
            Err(_) => self.error(error::invalid_number(text)),
        }
    }

    fn string(&mut self) {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.error(error::unterminated_string());
            return;
        }

        // closing quote
        self.advance();

        let value: String = self.source[self.start + 1..self.current - 1].iter().collect();
        self.add_token(TokenKind::String, Some(Literal::String(value)));
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alpha_numeric(c: char) -> bool {
    is_alpha(c) || c.is_ascii_digit()
}

/// Scan `source` with a fresh diagnostics collection
pub fn scan(source: &str) -> (Vec<Token>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let tokens = Lexer::new(source, &mut diagnostics).scan_tokens();
    (tokens, diagnostics)
}
