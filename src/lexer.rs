//! Lexical analysis.
//!
//! Contains the [Lexer], which implements an [Iterator] that yields [Lexeme]s.
//!
//! # Example
//!
//! ```
//! use monkey::lexer::Lexer;
//! use monkey::token::Token;
//!
//! let lexer = Lexer::new("let x = 1 + 2;");
//! let tokens: Vec<_> = lexer
//!     .map(|lexeme| lexeme.token())
//!     .take_while(|&token| token != Token::Eof)
//!     .collect();
//!
//! use Token::*;
//! assert_eq!(vec![Let, Ident, Assign, Int, Plus, Int, Semicolon], tokens);
//! ```

use crate::token::{lookup_ident, Lexeme, Token};

/// Scans source text and iteratively yields [Lexeme]s.
///
/// The lexer is stateful and does one pass over the source string. Once the whole source has
/// been scanned, it yields [Token::Eof] forever.
#[derive(Debug)]
pub struct Lexer<'a> {
    start: &'a str,
    current: &'a str,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            start: source,
            current: source,
            line: 1,
        }
    }

    /// Yield the next [Lexeme] from the string.
    pub fn scan_token(&mut self) -> Lexeme<'a> {
        self.skip_whitespace();
        self.start = self.current;

        if self.is_at_end() {
            return self.make_lexeme(Token::Eof);
        }

        match self.advance() {
            c if is_id_start(c) => self.identifier(),
            c if c.is_ascii_digit() => self.number(),
            '(' => self.make_lexeme(Token::LParen),
            ')' => self.make_lexeme(Token::RParen),
            '{' => self.make_lexeme(Token::LBrace),
            '}' => self.make_lexeme(Token::RBrace),
            '[' => self.make_lexeme(Token::LBracket),
            ']' => self.make_lexeme(Token::RBracket),
            ';' => self.make_lexeme(Token::Semicolon),
            ':' => self.make_lexeme(Token::Colon),
            ',' => self.make_lexeme(Token::Comma),
            '+' => self.make_lexeme(Token::Plus),
            '-' => self.make_lexeme(Token::Minus),
            '*' => self.make_lexeme(Token::Asterisk),
            '/' => self.make_lexeme(Token::Slash),
            '!' => {
                if self.match_and_advance('=') {
                    self.make_lexeme(Token::NotEq)
                } else {
                    self.make_lexeme(Token::Bang)
                }
            }
            '=' => {
                if self.match_and_advance('=') {
                    self.make_lexeme(Token::Eq)
                } else {
                    self.make_lexeme(Token::Assign)
                }
            }
            '<' => self.make_lexeme(Token::Lt),
            '>' => self.make_lexeme(Token::Gt),
            '"' => self.string(),
            _ => self.make_lexeme(Token::Illegal),
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.current.is_empty()
    }

    fn advance(&mut self) -> char {
        let c = self.current.chars().next().expect("advance at end of file");
        let len = c.len_utf8();
        self.current = &self.current[len..];
        c
    }

    fn peek(&self) -> char {
        self.current.chars().next().unwrap_or('\0')
    }

    fn match_and_advance(&mut self, expected: char) -> bool {
        if self.peek() != expected {
            return false;
        }
        self.current = &self.current[expected.len_utf8()..];
        true
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                ' ' | '\r' | '\t' => {
                    self.advance();
                }
                '\n' => {
                    self.line += 1;
                    self.advance();
                }
                _ => return,
            }
        }
    }

    fn identifier(&mut self) -> Lexeme<'a> {
        while is_id_continue(self.peek()) {
            self.advance();
        }
        let text = &self.start[..self.start.len() - self.current.len()];
        Lexeme::new(lookup_ident(text), text, self.line)
    }

    fn number(&mut self) -> Lexeme<'a> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        self.make_lexeme(Token::Int)
    }

    /// Expects the opening quote to have already been consumed. No escape sequences.
    fn string(&mut self) -> Lexeme<'a> {
        let content_start = self.current;
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }
        let content = &content_start[..content_start.len() - self.current.len()];

        if self.is_at_end() {
            return Lexeme::new(Token::Illegal, "unterminated string", self.line);
        }
        self.advance(); // closing quote
        Lexeme::new(Token::Str, content, self.line)
    }

    fn make_lexeme(&self, token: Token) -> Lexeme<'a> {
        let extent = self.start.len() - self.current.len();
        Lexeme::new(token, &self.start[..extent], self.line)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Lexeme<'a>;

    fn next(&mut self) -> Option<Lexeme<'a>> {
        Some(self.scan_token())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

fn is_id_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_id_continue(c: char) -> bool {
    is_id_start(c) || c.is_ascii_digit()
}
