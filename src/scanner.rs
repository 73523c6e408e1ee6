//! Module `scanner` implements a one‑pass, streaming lexer for the Lox language.
//!
//! It transforms source text into a sequence of [`Token`]s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end. Designed as a
//! `FusedIterator`, it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Create a new lexer over the input text.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token, LoxError>` on each `.next()`. Errors never stop the
//!   scan: the next call resumes after the offending character.
//!
//! - `Scanner::scan_all(self)`
//!   Drains the iterator into the token list and the list of lexical errors.
//!
//! # Token Recognition
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `-`, `+`, `;`, `*`.
//! - Two‑character operators: `!=`, `==`, `<=`, `>=`.
//! - String literals: `"` … `"`, may span lines, no escapes. An unterminated
//!   string is reported and abandoned at end of input.
//! - Numeric literals: digits with an optional fractional part that must have
//!   at least one digit after the point.
//! - Identifiers/keywords: alphanumeric/_ sequences, resolved via a
//!   perfect‑hash `KEYWORDS` map.
//! - Comments: `//` to end of line, skipped with `memchr`.
//!
//! # Example
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! let (tokens, errors) = Scanner::new("print 123; // example").scan_all();
//! assert_eq!(tokens.len(), 4); // PRINT NUMBER SEMICOLON EOF
//! assert!(errors.is_empty());
//! ```

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// Streaming lexer over one source unit.
pub struct Scanner<'a> {
    src: &'a str,
    start: usize,   // byte offset where the current lexeme begins
    current: usize, // byte offset of the next unread byte
    line: usize,
    done: bool, // EOF token already emitted
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            current: 0,
            line: 1,
            done: false,
        }
    }

    /// Scan the whole input, splitting tokens from lexical errors.
    pub fn scan_all(self) -> (Vec<Token>, Vec<LoxError>) {
        let mut tokens: Vec<Token> = Vec::new();
        let mut errors: Vec<LoxError> = Vec::new();

        for item in self {
            match item {
                Ok(token) => tokens.push(token),
                Err(e) => errors.push(e),
            }
        }

        info!(
            "Scanned {} token(s) with {} error(s)",
            tokens.len(),
            errors.len()
        );

        (tokens, errors)
    }

    // ── cursor ──────────────────────────────────────────────────────────────

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.current >= self.src.len()
    }

    #[inline(always)]
    fn byte_at(&self, offset: usize) -> u8 {
        self.src.as_bytes().get(offset).copied().unwrap_or(0)
    }

    /// Current byte, `0` at end of input.
    #[inline(always)]
    fn peek(&self) -> u8 {
        self.byte_at(self.current)
    }

    #[inline(always)]
    fn peek_next(&self) -> u8 {
        self.byte_at(self.current + 1)
    }

    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.peek();
        self.current += 1;
        b
    }

    /// `matched` if the next byte is `expected` (consuming it), else `single`.
    #[inline(always)]
    fn either(&mut self, expected: u8, matched: TokenType, single: TokenType) -> TokenType {
        if !self.is_at_end() && self.peek() == expected {
            self.current += 1;
            matched
        } else {
            single
        }
    }

    fn lexeme(&self) -> &'a str {
        &self.src[self.start..self.current]
    }

    // ── recognition ─────────────────────────────────────────────────────────

    /// Consume one lexeme. `Ok(None)` means whitespace or a comment.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let kind = match self.advance() {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,

            b'!' => self.either(b'=', TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.either(b'=', TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.either(b'=', TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.either(b'=', TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'/' if self.peek() == b'/' => {
                // Stop on the newline so the next call counts it.
                self.current = match memchr(b'\n', &self.src.as_bytes()[self.current..]) {
                    Some(offset) => self.current + offset,
                    None => self.src.len(),
                };
                return Ok(None);
            }
            b'/' => TokenType::SLASH,

            b' ' | b'\r' | b'\t' => return Ok(None),
            b'\n' => {
                self.line += 1;
                return Ok(None);
            }

            b'"' => self.string()?,
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                // One diagnostic per character, however many bytes it spans.
                let ch: Option<char> = self.src[self.start..].chars().next();
                if let Some(ch) = ch {
                    self.current = self.start + ch.len_utf8();
                }

                debug!("Unexpected character {:?} on line {}", ch, self.line);

                return Err(LoxError::lex(self.line, "Unexpected character."));
            }
        };

        Ok(Some(kind))
    }

    /// Rest of a string literal after its opening quote. Newlines are allowed
    /// and counted.
    fn string(&mut self) -> Result<TokenType> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.current += 1; // closing quote

        let lexeme: &str = self.lexeme();
        Ok(TokenType::STRING(lexeme[1..lexeme.len() - 1].to_owned()))
    }

    /// `123` or `3.14`; a trailing `.` is left for the next token.
    fn number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.current += 1;
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.current += 1;
            while self.peek().is_ascii_digit() {
                self.current += 1;
            }
        }

        // ASCII digits with at most one interior point always parse.
        TokenType::NUMBER(self.lexeme().parse().unwrap_or_default())
    }

    fn identifier(&mut self) -> TokenType {
        while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.current += 1;
        }

        KEYWORDS
            .get(self.lexeme().as_bytes())
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while !self.is_at_end() {
            self.start = self.current;

            match self.scan_token() {
                Err(e) => return Some(Err(e)),
                Ok(None) => continue,
                Ok(Some(kind)) => {
                    debug!("Scanned token ({:?}) on line {}", kind, self.line);
                    return Some(Ok(Token::new(kind, self.lexeme(), self.line)));
                }
            }
        }

        self.done = true;
        Some(Ok(Token::new(TokenType::EOF, "", self.line)))
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
