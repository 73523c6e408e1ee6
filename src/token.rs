use serde::Serialize;
use std::fmt;
use std::mem;

use crate::expr::LiteralValue;

/// Lexical category of a token.
///
/// `STRING` and `NUMBER` carry their literal value; comparisons between
/// kinds ignore it (see the `PartialEq` impl below).
#[allow(non_camel_case_types)]
#[rustfmt::skip]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    // Single-character tokens.
    LEFT_PAREN, RIGHT_PAREN, LEFT_BRACE, RIGHT_BRACE,
    COMMA, DOT, MINUS, PLUS, SEMICOLON, SLASH, STAR,

    // One or two character tokens.
    BANG, BANG_EQUAL,
    EQUAL, EQUAL_EQUAL,
    GREATER, GREATER_EQUAL,
    LESS, LESS_EQUAL,

    // Literals. The string payload excludes the quotes.
    IDENTIFIER,
    STRING(String),
    NUMBER(f64),

    // Keywords.
    AND, CLASS, ELSE, FALSE, FUN, FOR, IF, NIL, OR,
    PRINT, RETURN, SUPER, THIS, TRUE, VAR, WHILE,

    EOF,
}

impl TokenType {
    /// Variant name without payload, as printed by `tokenize`.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::STRING(_) => "STRING",
            TokenType::NUMBER(_) => "NUMBER",
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::COMMA => "COMMA",
            TokenType::DOT => "DOT",
            TokenType::MINUS => "MINUS",
            TokenType::PLUS => "PLUS",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::SLASH => "SLASH",
            TokenType::STAR => "STAR",
            TokenType::BANG => "BANG",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::AND => "AND",
            TokenType::CLASS => "CLASS",
            TokenType::ELSE => "ELSE",
            TokenType::FALSE => "FALSE",
            TokenType::FUN => "FUN",
            TokenType::FOR => "FOR",
            TokenType::IF => "IF",
            TokenType::NIL => "NIL",
            TokenType::OR => "OR",
            TokenType::PRINT => "PRINT",
            TokenType::RETURN => "RETURN",
            TokenType::SUPER => "SUPER",
            TokenType::THIS => "THIS",
            TokenType::TRUE => "TRUE",
            TokenType::VAR => "VAR",
            TokenType::WHILE => "WHILE",
            TokenType::EOF => "EOF",
        }
    }
}

impl PartialEq for TokenType {
    /// Same variant, payload ignored: `NUMBER(1.0) == NUMBER(2.0)`.
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

/// A scanned token, including its type, the source lexeme,
/// and the line number where it was found.
///
/// Tokens own their lexeme so the AST (and any closure built from it) can
/// outlive the source buffer, which interactive mode drops after every line.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: String,

    /// 1‑based line number in the source.
    pub line: usize,
}

impl Token {
    /// Create a new Token with the given type, lexeme, and line.
    pub fn new(token_type: TokenType, lexeme: impl Into<String>, line: usize) -> Self {
        Self {
            token_type,
            lexeme: lexeme.into(),
            line,
        }
    }

    /// The literal value carried by string and number tokens.
    pub fn literal(&self) -> Option<LiteralValue> {
        match &self.token_type {
            TokenType::STRING(s) => Some(LiteralValue::Str(s.clone())),
            TokenType::NUMBER(n) => Some(LiteralValue::Number(*n)),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.token_type.name(), self.lexeme)?;

        match &self.token_type {
            TokenType::STRING(s) => write!(f, "{}", s),
            TokenType::NUMBER(n) => {
                // 3 → "3.0", 3.14 → "3.14"
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    let mut buf: itoa::Buffer = itoa::Buffer::new();
                    write!(f, "{}.0", buf.format(*n as i64))
                } else {
                    write!(f, "{}", n)
                }
            }
            _ => write!(f, "null"),
        }
    }
}
