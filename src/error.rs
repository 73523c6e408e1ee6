//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! Static diagnostics (scanner, parser, resolver) are collected as
//! [`LoxError`] values and reported as `[line N] Error<location>: message`.
//! Evaluation failures are [`RuntimeError`]s, reported as `message\n[line N]`
//! on a separate sink. The two never convert into one another except through
//! the transparent [`LoxError::Runtime`] wrapper used by callers that want a
//! single error type.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::debug;

use crate::token::{Token, TokenType};

/// Canonical static-error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error, tagged with the offending token.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        /// ` at end` or ` at '<lexeme>'`.
        location: String,
    },

    /// Static‑analysis failure found by the resolver.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error (transparent).
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location(token),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: location(token),
        }
    }

    /// Source line the diagnostic is attributed to.
    pub fn line(&self) -> usize {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Resolve { line, .. } => *line,
            LoxError::Runtime(e) => e.line(),
        }
    }

    /// The bare message without the line/location prefix.
    pub fn message(&self) -> String {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Resolve { message, .. } => message.clone(),
            LoxError::Runtime(e) => e.message(),
        }
    }
}

fn location(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// An error raised while evaluating a program. Aborts the current top-level
/// run and is reported exactly once.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Ordinary type/arity/lookup failure attributed to a token.
    #[error("{message}\n[line {}]", .token.line)]
    Failure { token: Token, message: String },

    /// The call depth limit was exceeded (runaway or very deep recursion).
    #[error("Stack overflow.\n[line {}]", .token.line)]
    StackOverflow { token: Token },

    /// Writing to the print sink failed.
    #[error("Output error: {0}")]
    Output(#[from] io::Error),
}

impl RuntimeError {
    pub fn new<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Runtime error: line={}, msg={}", token.line, message);

        RuntimeError::Failure {
            token: token.clone(),
            message,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            RuntimeError::Failure { token, .. } | RuntimeError::StackOverflow { token } => {
                token.line
            }
            RuntimeError::Output(_) => 0,
        }
    }

    pub fn message(&self) -> String {
        match self {
            RuntimeError::Failure { message, .. } => message.clone(),
            RuntimeError::StackOverflow { .. } => "Stack overflow.".to_string(),
            RuntimeError::Output(e) => e.to_string(),
        }
    }
}

/// Crate‑wide `Result` alias for static phases.
pub type Result<T> = std::result::Result<T, LoxError>;
