//! The explicit context threaded through scan → parse → resolve → interpret.
//!
//! A [`Session`] owns one interpreter (globals and resolution table persist
//! between runs) and the expression-id generator. Diagnostics are returned
//! from each [`Session::run`] rather than recorded in shared flags, so a bad
//! interactive line never poisons the next one and independent sessions can
//! coexist in one process.

use log::info;
use thiserror::Error;

use crate::error::{LoxError, RuntimeError};
use crate::expr::{ExprId, ExprIds};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stack::ensure_sufficient_stack;
use crate::stmt::Stmt;

/// Why a run did not complete.
#[derive(Debug, Error)]
pub enum RunError {
    /// Scan, parse or resolve diagnostics. Nothing was evaluated.
    #[error("{} static error(s)", .0.len())]
    Static(Vec<LoxError>),

    /// Evaluation aborted; statements after the failing one did not run.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub struct Session {
    interpreter: Interpreter,
    ids: ExprIds,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            ids: ExprIds::new(),
        }
    }

    /// Runs one source unit (a file, or one interactive line) through the
    /// whole pipeline.
    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        let (tokens, mut errors) = Scanner::new(source).scan_all();

        // Lexical errors do not stop parsing; both kinds are reported together.
        let statements = match Parser::new(tokens, &mut self.ids).parse() {
            Ok(statements) => statements,
            Err(parse_errors) => {
                errors.extend(parse_errors);
                return Err(RunError::Static(errors));
            }
        };

        if !errors.is_empty() {
            return Err(RunError::Static(errors));
        }

        let locals = Resolver::new()
            .resolve(&statements)
            .map_err(RunError::Static)?;

        info!("Static phases passed; evaluating");

        // Only a function body can evaluate this unit's nodes after the run
        // ends. Without one, its table entries are dead once it finishes.
        let transient: Vec<ExprId> = if declares_function(&statements) {
            Vec::new()
        } else {
            locals.keys().copied().collect()
        };

        self.interpreter.add_locals(locals);
        let result = self.interpreter.interpret(&statements);
        self.interpreter.forget_locals(&transient);

        result.map_err(RunError::from)
    }
}

/// Does any statement, at any depth, declare a function? Class methods are
/// never called, so they do not count.
fn declares_function(statements: &[Stmt]) -> bool {
    statements.iter().any(declares)
}

fn declares(stmt: &Stmt) -> bool {
    ensure_sufficient_stack(|| match stmt {
        Stmt::Function(_) => true,
        Stmt::Block(body) => declares_function(body),
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => declares(then_branch) || else_branch.as_deref().is_some_and(declares),
        Stmt::While { body, .. } => declares(body),
        Stmt::Class { .. }
        | Stmt::Expression(_)
        | Stmt::Print(_)
        | Stmt::Return { .. }
        | Stmt::Var { .. } => false,
    })
}
