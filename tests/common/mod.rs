#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::error::LoxError;
use rox::expr::{Expr, ExprId};
use rox::interpreter::Interpreter;
use rox::session::{RunError, Session};
use rox::stmt::Stmt;

/// A `Write` sink the test keeps a handle to after the interpreter takes
/// ownership of its clone.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session whose printed output is captured.
pub fn session() -> (Session, SharedBuffer) {
    let out = SharedBuffer::default();
    let interpreter = Interpreter::with_output(Box::new(out.clone()));
    (Session::with_interpreter(interpreter), out)
}

/// Runs `source` in a fresh session, returning printed lines and the outcome.
pub fn run(source: &str) -> (Vec<String>, Result<(), RunError>) {
    let (mut session, out) = session();
    let result = session.run(source);
    (out.lines(), result)
}

/// Runs a program expected to succeed and returns its printed lines.
pub fn run_ok(source: &str) -> Vec<String> {
    let (lines, result) = run(source);
    if let Err(e) = result {
        panic!("program failed: {:?}\n{}", e, source);
    }
    lines
}

/// Runs a program expected to fail at runtime; returns output so far and the
/// runtime error message.
pub fn run_runtime_error(source: &str) -> (Vec<String>, String) {
    match run(source) {
        (lines, Err(RunError::Runtime(e))) => (lines, e.message()),
        (_, other) => panic!("expected runtime error, got {:?}", other),
    }
}

/// Runs a program expected to be rejected statically; returns the rendered
/// diagnostics.
pub fn static_errors(source: &str) -> Vec<String> {
    match run(source) {
        (lines, Err(RunError::Static(errors))) => {
            assert!(lines.is_empty(), "nothing may run after a static error");
            errors.iter().map(LoxError::to_string).collect()
        }
        (_, other) => panic!("expected static errors, got {:?}", other),
    }
}

/// Every variable reference named `target`, in source order.
pub fn references(statements: &[Stmt], target: &str) -> Vec<ExprId> {
    fn walk_expr(expr: &Expr, target: &str, out: &mut Vec<ExprId>) {
        match expr {
            Expr::Variable { id, name } if name.lexeme == target => out.push(*id),
            Expr::Assign { id, name, value } => {
                walk_expr(value, target, out);
                if name.lexeme == target {
                    out.push(*id);
                }
            }
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                walk_expr(left, target, out);
                walk_expr(right, target, out);
            }
            Expr::Unary { right, .. } => walk_expr(right, target, out),
            Expr::Grouping(inner) => walk_expr(inner, target, out),
            Expr::Call {
                callee, arguments, ..
            } => {
                walk_expr(callee, target, out);
                for arg in arguments {
                    walk_expr(arg, target, out);
                }
            }
            Expr::Get { object, .. } => walk_expr(object, target, out),
            Expr::Set { object, value, .. } => {
                walk_expr(object, target, out);
                walk_expr(value, target, out);
            }
            Expr::Variable { .. } | Expr::Literal(_) => {}
        }
    }

    fn walk_stmt(stmt: &Stmt, target: &str, out: &mut Vec<ExprId>) {
        match stmt {
            Stmt::Expression(e) | Stmt::Print(e) => walk_expr(e, target, out),
            Stmt::Var { initializer, .. } => {
                if let Some(e) = initializer {
                    walk_expr(e, target, out);
                }
            }
            Stmt::Block(body) => body.iter().for_each(|s| walk_stmt(s, target, out)),
            Stmt::Function(decl) => decl.body.iter().for_each(|s| walk_stmt(s, target, out)),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                walk_expr(condition, target, out);
                walk_stmt(then_branch, target, out);
                if let Some(e) = else_branch {
                    walk_stmt(e, target, out);
                }
            }
            Stmt::While { condition, body } => {
                walk_expr(condition, target, out);
                walk_stmt(body, target, out);
            }
            Stmt::Return { value, .. } => {
                if let Some(e) = value {
                    walk_expr(e, target, out);
                }
            }
            Stmt::Class { .. } => {}
        }
    }

    let mut out = Vec::new();
    for stmt in statements {
        walk_stmt(stmt, target, &mut out);
    }
    out
}
