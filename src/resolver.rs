//! Static resolver pass for the **Lox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<&str,bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, read in own initializer, top-level `return`).
//! 3. Record, for *each* local variable occurrence, how many scopes lie between
//!    the use and the declaring scope. Globals are deliberately left out of the
//!    table; the interpreter looks them up by name, which keeps forward
//!    references and interactive redefinition working.
//!
//! Class bodies are not descended into: the class name is bound, methods are
//! left unresolved.

use crate::error::LoxError;
use crate::expr::{Expr, ExprId};
use crate::stack::ensure_sufficient_stack;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;

/// Resolution table: variable-reference identity → scope distance.
pub type Locals = HashMap<ExprId, usize>;

/// Are we inside a user function?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
}

pub struct Resolver<'a> {
    scopes: Vec<HashMap<&'a str, bool>>, // false=declared, true=defined
    locals: Locals,
    current_function: FunctionType,
    errors: Vec<LoxError>,
}

impl<'a> Default for Resolver<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Resolver<'a> {
    pub fn new() -> Self {
        Resolver {
            scopes: Vec::new(),
            locals: HashMap::new(),
            current_function: FunctionType::None,
            errors: Vec::new(),
        }
    }

    /// Walk all top‑level statements. Every static error in the program is
    /// collected before returning.
    pub fn resolve(mut self, statements: &'a [Stmt]) -> Result<Locals, Vec<LoxError>> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements);

        info!(
            "Resolved {} local reference(s) with {} error(s)",
            self.locals.len(),
            self.errors.len()
        );

        if self.errors.is_empty() {
            Ok(self.locals)
        } else {
            Err(self.errors)
        }
    }

    fn resolve_stmts(&mut self, statements: &'a [Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &'a Stmt) {
        ensure_sufficient_stack(|| match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }

            Stmt::Class { name, .. } => {
                self.declare(name);
                self.define(name);
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(decl) => {
                // the name is visible inside its own body (recursion)
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }
                if let Some(expr) = value {
                    self.resolve_expr(expr);
                }
            }
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &'a Expr) {
        ensure_sufficient_stack(|| match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                let in_own_initializer: bool = self
                    .scopes
                    .last()
                    .is_some_and(|scope| scope.get(name.lexeme.as_str()) == Some(&false));

                if in_own_initializer {
                    self.error(name, "Can't read local variable in its own initializer.");
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.
    fn resolve_function(&mut self, decl: &'a FunctionDecl) {
        let enclosing = self.current_function;
        self.current_function = FunctionType::Function;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&decl.body);
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &'a Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(name.lexeme.as_str()) {
            self.error(name, "Already a variable with this name in this scope.");
            return;
        }

        scope.insert(&name.lexeme, false);
    }

    fn define(&mut self, name: &'a Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(&name.lexeme, true);
        }
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.errors.push(LoxError::resolve(token, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this variable occurrence as a local at distance `d` (innermost
    /// scope = 0), or leave it unrecorded when no pushed scope declares it.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (distance, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme.as_str()) {
                debug!("Resolved '{}' at distance {}", name.lexeme, distance);
                self.locals.insert(id, distance);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
