use std::mem;
use std::rc::Rc;

use crate::expr::Expr;
use crate::token::Token;

/// A function declaration. Shared (`Rc`) between the statement list and every
/// closure value created from it, so a closure stays callable after the
/// program text that declared it is gone.
#[derive(Debug)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Vec<Stmt>),

    Class {
        name: Token,
        methods: Vec<Rc<FunctionDecl>>,
    },

    Expression(Expr),

    Function(Rc<FunctionDecl>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    Print(Expr),

    Return {
        /// The `return` keyword, for diagnostics.
        keyword: Token,
        value: Option<Expr>,
    },

    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}

impl Stmt {
    /// Moves nested statements into `out`. A function body is only taken when
    /// this statement holds the last reference to the declaration; otherwise
    /// a live closure still needs it.
    fn take_children(&mut self, out: &mut Vec<Stmt>) {
        match self {
            Stmt::Block(statements) => out.append(statements),

            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                out.push(take(then_branch));
                if let Some(else_branch) = else_branch {
                    out.push(take(else_branch));
                }
            }

            Stmt::While { body, .. } => out.push(take(body)),

            Stmt::Function(declaration) => {
                if let Some(declaration) = Rc::get_mut(declaration) {
                    out.append(&mut declaration.body);
                }
            }

            Stmt::Class { methods, .. } => {
                for method in methods {
                    if let Some(method) = Rc::get_mut(method) {
                        out.append(&mut method.body);
                    }
                }
            }

            Stmt::Expression(_) | Stmt::Print(_) | Stmt::Return { .. } | Stmt::Var { .. } => {}
        }
    }
}

fn take(child: &mut Box<Stmt>) -> Stmt {
    mem::replace(&mut **child, Stmt::Block(Vec::new()))
}

/// Iterative for the same reason as `Expr`'s drop: nested blocks and bodies
/// go through a heap work-list, not the native stack.
impl Drop for Stmt {
    fn drop(&mut self) {
        let mut pending: Vec<Stmt> = Vec::new();
        self.take_children(&mut pending);

        while let Some(mut stmt) = pending.pop() {
            stmt.take_children(&mut pending);
        }
    }
}
