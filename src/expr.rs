use std::mem;

use crate::token::Token;

/// Identity of a variable-reference node. The resolver keys its distance
/// table by this id, never by structural equality, so two textually equal
/// references in different scopes resolve independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

/// Hands out fresh [`ExprId`]s. Owned by the session so ids stay unique
/// across every line fed to one interpreter.
#[derive(Debug, Default)]
pub struct ExprIds {
    next: usize,
}

impl ExprIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> ExprId {
        let id = ExprId(self.next);
        self.next += 1;
        id
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Integral lexemes such as `"3"` are still parsed as `3.0`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

#[derive(Debug, Clone)]
pub enum Expr {
    /// `name = value`
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Infix arithmetic, comparison and equality operators.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `callee(arguments)`
    Call {
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.name
    Get { object: Box<Expr>, name: Token },

    Grouping(Box<Expr>),

    Literal(LiteralValue),

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// object.name = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// Prefix `!` or `-`.
    Unary { operator: Token, right: Box<Expr> },

    Variable { id: ExprId, name: Token },
}

impl Expr {
    /// Moves every direct sub-expression into `out`, leaving `nil` leaves in
    /// their place.
    fn take_children(&mut self, out: &mut Vec<Expr>) {
        match self {
            Expr::Assign { value: child, .. }
            | Expr::Get { object: child, .. }
            | Expr::Grouping(child)
            | Expr::Unary { right: child, .. } => out.push(take(child)),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                out.push(take(left));
                out.push(take(right));
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                out.push(take(callee));
                out.append(arguments);
            }

            Expr::Set { object, value, .. } => {
                out.push(take(object));
                out.push(take(value));
            }

            Expr::Literal(_) | Expr::Variable { .. } => {}
        }
    }
}

fn take(child: &mut Box<Expr>) -> Expr {
    mem::replace(&mut **child, Expr::Literal(LiteralValue::Nil))
}

// The derived drop glue recurses once per nesting level, which overflows the
// native stack on deeply nested source. Unlink children onto a heap work-list
// instead.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending: Vec<Expr> = Vec::new();
        self.take_children(&mut pending);

        while let Some(mut expr) = pending.pop() {
            expr.take_children(&mut pending);
        }
    }
}
