use crate::expr::{Expr, LiteralValue};
use crate::stack::ensure_sufficient_stack;
use crate::stmt::Stmt;

/// Converts syntax trees to a parenthesized prefix form, e.g.
/// `(+ 1.0 (group (* 2.0 3.0)))` or `(var a (= b 1.0))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        ensure_sufficient_stack(|| Self::expr(expr))
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        ensure_sufficient_stack(|| Self::stmt(stmt))
    }

    fn expr(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),
        }
    }

    fn stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.lexeme, Self::print(init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => Self::sequence("block", statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::Function(decl) => {
                let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
                let body = Self::sequence("block", &decl.body);
                format!("(fun {} ({}) {})", decl.name.lexeme, params.join(" "), body)
            }

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print(value)),
                None => "(return)".into(),
            },

            Stmt::Class { name, methods } => {
                let mut s = format!("(class {}", name.lexeme);
                for method in methods {
                    s.push_str(&format!(" (method {})", method.name.lexeme));
                }
                s.push(')');
                s
            }
        }
    }

    fn sequence(head: &str, statements: &[Stmt]) -> String {
        let mut s = format!("({}", head);
        for stmt in statements {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }
}
