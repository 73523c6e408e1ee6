/*!
Recursive‑descent parser: token list → statement list.

Grammar (condensed EBNF)
-------------------------

```text
program        → declaration* EOF ;
declaration    → classDecl | funDecl | varDecl | statement ;
classDecl      → "class" IDENT "{" function* "}" ;
funDecl        → "fun" function ;
function       → IDENT "(" parameters? ")" block ;
varDecl        → "var" IDENT ( "=" expression )? ";" ;
statement      → exprStmt | forStmt | ifStmt | printStmt
               | returnStmt | whileStmt | block ;
forStmt        → "for" "(" ( varDecl | exprStmt | ";" )
                 expression? ";" expression? ")" statement ;
ifStmt         → "if" "(" expression ")" statement ( "else" statement )? ;
returnStmt     → "return" expression? ";" ;
whileStmt      → "while" "(" expression ")" statement ;
block          → "{" declaration* "}" ;
expression     → assignment ;
assignment     → ( call "." )? IDENT "=" assignment | logic_or ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → equality  ( "and" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" ) unary | call ;
call           → primary ( "(" arguments? ")" | "." IDENT )* ;
primary        → NUMBER | STRING | "true" | "false" | "nil"
               | IDENT | "(" expression ")" ;
```

`for` never reaches the AST: it is rewritten into
`{ initializer; while (condition) { body; increment; } }`.

Error recovery
--------------

A malformed declaration is recorded and the parser enters panic mode:
tokens are discarded until a `;` has been passed or the next token starts a
declaration/statement. Parsing then resumes, so one pass can surface several
independent errors. Some errors (invalid assignment target, the 255
argument/parameter limits) are recorded without unwinding at all.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, `statement`   | `debug`| High‑level descent into grammar branches. |
*/

use std::mem;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprIds, LiteralValue};
use crate::stack::ensure_sufficient_stack;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Upper bound on parameters and call arguments.
const MAX_ARITY: usize = 255;

#[derive(Copy, Clone, Debug)]
enum FunctionKind {
    Function,
    Method,
}

impl FunctionKind {
    fn as_str(self) -> &'static str {
        match self {
            FunctionKind::Function => "function",
            FunctionKind::Method => "method",
        }
    }
}

/// Top‑level parser over a scanned token list.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    current: usize,
    ids: &'a mut ExprIds,
    errors: Vec<LoxError>,
}

impl<'a> Parser<'a> {
    /// Construct a new parser. Variable references get their identities
    /// from `ids`.
    pub fn new(mut tokens: Vec<Token>, ids: &'a mut ExprIds) -> Self {
        if tokens.last().map_or(true, |t| t.token_type != TokenType::EOF) {
            let line: usize = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenType::EOF, "", line));
        }

        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            ids,
            errors: Vec::new(),
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program. Any syntax error makes the whole result an
    /// `Err` carrying every diagnostic found.
    pub fn parse(mut self) -> std::result::Result<Vec<Stmt>, Vec<LoxError>> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        info!(
            "Parsed {} statement(s) with {} error(s)",
            statements.len(),
            self.errors.len()
        );

        if self.errors.is_empty() {
            Ok(statements)
        } else {
            Err(self.errors)
        }
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Option<Stmt> {
        debug!("Entering declaration at line {}", self.peek().line);

        let result: Result<Stmt> = ensure_sufficient_stack(|| {
            if self.matches(TokenType::CLASS) {
                self.class_declaration()
            } else if self.matches(TokenType::FUN) {
                self.function(FunctionKind::Function).map(Stmt::Function)
            } else if self.matches(TokenType::VAR) {
                self.var_declaration()
            } else {
                self.statement()
            }
        });

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect class name.")?;

        self.consume(TokenType::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(self.function(FunctionKind::Method)?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after class body.")?;

        Ok(Stmt::Class { name, methods })
    }

    fn function(&mut self, kind: FunctionKind) -> Result<Rc<FunctionDecl>> {
        let name: Token = self.consume(
            TokenType::IDENTIFIER,
            &format!("Expect {} name.", kind.as_str()),
        )?;

        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expect '(' after {} name.", kind.as_str()),
        )?;

        let mut params: Vec<Token> = Vec::new();
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARITY {
                    let token: Token = self.peek().clone();
                    self.error(&token, "Can't have more than 255 parameters.");
                }

                params.push(self.consume(TokenType::IDENTIFIER, "Expect parameter name.")?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;

        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expect '{{' before {} body.", kind.as_str()),
        )?;
        let body: Vec<Stmt> = self.block()?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        ensure_sufficient_stack(|| {
            if self.matches(TokenType::FOR) {
                self.for_statement()
            } else if self.matches(TokenType::IF) {
                self.if_statement()
            } else if self.matches(TokenType::PRINT) {
                self.print_statement()
            } else if self.matches(TokenType::RETURN) {
                self.return_statement()
            } else if self.matches(TokenType::WHILE) {
                self.while_statement()
            } else if self.matches(TokenType::LEFT_BRACE) {
                Ok(Stmt::Block(self.block()?))
            } else {
                self.expression_statement()
            }
        })
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        debug!("Desugaring for loop at line {}", self.previous().line);

        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer: Option<Stmt> = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment: Option<Expr> = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let mut body: Stmt = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        body = Stmt::While {
            condition: condition.unwrap_or(Expr::Literal(LiteralValue::True)),
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let value: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;
        let body: Box<Stmt> = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        ensure_sufficient_stack(|| self.assignment())
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.logical_or()?;

        if self.matches(TokenType::EQUAL) {
            let equals: Token = self.previous().clone();
            let value: Expr = self.assignment()?;

            let mut target: Expr = expr;
            let assignment: Option<Expr> = match &mut target {
                Expr::Variable { name, .. } => Some(Expr::Assign {
                    id: self.ids.fresh(),
                    name: name.clone(),
                    value: Box::new(value),
                }),

                Expr::Get { object, name } => Some(Expr::Set {
                    object: mem::replace(object, Box::new(Expr::Literal(LiteralValue::Nil))),
                    name: name.clone(),
                    value: Box::new(value),
                }),

                _ => None,
            };

            // Reported, but the parser is not confused: no panic mode.
            return Ok(assignment.unwrap_or_else(|| {
                self.error(&equals, "Invalid assignment target.");
                target
            }));
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.comparison()?;

        while self.matches(TokenType::BANG_EQUAL) || self.matches(TokenType::EQUAL_EQUAL) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.comparison()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.term()?;

        while self.matches(TokenType::GREATER)
            || self.matches(TokenType::GREATER_EQUAL)
            || self.matches(TokenType::LESS)
            || self.matches(TokenType::LESS_EQUAL)
        {
            let operator: Token = self.previous().clone();
            let right: Expr = self.term()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.factor()?;

        while self.matches(TokenType::MINUS) || self.matches(TokenType::PLUS) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.factor()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.unary()?;

        while self.matches(TokenType::STAR) || self.matches(TokenType::SLASH) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator: Token = self.previous().clone();
            let right: Expr = ensure_sufficient_stack(|| self.unary())?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name: Token =
                    self.consume(TokenType::IDENTIFIER, "Expect property name after '.'.")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    let token: Token = self.peek().clone();
                    self.error(&token, "Can't have more than 255 arguments.");
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self.consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::FALSE) {
            return Ok(Expr::Literal(LiteralValue::False));
        }
        if self.matches(TokenType::TRUE) {
            return Ok(Expr::Literal(LiteralValue::True));
        }
        if self.matches(TokenType::NIL) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        if let TokenType::NUMBER(n) = self.peek().token_type {
            self.advance();
            return Ok(Expr::Literal(LiteralValue::Number(n)));
        }

        if let TokenType::STRING(s) = &self.peek().token_type {
            let s: String = s.clone();
            self.advance();
            return Ok(Expr::Literal(LiteralValue::Str(s)));
        }

        if self.matches(TokenType::IDENTIFIER) {
            let name: Token = self.previous().clone();
            return Ok(Expr::Variable {
                id: self.ids.fresh(),
                name,
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(LoxError::parse(self.peek(), "Expect expression."))
    }

    // ────────────────────── utility helpers ───────────────────────

    /// Record an error without unwinding.
    fn error(&mut self, token: &Token, message: &str) {
        self.errors.push(LoxError::parse(token, message));
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<Token> {
        if self.check(ttype) {
            return Ok(self.advance().clone());
        }

        debug!("Expected {:?}, found '{}'", message, self.peek().lexeme);

        Err(LoxError::parse(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,
                _ => {}
            }

            self.advance();
        }
    }
}
