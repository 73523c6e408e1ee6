//! Tree‑walking evaluator.
//!
//! One persistent global frame plus a "current" frame pointer that is swapped
//! around block and function execution (and always restored, even when a
//! runtime error unwinds through). Variable references found in the
//! resolution table are read/written at their exact distance; everything else
//! is a global looked up by name.
//!
//! `return` is not an error: statement execution yields a [`Flow`], and a
//! `Flow::Return` travels up through blocks and loops until the call boundary
//! collapses it into the call's value.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::resolver::Locals;
use crate::stack::ensure_sufficient_stack;
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::{LoxClass, LoxFunction, LoxInstance, NativeFunction, Value};

/// Default limit on nested calls before `Stack overflow.` is raised.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 4096;

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, RuntimeError>;

/// Outcome of executing one statement.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
    depth: usize,
    max_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter printing to stdout, with the native `clock`
    /// defined.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an interpreter whose `print` statements write to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: clock,
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
            depth: 0,
            max_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Merges a resolution table. Tables accumulate across runs so closures
    /// from earlier interactive lines keep their distances.
    pub fn add_locals(&mut self, locals: Locals) {
        debug!("Adding {} resolved local(s)", locals.len());
        self.locals.extend(locals);
    }

    /// Drops table entries that no remaining code can evaluate.
    pub fn forget_locals(&mut self, ids: &[ExprId]) {
        for id in ids {
            self.locals.remove(id);
        }
        debug!("Forgot {} local(s), {} retained", ids.len(), self.locals.len());
    }

    /// Number of resolved local references currently held.
    pub fn resolved_locals(&self) -> usize {
        self.locals.len()
    }

    /// Interprets a list of statements (a "program"). The first runtime error
    /// aborts the rest.
    pub fn interpret(&mut self, statements: &[Stmt]) -> IResult<()> {
        info!("Interpreting {} statements", statements.len());

        // Resolution rejects top-level `return`, so the flow is always Normal.
        self.execute_statements(statements)?;
        self.out.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ───────────────────────────── statements ──────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> IResult<Flow> {
        ensure_sufficient_stack(|| self.execute_inner(stmt))
    }

    fn execute_inner(&mut self, stmt: &Stmt) -> IResult<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let frame = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, Rc::new(RefCell::new(frame)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);
                // Capture the frame current at declaration time.
                let function = LoxFunction {
                    declaration: Rc::clone(declaration),
                    closure: Rc::clone(&self.environment),
                };
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class { name, .. } => {
                debug!("Defining class '{}'", name.lexeme);
                // Declare first, then assign, so the name exists while the
                // class object is built.
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Nil);

                let class = LoxClass {
                    name: name.lexeme.clone(),
                    methods: HashMap::new(),
                };

                self.environment
                    .borrow_mut()
                    .assign(name, Value::Class(Rc::new(class)))?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Runs `statements` with `environment` as the current frame, restoring
    /// the previous frame afterwards whatever the outcome.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> IResult<Flow> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = self.execute_statements(statements);
        self.environment = previous;
        result
    }

    fn execute_statements(&mut self, statements: &[Stmt]) -> IResult<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    // ──────────────────────────── expressions ──────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        ensure_sufficient_stack(|| self.evaluate_inner(expr))
    }

    fn evaluate_inner(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;
                match operator.token_type {
                    TokenType::MINUS => Ok(Value::Number(-number_operand(operator, &right)?)),
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => Err(RuntimeError::new(operator, "Invalid unary operator.")),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;
                binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let decided: bool = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.call(callee, paren, args)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let field: Option<Value> = instance.borrow().fields.get(&name.lexeme).cloned();
                    field.ok_or_else(|| {
                        RuntimeError::new(name, format!("Undefined property '{}'.", name.lexeme))
                    })
                }
                _ => Err(RuntimeError::new(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::new(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance
                    .borrow_mut()
                    .fields
                    .insert(name.lexeme.clone(), value.clone());
                Ok(value)
            }
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> IResult<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    // ───────────────────────────── calls ───────────────────────────────────

    /// Invokes a callable (native function, user function or class).
    fn call(&mut self, callee: Value, paren: &Token, args: Vec<Value>) -> IResult<Value> {
        let arity: usize = match &callee {
            Value::NativeFunction(native) => native.arity,
            Value::Function(function) => function.arity(),
            Value::Class(_) => 0,
            _ => {
                return Err(RuntimeError::new(
                    paren,
                    "Can only call functions and classes.",
                ))
            }
        };

        if args.len() != arity {
            return Err(RuntimeError::new(
                paren,
                format!("Expected {} arguments but got {}.", arity, args.len()),
            ));
        }

        match callee {
            Value::NativeFunction(native) => {
                debug!("Calling native function '{}'", native.name);
                (native.func)(self, &args).map_err(|message| RuntimeError::new(paren, message))
            }

            Value::Function(function) => self.call_function(&function, paren, args),

            Value::Class(class) => {
                debug!("Instantiating class '{}'", class.name);
                Ok(Value::Instance(Rc::new(RefCell::new(LoxInstance::new(
                    class,
                )))))
            }

            _ => Err(RuntimeError::new(
                paren,
                "Can only call functions and classes.",
            )),
        }
    }

    fn call_function(
        &mut self,
        function: &LoxFunction,
        paren: &Token,
        args: Vec<Value>,
    ) -> IResult<Value> {
        if self.depth >= self.max_depth {
            debug!("Call depth limit {} reached", self.max_depth);
            return Err(RuntimeError::StackOverflow {
                token: paren.clone(),
            });
        }

        debug!("Calling user-defined function '{}'", function.name());

        let mut frame = Environment::with_enclosing(Rc::clone(&function.closure));
        for (param, arg) in function.declaration.params.iter().zip(args) {
            frame.define(&param.lexeme, arg);
        }

        self.depth += 1;
        let result = self.execute_block(&function.declaration.body, Rc::new(RefCell::new(frame)));
        self.depth -= 1;

        match result? {
            Flow::Normal => Ok(Value::Nil),
            Flow::Return(value) => Ok(value),
        }
    }
}

// ───────────────────────────── helpers ─────────────────────────────────────

fn clock(_interpreter: &mut Interpreter, _args: &[Value]) -> Result<Value, String> {
    let micros: i64 = Utc::now().timestamp_micros();
    Ok(Value::Number(micros as f64 / 1_000_000.0))
}

fn literal_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::String(s.clone()),
        LiteralValue::True => Value::Bool(true),
        LiteralValue::False => Value::Bool(false),
        LiteralValue::Nil => Value::Nil,
    }
}

fn number_operand(operator: &Token, operand: &Value) -> IResult<f64> {
    match operand {
        Value::Number(n) => Ok(*n),
        _ => Err(RuntimeError::new(operator, "Operand must be a number.")),
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> IResult<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::new(operator, "Operands must be numbers.")),
    }
}

fn binary(operator: &Token, left: Value, right: Value) -> IResult<Value> {
    match operator.token_type {
        TokenType::PLUS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            _ => Err(RuntimeError::new(
                operator,
                "Operands must be two numbers or two strings.",
            )),
        },

        TokenType::MINUS => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Number(a - b))
        }

        TokenType::STAR => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Number(a * b))
        }

        // IEEE semantics: x / 0 is ±inf or NaN.
        TokenType::SLASH => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Number(a / b))
        }

        TokenType::GREATER => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Bool(a > b))
        }

        TokenType::GREATER_EQUAL => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Bool(a >= b))
        }

        TokenType::LESS => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Bool(a < b))
        }

        TokenType::LESS_EQUAL => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Bool(a <= b))
        }

        TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

        TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

        _ => Err(RuntimeError::new(operator, "Invalid binary operator.")),
    }
}
