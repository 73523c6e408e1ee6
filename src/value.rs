use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::interpreter::Interpreter;
use crate::stmt::FunctionDecl;

/// Host behaviour behind a native callable. Receives the interpreter and the
/// already-evaluated arguments; an `Err` becomes a runtime error at the call
/// site.
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> Result<Value, String>;

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({}/{})", self.name, self.arity)
    }
}

/// A user function: its declaration plus the frame that was current when the
/// declaration ran.
pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
}

impl LoxFunction {
    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }
}

impl fmt::Debug for LoxFunction {
    // The closure chain may be cyclic (a function stored in its own frame).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LoxFunction({})", self.name())
    }
}

#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    pub methods: HashMap<String, Rc<LoxFunction>>,
}

pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    pub fields: HashMap<String, Value>,
}

impl fmt::Debug for LoxInstance {
    // Fields may point back at the instance itself.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxInstance")
            .field("class", &self.class.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    NativeFunction(Rc<NativeFunction>),
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
    Instance(Rc<RefCell<LoxInstance>>),
}

impl Value {
    /// `nil` and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }
}

impl PartialEq for Value {
    /// Primitive values compare by content, callables and instances by
    /// identity. Values of different kinds are never equal.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            // Reflexive: NaN equals NaN. 0 and -0 stay equal.
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::NativeFunction(a), Value::NativeFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    let mut buf: itoa::Buffer = itoa::Buffer::new();
                    // keep the sign of negative zero
                    if *n == 0.0 && n.is_sign_negative() {
                        write!(f, "-0")
                    } else {
                        write!(f, "{}", buf.format(*n as i64))
                    }
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction(_) => write!(f, "<native fn>"),

            Value::Function(function) => write!(f, "<fn {}>", function.name()),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "{} instance", instance.borrow().class.name),
        }
    }
}
