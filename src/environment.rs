use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One frame of variable bindings. Frames are shared (`Rc`) because a closure
/// keeps its declaring frame alive after the block that created it exits, and
/// mutations through one holder are visible to every other.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Always succeeds; shadows (never touches) a same-named outer binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Updates the nearest existing binding; never creates one.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// The frame exactly `distance` parent links above `env`.
    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut frame: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..distance {
            let parent = frame.borrow().enclosing.clone()?;
            frame = parent;
        }

        Some(frame)
    }

    /// Reads `name` from the frame `distance` links up, without searching.
    /// Only called with distances computed by the resolver.
    pub(crate) fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
    ) -> Result<Value, RuntimeError> {
        Self::ancestor(env, distance)
            .and_then(|frame| {
                let value = frame.borrow().values.get(&name.lexeme).cloned();
                value
            })
            .ok_or_else(|| undefined(name))
    }

    /// Writes `name` in the frame `distance` links up, without searching.
    pub(crate) fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let frame = Self::ancestor(env, distance).ok_or_else(|| undefined(name))?;
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(undefined(name)),
        }
    }
}

// A closure can pin an arbitrarily long frame chain; release it link by link.
impl Drop for Environment {
    fn drop(&mut self) {
        let mut next: Option<Rc<RefCell<Environment>>> = self.enclosing.take();

        while let Some(frame) = next {
            next = match Rc::try_unwrap(frame) {
                Ok(cell) => cell.into_inner().enclosing.take(),
                Err(_) => None, // still shared
            };
        }
    }
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    fn chain(depth: usize) -> Vec<Rc<RefCell<Environment>>> {
        let mut frames = vec![Rc::new(RefCell::new(Environment::new()))];
        for _ in 0..depth {
            let parent = Rc::clone(frames.last().unwrap());
            frames.push(Rc::new(RefCell::new(Environment::with_enclosing(parent))));
        }
        frames
    }

    #[test]
    fn get_at_reads_exact_frame_not_nearest() {
        let frames = chain(3);
        frames[0].borrow_mut().define("a", Value::Number(0.0));
        frames[2].borrow_mut().define("a", Value::Number(2.0));
        let innermost = &frames[3];

        assert_eq!(
            Environment::get_at(innermost, 3, &ident("a")).unwrap(),
            Value::Number(0.0)
        );
        assert_eq!(
            Environment::get_at(innermost, 1, &ident("a")).unwrap(),
            Value::Number(2.0)
        );
        // off-by-one lands on a frame without the binding
        assert!(Environment::get_at(innermost, 2, &ident("a")).is_err());
        // past the root
        assert!(Environment::get_at(innermost, 4, &ident("a")).is_err());
    }

    #[test]
    fn assign_at_writes_only_target_frame() {
        let frames = chain(2);
        frames[0].borrow_mut().define("x", Value::Number(1.0));
        frames[1].borrow_mut().define("x", Value::Number(1.0));

        Environment::assign_at(&frames[2], 2, &ident("x"), Value::Number(9.0)).unwrap();

        assert_eq!(frames[0].borrow().get(&ident("x")).unwrap(), Value::Number(9.0));
        assert_eq!(frames[1].borrow().get(&ident("x")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_never_creates_binding() {
        let frames = chain(1);
        let err = frames[1]
            .borrow_mut()
            .assign(&ident("ghost"), Value::Nil)
            .unwrap_err();

        assert_eq!(err.message(), "Undefined variable 'ghost'.");
        assert!(frames[0].borrow().get(&ident("ghost")).is_err());
    }

    #[test]
    fn long_frame_chain_drops_iteratively() {
        let mut innermost = Rc::new(RefCell::new(Environment::new()));
        for _ in 0..200_000 {
            innermost = Rc::new(RefCell::new(Environment::with_enclosing(innermost)));
        }
        drop(innermost);
    }

    #[test]
    fn define_shadows_without_touching_outer() {
        let frames = chain(1);
        frames[0].borrow_mut().define("v", Value::Bool(true));
        frames[1].borrow_mut().define("v", Value::Bool(false));

        assert_eq!(frames[1].borrow().get(&ident("v")).unwrap(), Value::Bool(false));
        assert_eq!(frames[0].borrow().get(&ident("v")).unwrap(), Value::Bool(true));
    }
}
