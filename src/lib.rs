pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod session;
pub mod stack;
pub mod stmt;
pub mod token;
pub mod value;
