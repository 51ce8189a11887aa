//! Kite: a small expression language with lexical scoping, closures and
//! first-class functions, evaluated by walking its syntax tree.
//!
//! ```
//! use kite_lang::{language::parser::parse_source, runtime::{Interpreter, Value}};
//!
//! let program = parse_source("let add = fn(a, b) { a + b }; add(2, 3)").unwrap();
//! let mut interpreter = Interpreter::new();
//! assert_eq!(interpreter.run(&program), Ok(Value::Integer(5)));
//! ```

pub mod diagnostics;
pub mod language;
pub mod runtime;
pub mod stack;

#[cfg(test)]
mod tests;
