//! Source-to-value tests: every case goes through the lexer, the parser and
//! the interpreter.


use crate::language::parser::parse_source;
use crate::runtime::{platform::CapturePlatform, Interpreter, RuntimeResult, Value};
use std::rc::Rc;

pub(crate) fn run(source: &str) -> RuntimeResult<Value> {
    run_with_output(source).0
}

pub(crate) fn run_with_output(source: &str) -> (RuntimeResult<Value>, Vec<String>) {
    let program =
        parse_source(source).unwrap_or_else(|errors| panic!("syntax errors in {source:?}: {errors:?}"));
    let platform = Rc::new(CapturePlatform::new());
    let mut interpreter = Interpreter::with_platform(platform.clone());
    let result = interpreter.run(&program);
    (result, platform.lines())
}

pub(crate) fn run_err(source: &str) -> String {
    match run(source) {
        Ok(value) => panic!("expected {source:?} to fail, got {value}"),
        Err(err) => err.to_string(),
    }
}
