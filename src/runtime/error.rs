use crate::language::ast::{InfixOperator, PrefixOperator};
use crate::runtime::value::{Value, ValueType};
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Result of evaluating a node: a value, or a signal unwinding the evaluation.
pub type EvalResult = Result<Value, FlowSignal>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("unknown operator: {operator}{operand}")]
    UnknownPrefixOperator {
        operator: PrefixOperator,
        operand: ValueType,
    },
    #[error("unknown operator: {left} {operator} {right}")]
    UnknownInfixOperator {
        left: ValueType,
        operator: InfixOperator,
        right: ValueType,
    },
    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch {
        left: ValueType,
        operator: InfixOperator,
        right: ValueType,
    },
    #[error("identifier not found: {name}")]
    IdentifierNotFound { name: String },
    #[error("not a function: {callee}")]
    NotAFunction { callee: ValueType },
    #[error("wrong number of arguments. got={got}, want={want}")]
    WrongArgumentCount { got: usize, want: usize },
    #[error("argument to `{builtin}` not supported, got {got}")]
    UnsupportedArgument {
        builtin: &'static str,
        got: ValueType,
    },
    #[error("division by zero: {dividend} / 0")]
    DivisionByZero { dividend: i64 },
    #[error("stack overflow: call depth exceeded {limit}")]
    CallDepthExceeded { limit: usize },
}

/// Non-local exits. `Return` stops at the nearest function boundary or at the
/// program; `Error` unwinds all the way out.
#[derive(Clone, Debug, PartialEq)]
pub enum FlowSignal {
    Return(Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for FlowSignal {
    fn from(err: RuntimeError) -> Self {
        FlowSignal::Error(err)
    }
}
