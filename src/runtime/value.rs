use crate::language::ast::BlockStatement;
use crate::runtime::{builtins::Builtin, environment::Env};
use crate::stack::ensure_sufficient_stack;
use std::fmt;
use std::rc::Rc;

/// The canonical boolean and null values. `Value::Boolean` and `Value::Null`
/// carry no heap payload, so every copy is indistinguishable from these and
/// comparing them is identity comparison.
pub const TRUE: Value = Value::Boolean(true);
pub const FALSE: Value = Value::Boolean(false);
pub const NULL: Value = Value::Null;

#[derive(Clone, Debug)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    String(Rc<str>),
    Array(Rc<Vec<Value>>),
    Null,
    Function(Rc<FunctionValue>),
    Builtin(Builtin),
}

/// Type tag used for dispatch and in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    Boolean,
    String,
    Array,
    Null,
    Function,
    Builtin,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Integer => "INTEGER",
            ValueType::Boolean => "BOOLEAN",
            ValueType::String => "STRING",
            ValueType::Array => "ARRAY",
            ValueType::Null => "NULL",
            ValueType::Function => "FUNCTION",
            ValueType::Builtin => "BUILTIN",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn from_bool(value: bool) -> Value {
        if value {
            TRUE
        } else {
            FALSE
        }
    }

    pub fn string(text: &str) -> Value {
        Value::String(Rc::from(text))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(items))
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Boolean(_) => ValueType::Boolean,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Null => ValueType::Null,
            Value::Function(_) => ValueType::Function,
            Value::Builtin(_) => ValueType::Builtin,
        }
    }

    /// Only `null` and `false` are falsy; `0`, `""` and `[]` are truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (idx, value) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    ensure_sufficient_stack(|| write!(f, "{value}"))?;
                }
                write!(f, "]")
            }
            Value::Null => write!(f, "null"),
            Value::Function(function) => write!(f, "{function}"),
            Value::Builtin(builtin) => write!(f, "builtin function `{}`", builtin.name()),
        }
    }
}

// Nested arrays are released from a work list so that freeing a deeply
// nested value does not recurse on the host stack.
impl Drop for Value {
    fn drop(&mut self) {
        let Value::Array(items) = self else {
            return;
        };
        let Some(items) = Rc::get_mut(items) else {
            return;
        };
        let mut pending = std::mem::take(items);
        while let Some(mut value) = pending.pop() {
            if let Value::Array(inner) = &mut value {
                if let Some(inner) = Rc::get_mut(inner) {
                    pending.append(inner);
                }
            }
        }
    }
}

/// A user function together with the scope it was defined in.
pub struct FunctionValue {
    pub parameters: Vec<String>,
    pub body: Rc<BlockStatement>,
    /// Shared with the defining scope; later bindings there stay visible.
    pub env: Env,
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The captured scope may contain this very function.
        f.debug_struct("FunctionValue")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn({}) {}", self.parameters.join(", "), self.body)
    }
}
