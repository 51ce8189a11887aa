use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    platform::Platform,
    value::{Value, NULL},
};
use std::fmt;
use std::rc::Rc;

pub type BuiltinFn = fn(&dyn Platform, &[Value]) -> RuntimeResult<Value>;

/// A native function exposed to programs under a fixed name.
#[derive(Clone, Copy)]
pub struct Builtin {
    name: &'static str,
    func: BuiltinFn,
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn call(&self, platform: &dyn Platform, args: &[Value]) -> RuntimeResult<Value> {
        (self.func)(platform, args)
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Builtin").field(&self.name).finish()
    }
}

static REGISTRY: [Builtin; 6] = [
    Builtin {
        name: "len",
        func: builtin_len,
    },
    Builtin {
        name: "push",
        func: builtin_push,
    },
    Builtin {
        name: "first",
        func: builtin_first,
    },
    Builtin {
        name: "last",
        func: builtin_last,
    },
    Builtin {
        name: "rest",
        func: builtin_rest,
    },
    Builtin {
        name: "puts",
        func: builtin_puts,
    },
];

pub fn lookup(name: &str) -> Option<Builtin> {
    REGISTRY.iter().find(|builtin| builtin.name == name).copied()
}

fn expect_arity(args: &[Value], want: usize) -> RuntimeResult<()> {
    if args.len() != want {
        Err(RuntimeError::WrongArgumentCount {
            got: args.len(),
            want,
        })
    } else {
        Ok(())
    }
}

fn unsupported(builtin: &'static str, value: &Value) -> RuntimeError {
    RuntimeError::UnsupportedArgument {
        builtin,
        got: value.value_type(),
    }
}

fn builtin_len(_: &dyn Platform, args: &[Value]) -> RuntimeResult<Value> {
    expect_arity(args, 1)?;
    match &args[0] {
        Value::String(text) => Ok(Value::Integer(text.len() as i64)),
        Value::Array(items) => Ok(Value::Integer(items.len() as i64)),
        other => Err(unsupported("len", other)),
    }
}

/// Returns a new array; the argument is left untouched.
fn builtin_push(_: &dyn Platform, args: &[Value]) -> RuntimeResult<Value> {
    expect_arity(args, 2)?;
    match &args[0] {
        Value::Array(items) => {
            let mut extended = Vec::with_capacity(items.len() + 1);
            extended.extend(items.iter().cloned());
            extended.push(args[1].clone());
            Ok(Value::Array(Rc::new(extended)))
        }
        other => Err(unsupported("push", other)),
    }
}

fn builtin_first(_: &dyn Platform, args: &[Value]) -> RuntimeResult<Value> {
    expect_arity(args, 1)?;
    match &args[0] {
        Value::Array(items) => Ok(items.first().cloned().unwrap_or(NULL)),
        Value::String(text) => Ok(text
            .chars()
            .next()
            .map(|ch| Value::string(ch.encode_utf8(&mut [0; 4])))
            .unwrap_or(NULL)),
        other => Err(unsupported("first", other)),
    }
}

fn builtin_last(_: &dyn Platform, args: &[Value]) -> RuntimeResult<Value> {
    expect_arity(args, 1)?;
    match &args[0] {
        Value::Array(items) => Ok(items.last().cloned().unwrap_or(NULL)),
        Value::String(text) => Ok(text
            .chars()
            .next_back()
            .map(|ch| Value::string(ch.encode_utf8(&mut [0; 4])))
            .unwrap_or(NULL)),
        other => Err(unsupported("last", other)),
    }
}

fn builtin_rest(_: &dyn Platform, args: &[Value]) -> RuntimeResult<Value> {
    expect_arity(args, 1)?;
    match &args[0] {
        Value::Array(items) if items.is_empty() => Ok(NULL),
        Value::Array(items) => Ok(Value::array(items[1..].to_vec())),
        Value::String(text) => {
            let mut chars = text.chars();
            match chars.next() {
                Some(_) => Ok(Value::string(chars.as_str())),
                None => Ok(NULL),
            }
        }
        other => Err(unsupported("rest", other)),
    }
}

fn builtin_puts(platform: &dyn Platform, args: &[Value]) -> RuntimeResult<Value> {
    for arg in args {
        platform.write_line(&arg.to_string());
    }
    Ok(NULL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::platform::CapturePlatform;
    use crate::runtime::value::ValueType;
    use pretty_assertions::assert_eq;

    fn call(name: &str, args: &[Value]) -> RuntimeResult<Value> {
        let builtin = lookup(name).unwrap_or_else(|| panic!("missing builtin {name}"));
        builtin.call(&CapturePlatform::new(), args)
    }

    fn ints(values: &[i64]) -> Value {
        Value::array(values.iter().copied().map(Value::Integer).collect())
    }

    #[test]
    fn registry_exposes_every_builtin() {
        for name in ["len", "push", "first", "last", "rest", "puts"] {
            assert_eq!(lookup(name).map(|builtin| builtin.name()), Some(name));
        }
        assert!(lookup("print").is_none());
    }

    #[test]
    fn len_counts_bytes_and_elements() {
        assert_eq!(call("len", &[Value::string("")]), Ok(Value::Integer(0)));
        assert_eq!(call("len", &[Value::string("héllo")]), Ok(Value::Integer(6)));
        assert_eq!(call("len", &[ints(&[1, 2, 3])]), Ok(Value::Integer(3)));
    }

    #[test]
    fn len_validates_arguments() {
        assert_eq!(
            call("len", &[Value::Integer(1)]).unwrap_err().to_string(),
            "argument to `len` not supported, got INTEGER"
        );
        assert_eq!(
            call("len", &[Value::string("a"), Value::string("b")])
                .unwrap_err()
                .to_string(),
            "wrong number of arguments. got=2, want=1"
        );
    }

    #[test]
    fn push_returns_a_new_array() {
        let original = ints(&[1]);
        let pushed = call("push", &[original.clone(), Value::Integer(2)]);
        assert_eq!(pushed, Ok(ints(&[1, 2])));
        assert_eq!(original, ints(&[1]));
        assert_eq!(
            call("push", &[original]),
            Err(RuntimeError::WrongArgumentCount { got: 1, want: 2 })
        );
        assert_eq!(
            call("push", &[NULL, Value::Integer(1)]),
            Err(RuntimeError::UnsupportedArgument {
                builtin: "push",
                got: ValueType::Null,
            })
        );
    }

    #[test]
    fn first_last_rest_on_arrays() {
        let items = ints(&[1, 2, 3]);
        assert_eq!(call("first", &[items.clone()]), Ok(Value::Integer(1)));
        assert_eq!(call("last", &[items.clone()]), Ok(Value::Integer(3)));
        assert_eq!(call("rest", &[items]), Ok(ints(&[2, 3])));
    }

    #[test]
    fn empty_inputs_yield_null() {
        for name in ["first", "last", "rest"] {
            assert_eq!(call(name, &[ints(&[])]), Ok(NULL), "{name} on []");
            assert_eq!(call(name, &[Value::string("")]), Ok(NULL), "{name} on \"\"");
        }
    }

    #[test]
    fn string_variants_work_on_characters() {
        assert_eq!(call("first", &[Value::string("kite")]), Ok(Value::string("k")));
        assert_eq!(call("last", &[Value::string("kite")]), Ok(Value::string("e")));
        assert_eq!(call("rest", &[Value::string("kite")]), Ok(Value::string("ite")));
        assert_eq!(call("first", &[Value::string("héllo")]), Ok(Value::string("h")));
        assert_eq!(call("last", &[Value::string("hé")]), Ok(Value::string("é")));
        assert_eq!(call("rest", &[Value::string("éa")]), Ok(Value::string("a")));
        assert_eq!(call("first", &[Value::string("é")]), Ok(Value::string("é")));
        assert_eq!(call("rest", &[Value::string("é")]), Ok(Value::string("")));
    }

    #[test]
    fn puts_writes_each_argument_and_yields_null() {
        let platform = CapturePlatform::new();
        let puts = lookup("puts").unwrap();
        let result = puts.call(&platform, &[Value::Integer(1), Value::string("two"), ints(&[3])]);
        assert_eq!(result, Ok(NULL));
        assert_eq!(platform.lines(), vec!["1", "two", "[3]"]);
    }
}
