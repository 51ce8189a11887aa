pub mod builtins;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod platform;
pub mod value;

pub use environment::{Env, Environment};
pub use error::{RuntimeError, RuntimeResult};
pub use interpreter::{Interpreter, InterpreterOptions};
pub use value::Value;
