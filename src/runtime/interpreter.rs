use crate::language::ast::{
    BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::runtime::{
    builtins,
    environment::{Env, Environment},
    error::{EvalResult, FlowSignal, RuntimeError, RuntimeResult},
    platform::{Platform, StdPlatform},
    value::{FunctionValue, Value, ValueType, FALSE, NULL, TRUE},
};
use crate::stack::ensure_sufficient_stack;
use std::rc::Rc;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterpreterOptions {
    /// Nested user-function calls allowed before evaluation aborts.
    pub max_call_depth: usize,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// Evaluates `program` in `env` with output going to stdout.
pub fn eval(program: &Program, env: &Env) -> RuntimeResult<Value> {
    Interpreter::new().eval_program(program, env)
}

pub struct Interpreter {
    globals: Env,
    platform: Rc<dyn Platform>,
    options: InterpreterOptions,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_platform(Rc::new(StdPlatform))
    }

    pub fn with_platform(platform: Rc<dyn Platform>) -> Self {
        Self {
            globals: Environment::new().into_shared(),
            platform,
            options: InterpreterOptions::default(),
            call_depth: 0,
        }
    }

    pub fn with_options(mut self, options: InterpreterOptions) -> Self {
        self.options = options;
        self
    }

    /// Evaluates `program` in the root scope, so bindings persist across runs.
    pub fn run(&mut self, program: &Program) -> RuntimeResult<Value> {
        let env = Rc::clone(&self.globals);
        self.eval_program(program, &env)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(statements = program.statements.len()))]
    pub fn eval_program(&mut self, program: &Program, env: &Env) -> RuntimeResult<Value> {
        self.call_depth = 0;
        match self.eval_statements(&program.statements, env) {
            Ok(value) | Err(FlowSignal::Return(value)) => Ok(value),
            Err(FlowSignal::Error(err)) => {
                tracing::debug!(error = %err, "program aborted");
                Err(err)
            }
        }
    }

    fn eval_block(&mut self, block: &BlockStatement, env: &Env) -> EvalResult {
        self.eval_statements(&block.statements, env)
    }

    /// Yields the last statement's value; stops at the first return or error.
    fn eval_statements(&mut self, statements: &[Statement], env: &Env) -> EvalResult {
        let mut result = NULL;
        for statement in statements {
            result = self.eval_statement(statement, env)?;
        }
        Ok(result)
    }

    fn eval_statement(&mut self, statement: &Statement, env: &Env) -> EvalResult {
        match statement {
            Statement::Let { name, value } => {
                let value = self.eval_expression(value, env)?;
                env.borrow_mut().set(name.as_str(), value);
                Ok(NULL)
            }
            Statement::Return(expr) => {
                let value = self.eval_expression(expr, env)?;
                Err(FlowSignal::Return(value))
            }
            Statement::Expression(expr) => self.eval_expression(expr, env),
        }
    }

    fn eval_expression(&mut self, expr: &Expression, env: &Env) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_expression_inner(expr, env))
    }

    fn eval_expression_inner(&mut self, expr: &Expression, env: &Env) -> EvalResult {
        match expr {
            Expression::Identifier(name) => Ok(eval_identifier(name, env)?),
            Expression::IntegerLiteral(value) => Ok(Value::Integer(*value)),
            Expression::BooleanLiteral(value) => Ok(Value::from_bool(*value)),
            Expression::StringLiteral(text) => Ok(Value::string(text)),
            Expression::ArrayLiteral(elements) => {
                Ok(Value::array(self.eval_expressions(elements, env)?))
            }
            Expression::Prefix { operator, right } => {
                let right = self.eval_expression(right, env)?;
                Ok(eval_prefix(*operator, right)?)
            }
            Expression::Infix {
                operator,
                left,
                right,
            } => {
                let left = self.eval_expression(left, env)?;
                let right = self.eval_expression(right, env)?;
                Ok(eval_infix(*operator, left, right)?)
            }
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                let condition = self.eval_expression(condition, env)?;
                if condition.is_truthy() {
                    self.eval_block(consequence, env)
                } else if let Some(alternative) = alternative {
                    self.eval_block(alternative, env)
                } else {
                    Ok(NULL)
                }
            }
            Expression::FunctionLiteral { parameters, body } => {
                Ok(Value::Function(Rc::new(FunctionValue {
                    parameters: parameters.clone(),
                    body: Rc::clone(body),
                    env: Rc::clone(env),
                })))
            }
            Expression::Call {
                function,
                arguments,
            } => {
                let callee = self.eval_expression(function, env)?;
                let args = self.eval_expressions(arguments, env)?;
                self.apply_function(callee, args)
            }
        }
    }

    /// Left to right; nothing after the first failing expression is evaluated.
    fn eval_expressions(
        &mut self,
        expressions: &[Expression],
        env: &Env,
    ) -> Result<Vec<Value>, FlowSignal> {
        expressions
            .iter()
            .map(|expr| self.eval_expression(expr, env))
            .collect()
    }

    fn apply_function(&mut self, callee: Value, args: Vec<Value>) -> EvalResult {
        match &callee {
            Value::Function(function) => self.call_function(function, args),
            Value::Builtin(builtin) => {
                tracing::trace!(builtin = builtin.name(), arguments = args.len(), "calling builtin");
                Ok(builtin.call(self.platform.as_ref(), &args)?)
            }
            other => Err(RuntimeError::NotAFunction {
                callee: other.value_type(),
            }
            .into()),
        }
    }

    fn call_function(&mut self, function: &FunctionValue, args: Vec<Value>) -> EvalResult {
        if self.call_depth >= self.options.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded {
                limit: self.options.max_call_depth,
            }
            .into());
        }
        tracing::trace!(
            parameters = function.parameters.len(),
            arguments = args.len(),
            depth = self.call_depth,
            "applying function"
        );

        let call_env = extend_function_env(function, args);
        self.call_depth += 1;
        let result = self.eval_block(&function.body, &call_env);
        self.call_depth -= 1;

        match result {
            Err(FlowSignal::Return(value)) => Ok(value),
            other => other,
        }
    }
}

/// Binds parameters positionally in a scope enclosed by the captured one.
/// Surplus arguments are dropped; parameters without an argument stay
/// unbound and only fail if the body reads them.
fn extend_function_env(function: &FunctionValue, args: Vec<Value>) -> Env {
    let mut scope = Environment::new_enclosed(Rc::clone(&function.env));
    for (parameter, arg) in function.parameters.iter().zip(args) {
        scope.set(parameter.as_str(), arg);
    }
    scope.into_shared()
}

fn eval_identifier(name: &str, env: &Env) -> RuntimeResult<Value> {
    if let Some(value) = env.borrow().get(name) {
        return Ok(value);
    }
    builtins::lookup(name)
        .map(Value::Builtin)
        .ok_or_else(|| RuntimeError::IdentifierNotFound {
            name: name.to_string(),
        })
}

fn eval_prefix(operator: PrefixOperator, right: Value) -> RuntimeResult<Value> {
    match operator {
        PrefixOperator::Bang => Ok(eval_bang(&right)),
        PrefixOperator::Minus => match right {
            Value::Integer(value) => Ok(Value::Integer(value.wrapping_neg())),
            other => Err(RuntimeError::UnknownPrefixOperator {
                operator,
                operand: other.value_type(),
            }),
        },
    }
}

fn eval_bang(right: &Value) -> Value {
    match right {
        Value::Boolean(true) => FALSE,
        Value::Boolean(false) => TRUE,
        Value::Null => TRUE,
        _ => FALSE,
    }
}

fn eval_infix(operator: InfixOperator, left: Value, right: Value) -> RuntimeResult<Value> {
    match (&left, &right) {
        (Value::Integer(lhs), Value::Integer(rhs)) => eval_integer_infix(operator, *lhs, *rhs),
        (Value::Boolean(lhs), Value::Boolean(rhs)) => eval_boolean_infix(operator, *lhs, *rhs),
        _ if left.value_type() != right.value_type() => Err(RuntimeError::TypeMismatch {
            left: left.value_type(),
            operator,
            right: right.value_type(),
        }),
        _ => Err(RuntimeError::UnknownInfixOperator {
            left: left.value_type(),
            operator,
            right: right.value_type(),
        }),
    }
}

fn eval_integer_infix(operator: InfixOperator, lhs: i64, rhs: i64) -> RuntimeResult<Value> {
    let value = match operator {
        InfixOperator::Add => Value::Integer(lhs.wrapping_add(rhs)),
        InfixOperator::Sub => Value::Integer(lhs.wrapping_sub(rhs)),
        InfixOperator::Mul => Value::Integer(lhs.wrapping_mul(rhs)),
        InfixOperator::Div => {
            if rhs == 0 {
                return Err(RuntimeError::DivisionByZero { dividend: lhs });
            }
            Value::Integer(lhs.wrapping_div(rhs))
        }
        InfixOperator::Lt => Value::from_bool(lhs < rhs),
        InfixOperator::Gt => Value::from_bool(lhs > rhs),
        InfixOperator::Eq => Value::from_bool(lhs == rhs),
        InfixOperator::NotEq => Value::from_bool(lhs != rhs),
    };
    Ok(value)
}

fn eval_boolean_infix(operator: InfixOperator, lhs: bool, rhs: bool) -> RuntimeResult<Value> {
    match operator {
        InfixOperator::Eq => Ok(Value::from_bool(lhs == rhs)),
        InfixOperator::NotEq => Ok(Value::from_bool(lhs != rhs)),
        _ => Err(RuntimeError::UnknownInfixOperator {
            left: ValueType::Boolean,
            operator,
            right: ValueType::Boolean,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::parser::parse_source;
    use crate::runtime::platform::CapturePlatform;
    use pretty_assertions::assert_eq;

    fn program(source: &str) -> Program {
        parse_source(source).unwrap_or_else(|errors| panic!("syntax errors: {errors:?}"))
    }

    #[test]
    fn bang_treats_only_null_and_false_as_false() {
        assert_eq!(eval_bang(&TRUE), FALSE);
        assert_eq!(eval_bang(&FALSE), TRUE);
        assert_eq!(eval_bang(&NULL), TRUE);
        assert_eq!(eval_bang(&Value::Integer(0)), FALSE);
        assert_eq!(eval_bang(&Value::string("")), FALSE);
    }

    #[test]
    fn minus_requires_an_integer() {
        assert_eq!(
            eval_prefix(PrefixOperator::Minus, Value::Integer(5)),
            Ok(Value::Integer(-5))
        );
        assert_eq!(
            eval_prefix(PrefixOperator::Minus, TRUE).unwrap_err().to_string(),
            "unknown operator: -BOOLEAN"
        );
    }

    #[test]
    fn integer_arithmetic_wraps_and_truncates() {
        assert_eq!(
            eval_integer_infix(InfixOperator::Div, -7, 2),
            Ok(Value::Integer(-3))
        );
        assert_eq!(
            eval_integer_infix(InfixOperator::Add, i64::MAX, 1),
            Ok(Value::Integer(i64::MIN))
        );
        assert_eq!(
            eval_integer_infix(InfixOperator::Div, i64::MIN, -1),
            Ok(Value::Integer(i64::MIN))
        );
        assert_eq!(
            eval_prefix(PrefixOperator::Minus, Value::Integer(i64::MIN)),
            Ok(Value::Integer(i64::MIN))
        );
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        assert_eq!(
            eval_integer_infix(InfixOperator::Div, 10, 0),
            Err(RuntimeError::DivisionByZero { dividend: 10 })
        );
    }

    #[test]
    fn infix_error_classification() {
        assert_eq!(
            eval_infix(InfixOperator::Add, Value::Integer(1), TRUE)
                .unwrap_err()
                .to_string(),
            "type mismatch: INTEGER + BOOLEAN"
        );
        assert_eq!(
            eval_infix(InfixOperator::Add, TRUE, FALSE).unwrap_err().to_string(),
            "unknown operator: BOOLEAN + BOOLEAN"
        );
        assert_eq!(
            eval_infix(InfixOperator::Lt, TRUE, FALSE).unwrap_err().to_string(),
            "unknown operator: BOOLEAN < BOOLEAN"
        );
        assert_eq!(
            eval_infix(InfixOperator::Eq, Value::string("a"), Value::string("a"))
                .unwrap_err()
                .to_string(),
            "unknown operator: STRING == STRING"
        );
        assert_eq!(
            eval_infix(InfixOperator::Eq, NULL, NULL).unwrap_err().to_string(),
            "unknown operator: NULL == NULL"
        );
    }

    #[test]
    fn identifiers_fall_back_to_builtins_and_can_shadow_them() {
        let env = Environment::new().into_shared();
        assert_eq!(
            eval_identifier("len", &env),
            Ok(Value::Builtin(builtins::lookup("len").unwrap()))
        );
        env.borrow_mut().set("len", Value::Integer(3));
        assert_eq!(eval_identifier("len", &env), Ok(Value::Integer(3)));
        assert_eq!(
            eval_identifier("nope", &env).unwrap_err().to_string(),
            "identifier not found: nope"
        );
    }

    #[test]
    fn extra_arguments_are_dropped_and_missing_ones_stay_unbound() {
        let function = FunctionValue {
            parameters: vec!["a".into(), "b".into()],
            body: Rc::new(BlockStatement::default()),
            env: Environment::new().into_shared(),
        };
        let scope = extend_function_env(&function, vec![Value::Integer(1)]);
        assert_eq!(scope.borrow().get("a"), Some(Value::Integer(1)));
        assert_eq!(scope.borrow().get("b"), None);

        let scope = extend_function_env(
            &function,
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)],
        );
        assert_eq!(scope.borrow().get("b"), Some(Value::Integer(2)));
    }

    #[test]
    fn run_keeps_bindings_between_programs() {
        let platform = Rc::new(CapturePlatform::new());
        let mut interpreter = Interpreter::with_platform(platform.clone());
        assert_eq!(interpreter.run(&program("let x = 40;")), Ok(NULL));
        assert_eq!(interpreter.run(&program("puts(x + 2); x")), Ok(Value::Integer(40)));
        assert_eq!(platform.lines(), vec!["42"]);
    }

    #[test]
    fn call_depth_limit_reports_an_error() {
        let mut interpreter = Interpreter::with_platform(Rc::new(CapturePlatform::new()))
            .with_options(InterpreterOptions { max_call_depth: 50 });
        let result = interpreter.run(&program("let f = fn(n) { f(n + 1) }; f(0)"));
        assert_eq!(result, Err(RuntimeError::CallDepthExceeded { limit: 50 }));

        let result = interpreter.run(&program(
            "let count = fn(n) { if (n == 0) { 0 } else { 1 + count(n - 1) } }; count(49)",
        ));
        assert_eq!(result, Ok(Value::Integer(49)));
    }

    #[test]
    fn free_eval_uses_the_given_environment() {
        let env = Environment::new().into_shared();
        env.borrow_mut().set("base", Value::Integer(10));
        assert_eq!(eval(&program("base * 2"), &env), Ok(Value::Integer(20)));
    }
}
