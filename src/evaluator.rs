//! Expression evaluator.
//!
//! [`eval`] interprets an [`Object`] against an [`Environment`] and always returns an
//! `Object`: failures come back as [`Object::Error`] values instead of `Err`. Inside
//! this module, special-form handlers and primitives still use `Result` with `?`, and
//! the conversion to an error object happens once, at the dispatch boundary.
//!
//! ## Evaluation rules
//!
//! - `Int`, `Real`, `Bool`, closures, errors and `()` evaluate to themselves.
//! - A symbol evaluates to its binding, or to a `"<symbol> Not Found"` error.
//! - A list headed by a special-form name is dispatched to that form, with each
//!   argument evaluated or passed through according to the form's flags.
//! - Any other list has every element evaluated left to right. If the evaluated head
//!   is a closure it is applied to the rest, otherwise the evaluated list is the result.
//!
//! Applying a lambda evaluates its body in a fresh call environment (see
//! [`Environment`]): parameters first, then the closure's captured bindings, then the
//! caller's.

use crate::env::Environment;
use crate::list::List;
use crate::object::{Closure, Object};
use crate::parser::{ParseConfig, parse_program, parse_with_config};
use crate::primitives::get_primitive_ops;
use crate::specialforms::{ArgPolicy, SpecialForm, find_special_form};
use crate::{Error, MAX_EVAL_DEPTH};

/// Per-call evaluation state threaded through eval/apply. `depth` counts nested
/// lambda applications only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    depth: usize,
    trace: bool,
}

impl Context {
    pub fn new(trace: bool) -> Self {
        Context { depth: 0, trace }
    }

    /// Context for the body of a lambda application
    pub fn deeper(self) -> Self {
        Context {
            depth: self.depth + 1,
            ..self
        }
    }

    fn indent(&self) -> String {
        "  ".repeat(self.depth)
    }
}

/// Create a global environment with all primitives installed
pub fn create_global_env() -> Environment {
    let env = Environment::new();
    for op in get_primitive_ops() {
        env.register_primitive(op.name, op.arity, op.func);
    }
    env
}

/// Evaluate an expression with tracing off
pub fn eval(expr: &Object, env: &Environment) -> Object {
    eval_in(expr, env, Context::default())
}

/// Minimum stack left before a nested evaluation switches to a fresh segment
const STACK_RED_ZONE: usize = 64 * 1024;

/// Size of each stack segment allocated for deep recursion
const STACK_SEGMENT: usize = 1024 * 1024;

/// Evaluate an expression under the given context
pub fn eval_in(expr: &Object, env: &Environment, ctx: Context) -> Object {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || eval_expr(expr, env, ctx))
}

fn eval_expr(expr: &Object, env: &Environment, ctx: Context) -> Object {
    let result = match expr {
        Object::Int(_)
        | Object::Real(_)
        | Object::Bool(_)
        | Object::Closure(_)
        | Object::Error(_) => return expr.clone(),
        Object::List(list) if list.is_empty() => return expr.clone(),
        Object::Symbol(_) => env.lookup(expr),
        Object::Binding(_) => {
            Error::TypeError(format!("cannot evaluate binding '{expr}'")).into()
        }
        Object::List(list) => eval_list(list, env, ctx),
    };

    if ctx.trace {
        log::info!("{}{expr} => {result}", ctx.indent());
    }
    result
}

fn eval_list(list: &List, env: &Environment, ctx: Context) -> Object {
    if let Some(Object::Symbol(name)) = list.front() {
        if let Some(form) = find_special_form(name) {
            return apply_special(form, list, env, ctx)
                .unwrap_or_else(|err| err.in_expression(list).into());
        }
    }

    let mut evaluated: List = list.iter().map(|item| eval_in(item, env, ctx)).collect();
    // The head is split off in place so the arguments are handed over without a copy
    match evaluated.pop_front() {
        Ok(Object::Closure(closure)) => call_closure(&closure, evaluated, env, ctx)
            .unwrap_or_else(|err| err.in_expression(list).into()),
        Ok(head) => {
            evaluated.push(head);
            Object::List(evaluated)
        }
        Err(err) => err.into(),
    }
}

/// Validate arity, prepare arguments per the form's flags, then run the handler
fn apply_special(
    form: &SpecialForm,
    list: &List,
    env: &Environment,
    ctx: Context,
) -> Result<Object, Error> {
    form.arity.validate(list.len().saturating_sub(1))?;

    let args: List = list
        .iter()
        .skip(1)
        .enumerate()
        .map(|(i, arg)| match form.policy(i) {
            ArgPolicy::Eval => eval_in(arg, env, ctx),
            ArgPolicy::NoEval => arg.clone(),
        })
        .collect();
    (form.handler)(&args, env, ctx)
}

/// Apply `func` to already evaluated `args` on behalf of `caller`
pub fn apply(func: &Object, args: List, caller: &Environment) -> Object {
    apply_in(func, args, caller, Context::default())
}

pub fn apply_in(func: &Object, args: List, caller: &Environment, ctx: Context) -> Object {
    match func {
        Object::Closure(closure) => {
            call_closure(closure, args, caller, ctx).unwrap_or_else(Object::from)
        }
        other => Error::ApplyError(format!("{} '{other}'", other.type_name())).into(),
    }
}

fn call_closure(
    closure: &Closure,
    args: List,
    caller: &Environment,
    ctx: Context,
) -> Result<Object, Error> {
    match closure {
        Closure::Primitive(primitive) => {
            if ctx.trace {
                log::info!("{}apply {} to {args}", ctx.indent(), primitive.name);
            }
            primitive.call(&args)
        }
        Closure::Lambda(lambda) => {
            if ctx.trace {
                log::info!(
                    "{}apply (lambda {:?} {}) to {args}",
                    ctx.indent(),
                    lambda.params,
                    lambda.body
                );
            }
            if ctx.depth >= MAX_EVAL_DEPTH {
                return Err(Error::EvalError(format!(
                    "evaluation depth limit exceeded (max depth: {MAX_EVAL_DEPTH})"
                )));
            }
            let call_env = Environment::for_call(lambda, args, caller)?;
            Ok(eval_in(&lambda.body, &call_env, ctx.deeper()))
        }
    }
}

/// Evaluator bound to a persistent global environment
///
/// This is what the REPL drives: one `eval_str` per input line, with an optional
/// trace that logs every evaluation step without changing any result.
pub struct Interpreter {
    env: Environment,
    trace: bool,
    config: ParseConfig,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(ParseConfig::default())
    }

    pub fn with_config(config: ParseConfig) -> Self {
        Interpreter {
            env: create_global_env(),
            trace: false,
            config,
        }
    }

    /// The global environment
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn set_trace(&mut self, on: bool) {
        self.trace = on;
    }

    pub fn trace(&self) -> bool {
        self.trace
    }

    pub fn eval(&self, expr: &Object) -> Object {
        eval_in(expr, &self.env, Context::new(self.trace))
    }

    /// Parse and evaluate one expression; a parse failure is returned as an error object
    pub fn eval_str(&self, input: &str) -> Object {
        match parse_with_config(input, self.config) {
            Ok(expr) => self.eval(&expr),
            Err(err) => err.into(),
        }
    }

    /// Evaluate every top-level expression of `input` in order.
    ///
    /// Only a syntax error in the text is an `Err`; evaluation errors appear as
    /// error objects in the returned results and do not stop later expressions.
    pub fn eval_program(&self, input: &str) -> Result<Vec<Object>, Error> {
        Ok(parse_program(input)?
            .iter()
            .map(|expr| self.eval(expr))
            .collect())
    }
}
