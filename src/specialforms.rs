//! Special-form registry.
//!
//! A special form is dispatched by the literal symbol at the head of a list, before
//! anything is evaluated. Each entry declares its arity and, per argument position,
//! whether the evaluator should evaluate that argument before calling the handler.
//! Positions without a flag are passed through unevaluated; `do` and `cond` declare
//! no flags at all and evaluate their own arguments.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::env::Environment;
use crate::evaluator::{Context, apply_in, eval_in};
use crate::list::List;
use crate::object::{Closure, Lambda, Object};
use crate::{Arity, Error};

/// Marker separating fixed parameters from the rest parameter: `(a b .. rest)`
pub const REST_MARKER: &str = "..";

/// Whether the evaluator evaluates an argument before handing it to the handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgPolicy {
    Eval,
    NoEval,
}

/// Handler signature: prepared arguments, current environment, evaluation context
pub type SpecialFormFn = fn(&List, &Environment, Context) -> Result<Object, Error>;

/// Definition of a special form
#[derive(Debug, Clone, Copy)]
pub struct SpecialForm {
    pub name: &'static str,
    pub arity: Arity,
    pub flags: &'static [ArgPolicy],
    pub handler: SpecialFormFn,
}

impl SpecialForm {
    /// Evaluation policy for the argument at `index`
    pub fn policy(&self, index: usize) -> ArgPolicy {
        self.flags.get(index).copied().unwrap_or(ArgPolicy::NoEval)
    }
}

use ArgPolicy::{Eval, NoEval};

static SPECIAL_FORMS: &[SpecialForm] = &[
    SpecialForm {
        name: "define",
        arity: Arity::Exact(2),
        flags: &[NoEval, Eval],
        handler: special_define,
    },
    SpecialForm {
        name: "if",
        arity: Arity::Exact(3),
        flags: &[Eval, NoEval, NoEval],
        handler: special_if,
    },
    SpecialForm {
        name: "lambda",
        arity: Arity::Exact(2),
        flags: &[NoEval, NoEval],
        handler: special_lambda,
    },
    // Only the first argument matters; a second one is tolerated and ignored
    SpecialForm {
        name: "quote",
        arity: Arity::Range(1, 2),
        flags: &[NoEval, NoEval],
        handler: special_quote,
    },
    SpecialForm {
        name: "'",
        arity: Arity::Range(1, 2),
        flags: &[NoEval, NoEval],
        handler: special_quote,
    },
    SpecialForm {
        name: "set",
        arity: Arity::Exact(2),
        flags: &[NoEval, Eval],
        handler: special_set,
    },
    SpecialForm {
        name: "do",
        arity: Arity::Any,
        flags: &[],
        handler: special_do,
    },
    SpecialForm {
        name: "cond",
        arity: Arity::Any,
        flags: &[],
        handler: special_cond,
    },
    SpecialForm {
        name: "let",
        arity: Arity::Exact(2),
        flags: &[NoEval, NoEval],
        handler: special_let,
    },
];

/// Lazy static map from form name to definition (private - use find_special_form)
static SPECIAL_FORM_INDEX: LazyLock<HashMap<&'static str, &'static SpecialForm>> =
    LazyLock::new(|| SPECIAL_FORMS.iter().map(|form| (form.name, form)).collect());

/// All registered special forms, in registration order
pub fn get_special_forms() -> &'static [SpecialForm] {
    SPECIAL_FORMS
}

/// Special form registered under `name`
pub fn find_special_form(name: &str) -> Option<&'static SpecialForm> {
    SPECIAL_FORM_INDEX.get(name).copied()
}

fn label(args: &List, form: &str) -> Result<String, Error> {
    match args.nth(0)? {
        Object::Symbol(name) => Ok(name.clone()),
        other => Err(Error::TypeError(format!(
            "{form} requires a symbol, got {} '{other}'",
            other.type_name()
        ))),
    }
}

/// `(define label value)`: append a new binding and return the label
fn special_define(args: &List, env: &Environment, _ctx: Context) -> Result<Object, Error> {
    let name = label(args, "define")?;
    env.define(name.as_str(), args.nth(1)?.clone());
    Ok(Object::Symbol(name))
}

/// `(set label value)`: mutate the first binding of label, or define it
fn special_set(args: &List, env: &Environment, _ctx: Context) -> Result<Object, Error> {
    let name = label(args, "set")?;
    env.set(&name, args.nth(1)?.clone());
    Ok(Object::Symbol(name))
}

fn special_if(args: &List, env: &Environment, ctx: Context) -> Result<Object, Error> {
    let branch = if args.nth(0)?.is_false() { 2 } else { 1 };
    Ok(eval_in(args.nth(branch)?, env, ctx))
}

/// Split a parameter list into fixed names and the optional rest parameter
fn parameter_list(params: &Object) -> Result<(Vec<String>, Option<String>), Error> {
    let Object::List(params) = params else {
        return Err(Error::SyntaxError(format!(
            "lambda parameters must be a list, got '{params}'"
        )));
    };

    let mut names = Vec::with_capacity(params.len());
    for param in params {
        match param {
            Object::Symbol(name) => names.push(name.clone()),
            other => {
                return Err(Error::TypeError(format!(
                    "lambda parameters must be symbols, got {} '{other}'",
                    other.type_name()
                )));
            }
        }
    }

    match names.iter().position(|name| name == REST_MARKER) {
        None => Ok((names, None)),
        Some(at) if at + 2 == names.len() => {
            let rest = names.pop();
            names.truncate(at);
            Ok((names, rest))
        }
        Some(_) => Err(Error::SyntaxError(format!(
            "'{REST_MARKER}' must come right before the last parameter in {params}"
        ))),
    }
}

/// `(lambda (params) body)`: closure sharing the current environment
fn special_lambda(args: &List, env: &Environment, _ctx: Context) -> Result<Object, Error> {
    let (params, rest) = parameter_list(args.nth(0)?)?;
    Ok(Object::closure(Closure::Lambda(Lambda {
        params,
        rest,
        body: args.nth(1)?.clone(),
        env: env.clone(),
    })))
}

fn special_quote(args: &List, _env: &Environment, _ctx: Context) -> Result<Object, Error> {
    Ok(args.nth(0)?.clone())
}

/// Evaluate in order, returning the last value; stop at the first error
fn eval_sequence(exprs: &List, env: &Environment, ctx: Context) -> Object {
    let mut result = Object::List(List::new());
    for expr in exprs {
        result = eval_in(expr, env, ctx);
        if result.is_error() {
            break;
        }
    }
    result
}

fn special_do(args: &List, env: &Environment, ctx: Context) -> Result<Object, Error> {
    Ok(eval_sequence(args, env, ctx))
}

/// Every clause must be a list. Clauses are then evaluated in order like `do`;
/// there is no test-based clause selection.
fn special_cond(args: &List, env: &Environment, ctx: Context) -> Result<Object, Error> {
    if let Some(clause) = args.iter().find(|clause| !matches!(clause, Object::List(_))) {
        return Err(Error::SyntaxError(format!(
            "cond clause must be a list, got '{clause}'"
        )));
    }
    Ok(eval_sequence(args, env, ctx))
}

/// `(let ((name value) ...) body)`: apply a lambda over the names to the values
fn special_let(args: &List, env: &Environment, ctx: Context) -> Result<Object, Error> {
    let Object::List(pairs) = args.nth(0)? else {
        return Err(Error::SyntaxError(
            "let requires a list of (name value) pairs".into(),
        ));
    };

    let mut params = Vec::with_capacity(pairs.len());
    let mut values = List::new();
    for pair in pairs {
        match pair {
            Object::List(pair) if pair.len() == 2 => match pair.nth(0)? {
                Object::Symbol(name) => {
                    params.push(name.clone());
                    values.append(eval_in(pair.nth(1)?, env, ctx));
                }
                other => {
                    return Err(Error::SyntaxError(format!(
                        "let binding name must be a symbol, got '{other}'"
                    )));
                }
            },
            other => {
                return Err(Error::SyntaxError(format!(
                    "malformed let binding '{other}', expected (name value)"
                )));
            }
        }
    }

    let lambda = Object::closure(Closure::Lambda(Lambda {
        params,
        rest: None,
        body: args.nth(1)?.clone(),
        env: env.clone(),
    }));
    Ok(apply_in(&lambda, values, env, ctx))
}
