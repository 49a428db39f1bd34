//! mgclisp - a small evaluator for a Lisp-family expression language
//!
//! The language manipulates integers, reals, booleans, symbols, nested lists and
//! closures, combined through a fixed set of special forms and a handful of
//! primitive procedures:
//!
//! ```text
//! (define fact (lambda (n) (if (< n 2) 1 (* n (fact (- n 1))))))
//! (fact 5)                       ; 120
//! (let ((a 1) (b 2)) (+ a b))    ; 3
//! (' (1 2 3))                    ; (1 2 3)
//! (do (define x 1) (push x (' (2 3))))
//! ```
//!
//! ## Evaluation model
//!
//! - Errors are values: every failure produces an [`object::Object::Error`] which flows
//!   through evaluation like any other object. Only `do` and `cond` inspect it.
//! - Lists double as data and as calls: a non-empty list whose evaluated head is a
//!   closure is applied, any other list evaluates to the list of its evaluated parts.
//! - Environments are sequences of bindings searched front-to-back. A lambda call
//!   builds its environment from the parameters, then the captured environment,
//!   then the caller's environment.
//!
//! ## Modules
//!
//! - `object`: the tagged object model
//! - `list`: the singly linked sequence used for data, arguments and environments
//! - `env`: environments, bindings and call-environment composition
//! - `specialforms`: the special-form table and its handlers
//! - `primitives`: native procedures installed in the global environment
//! - `evaluator`: eval/apply and the [`evaluator::Interpreter`] facade
//! - `lexer`, `parser`: text to expression front end

use std::fmt;

/// Maximum nesting depth accepted by the parser
pub const MAX_PARSE_DEPTH: usize = 64;

/// Maximum number of nested lambda applications before an `EvalError` object is
/// produced. Nesting inside a single body is already bounded by [`MAX_PARSE_DEPTH`].
pub const MAX_EVAL_DEPTH: usize = 5_000;

/// Number of arguments accepted by a special form or primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many arguments
    Exact(usize),
    /// This many arguments or more
    AtLeast(usize),
    /// Between the two bounds, inclusive
    Range(usize, usize),
    /// Any number of arguments (forms that evaluate their own arguments)
    Any,
}

impl Arity {
    /// Check an argument count against this arity
    pub fn validate(&self, got: usize) -> Result<(), Error> {
        let ok = match *self {
            Arity::Exact(n) => got == n,
            Arity::AtLeast(n) => got >= n,
            Arity::Range(min, max) => (min..=max).contains(&got),
            Arity::Any => true,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::arity_error(*self, got))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Range(min, max) => write!(f, "{min} to {max}"),
            Arity::Any => write!(f, "any number of"),
        }
    }
}

/// Error types for the interpreter
///
/// Inside the evaluator these never unwind: they are turned into
/// [`object::Object::Error`] values carrying their `Display` text.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Symbol not bound in the environment
    LookupError(String),
    ArityError {
        expected: Arity,
        got: usize,
        expression: Option<String>,
    },
    TypeError(String),
    SyntaxError(String),
    ApplyError(String),
    IndexError {
        index: usize,
        len: usize,
    },
    EvalError(String),
}

impl Error {
    /// Create an ArityError without expression context
    pub fn arity_error(expected: Arity, got: usize) -> Self {
        Error::ArityError {
            expected,
            got,
            expression: None,
        }
    }

    /// Create an ArityError with expression context
    pub fn arity_error_with_expr(expected: Arity, got: usize, expression: String) -> Self {
        Error::ArityError {
            expected,
            got,
            expression: Some(expression),
        }
    }

    /// Attach expression context to an ArityError; other errors pass through
    pub(crate) fn in_expression(self, expression: impl fmt::Display) -> Self {
        match self {
            Error::ArityError {
                expected,
                got,
                expression: None,
            } => Error::arity_error_with_expr(expected, got, expression.to_string()),
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::LookupError(symbol) => write!(f, "{symbol} Not Found"),
            Error::ArityError {
                expected,
                got,
                expression,
            } => match expression {
                Some(expr) => write!(
                    f,
                    "ArityError: {expr}: expected {expected} arguments, got {got}"
                ),
                None => write!(f, "ArityError: expected {expected} arguments, got {got}"),
            },
            Error::TypeError(msg) => write!(f, "TypeError: {msg}"),
            Error::SyntaxError(msg) => write!(f, "SyntaxError: {msg}"),
            Error::ApplyError(what) => write!(f, "ApplyError: cannot apply {what}"),
            Error::IndexError { index, len } => write!(
                f,
                "IndexError: index {index} out of range for list of length {len}"
            ),
            Error::EvalError(msg) => write!(f, "EvalError: {msg}"),
        }
    }
}

pub mod env;
pub mod evaluator;
pub mod lexer;
pub mod list;
pub mod object;
pub mod parser;
pub mod primitives;
pub mod specialforms;

pub use env::Environment;
pub use evaluator::{Interpreter, apply, eval};
pub use list::List;
pub use object::Object;
