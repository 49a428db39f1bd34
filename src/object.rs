//! This module defines the tagged [`Object`] type manipulated by the evaluator, along
//! with bindings and closures. Constructors mirror the language's value rules (reals
//! produced by arithmetic demote to integers when they have no fractional part, the
//! symbols `true`/`false` become booleans), equality is deep structural equality, and
//! `Display` renders the text the REPL prints. Helper functions [`val`], [`sym`] and
//! [`nil`] keep expected values short in tests.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::env::Environment;
use crate::list::List;
use crate::{Arity, Error};

/// Symbol name treated as false by `if`
pub const NIL_SYMBOL: &str = "NIL";

/// Core value type of the interpreter
///
/// Bindings and closures are reference-counted: a binding reached through several
/// environments is the same binding, so `set` is visible everywhere it is shared.
#[derive(Clone)]
pub enum Object {
    Int(i64),
    Real(f64),
    Bool(bool),
    Symbol(String),
    /// First-class error value; see [`crate::Error`] for the message taxonomy
    Error(String),
    /// Environment entry; never produced by the language surface
    Binding(Rc<RefCell<Binding>>),
    Closure(Rc<Closure>),
    List(List),
}

/// A single symbol to value association
#[derive(Debug, Clone)]
pub struct Binding {
    pub symbol: String,
    pub value: Object,
}

/// Signature of native procedures
pub type PrimitiveFn = dyn Fn(&List) -> Result<Object, Error>;

/// Callable value
pub enum Closure {
    Primitive(Primitive),
    Lambda(Lambda),
}

/// Native procedure over an argument sequence
pub struct Primitive {
    pub name: String,
    pub arity: Arity,
    pub(crate) func: Rc<PrimitiveFn>,
}

impl Primitive {
    pub fn new(
        name: impl Into<String>,
        arity: Arity,
        func: impl Fn(&List) -> Result<Object, Error> + 'static,
    ) -> Self {
        Primitive {
            name: name.into(),
            arity,
            func: Rc::new(func),
        }
    }

    /// Validate the argument count, then run the procedure
    pub fn call(&self, args: &List) -> Result<Object, Error> {
        self.arity
            .validate(args.len())
            .map_err(|err| err.in_expression(&self.name))?;
        (self.func)(args)
    }
}

/// User-defined procedure
pub struct Lambda {
    /// Formal parameter symbols, in order
    pub params: Vec<String>,
    /// Parameter collecting surplus arguments, from `(a .. rest)`
    pub rest: Option<String>,
    pub body: Object,
    /// Environment in effect where the `lambda` form was evaluated (shared, not copied)
    pub env: Environment,
}

impl Object {
    pub fn int(value: i64) -> Object {
        Object::Int(value)
    }

    /// Real produced by arithmetic: values with no fractional part become `Int`.
    /// Literal reals are built with `Object::Real` directly and keep their form.
    pub fn real(value: f64) -> Object {
        // i64::MAX as f64 rounds up to 2^63, which is already out of range
        if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
            Object::Int(value as i64)
        } else {
            Object::Real(value)
        }
    }

    /// Symbol, except that `true` and `false` are recognised as booleans
    pub fn symbol(name: &str) -> Object {
        match name {
            "true" => Object::Bool(true),
            "false" => Object::Bool(false),
            _ => Object::Symbol(name.to_owned()),
        }
    }

    pub fn boolean(value: bool) -> Object {
        Object::Bool(value)
    }

    pub fn list(list: List) -> Object {
        Object::List(list)
    }

    pub fn closure(closure: Closure) -> Object {
        Object::Closure(Rc::new(closure))
    }

    pub fn binding(symbol: impl Into<String>, value: Object) -> Object {
        Object::Binding(Rc::new(RefCell::new(Binding {
            symbol: symbol.into(),
            value,
        })))
    }

    pub fn error(message: impl Into<String>) -> Object {
        Object::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }

    /// `Bool(false)` or the symbol `NIL`
    pub fn is_false(&self) -> bool {
        match self {
            Object::Bool(b) => !b,
            Object::Symbol(s) => s == NIL_SYMBOL,
            _ => false,
        }
    }

    /// Tag name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Int(_) => "int",
            Object::Real(_) => "real",
            Object::Bool(_) => "bool",
            Object::Symbol(_) => "symbol",
            Object::Error(_) => "error",
            Object::Binding(_) => "binding",
            Object::Closure(_) => "closure",
            Object::List(_) => "list",
        }
    }

    /// Numeric payload of `Int` and `Real`
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Int(n) => Some(*n as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }
}

impl From<Error> for Object {
    fn from(err: Error) -> Self {
        Object::Error(err.to_string())
    }
}

/// Deep structural equality
///
/// Different tags are never equal, closures are never equal to anything (themselves
/// included), errors compare unequal, bindings compare by symbol and lists compare
/// element by element with equal lengths.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Int(a), Object::Int(b)) => a == b,
            (Object::Real(a), Object::Real(b)) => a == b,
            (Object::Bool(a), Object::Bool(b)) => a == b,
            (Object::Symbol(a), Object::Symbol(b)) => a == b,
            (Object::List(a), Object::List(b)) => a == b,
            (Object::Binding(a), Object::Binding(b)) => a.borrow().symbol == b.borrow().symbol,
            (Object::Closure(_), _) | (_, Object::Closure(_)) => false,
            _ => false,
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Int(n) => write!(f, "Int({n})"),
            Object::Real(r) => write!(f, "Real({r:?})"),
            Object::Bool(b) => write!(f, "Bool({b})"),
            Object::Symbol(s) => write!(f, "Symbol({s})"),
            Object::Error(e) => write!(f, "Error({e:?})"),
            Object::Binding(b) => {
                let b = b.borrow();
                write!(f, "Binding({} = {:?})", b.symbol, b.value)
            }
            Object::Closure(c) => write!(f, "{c:?}"),
            Object::List(list) => write!(f, "List{list:?}"),
        }
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Closure::Primitive(p) => write!(f, "Primitive({})", p.name),
            // Captured environment omitted: it usually contains this closure
            Closure::Lambda(l) => write!(
                f,
                "Lambda(params={:?}, rest={:?}, body={:?})",
                l.params, l.rest, l.body
            ),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Int(n) => write!(f, "{n}"),
            Object::Real(r) => write!(f, "{r:?}"),
            Object::Bool(b) => write!(f, "{b}"),
            Object::Symbol(s) | Object::Error(s) => write!(f, "{s}"),
            Object::Binding(b) => write!(f, "{}", b.borrow().symbol),
            Object::Closure(_) => write!(f, "(func)"),
            Object::List(list) => write!(f, "{list}"),
        }
    }
}

// From trait implementations for Object - enables .into() conversion

impl From<i64> for Object {
    fn from(n: i64) -> Self {
        Object::Int(n)
    }
}

impl From<i32> for Object {
    fn from(n: i32) -> Self {
        Object::Int(n.into())
    }
}

/// Literal real: no demotion
impl From<f64> for Object {
    fn from(r: f64) -> Self {
        Object::Real(r)
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Object::Bool(b)
    }
}

impl From<&str> for Object {
    fn from(s: &str) -> Self {
        Object::symbol(s)
    }
}

impl From<List> for Object {
    fn from(list: List) -> Self {
        Object::List(list)
    }
}

impl<T: Into<Object>> From<Vec<T>> for Object {
    fn from(v: Vec<T>) -> Self {
        Object::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Object>, const N: usize> From<[T; N]> for Object {
    fn from(arr: [T; N]) -> Self {
        Object::List(arr.into_iter().map(Into::into).collect())
    }
}

/// Helper function for creating symbols in mixed lists
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn sym<S: AsRef<str>>(name: S) -> Object {
    Object::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating objects from Rust literals
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn val<T: Into<Object>>(value: T) -> Object {
    value.into()
}

/// Helper function for creating the empty list
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn nil() -> Object {
    Object::List(List::new())
}
