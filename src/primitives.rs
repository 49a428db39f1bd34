//! Native procedures installed in the global environment.
//!
//! Primitives receive their arguments already evaluated. Unlike special forms they
//! are ordinary values: the global environment binds each name to a
//! [`Closure::Primitive`](crate::object::Closure::Primitive), so they can be passed
//! around, captured and shadowed like any lambda.
//!
//! Operands are type-checked explicitly. An error object reaching an arithmetic or
//! comparison primitive is reported as a `TypeError` rather than used as a number.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::list::List;
use crate::object::Object;
use crate::{Arity, Error};

/// Definition of a primitive procedure
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveOp {
    pub name: &'static str,
    pub arity: Arity,
    pub func: fn(&List) -> Result<Object, Error>,
}

//
// Primitive implementations
//

/// Longest operand text quoted in a type error
const OPERAND_PREVIEW: usize = 40;

/// Type and rendered text of an operand for error messages. Long text is cut short
/// so that errors fed back into primitives do not grow with every level.
fn describe(arg: &Object) -> String {
    let text = arg.to_string();
    match text.char_indices().nth(OPERAND_PREVIEW) {
        Some((cut, _)) => format!("{} '{}...'", arg.type_name(), &text[..cut]),
        None => format!("{} '{text}'", arg.type_name()),
    }
}

fn numeric_operands(args: &List) -> Result<Vec<f64>, Error> {
    args.iter()
        .map(|arg| {
            arg.as_number()
                .ok_or_else(|| Error::TypeError(format!("expected number, got {}", describe(arg))))
        })
        .collect()
}

// Left fold in f64 starting from the first operand; whole results demote to Int
macro_rules! arithmetic_op {
    ($name:ident, $op:tt) => {
        fn $name(args: &List) -> Result<Object, Error> {
            let operands = numeric_operands(args)?;
            let (first, rest) = operands
                .split_first()
                .ok_or_else(|| Error::arity_error(Arity::AtLeast(1), 0))?;
            Ok(Object::real(rest.iter().fold(*first, |acc, x| acc $op x)))
        }
    };
}

arithmetic_op!(builtin_add, +);
arithmetic_op!(builtin_sub, -);
arithmetic_op!(builtin_mul, *);

fn builtin_div(args: &List) -> Result<Object, Error> {
    let operands = numeric_operands(args)?;
    let (first, rest) = operands
        .split_first()
        .ok_or_else(|| Error::arity_error(Arity::AtLeast(1), 0))?;
    if rest.contains(&0.0) {
        return Err(Error::EvalError("division by zero".into()));
    }
    Ok(Object::real(rest.iter().fold(*first, |acc, x| acc / x)))
}

fn comparable_pair(args: &List) -> Result<(&Object, &Object), Error> {
    let pair = (args.nth(0)?, args.nth(1)?);
    for operand in [pair.0, pair.1] {
        if operand.is_error() {
            return Err(Error::TypeError(format!(
                "cannot compare {}",
                describe(operand)
            )));
        }
    }
    Ok(pair)
}

// Numbers compare numerically, anything else by rendered text
macro_rules! ordering_op {
    ($name:ident, $op:tt) => {
        fn $name(args: &List) -> Result<Object, Error> {
            let (a, b) = comparable_pair(args)?;
            let result = match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x $op y,
                _ => a.to_string() $op b.to_string(),
            };
            Ok(Object::Bool(result))
        }
    };
}

ordering_op!(builtin_lt, <);
ordering_op!(builtin_gt, >);

fn builtin_eq(args: &List) -> Result<Object, Error> {
    Ok(Object::Bool(args.nth(0)? == args.nth(1)?))
}

fn builtin_print(args: &List) -> Result<Object, Error> {
    println!("{args}");
    Ok(Object::List(List::new()))
}

fn list_operand<'a>(arg: &'a Object, op: &str) -> Result<&'a List, Error> {
    match arg {
        Object::List(list) => Ok(list),
        other => Err(Error::TypeError(format!(
            "{op} requires a list, got {}",
            describe(other)
        ))),
    }
}

fn builtin_car(args: &List) -> Result<Object, Error> {
    list_operand(args.nth(0)?, "car")?.nth(0).cloned()
}

fn builtin_cdr(args: &List) -> Result<Object, Error> {
    Ok(Object::List(list_operand(args.nth(0)?, "cdr")?.rest()))
}

/// `(push value list)`: new list with `value` at the head
fn builtin_push(args: &List) -> Result<Object, Error> {
    let value = args.nth(0)?;
    let mut list = list_operand(args.nth(1)?, "push")?.copy();
    list.push(value.clone());
    Ok(Object::List(list))
}

/// Global registry, in installation order
static PRIMITIVE_OPS: &[PrimitiveOp] = &[
    PrimitiveOp {
        name: "+",
        arity: Arity::AtLeast(1),
        func: builtin_add,
    },
    PrimitiveOp {
        name: "-",
        arity: Arity::AtLeast(1),
        func: builtin_sub,
    },
    PrimitiveOp {
        name: "/",
        arity: Arity::AtLeast(1),
        func: builtin_div,
    },
    PrimitiveOp {
        name: "*",
        arity: Arity::AtLeast(1),
        func: builtin_mul,
    },
    PrimitiveOp {
        name: "<",
        arity: Arity::Exact(2),
        func: builtin_lt,
    },
    PrimitiveOp {
        name: "eq",
        arity: Arity::Exact(2),
        func: builtin_eq,
    },
    PrimitiveOp {
        name: "print",
        arity: Arity::Any,
        func: builtin_print,
    },
    PrimitiveOp {
        name: ">",
        arity: Arity::Exact(2),
        func: builtin_gt,
    },
    PrimitiveOp {
        name: "car",
        arity: Arity::Exact(1),
        func: builtin_car,
    },
    PrimitiveOp {
        name: "cdr",
        arity: Arity::Exact(1),
        func: builtin_cdr,
    },
    PrimitiveOp {
        name: "push",
        arity: Arity::Exact(2),
        func: builtin_push,
    },
];

/// Lazy static map from name to PrimitiveOp (private - use find_primitive_op)
static PRIMITIVE_INDEX: LazyLock<HashMap<&'static str, &'static PrimitiveOp>> =
    LazyLock::new(|| PRIMITIVE_OPS.iter().map(|op| (op.name, op)).collect());

pub fn get_primitive_ops() -> &'static [PrimitiveOp] {
    PRIMITIVE_OPS
}

pub fn find_primitive_op(name: &str) -> Option<&'static PrimitiveOp> {
    PRIMITIVE_INDEX.get(name).copied()
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::object::{nil, sym, val};

    fn call(name: &str, args: Vec<Object>) -> Result<Object, Error> {
        let op = find_primitive_op(name).unwrap();
        let args: List = args.into_iter().collect();
        op.arity.validate(args.len())?;
        (op.func)(&args)
    }

    #[test]
    fn test_registry_order() {
        let names: Vec<_> = get_primitive_ops().iter().map(|op| op.name).collect();
        assert_eq!(
            names,
            ["+", "-", "/", "*", "<", "eq", "print", ">", "car", "cdr", "push"]
        );
        assert!(find_primitive_op("define").is_none());
    }

    #[test]
    fn test_primitives_data_driven() {
        type TestCase = (&'static str, Vec<Object>, Result<Object, Error>);
        let test_cases: Vec<TestCase> = vec![
            // Arithmetic
            ("+", vec![val(1), val(2), val(3)], Ok(val(6))),
            ("+", vec![val(7)], Ok(val(7))),
            ("+", vec![val(1.5), val(1.5)], Ok(val(3))),
            ("+", vec![val(1), val(0.25)], Ok(val(1.25))),
            ("-", vec![val(10), val(3), val(2)], Ok(val(5))),
            ("-", vec![val(5)], Ok(val(5))),
            ("-", vec![val(1), val(3)], Ok(val(-2))),
            ("*", vec![val(2), val(3), val(4)], Ok(val(24))),
            ("/", vec![val(9), val(2)], Ok(val(4.5))),
            ("/", vec![val(8), val(2), val(2)], Ok(val(2))),
            (
                "/",
                vec![val(1), val(0)],
                Err(Error::EvalError("division by zero".into())),
            ),
            (
                "+",
                vec![val(1), sym("a")],
                Err(Error::TypeError("expected number, got symbol 'a'".into())),
            ),
            (
                "*",
                vec![Object::error("x Not Found"), val(2)],
                Err(Error::TypeError(
                    "expected number, got error 'x Not Found'".into(),
                )),
            ),
            ("+", vec![], Err(Error::arity_error(Arity::AtLeast(1), 0))),
            // Comparison
            ("<", vec![val(1), val(2)], Ok(val(true))),
            ("<", vec![val(2), val(1)], Ok(val(false))),
            ("<", vec![val(1.5), val(2)], Ok(val(true))),
            (">", vec![val(3), val(2)], Ok(val(true))),
            (">", vec![val(2), val(2)], Ok(val(false))),
            ("<", vec![sym("abc"), sym("abd")], Ok(val(true))),
            (">", vec![sym("b"), sym("a")], Ok(val(true))),
            (
                "<",
                vec![Object::error("boom"), val(1)],
                Err(Error::TypeError("cannot compare error 'boom'".into())),
            ),
            ("<", vec![val(1)], Err(Error::arity_error(Arity::Exact(2), 1))),
            // Equality
            ("eq", vec![val(1), val(1)], Ok(val(true))),
            ("eq", vec![val(1), val(1.0)], Ok(val(false))),
            ("eq", vec![val([1, 2]), val([1, 2])], Ok(val(true))),
            ("eq", vec![nil(), nil()], Ok(val(true))),
            ("eq", vec![val([1]), nil()], Ok(val(false))),
            // List operations
            ("car", vec![val([1, 2, 3])], Ok(val(1))),
            (
                "car",
                vec![nil()],
                Err(Error::IndexError { index: 0, len: 0 }),
            ),
            (
                "car",
                vec![val(5)],
                Err(Error::TypeError("car requires a list, got int '5'".into())),
            ),
            ("cdr", vec![val([1, 2, 3])], Ok(val([2, 3]))),
            ("cdr", vec![val([1])], Ok(nil())),
            ("cdr", vec![nil()], Ok(nil())),
            ("push", vec![val(0), val([1, 2])], Ok(val([0, 1, 2]))),
            ("push", vec![val([1]), nil()], Ok(val(vec![val([1])]))),
            (
                "push",
                vec![val(1), val(2)],
                Err(Error::TypeError("push requires a list, got int '2'".into())),
            ),
            // print returns the empty list
            ("print", vec![val(1), sym("two")], Ok(nil())),
        ];

        for (i, (name, args, expected)) in test_cases.into_iter().enumerate() {
            let display = format!("({name} {})", List::from_iter(args.iter().cloned()));
            let actual = call(name, args);
            match (&actual, &expected) {
                // Errors never compare equal as objects, so compare the Rust-level errors
                (Ok(a), Ok(e)) => assert_eq!(a, e, "case #{} {display}", i + 1),
                (Err(a), Err(e)) => assert_eq!(a, e, "case #{} {display}", i + 1),
                _ => panic!(
                    "case #{} {display}: expected {expected:?}, got {actual:?}",
                    i + 1
                ),
            }
        }
    }

    #[test]
    fn test_push_leaves_operand_untouched() {
        let original = val([1, 2]);
        let pushed = call("push", vec![val(0), original.clone()]).unwrap();
        assert_eq!(pushed, val([0, 1, 2]));
        assert_eq!(original, val([1, 2]));
    }

    #[test]
    fn test_operand_text_is_truncated() {
        let long = val((0..30).collect::<Vec<i64>>());
        let err = call("+", vec![val(1), long]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: expected number, got list '(0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 1...'"
        );

        // An error fed through many primitives keeps a bounded message
        let mut result = Object::error("x Not Found");
        for _ in 0..50 {
            result = call("+", vec![val(1), result]).unwrap_err().into();
        }
        let message = result.to_string();
        assert!(message.len() < 100, "message grew to {} bytes", message.len());
        assert!(message.starts_with("TypeError: expected number, got error 'TypeError: "));

        let err = call("car", vec![sym("x".repeat(100).as_str())]).unwrap_err();
        assert!(err.to_string().ends_with("...'"), "got {err}");
    }

    #[test]
    fn test_real_results_keep_fraction() {
        let result = call("/", vec![val(1), val(4)]).unwrap();
        assert!(matches!(result, Object::Real(r) if r == 0.25));
        let result = call("*", vec![val(0.5), val(4)]).unwrap();
        assert!(matches!(result, Object::Int(2)));
    }
}
