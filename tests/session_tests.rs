//! End-to-end sessions driven through the public `Interpreter` API, one input line
//! at a time the way the REPL feeds it.

use mgclisp::evaluator::Interpreter;
use mgclisp::parser::ParseConfig;
use mgclisp::{Arity, Error, Object};

/// Expected outcome of one input line
#[derive(Debug, Clone, Copy)]
enum Expect {
    Prints(&'static str),        // Result renders as this text
    SpecificError(&'static str), // Result is an error object containing this text
}
use Expect::*;

fn run_session(name: &str, lines: &[(&str, Expect)]) {
    let interp = Interpreter::new();
    for (i, (input, expected)) in lines.iter().enumerate() {
        let result = interp.eval_str(input);
        let test_id = format!("{name} line #{}", i + 1);
        match expected {
            Prints(text) => {
                assert!(!result.is_error(), "{test_id}: '{input}' failed with {result}");
                assert_eq!(result.to_string(), *text, "{test_id}: '{input}'");
            }
            SpecificError(text) => {
                assert!(result.is_error(), "{test_id}: '{input}' expected error, got {result}");
                let msg = result.to_string();
                assert!(msg.contains(text), "{test_id}: error should contain '{text}', got: {msg}");
            }
        }
    }
}

#[test]
fn factorial_session() {
    run_session(
        "factorial",
        &[
            (
                "(define fact (lambda (n) (if (< n 2) 1 (* n (fact (- n 1))))))",
                Prints("fact"),
            ),
            ("(fact 5)", Prints("120")),
            ("(fact 0)", Prints("1")),
            ("fact", Prints("(func)")),
        ],
    );
}

#[test]
fn list_session() {
    run_session(
        "lists",
        &[
            ("(define xs (' (1 2 3)))", Prints("xs")),
            ("(car xs)", Prints("1")),
            ("(cdr xs)", Prints("(2 3)")),
            ("(push 0 xs)", Prints("(0 1 2 3)")),
            ("xs", Prints("(1 2 3)")),
            ("(car (cdr (cdr (cdr xs))))", SpecificError("IndexError")),
            ("(eq xs (' (1 2 3)))", Prints("true")),
            ("(1 (+ 1 1) (' x))", Prints("(1 2 x)")),
        ],
    );
}

#[test]
fn error_recovery_session() {
    run_session(
        "errors",
        &[
            ("nope", SpecificError("nope Not Found")),
            ("(+ 1 (", SpecificError("Mismatched Parentheses")),
            ("(car 1 2)", SpecificError("ArityError")),
            ("(+ 1 true)", SpecificError("TypeError")),
            ("(/ 4 0)", SpecificError("division by zero")),
            ("(let ((a)) a)", SpecificError("SyntaxError")),
            // The session is still usable afterwards
            ("(+ 1 2)", Prints("3")),
            ("(/ 7 2)", Prints("3.5")),
            ("2.0", Prints("2.0")),
        ],
    );
}

#[test]
fn do_short_circuit_session() {
    run_session(
        "do",
        &[
            ("(do (define x 1) (car x) (define y 2))", SpecificError("TypeError")),
            ("x", Prints("1")),
            ("y", SpecificError("y Not Found")),
            ("(do (define z 3) (+ z 1))", Prints("4")),
        ],
    );
}

#[test]
fn cond_short_circuit_session() {
    run_session(
        "cond",
        &[
            ("(cond (define a 1) (car a) (define b 2))", SpecificError("TypeError")),
            ("a", Prints("1")),
            ("b", SpecificError("b Not Found")),
        ],
    );
}

#[test]
fn deep_recursion_session() {
    run_session(
        "recursion",
        &[
            (
                "(define sum (lambda (n) (if (< n 1) 0 (+ n (sum (- n 1))))))",
                Prints("sum"),
            ),
            ("(sum 90)", Prints("4095")),
            ("(sum 1000)", Prints("500500")),
            ("(define spin (lambda (n) (spin n)))", Prints("spin")),
            ("(spin 0)", SpecificError("depth limit exceeded")),
            ("(sum 10)", Prints("55")),
        ],
    );
}

#[test]
fn closure_session() {
    run_session(
        "closures",
        &[
            ("(define addN (lambda (x) (+ x n)))", Prints("addN")),
            ("(define n 10)", Prints("n")),
            ("(addN 5)", Prints("15")),
            ("(set n 20)", Prints("n")),
            ("(addN 5)", Prints("25")),
            ("(define rest-of (lambda (a .. more) more))", Prints("rest-of")),
            ("(rest-of 1 2 3)", Prints("(2 3)")),
            ("(let ((n 1)) (addN 1))", Prints("21")),
        ],
    );
}

#[test]
fn host_registered_primitive() {
    let interp = Interpreter::new();
    interp
        .environment()
        .register_primitive("double", Arity::Exact(1), |args| {
            match args.nth(0)? {
                Object::Int(n) => Ok(Object::Int(n * 2)),
                other => Err(Error::TypeError(format!("cannot double {other}"))),
            }
        });
    assert_eq!(interp.eval_str("(double 21)").to_string(), "42");
    assert_eq!(
        interp.eval_str("(double (' a))").to_string(),
        "TypeError: cannot double a"
    );
    assert_eq!(
        interp.eval_str("(double)").to_string(),
        "ArityError: double: expected 1 arguments, got 0"
    );
}

#[test]
fn program_evaluation() {
    let interp = Interpreter::with_config(ParseConfig::default());
    let results = interp
        .eval_program("(define sq (lambda (x) (* x x)))\n(sq 3)\n(sq (sq 2))")
        .expect("program parses");
    let rendered: Vec<String> = results.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, ["sq", "9", "16"]);
}
