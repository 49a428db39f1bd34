use mgclisp::evaluator::Interpreter;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::panic;
use std::path::{Path, PathBuf};
use std::process;

struct Options {
    trace: bool,
    file: Option<PathBuf>,
}

fn parse_options() -> Result<Options, String> {
    let mut args = pico_args::Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        println!("Usage: mgclisp [options] [FILE]");
        println!("Options:");
        println!("  -h, --help: Print this help message");
        println!("  -t, --trace: Log every evaluation step");
        println!("Without FILE an interactive session is started.");
        process::exit(0);
    }

    let trace = args.contains(["-t", "--trace"]);
    let file = args
        .opt_free_from_str::<PathBuf>()
        .map_err(|e| e.to_string())?;

    let rest = args.finish();
    if !rest.is_empty() {
        return Err(format!("unexpected arguments: {rest:?}"));
    }

    Ok(Options { trace, file })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let options = match parse_options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(2);
        }
    };

    let result = panic::catch_unwind(|| match &options.file {
        Some(path) => run_file(path, options.trace),
        None => run_repl(options.trace),
    });

    match result {
        Ok(Ok(())) => {}
        Ok(Err(msg)) => {
            eprintln!("Error: {msg}");
            process::exit(1);
        }
        Err(panic_info) => {
            eprintln!("The interpreter encountered an unexpected error and must exit.");

            if let Some(msg) = panic_info.downcast_ref::<&str>() {
                eprintln!("Error: {msg}");
            } else if let Some(msg) = panic_info.downcast_ref::<String>() {
                eprintln!("Error: {msg}");
            } else {
                eprintln!("Error: Unknown panic occurred");
            }

            process::exit(1);
        }
    }
}

fn run_file(path: &Path, trace: bool) -> Result<(), String> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;

    let mut interp = Interpreter::new();
    interp.set_trace(trace);
    log::debug!("evaluating {}", path.display());

    let results = interp.eval_program(&source).map_err(|e| e.to_string())?;
    for result in results {
        println!("{result}");
    }
    Ok(())
}

fn run_repl(trace: bool) -> Result<(), String> {
    println!("mgclisp - a small Lisp evaluator");
    println!("Enter expressions like: (+ 1 2)");
    println!("Type .help for more commands, or quit to exit.");
    println!();

    let mut rl = DefaultEditor::new().map_err(|e| format!("could not initialize REPL: {e}"))?;
    let mut interp = Interpreter::new();
    interp.set_trace(trace);
    let mut counter = 0usize;

    loop {
        match rl.readline(&format!("mgclisp({counter})> ")) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    ".help" => {
                        print_help();
                        continue;
                    }
                    ".env" => {
                        print_environment(&interp);
                        continue;
                    }
                    ".trace" => {
                        let on = !interp.trace();
                        interp.set_trace(on);
                        println!("trace {}", if on { "on" } else { "off" });
                        continue;
                    }
                    "quit" | ":quit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                // Errors are values: they are printed like any other result
                println!("{}", interp.eval_str(line));
                counter += 1;
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                return Err(format!("{err:?}"));
            }
        }
    }
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  .help   - Show this help message");
    println!("  .env    - Show current environment bindings");
    println!("  .trace  - Toggle evaluation tracing");
    println!("  quit    - Exit the interpreter");
    println!("  Ctrl+D  - Exit the interpreter");
    println!();
    println!("Special forms: define if lambda quote ' set do cond let");
    println!("Primitives:    + - / * < eq print > car cdr push");
    println!();
    println!("Examples:");
    println!("  (define fact (lambda (n) (if (< n 2) 1 (* n (fact (- n 1))))))");
    println!("  (fact 5)");
    println!("  (let ((a 1) (b 2)) (+ a b))");
    println!("  (' (1 2 3))");
    println!();
}

fn print_environment(interp: &Interpreter) {
    let bindings = interp.environment().bindings();

    if bindings.is_empty() {
        println!("Environment is empty.");
        return;
    }

    println!("Environment bindings ({} total):", bindings.len());
    for (name, value) in bindings {
        println!("  {name} = {value}");
    }
}
