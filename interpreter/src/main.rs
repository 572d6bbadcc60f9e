use std::cell::RefCell;
use std::env;
use std::fs;
use std::io;
use std::io::{BufRead, Write};
use std::process::exit;
use std::rc::Rc;

use lox_core::{Scanner, Token};

use interpreter::error::Error;
use interpreter::interpreter::Interpreter;
use interpreter::parser::Parser;
use interpreter::resolver::Resolver;

enum RunError {
    Static(Vec<Error>),
    Runtime(Error),
}

fn main() {
    let args: Vec<String> = env::args().collect();
    match args.len() {
        1 => {
            if let Err(err) = run_prompt() {
                eprintln!("{}", err);
                exit(74);
            }
        }
        2 => run_file(&args[1]),
        _ => {
            eprintln!("Usage: lox [script]");
            exit(64);
        }
    }
}

fn run_file(path: &str) {
    let src = match fs::read_to_string(path) {
        Ok(src) => src,
        Err(err) => {
            eprintln!("Could not read '{}': {}", path, err);
            exit(74);
        }
    };

    let stdout = Rc::new(RefCell::new(io::stdout()));
    let mut interpreter = Interpreter::new(stdout);
    let mut scanner = Scanner::new();

    match run(&mut scanner, &mut interpreter, &src) {
        Ok(()) => {}
        Err(RunError::Static(errs)) => {
            for err in errs {
                eprintln!("{}", err);
            }
            exit(65);
        }
        Err(RunError::Runtime(err)) => {
            eprintln!("{}", err);
            exit(70);
        }
    }
}

fn run_prompt() -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = Rc::new(RefCell::new(io::stdout()));
    let mut interpreter = Interpreter::new(stdout);

    // One scanner for the whole session, so token indices stay unique and
    // functions defined on earlier lines keep their resolved variables
    let mut scanner = Scanner::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        let nbytes = stdin.lock().read_line(&mut input)?;
        if nbytes == 0 {
            return Ok(());
        }

        // Errors don't end an interactive session
        match run(&mut scanner, &mut interpreter, &input) {
            Ok(()) => {}
            Err(RunError::Static(errs)) => {
                for err in errs {
                    eprintln!("{}", err);
                }
            }
            Err(RunError::Runtime(err)) => eprintln!("{}", err),
        }
    }
}

fn run(scanner: &mut Scanner, interpreter: &mut Interpreter, src: &str) -> Result<(), RunError> {
    let mut stream = scanner.scan_tokens(src);
    let tokens: Vec<Token> = stream.by_ref().collect();
    if let Some(err) = stream.error() {
        return Err(RunError::Static(vec![Error::from(err.clone())]));
    }

    let parsed = Parser::new(&tokens).parse().map_err(RunError::Static)?;
    let resolved = Resolver::new(interpreter)
        .resolve(parsed)
        .map_err(RunError::Static)?;
    interpreter.interpret(&resolved).map_err(RunError::Runtime)
}
