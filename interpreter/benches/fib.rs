use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use criterion::{criterion_group, criterion_main, Criterion};
use interpreter::interpreter::Interpreter;
use interpreter::parser::Parser;
use interpreter::resolver::Resolver;
use lox_core::{Scanner, Token};

fn benchmark(c: &mut Criterion) {
    let src = include_str!("../../data/fib.lox");

    c.bench_function("fib 20", |b| {
        b.iter(|| {
            let mut scanner = Scanner::new();
            let tokens: Vec<Token> = scanner.scan_tokens(src).collect();
            let parsed = Parser::new(&tokens).parse().unwrap();

            let sink = Rc::new(RefCell::new(io::sink()));
            let mut interpreter = Interpreter::new(sink);
            let resolved = Resolver::new(&mut interpreter).resolve(parsed).unwrap();
            interpreter.interpret(&resolved).unwrap();
        })
    });
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
