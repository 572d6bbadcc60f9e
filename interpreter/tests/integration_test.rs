use std::cell::RefCell;
use std::fs::File;
use std::io::Read;
use std::rc::Rc;
use std::str;

use interpreter::interpreter::Interpreter;
use interpreter::parser::Parser;
use interpreter::resolver::Resolver;
use lox_core::{Scanner, Token};
use walkdir::WalkDir;

#[test]
fn test_programs() {
    let source_files = WalkDir::new("../tests")
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| matches!(entry.path().extension(), Some(extension) if extension == "lox"))
        .filter_map(|entry| {
            let mut exp_filename = entry.file_name().to_os_string();
            exp_filename.push(".out");

            let parent = entry.path().parent().unwrap();
            let exp_filepath = parent.join(exp_filename);

            if exp_filepath.exists() {
                Some((entry, exp_filepath))
            } else {
                None
            }
        });

    let mut total = 0;

    for (src_path, exp_path) in source_files {
        println!("🕑 Running test: {}", src_path.path().display());

        let mut src_content = String::new();
        let mut exp_content = String::new();

        File::open(src_path.path())
            .unwrap()
            .read_to_string(&mut src_content)
            .unwrap();
        File::open(exp_path)
            .unwrap()
            .read_to_string(&mut exp_content)
            .unwrap();

        let mut scanner = Scanner::new();
        let mut stream = scanner.scan_tokens(&src_content);
        let tokens: Vec<Token> = stream.by_ref().collect();
        assert_eq!(stream.error(), None);

        let parsed = Parser::new(&tokens).parse().unwrap();

        let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let mut interpreter = Interpreter::new(output.clone());
        let resolved = Resolver::new(&mut interpreter).resolve(parsed).unwrap();

        match interpreter.interpret(&resolved) {
            Ok(()) => {
                assert_eq!(exp_content, str::from_utf8(&output.borrow()).unwrap())
            }
            Err(err) => {
                assert_eq!(exp_content, err.to_string())
            }
        }

        println!("✅ Test complete: {}", src_path.path().display());
        total += 1;
    }

    println!("✅ Ran {} tests", total)
}
