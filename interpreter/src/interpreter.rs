use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use lox_core::{Literal, Token, TokenIndex, Type};

use crate::ast::{Expr, ExprVisitor, FunctionKind, Stmt, StmtVisitor};
use crate::callable::{BoxedFunction, Callable, Class, Function, Instance, Method, Native};
use crate::env::Environment;
use crate::error::Error;
use crate::resolver::ResolvedStmts;
use crate::value::Value;

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    env: Rc<RefCell<Environment>>,

    // Scope distances computed by the resolver, keyed by token position.
    // A token that is absent here refers to a global.
    locals: HashMap<TokenIndex, usize>,
    stdout: Rc<RefCell<dyn Write>>,
}

impl Interpreter {
    pub fn new(stdout: Rc<RefCell<dyn Write>>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        let clock: BoxedFunction = Box::new(|_| {
            let since_epoch = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default();
            Ok(Value::Num(since_epoch.as_secs_f64()))
        });
        let clock_callable = Native::new(clock, String::from("clock"), 0);
        globals
            .borrow_mut()
            .define("clock", Value::Callable(Rc::new(clock_callable)));

        Interpreter {
            env: globals.clone(),
            globals,
            locals: HashMap::new(),
            stdout,
        }
    }

    pub fn interpret(&mut self, resolved: &ResolvedStmts) -> Result<(), Error> {
        for stmt in &resolved.0 {
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    pub(crate) fn execute_block_with_env(
        &mut self,
        stmts: &[Stmt],
        env: Rc<RefCell<Environment>>,
    ) -> Result<(), Error> {
        let current = self.env.clone();
        self.env = env;
        for stmt in stmts {
            if let err @ Err(_) = self.visit_stmt(stmt) {
                self.env = current;
                return err;
            }
        }
        self.env = current;
        Ok(())
    }

    pub(crate) fn resolve(&mut self, token: &Token, depth: usize) {
        self.locals.insert(token.idx, depth);
    }

    fn lookup_variable(&self, token: &Token) -> Result<Value, Error> {
        let value = match self.locals.get(&token.idx) {
            Some(dist) => RefCell::borrow(&self.env).get_at(*dist, &token.lexeme),
            None => self.globals.borrow().get(&token.lexeme),
        };

        value.ok_or_else(|| {
            Error::runtime_error(token, &format!("Undefined variable '{}'.", token.lexeme))
        })
    }
}

impl ExprVisitor for Interpreter {
    type Item = Value;

    fn visit_assign(&mut self, name: &Token, value: &Expr) -> Result<Value, Error> {
        let value = self.visit_expr(value)?;

        match self.locals.get(&name.idx) {
            Some(dist) => {
                if RefCell::borrow_mut(&self.env)
                    .assign_at(*dist, &name.lexeme, value.clone())
                    .is_err()
                {
                    return Err(Error::runtime_error(
                        name,
                        &format!("Undefined variable '{}'.", name.lexeme),
                    ));
                }
            }

            // Assigning a global that doesn't exist yet creates it; only
            // reading an unbound global is an error.
            None => RefCell::borrow_mut(&self.globals).define(&name.lexeme, value.clone()),
        }

        Ok(value)
    }

    fn visit_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value, Error> {
        let left = self.visit_expr(left)?;
        let right = self.visit_expr(right)?;

        match operator.ty {
            Type::Minus => match (left, right) {
                (Value::Num(left), Value::Num(right)) => Ok(Value::Num(left - right)),
                _ => Err(Error::runtime_error(operator, "Operands must be numbers.")),
            },
            Type::Plus => match (left, right) {
                (Value::Num(left), Value::Num(right)) => Ok(Value::Num(left + right)),

                // If either operand is a string, the other is coerced to
                // its textual form and the result is the concatenation
                (Value::Str(left), right) => Ok(Value::from(format!("{}{}", left, right))),
                (left, Value::Str(right)) => Ok(Value::from(format!("{}{}", left, right))),
                _ => Err(Error::runtime_error(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },

            // Division by zero is not a language error, the result follows
            // the underlying float
            Type::Slash => match (left, right) {
                (Value::Num(left), Value::Num(right)) => Ok(Value::Num(left / right)),
                _ => Err(Error::runtime_error(operator, "Operands must be numbers.")),
            },
            Type::Star => match (left, right) {
                (Value::Num(left), Value::Num(right)) => Ok(Value::Num(left * right)),
                _ => Err(Error::runtime_error(operator, "Operands must be numbers.")),
            },
            Type::Greater => match (left, right) {
                (Value::Num(left), Value::Num(right)) => Ok(Value::Bool(left > right)),
                _ => Err(Error::runtime_error(operator, "Operands must be numbers.")),
            },
            Type::GreaterEqual => match (left, right) {
                (Value::Num(left), Value::Num(right)) => Ok(Value::Bool(left >= right)),
                _ => Err(Error::runtime_error(operator, "Operands must be numbers.")),
            },
            Type::Less => match (left, right) {
                (Value::Num(left), Value::Num(right)) => Ok(Value::Bool(left < right)),
                _ => Err(Error::runtime_error(operator, "Operands must be numbers.")),
            },
            Type::LessEqual => match (left, right) {
                (Value::Num(left), Value::Num(right)) => Ok(Value::Bool(left <= right)),
                _ => Err(Error::runtime_error(operator, "Operands must be numbers.")),
            },
            Type::EqualEqual => Ok(Value::Bool(left == right)),
            Type::BangEqual => Ok(Value::Bool(left != right)),
            _ => Err(Error::runtime_error(operator, "Invalid operator.")),
        }
    }

    fn visit_call(&mut self, callee: &Expr, paren: &Token, args: &[Expr]) -> Result<Value, Error> {
        let callee = self.visit_expr(callee)?;
        let mut evaluated_args = Vec::new();
        for arg in args {
            evaluated_args.push(self.visit_expr(arg)?);
        }

        match callee {
            Value::Callable(func) => {
                if func.arity() == evaluated_args.len() {
                    func.execute(self, &evaluated_args)
                } else {
                    Err(Error::runtime_error(
                        paren,
                        &format!(
                            "Expected {} arguments but got {}.",
                            func.arity(),
                            evaluated_args.len()
                        ),
                    ))
                }
            }
            _ => Err(Error::runtime_error(
                paren,
                "Can only call functions and classes.",
            )),
        }
    }

    fn visit_get(&mut self, object: &Expr, name: &Token) -> Result<Value, Error> {
        if let Value::Instance(instance) = self.visit_expr(object)? {
            match Instance::get(&instance, &name.lexeme) {
                Some(val) => Ok(val),
                None => Err(Error::runtime_error(
                    name,
                    &format!("Undefined property '{}'.", name.lexeme),
                )),
            }
        } else {
            Err(Error::runtime_error(
                name,
                "Only instances have properties.",
            ))
        }
    }

    fn visit_set(&mut self, object: &Expr, name: &Token, value: &Expr) -> Result<Value, Error> {
        match self.visit_expr(object)? {
            Value::Instance(instance) => {
                let value = self.visit_expr(value)?;
                Ok(RefCell::borrow_mut(&instance).set(&name.lexeme, value))
            }
            _ => Err(Error::runtime_error(name, "Only instances have fields.")),
        }
    }

    fn visit_this(&mut self, keyword: &Token) -> Result<Value, Error> {
        self.lookup_variable(keyword)
    }

    fn visit_super(&mut self, keyword: &Token, method: &Token) -> Result<Value, Error> {
        // `super` was resolved like a variable; `this` lives one frame
        // nearer to the method body
        let dist = match self.locals.get(&keyword.idx) {
            Some(dist) => *dist,
            None => {
                return Err(Error::runtime_error(
                    keyword,
                    "Can't use 'super' outside of a class.",
                ))
            }
        };

        let superclass = match RefCell::borrow(&self.env).get_at(dist, "super") {
            Some(Value::Callable(callable)) => callable.as_class(),
            _ => None,
        };
        let superclass = match superclass {
            Some(class) => class,
            None => {
                return Err(Error::runtime_error(
                    keyword,
                    "Can't use 'super' in a class with no superclass.",
                ))
            }
        };

        let receiver = match RefCell::borrow(&self.env).get_at(dist - 1, "this") {
            Some(Value::Instance(instance)) => instance,
            _ => {
                return Err(Error::runtime_error(
                    keyword,
                    "Can't use 'super' outside of a method.",
                ))
            }
        };

        match superclass.find_method(&method.lexeme) {
            Some(function) => Ok(Value::Callable(Rc::new(Method::bind(function, receiver)))),
            None => Err(Error::runtime_error(
                method,
                &format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    fn visit_grouping(&mut self, expression: &Expr) -> Result<Value, Error> {
        self.visit_expr(expression)
    }

    fn visit_literal(&mut self, value: &Literal) -> Result<Value, Error> {
        Ok(Value::from(value.clone()))
    }

    fn visit_logical(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Value, Error> {
        let left = self.visit_expr(left)?;

        // The deciding operand is returned as-is; the other side is only
        // evaluated when the left one doesn't settle the answer.
        match operator.ty {
            Type::Or if left.is_truthy() => Ok(left),
            Type::Or => self.visit_expr(right),
            _ if !left.is_truthy() => Ok(left),
            _ => self.visit_expr(right),
        }
    }

    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value, Error> {
        let right = self.visit_expr(right)?;
        match (operator.ty, right) {
            (Type::Minus, Value::Num(val)) => Ok(Value::Num(-val)),
            (Type::Minus, _) => Err(Error::runtime_error(operator, "Operand must be a number.")),
            (Type::Bang, right) => Ok(Value::Bool(!right.is_truthy())),
            _ => Err(Error::runtime_error(operator, "Invalid operator.")),
        }
    }

    fn visit_variable(&mut self, name: &Token) -> Result<Value, Error> {
        self.lookup_variable(name)
    }

    fn visit_empty(&mut self) -> Result<Value, Error> {
        Ok(Value::Nil)
    }
}

impl StmtVisitor for Interpreter {
    type Item = ();

    fn visit_block(&mut self, statements: &[Stmt]) -> Result<(), Error> {
        let env = Rc::new(RefCell::new(Environment::with(self.env.clone())));
        self.execute_block_with_env(statements, env)
    }

    fn visit_break(&mut self, _keyword: &Token) -> Result<(), Error> {
        Err(Error::Break)
    }

    fn visit_expression(&mut self, expression: &Expr) -> Result<(), Error> {
        self.visit_expr(expression)?;
        Ok(())
    }

    fn visit_function(
        &mut self,
        name: &Token,
        params: &[Token],
        body: &[Stmt],
        _: FunctionKind,
    ) -> Result<(), Error> {
        let function = Rc::new(Function::new(self.env.clone(), name, params, body, false));
        RefCell::borrow_mut(&self.env).define(&name.lexeme, Value::Callable(function));
        Ok(())
    }

    fn visit_class(
        &mut self,
        name: &Token,
        superclass: &Expr,
        methods: &[Stmt],
    ) -> Result<(), Error> {
        let superclass = match superclass {
            Expr::Variable { name: super_name } => {
                let value = self.visit_expr(superclass)?;
                let class = match value {
                    Value::Callable(callable) => callable.as_class(),
                    _ => None,
                };

                match class {
                    Some(class) => Some(class),
                    None => {
                        return Err(Error::runtime_error(
                            super_name,
                            "Superclass must be a class.",
                        ))
                    }
                }
            }
            _ => None,
        };

        RefCell::borrow_mut(&self.env).define(&name.lexeme, Value::Nil);

        // Methods of a subclass capture an extra frame holding `super`, so
        // a `super` access inside them finds the superclass by its
        // resolved depth no matter which receiver they are bound to later.
        let method_env = match &superclass {
            Some(class) => {
                let mut env = Environment::with(self.env.clone());
                env.define("super", Value::Callable(Rc::clone(class) as Rc<dyn Callable>));
                Rc::new(RefCell::new(env))
            }
            None => self.env.clone(),
        };

        let mut method_map = HashMap::new();
        for method in methods {
            if let Stmt::Function {
                name,
                params,
                body,
                kind,
            } = method
            {
                let function = Function::new(
                    method_env.clone(),
                    name,
                    params,
                    body,
                    *kind == FunctionKind::Initializer,
                );
                method_map.insert(name.lexeme.clone(), Rc::new(function));
            }
        }

        let class = Class::new(&name.lexeme, superclass, method_map);
        if RefCell::borrow_mut(&self.env)
            .assign(&name.lexeme, Value::Callable(class))
            .is_err()
        {
            Err(Error::runtime_error(name, "Undefined variable."))
        } else {
            Ok(())
        }
    }

    fn visit_if(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: &Stmt,
    ) -> Result<(), Error> {
        if self.visit_expr(condition)?.is_truthy() {
            self.visit_stmt(then_branch)
        } else {
            self.visit_stmt(else_branch)
        }
    }

    fn visit_while(&mut self, condition: &Expr, body: &Stmt) -> Result<(), Error> {
        while self.visit_expr(condition)?.is_truthy() {
            match self.visit_stmt(body) {
                // `break` unwinds up to the nearest loop, and only that one
                Err(Error::Break) => return Ok(()),
                Err(err) => return Err(err),
                Ok(()) => {}
            }
        }

        Ok(())
    }

    fn visit_print(&mut self, expression: &Expr) -> Result<(), Error> {
        let value = self.visit_expr(expression)?;
        let _ = writeln!(RefCell::borrow_mut(&self.stdout), "{}", value);
        Ok(())
    }

    fn visit_return(&mut self, _keyword: &Token, value: &Expr) -> Result<(), Error> {
        let value = self.visit_expr(value)?;
        Err(Error::return_value(value))
    }

    fn visit_var(&mut self, name: &Token, init: &Expr) -> Result<(), Error> {
        let value = self.visit_expr(init)?;
        RefCell::borrow_mut(&self.env).define(&name.lexeme, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::str;

    use lox_core::{Scanner, Token};

    use crate::error::Error;
    use crate::interpreter::Interpreter;
    use crate::parser::Parser;
    use crate::resolver::Resolver;

    fn test_statements(src: &str, out: Option<&str>, err: Option<&str>) {
        let mut scanner = Scanner::new();
        let tokens: Vec<Token> = scanner.scan_tokens(src).collect();
        let parsed = Parser::new(&tokens).parse().unwrap();

        let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let mut interpreter = Interpreter::new(output.clone());
        let resolver = Resolver::new(&mut interpreter);
        let resolved = resolver.resolve(parsed).unwrap();
        let result = interpreter.interpret(&resolved);

        match (result, err) {
            (Err(Error::RuntimeError { msg, .. }), Some(err)) => assert_eq!(err, msg),
            (Err(Error::RuntimeError { msg, .. }), None) => {
                panic!("Not expecting any error, found '{}'", msg)
            }
            (Err(other), _) => panic!("Unexpected error '{:?}'", other),
            (Ok(_), Some(err)) => panic!("Expecting an error '{}', found none.", err),
            _ => {}
        }

        if let Some(out) = out {
            assert_eq!(str::from_utf8(&output.borrow()).unwrap(), out);
        }
    }

    #[test]
    fn test_lox_programs() {
        let tests = [
            // binary and grouping expressions, with precedence
            ("print (1 + 2) * 5 + 2;", "17\n"),
            ("print \"hello \" + \"world\";", "hello world\n"),
            ("var a = 3; print 1 + (a * 2);", "7\n"),
            // unary expressions
            ("print !true;", "false\n"),
            ("print !10;", "false\n"),
            ("print -10.5;", "-10.5\n"),
            // variable assignment, and assignment as an expression
            (
                "var foo = \"bar\";\
                 print foo;",
                "bar\n",
            ),
            ("var a; var b; print a = b = 2; print a;", "2\n2\n"),
            // block scoping
            (
                "var b = 3; { var b = 4; print b; } print b;",
                "4\n3\n",
            ),
            // division follows the underlying float
            ("print 1 / 0;", "inf\n"),
            ("print 7 / 2;", "3.5\n"),
            // printing callables
            ("print clock;", "<native fn>\n"),
            ("fun f() {} print f;", "<fn f>\n"),
            (
                include_str!("../../data/if_else.lox"),
                include_str!("../../data/if_else.lox.expected"),
            ),
            (
                include_str!("../../data/while.lox"),
                include_str!("../../data/while.lox.expected"),
            ),
            (
                include_str!("../../data/for.lox"),
                include_str!("../../data/for.lox.expected"),
            ),
            (
                include_str!("../../data/binding.lox"),
                include_str!("../../data/binding.lox.expected"),
            ),
            (
                include_str!("../../data/fib.lox"),
                include_str!("../../data/fib.lox.expected"),
            ),
            (
                include_str!("../../data/make_counter.lox"),
                include_str!("../../data/make_counter.lox.expected"),
            ),
            (
                include_str!("../../data/class.lox"),
                include_str!("../../data/class.lox.expected"),
            ),
        ];

        for (src, expected) in tests {
            test_statements(src, Some(expected), None);
        }
    }

    #[test]
    fn test_logical_operators_return_operands() {
        let tests = [
            ("print \"ok\" or \"no\"; print \"no\" and \"ok\";", "ok\nok\n"),
            ("print nil or \"fallback\";", "fallback\n"),
            ("print false and \"x\";", "false\n"),
            ("print false or true;", "true\n"),
            // the right side is not evaluated when the left one decides
            (
                "var called = \"no\";\
                 fun mark() { called = \"yes\"; return true; }\
                 print true or mark();\
                 print called;",
                "true\nno\n",
            ),
            (
                "var called = \"no\";\
                 fun mark() { called = \"yes\"; return true; }\
                 print false and mark();\
                 print called;",
                "false\nno\n",
            ),
        ];

        for (src, expected) in tests {
            test_statements(src, Some(expected), None);
        }
    }

    #[test]
    fn test_string_coercion() {
        let tests = [
            ("var a = 3; print \"Expected '\" + a + \"'\";", "Expected '3'\n"),
            ("print 3 + \"a\";", "3a\n"),
            ("print \"v=\" + true;", "v=true\n"),
            ("print \"v=\" + nil;", "v=nil\n"),
            ("print \"n=\" + 2.5;", "n=2.5\n"),
        ];

        for (src, expected) in tests {
            test_statements(src, Some(expected), None);
        }
    }

    #[test]
    fn test_equality_across_types() {
        let tests = [
            ("print nil == nil;", "true\n"),
            ("print 1 == 1;", "true\n"),
            ("print 1 == \"1\";", "false\n"),
            ("print 0 == false;", "false\n"),
            ("print \"a\" != \"b\";", "true\n"),
            ("class C {} var c = C(); print c == c;", "true\n"),
            ("class C {} print C() == C();", "false\n"),
        ];

        for (src, expected) in tests {
            test_statements(src, Some(expected), None);
        }
    }

    #[test]
    fn test_for_loop_accumulates() {
        test_statements(
            "var c = 0; for (var i = 0; i <= 50; i = i + 1) c = c + i; print c;",
            Some("1275\n"),
            None,
        );
    }

    #[test]
    fn test_closure_keeps_counter_state() {
        test_statements(
            "fun mk() {\
               var i = 0;\
               fun c() { i = i + 1; return i; }\
               return c;\
             }\
             var k = mk();\
             k(); k();\
             print k();",
            Some("3\n"),
            None,
        );
    }

    #[test]
    fn test_break_exits_one_loop() {
        let tests = [
            (
                "var i = 0;\
                 while (true) { i = i + 1; if (i == 3) break; }\
                 print i;",
                "3\n",
            ),
            // only the inner loop is exited
            (
                "var log = \"\";\
                 for (var i = 0; i < 2; i = i + 1) {\
                   for (var j = 0; j < 5; j = j + 1) {\
                     if (j == 1) break;\
                     log = log + i + j;\
                   }\
                 }\
                 print log;",
                "0010\n",
            ),
        ];

        for (src, expected) in tests {
            test_statements(src, Some(expected), None);
        }
    }

    #[test]
    fn test_return_unwinds_through_loops() {
        test_statements(
            "fun find() { while (true) { return \"found\"; } } print find();",
            Some("found\n"),
            None,
        );
    }

    #[test]
    fn test_classes_and_inheritance() {
        let tests = [
            // methods dispatch through the receiver
            (
                "class A { who() { return \"A\"; } name() { return this.who(); } }\
                 class B < A { who() { return \"B\"; } }\
                 print B().name();",
                "B\n",
            ),
            // super unconditionally skips the current class
            (
                "class P { foo() { return 42; } }\
                 class C < P { bar() { return super.foo() + 1; } }\
                 print C().bar();",
                "43\n",
            ),
            (
                "class A { m() { return \"A\"; } }\
                 class B < A { m() { return \"B\"; } call_super() { return super.m(); } }\
                 class C < B {}\
                 print C().m();\
                 print C().call_super();",
                "B\nA\n",
            ),
            // instances have independent field maps
            (
                "class P {}\
                 var a = P();\
                 var b = P();\
                 a.x = 1;\
                 b.x = 2;\
                 print a.x;\
                 print b.x;",
                "1\n2\n",
            ),
            // fields shadow methods, a bound method survives a field write
            (
                "class C { m() { return \"method\"; } }\
                 var c = C();\
                 print c.m();\
                 var bound = c.m;\
                 c.m = \"field\";\
                 print c.m;\
                 print bound();",
                "method\nfield\nmethod\n",
            ),
            // an initializer always evaluates to the receiver
            (
                "class F { init(n) { this.x = n; } }\
                 var f = F(5);\
                 f.init(9);\
                 print f.x;",
                "9\n",
            ),
            (
                "class C { init() { this.v = 1; return; } }\
                 print C().v;",
                "1\n",
            ),
            // inherited init drives the subclass arity
            (
                "class P { init(n) { this.n = n; } }\
                 class C < P {}\
                 print C(7).n;",
                "7\n",
            ),
            ("class C {} print C; print C();", "C\n<C instance>\n"),
        ];

        for (src, expected) in tests {
            test_statements(src, Some(expected), None);
        }
    }

    #[test]
    fn test_assigning_undefined_global_defines_it() {
        test_statements(
            "fun set_flag() { flag = true; } set_flag(); print flag;",
            Some("true\n"),
            None,
        );
    }

    #[test]
    fn test_binary_expression_with_wrong_types() {
        let tests = [
            ("print 1 + false;", "Operands must be two numbers or two strings."),
            ("print true + false;", "Operands must be two numbers or two strings."),
            ("print 1 - \"one\";", "Operands must be numbers."),
            ("print 1 < \"2\";", "Operands must be numbers."),
            ("print \"a\" > \"b\";", "Operands must be numbers."),
            ("-false;", "Operand must be a number."),
        ];

        for (src, expected) in tests {
            test_statements(src, None, Some(expected));
        }
    }

    #[test]
    fn test_runtime_errors() {
        let tests = [
            ("print foo;", "Undefined variable 'foo'."),
            ("\"not callable\"();", "Can only call functions and classes."),
            ("fun f(a, b) {} f(1);", "Expected 2 arguments but got 1."),
            ("class C {} print C().missing;", "Undefined property 'missing'."),
            ("var x = 1; x.field;", "Only instances have properties."),
            ("var x = 1; x.field = 2;", "Only instances have fields."),
            (
                "var NotAClass = 1; class C < NotAClass {}",
                "Superclass must be a class.",
            ),
            (
                "class A {} class B < A { m() { return super.nope(); } } B().m();",
                "Undefined property 'nope'.",
            ),
        ];

        for (src, expected) in tests {
            test_statements(src, None, Some(expected));
        }
    }

    #[test]
    fn test_runtime_error_carries_the_offending_line() {
        let mut scanner = Scanner::new();
        let tokens: Vec<Token> = scanner.scan_tokens("var a = 1;\nprint a +\ntrue;").collect();
        let parsed = Parser::new(&tokens).parse().unwrap();

        let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let mut interpreter = Interpreter::new(output);
        let resolved = Resolver::new(&mut interpreter).resolve(parsed).unwrap();

        match interpreter.interpret(&resolved) {
            Err(Error::RuntimeError { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected a runtime error, found {:?}", other),
        }
    }

    #[test]
    fn test_native_clock() {
        test_statements(
            "print clock() > 1000; print clock() < 2000000000;",
            Some("true\ntrue\n"),
            None,
        );
    }

    #[test]
    fn test_native_functions_with_wrong_argument_number() {
        test_statements("clock(1);", None, Some("Expected 0 arguments but got 1."));
    }

    #[test]
    fn test_session_state_persists_across_runs() {
        let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let mut interpreter = Interpreter::new(output.clone());
        let mut scanner = Scanner::new();

        // Later lines call into functions defined earlier, the way the
        // interactive mode feeds the pipeline line by line
        let lines = [
            "fun add(a, b) { return a + b; }",
            "var total = add(1, 2);",
            "{ var x = total; print x; }",
        ];

        for line in lines {
            let tokens: Vec<Token> = scanner.scan_tokens(line).collect();
            let parsed = Parser::new(&tokens).parse().unwrap();
            let resolved = Resolver::new(&mut interpreter).resolve(parsed).unwrap();
            interpreter.interpret(&resolved).unwrap();
        }

        assert_eq!(str::from_utf8(&output.borrow()).unwrap(), "3\n");
    }
}
