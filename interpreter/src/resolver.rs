use std::collections::HashMap;

use lox_core::{Literal, Token};

use crate::ast::{Expr, ExprVisitor, FunctionKind, Stmt, StmtVisitor};
use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::parser::StmtStream;

enum State {
    Defined,
    Declared,
}

#[derive(Copy, Clone)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Copy, Clone)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Walks the tree before evaluation and tells the interpreter, for every
/// variable use, how many scope frames lie between the use and its binding.
/// All static errors are collected so each of them can be reported in a
/// single pass; if any were found, evaluation must not start.
pub struct Resolver<'a> {
    scopes: Vec<HashMap<String, State>>,
    interpreter: &'a mut Interpreter,
    errors: Vec<Error>,
    current_fun: FunctionType,
    current_cls: ClassType,

    // Number of loops enclosing the current statement within the current
    // function, so `break` outside a loop is rejected even when the loop is
    // in an enclosing function.
    loop_depth: usize,
}

pub struct ResolvedStmts(pub(crate) Vec<Stmt>);

impl<'a> Resolver<'a> {
    pub fn new(interpreter: &'a mut Interpreter) -> Self {
        Resolver {
            scopes: Vec::new(),
            interpreter,
            errors: Vec::new(),
            current_fun: FunctionType::None,
            current_cls: ClassType::None,
            loop_depth: 0,
        }
    }

    pub fn resolve(mut self, stmts: StmtStream) -> Result<ResolvedStmts, Vec<Error>> {
        self.resolve_stmts(&stmts.0);
        if self.errors.is_empty() {
            Ok(ResolvedStmts(stmts.0))
        } else {
            Err(self.errors)
        }
    }

    fn resolve_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            if let Err(err) = self.visit_stmt(stmt) {
                self.errors.push(err);
            }
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, token: &Token) -> Result<(), Error> {
        let last = match self.scopes.last_mut() {
            Some(scope) => scope,
            None => return Ok(()),
        };

        if last.contains_key(&token.lexeme) {
            Err(Error::resolver_error(
                token,
                "Already a variable with this name in this scope.",
            ))
        } else {
            last.insert(token.lexeme.clone(), State::Declared);
            Ok(())
        }
    }

    fn define(&mut self, token: &Token) {
        self.define_name(&token.lexeme);
    }

    fn define_name(&mut self, name: &str) {
        if let Some(last) = self.scopes.last_mut() {
            last.insert(String::from(name), State::Defined);
        }
    }

    fn resolve_local(&mut self, token: &Token) {
        for i in (0..self.scopes.len()).rev() {
            if self.scopes[i].contains_key(&token.lexeme) {
                self.interpreter.resolve(token, self.scopes.len() - 1 - i);
                return;
            }
        }
    }

    fn resolve_function(&mut self, params: &[Token], body: &[Stmt], ty: FunctionType) {
        let enclosing = self.current_fun;
        self.current_fun = ty;

        // A function body is a fresh loop context, a `break` inside it
        // can't target a loop outside of it
        let enclosing_loops = self.loop_depth;
        self.loop_depth = 0;

        self.begin_scope();
        for param in params {
            if let Err(err) = self.declare(param) {
                self.errors.push(err);
            }
            self.define(param);
        }
        self.resolve_stmts(body);
        self.end_scope();

        self.loop_depth = enclosing_loops;
        self.current_fun = enclosing;
    }
}

impl<'a> StmtVisitor for Resolver<'a> {
    type Item = ();

    fn visit_block(&mut self, statements: &[Stmt]) -> Result<Self::Item, Error> {
        self.begin_scope();
        self.resolve_stmts(statements);
        self.end_scope();
        Ok(())
    }

    fn visit_break(&mut self, keyword: &Token) -> Result<Self::Item, Error> {
        if self.loop_depth == 0 {
            Err(Error::resolver_error(
                keyword,
                "Can't use 'break' outside of a loop.",
            ))
        } else {
            Ok(())
        }
    }

    fn visit_expression(&mut self, expression: &Expr) -> Result<Self::Item, Error> {
        self.visit_expr(expression)
    }

    fn visit_function(
        &mut self,
        name: &Token,
        params: &[Token],
        body: &[Stmt],
        _: FunctionKind,
    ) -> Result<Self::Item, Error> {
        self.declare(name)?;
        self.define(name);
        self.resolve_function(params, body, FunctionType::Function);
        Ok(())
    }

    fn visit_class(
        &mut self,
        name: &Token,
        superclass: &Expr,
        methods: &[Stmt],
    ) -> Result<Self::Item, Error> {
        let enclosing = self.current_cls;
        self.current_cls = ClassType::Class;

        if let Err(err) = self.declare(name) {
            self.errors.push(err);
        }
        self.define(name);

        if let Expr::Variable { name: super_name } = superclass {
            if name.lexeme == super_name.lexeme {
                self.errors.push(Error::resolver_error(
                    super_name,
                    "A class can't inherit from itself.",
                ));
            } else if let Err(err) = self.visit_variable(super_name) {
                self.errors.push(err);
            }

            self.current_cls = ClassType::Subclass;
            self.begin_scope();
            self.define_name("super");
        }

        self.begin_scope();
        self.define_name("this");

        for method in methods {
            if let Stmt::Function {
                params, body, kind, ..
            } = method
            {
                let ty = match kind {
                    FunctionKind::Initializer => FunctionType::Initializer,
                    _ => FunctionType::Method,
                };
                self.resolve_function(params, body, ty);
            } else {
                panic!(
                    "Unexpected statement '{:?}' found in class body, expecting a method.",
                    method
                )
            }
        }

        self.end_scope();
        if let Expr::Variable { .. } = superclass {
            self.end_scope();
        }

        self.current_cls = enclosing;
        Ok(())
    }

    fn visit_if(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: &Stmt,
    ) -> Result<Self::Item, Error> {
        self.visit_expr(condition)?;
        self.visit_stmt(then_branch)?;
        self.visit_stmt(else_branch)
    }

    fn visit_while(&mut self, condition: &Expr, body: &Stmt) -> Result<Self::Item, Error> {
        self.visit_expr(condition)?;

        self.loop_depth += 1;
        let res = self.visit_stmt(body);
        self.loop_depth -= 1;
        res
    }

    fn visit_print(&mut self, expression: &Expr) -> Result<Self::Item, Error> {
        self.visit_expr(expression)
    }

    fn visit_return(&mut self, keyword: &Token, value: &Expr) -> Result<Self::Item, Error> {
        if let FunctionType::None = self.current_fun {
            return Err(Error::resolver_error(
                keyword,
                "Can't return from top-level code.",
            ));
        }

        match value {
            Expr::Empty => Ok(()),
            _ => {
                if let FunctionType::Initializer = self.current_fun {
                    Err(Error::resolver_error(
                        keyword,
                        "Can't return a value from an initializer.",
                    ))
                } else {
                    self.visit_expr(value)
                }
            }
        }
    }

    fn visit_var(&mut self, name: &Token, init: &Expr) -> Result<Self::Item, Error> {
        self.declare(name)?;
        self.visit_expr(init)?;
        self.define(name);
        Ok(())
    }
}

impl<'a> ExprVisitor for Resolver<'a> {
    type Item = ();

    fn visit_assign(&mut self, name: &Token, value: &Expr) -> Result<Self::Item, Error> {
        self.visit_expr(value)?;
        self.resolve_local(name);
        Ok(())
    }

    fn visit_binary(&mut self, left: &Expr, _: &Token, right: &Expr) -> Result<Self::Item, Error> {
        self.visit_expr(left)?;
        self.visit_expr(right)
    }

    fn visit_call(&mut self, callee: &Expr, _: &Token, args: &[Expr]) -> Result<Self::Item, Error> {
        self.visit_expr(callee)?;
        for arg in args {
            self.visit_expr(arg)?;
        }
        Ok(())
    }

    fn visit_get(&mut self, object: &Expr, _: &Token) -> Result<Self::Item, Error> {
        self.visit_expr(object)
    }

    fn visit_set(&mut self, object: &Expr, _: &Token, value: &Expr) -> Result<Self::Item, Error> {
        self.visit_expr(object)?;
        self.visit_expr(value)
    }

    fn visit_this(&mut self, keyword: &Token) -> Result<Self::Item, Error> {
        if let ClassType::None = self.current_cls {
            return Err(Error::resolver_error(
                keyword,
                "Can't use 'this' outside of a class.",
            ));
        }

        self.resolve_local(keyword);
        Ok(())
    }

    fn visit_super(&mut self, keyword: &Token, _method: &Token) -> Result<Self::Item, Error> {
        match self.current_cls {
            ClassType::None => Err(Error::resolver_error(
                keyword,
                "Can't use 'super' outside of a class.",
            )),
            ClassType::Class => Err(Error::resolver_error(
                keyword,
                "Can't use 'super' in a class with no superclass.",
            )),
            ClassType::Subclass => {
                self.resolve_local(keyword);
                Ok(())
            }
        }
    }

    fn visit_grouping(&mut self, expression: &Expr) -> Result<Self::Item, Error> {
        self.visit_expr(expression)
    }

    fn visit_literal(&mut self, _value: &Literal) -> Result<Self::Item, Error> {
        Ok(())
    }

    fn visit_logical(&mut self, left: &Expr, _: &Token, right: &Expr) -> Result<Self::Item, Error> {
        self.visit_expr(left)?;
        self.visit_expr(right)
    }

    fn visit_unary(&mut self, _: &Token, right: &Expr) -> Result<Self::Item, Error> {
        self.visit_expr(right)
    }

    fn visit_variable(&mut self, name: &Token) -> Result<Self::Item, Error> {
        // Check if variable is being accessed in its own initializer,
        // which means the variable is declared, but value not bound yet
        if let Some(last) = self.scopes.last() {
            if let Some(State::Declared) = last.get(&name.lexeme) {
                return Err(Error::resolver_error(
                    name,
                    "Can't read local variable in its own initializer.",
                ));
            }
        }

        self.resolve_local(name);
        Ok(())
    }

    fn visit_empty(&mut self) -> Result<Self::Item, Error> {
        Ok(())
    }
}
