use lox_core::{Literal, Token, Type};

use crate::ast::{Expr, FunctionKind, Stmt};
use crate::error::Error;

pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
}

// A wrapper over vector of statements to not leak Stmt to public
#[derive(Debug, PartialEq)]
pub struct StmtStream(pub(crate) Vec<Stmt>);

// Helper alias for shorter return types
type ParserResult = Result<StmtStream, Vec<Error>>;
type BlockResult = Result<Vec<Stmt>, Error>;
type StmtResult = Result<Stmt, Error>;
type ExprResult = Result<Expr, Error>;

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Parser { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> ParserResult {
        let mut statements = Vec::new();
        let mut errs = Vec::new();

        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => errs.push(err),
            };
        }

        if errs.is_empty() {
            Ok(StmtStream(statements))
        } else {
            Err(errs)
        }
    }

    fn declaration(&mut self) -> StmtResult {
        let res = if self.match_one(Type::Class) {
            self.class_declaration()
        } else if self.match_one(Type::Fun) {
            self.function(FunctionKind::Function)
        } else if self.match_one(Type::Var) {
            self.var_declaration()
        } else {
            self.statement()
        };

        if res.is_err() {
            self.synchronize();
        }

        res
    }

    fn class_declaration(&mut self) -> StmtResult {
        let name = self.consume(Type::Identifier, "Expect class name.")?.clone();

        let mut superclass = Expr::empty();
        if self.match_one(Type::Less) {
            self.consume(Type::Identifier, "Expect superclass name.")?;
            superclass = Expr::variable(self.previous().clone());
        }

        self.consume(Type::LeftBrace, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        while !self.check(Type::RightBrace) && !self.is_at_end() {
            methods.push(self.function(FunctionKind::Method)?);
        }
        self.consume(Type::RightBrace, "Expect '}' after class body.")?;
        Ok(Stmt::class(name, superclass, methods))
    }

    fn function(&mut self, kind: FunctionKind) -> StmtResult {
        let name = self
            .consume(Type::Identifier, &format!("Expect {} name.", kind))?
            .clone();

        // A method named `init` is the class initializer
        let kind = if kind == FunctionKind::Method && name.lexeme == "init" {
            FunctionKind::Initializer
        } else {
            kind
        };

        self.consume(Type::LeftParen, &format!("Expect '(' after {} name.", kind))?;

        let mut params = Vec::new();
        if !self.check(Type::RightParen) {
            loop {
                if params.len() >= 255 {
                    return Err(Error::parser_error(
                        self.peek(),
                        "Can't have more than 255 parameters.",
                    ));
                }

                params.push(
                    self.consume(Type::Identifier, "Expect parameter name.")?
                        .clone(),
                );
                if !self.match_one(Type::Comma) {
                    break;
                }
            }
        }

        self.consume(Type::RightParen, "Expect ')' after parameters.")?;
        self.consume(
            Type::LeftBrace,
            &format!("Expect '{{' before {} body.", kind),
        )?;

        let body = self.block()?;
        Ok(Stmt::function(name, params, body, kind))
    }

    fn var_declaration(&mut self) -> StmtResult {
        let name = self
            .consume(Type::Identifier, "Expect variable name.")?
            .clone();
        let mut init = Expr::empty();
        if self.match_one(Type::Equal) {
            init = self.expression()?;
        }

        self.consume(Type::SemiColon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::var(name, init))
    }

    fn statement(&mut self) -> StmtResult {
        if self.match_one(Type::If) {
            self.if_statement()
        } else if self.match_one(Type::Print) {
            self.print_statement()
        } else if self.match_one(Type::Return) {
            self.return_statement()
        } else if self.match_one(Type::Break) {
            self.break_statement()
        } else if self.match_one(Type::While) {
            self.while_statement()
        } else if self.match_one(Type::For) {
            self.for_statement()
        } else if self.match_one(Type::LeftBrace) {
            Ok(Stmt::Block {
                statements: self.block()?,
            })
        } else {
            self.expression_statement()
        }
    }

    fn block(&mut self) -> BlockResult {
        let mut stmts = Vec::new();
        while !self.check(Type::RightBrace) && !self.is_at_end() {
            stmts.push(self.declaration()?);
        }
        self.consume(Type::RightBrace, "Expect '}' after block.")?;
        Ok(stmts)
    }

    fn expression_statement(&mut self) -> StmtResult {
        let expr = self.expression()?;
        self.consume(Type::SemiColon, "Expect ';' after expression.")?;
        Ok(Stmt::expression(expr))
    }

    fn if_statement(&mut self) -> StmtResult {
        self.consume(Type::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expect ')' after if condition.")?;

        let then_branch = self.statement()?;
        let mut else_branch = Stmt::block(Vec::new());
        if self.match_one(Type::Else) {
            else_branch = self.statement()?;
        }

        Ok(Stmt::if_(condition, then_branch, else_branch))
    }

    fn while_statement(&mut self) -> StmtResult {
        self.consume(Type::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expect ')' after while condition.")?;
        let body = self.statement()?;
        Ok(Stmt::while_(condition, body))
    }

    fn for_statement(&mut self) -> StmtResult {
        self.consume(Type::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_one(Type::SemiColon) {
            Stmt::block(Vec::new())
        } else if self.match_one(Type::Var) {
            self.var_declaration()?
        } else {
            self.expression_statement()?
        };

        // An omitted condition loops forever
        let condition = if !self.check(Type::SemiColon) {
            self.expression()?
        } else {
            Expr::literal(true)
        };
        self.consume(Type::SemiColon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(Type::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(Type::RightParen, "Expect ')' after for clauses.")?;

        let body = self.statement()?;
        let while_body = match increment {
            Some(increment) => Stmt::block(vec![body, Stmt::expression(increment)]),
            None => body,
        };

        Ok(Stmt::block(vec![
            // initialise the variables first
            initializer,
            // after that, it's just normal while loop
            Stmt::while_(condition, while_body),
        ]))
    }

    fn print_statement(&mut self) -> StmtResult {
        let expr = self.expression()?;
        self.consume(Type::SemiColon, "Expect ';' after value.")?;
        Ok(Stmt::print(expr))
    }

    fn return_statement(&mut self) -> StmtResult {
        let keyword = self.previous().clone();
        let mut value = Expr::empty();
        if !self.check(Type::SemiColon) {
            value = self.expression()?;
        }

        self.consume(Type::SemiColon, "Expect ';' after return value.")?;
        Ok(Stmt::return_(keyword, value))
    }

    fn break_statement(&mut self) -> StmtResult {
        let keyword = self.previous().clone();
        self.consume(Type::SemiColon, "Expect ';' after 'break'.")?;
        Ok(Stmt::break_(keyword))
    }

    fn expression(&mut self) -> ExprResult {
        self.assignment()
    }

    fn assignment(&mut self) -> ExprResult {
        let expr = self.or_expression()?;
        if self.match_one(Type::Equal) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            match expr {
                Expr::Variable { name } => Ok(Expr::assign(name, value)),
                Expr::Get { name, object } => Ok(Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                }),
                _ => Err(Error::parser_error(&equals, "Invalid assignment target.")),
            }
        } else {
            Ok(expr)
        }
    }

    fn or_expression(&mut self) -> ExprResult {
        let mut expr = self.and_expression()?;
        while self.match_one(Type::Or) {
            let operator = self.previous().clone();
            let right = self.and_expression()?;
            expr = Expr::logical(expr, operator, right);
        }
        Ok(expr)
    }

    fn and_expression(&mut self) -> ExprResult {
        let mut expr = self.equality()?;
        while self.match_one(Type::And) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::logical(expr, operator, right);
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ExprResult {
        let mut expr = self.comparison()?;
        while self.match_either(&[Type::BangEqual, Type::EqualEqual]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ExprResult {
        let mut expr = self.term()?;
        while self.match_either(&[
            Type::Greater,
            Type::GreaterEqual,
            Type::Less,
            Type::LessEqual,
        ]) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn term(&mut self) -> ExprResult {
        let mut expr = self.factor()?;
        while self.match_either(&[Type::Plus, Type::Minus]) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ExprResult {
        let mut expr = self.unary()?;
        while self.match_either(&[Type::Slash, Type::Star]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ExprResult {
        if self.match_either(&[Type::Bang, Type::Minus]) {
            let operator = self.previous().clone();
            Ok(Expr::unary(operator, self.unary()?))
        } else {
            self.call()
        }
    }

    fn call(&mut self) -> ExprResult {
        let mut expr = self.primary()?;
        loop {
            if self.match_one(Type::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if self.match_one(Type::Dot) {
                let name = self
                    .consume(Type::Identifier, "Expect property name after '.'.")?
                    .clone();
                expr = Expr::get(expr, name);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ExprResult {
        let mut args: Vec<Expr> = Vec::new();
        if !self.check(Type::RightParen) {
            loop {
                if args.len() >= 255 {
                    return Err(Error::parser_error(
                        self.peek(),
                        "Can't have more than 255 arguments.",
                    ));
                }

                args.push(self.expression()?);
                if !self.match_one(Type::Comma) {
                    break;
                }
            }
        }

        let paren = self.consume(Type::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::call(callee, paren.clone(), args))
    }

    fn primary(&mut self) -> ExprResult {
        if self.match_one(Type::True) {
            Ok(Expr::literal(true))
        } else if self.match_one(Type::False) {
            Ok(Expr::literal(false))
        } else if self.match_one(Type::Nil) {
            Ok(Expr::literal(Literal::Nil))
        } else if self.match_either(&[Type::Number, Type::String]) {
            Ok(Expr::literal(self.previous().value.clone()))
        } else if self.match_one(Type::LeftParen) {
            let expr = self.expression()?;
            self.consume(Type::RightParen, "Expect ')' after expression.")?;
            Ok(Expr::grouping(expr))
        } else if self.match_one(Type::Identifier) {
            Ok(Expr::variable(self.previous().clone()))
        } else if self.match_one(Type::This) {
            Ok(Expr::this(self.previous().clone()))
        } else if self.match_one(Type::Super) {
            let token = self.previous().clone();
            self.consume(Type::Dot, "Expect '.' after 'super'.")?;
            let method = self
                .consume(Type::Identifier, "Expect superclass method name.")?
                .clone();
            Ok(Expr::super_(token, method))
        } else {
            Err(Error::parser_error(self.peek(), "Expect expression."))
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek().ty == Type::Eof
    }

    fn check(&self, ty: Type) -> bool {
        if self.is_at_end() {
            false
        } else {
            self.peek().ty == ty
        }
    }

    fn consume(&mut self, ty: Type, msg: &str) -> Result<&Token, Error> {
        if self.check(ty) {
            Ok(self.advance())
        } else {
            Err(Error::parser_error(self.peek(), msg))
        }
    }

    // Panic-mode recovery: drop tokens until a statement boundary so the
    // rest of the source can still be checked for errors.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().ty == Type::SemiColon {
                return;
            }

            match self.peek().ty {
                Type::Class
                | Type::Fun
                | Type::Var
                | Type::For
                | Type::If
                | Type::While
                | Type::Print
                | Type::Return
                | Type::Break => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn match_either(&mut self, types: &[Type]) -> bool {
        for ty in types {
            if self.match_one(*ty) {
                // Already skipped in the `match_one`, just return result
                return true;
            }
        }

        false
    }

    fn match_one(&mut self, ty: Type) -> bool {
        if self.check(ty) {
            self.advance();
            true
        } else {
            false
        }
    }
}
