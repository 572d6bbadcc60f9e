use lox_core::Token;
use thiserror::Error;

use crate::value::Value;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("[line {line}] scan error: {msg}")]
    ScannerError { line: usize, msg: String },

    #[error("[line {line}] parse error: {msg}")]
    ParserError {
        token: Token,

        // line is copied from token, this is required because thiserror doesn't support field
        // access, e.g {token.line:?}, in error strings
        line: usize,
        msg: String,
    },

    #[error("[line {line}] resolve error: {msg}")]
    ResolverError { token: Token, line: usize, msg: String },

    #[error("[line {line}] runtime error: {msg}")]
    RuntimeError { token: Token, line: usize, msg: String },

    // The last two are not errors but unwinding signals. `Return` is caught
    // at the call boundary, `Break` at the nearest enclosing loop; the
    // resolver guarantees both have such a catcher.
    #[error("return")]
    Return(ReturnValue),

    #[error("break")]
    Break,
}

#[derive(Debug, PartialEq)]
pub struct ReturnValue {
    pub(crate) value: Value,
}

impl Error {
    pub(crate) fn parser_error(token: &Token, msg: &str) -> Self {
        Error::ParserError {
            token: token.clone(),
            line: token.line,
            msg: String::from(msg),
        }
    }

    pub(crate) fn resolver_error(token: &Token, msg: &str) -> Self {
        Error::ResolverError {
            token: token.clone(),
            line: token.line,
            msg: String::from(msg),
        }
    }

    pub(crate) fn runtime_error(token: &Token, msg: &str) -> Self {
        Error::RuntimeError {
            token: token.clone(),
            line: token.line,
            msg: String::from(msg),
        }
    }

    pub(crate) fn return_value(value: Value) -> Self {
        Error::Return(ReturnValue { value })
    }
}

impl From<lox_core::Error> for Error {
    fn from(err: lox_core::Error) -> Self {
        Error::ScannerError {
            line: err.line(),
            msg: err.to_string(),
        }
    }
}
