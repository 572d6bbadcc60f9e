use phf::{phf_map, Map};

use crate::error::Error;
use crate::token::{Literal, Token, Type};

pub struct Scanner {
    // Next token index to hand out. Lives on the scanner rather than the
    // stream so indices stay unique across several `scan_tokens` calls in
    // one interactive session.
    next_index: usize,
}

impl Scanner {
    const KEYWORDS: Map<&'static str, Type> = phf_map! {
        "and" => Type::And,
        "break" => Type::Break,
        "else" => Type::Else,
        "for" => Type::For,
        "if" => Type::If,
        "or" => Type::Or,
        "return" => Type::Return,
        "this" => Type::This,
        "var" => Type::Var,
        "class" => Type::Class,
        "false" => Type::False,
        "fun" => Type::Fun,
        "nil" => Type::Nil,
        "print" => Type::Print,
        "super" => Type::Super,
        "true" => Type::True,
        "while" => Type::While,
    };

    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Scanner { next_index: 0 }
    }

    pub fn scan_tokens<'a>(&'a mut self, src: &'a str) -> TokenStream<'a> {
        TokenStream::new(src, self)
    }
}

pub struct TokenStream<'a> {
    src: &'a str,
    scanner: &'a mut Scanner,
    line: usize,

    // `start` and `current` are byte offsets into the source; the token
    // being scanned spans `start..current`. The scanner is ASCII-oriented,
    // non-ASCII bytes only ever appear inside string literals.
    start: usize,
    current: usize,

    // This flag is set to `true` if the eof is reached and the eof token has been emitted.
    // This is required because the iterator needs to distinguish between when eof is reached but
    // the token is not emitted, and eof is reached and token has been emitted.
    eof: bool,
    error: Option<Error>,
}

impl<'a> TokenStream<'a> {
    fn new(src: &'a str, scanner: &'a mut Scanner) -> Self {
        TokenStream {
            src,
            scanner,
            line: 1,
            start: 0,
            current: 0,
            eof: false,
            error: None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    fn scan_token(&mut self) -> Result<Option<Token>, Error> {
        let c = self.advance();

        let token = match c {
            '(' => Some(self.make_token(Type::LeftParen)),
            ')' => Some(self.make_token(Type::RightParen)),
            '{' => Some(self.make_token(Type::LeftBrace)),
            '}' => Some(self.make_token(Type::RightBrace)),
            ',' => Some(self.make_token(Type::Comma)),
            '.' => Some(self.make_token(Type::Dot)),
            '-' => Some(self.make_token(Type::Minus)),
            '+' => Some(self.make_token(Type::Plus)),
            ';' => Some(self.make_token(Type::SemiColon)),
            '*' => Some(self.make_token(Type::Star)),

            '!' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::BangEqual))
                } else {
                    Some(self.make_token(Type::Bang))
                }
            }

            '=' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::EqualEqual))
                } else {
                    Some(self.make_token(Type::Equal))
                }
            }

            '<' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::LessEqual))
                } else {
                    Some(self.make_token(Type::Less))
                }
            }

            '>' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::GreaterEqual))
                } else {
                    Some(self.make_token(Type::Greater))
                }
            }

            '/' => {
                if self.match_char('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                    None
                } else if self.match_char('*') {
                    // Block comments don't nest but may span lines, so ensure
                    // to increment the line since `advance()` doesn't
                    // increment line number
                    let mut done = false;
                    while !self.is_at_end() && !done {
                        if self.current() == '\n' {
                            self.line += 1;
                        }

                        let now = self.advance();
                        if now == '*' && self.peek() == '/' {
                            self.advance();
                            done = true;
                        }
                    }

                    if done {
                        None
                    } else {
                        return Err(Error::UnterminatedBlockComment { line: self.line });
                    }
                } else {
                    Some(self.make_token(Type::Slash))
                }
            }

            '"' => Some(self.string()?),

            // White spaces, do nothing
            ' ' | '\t' | '\r' => None,

            // Increment for new line
            '\n' => {
                self.line += 1;
                None
            }

            _ => {
                if c.is_ascii_digit() {
                    Some(self.number())
                } else if c.is_ascii_alphabetic() || c == '_' {
                    Some(self.identifier())
                } else {
                    return Err(Error::UnexpectedCharacter {
                        ch: c,
                        line: self.line,
                    });
                }
            }
        };

        Ok(token)
    }

    fn string(&mut self) -> Result<Token, Error> {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }

            self.advance();
        }

        if self.is_at_end() {
            return Err(Error::UnterminatedString { line: self.line });
        }

        // consume the closing "
        self.advance();
        Ok(self.make_token_with_val(
            Type::String,
            Literal::from(String::from(&self.src[self.start + 1..self.current - 1])),
        ))
    }

    fn number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        // A digit-and-dot lexeme always parses as f64
        let value = self.src[self.start..self.current].parse::<f64>().unwrap();
        self.make_token_with_val(Type::Number, Literal::Num(value))
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = &self.src[self.start..self.current];

        match Scanner::KEYWORDS.get(text) {
            None => self.make_token(Type::Identifier),
            Some(ty @ Type::True) => self.make_token_with_val(*ty, Literal::Bool(true)),
            Some(ty @ Type::False) => self.make_token_with_val(*ty, Literal::Bool(false)),
            Some(keyword) => self.make_token(*keyword),
        }
    }

    fn current(&self) -> char {
        self.src.as_bytes()[self.current] as char
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.current()
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.src.len() {
            '\0'
        } else {
            self.src.as_bytes()[self.current + 1] as char
        }
    }

    fn advance(&mut self) -> char {
        let res = self.current();
        self.current += 1;
        res
    }

    fn match_char(&mut self, c: char) -> bool {
        if self.is_at_end() || self.current() != c {
            false
        } else {
            self.current += 1;
            true
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.src.len()
    }

    fn make_token(&mut self, ty: Type) -> Token {
        self.make_token_with_val(ty, Literal::Nil)
    }

    fn make_token_with_val(&mut self, ty: Type, val: Literal) -> Token {
        let lexeme = match ty {
            Type::Eof => String::new(),
            _ => String::from(&self.src[self.start..self.current]),
        };

        let token = Token::new(ty, lexeme, self.line, self.start, self.scanner.next_index, val);
        self.scanner.next_index += 1;
        token
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof || self.error.is_some() {
            return None;
        }

        while !self.is_at_end() {
            self.start = self.current;

            let token = self.scan_token();
            match token {
                Ok(None) => continue,
                Ok(Some(token)) => return Some(token),
                Err(err) => {
                    self.error = Some(err);
                    return None;
                }
            }
        }

        self.eof = true;
        self.start = self.current;
        Some(self.make_token(Type::Eof))
    }
}
