//! Integer expressions for assembler operands.
//!
//! ```text
//! addsub  = unary { ("+" | "-") unary }
//! unary   = ("+" | "-" | "<" | ">") unary | primary
//! primary = number | ident | "*" | "(" addsub ")"
//! number  = digits | "$" hexdigits | "%" bindigits
//! ```

use crate::symbol::SymbolTable;
use std::iter::Peekable;
use std::str::CharIndices;
use std::vec::IntoIter;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Undefined symbol: `{0}`")]
    UnknownSymbol(String),

    #[error("Unexpected token: `{0}`")]
    UnexpectedToken(String),
}

// ----------------------------------------------------------------------------
// Lexer
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(u32),
    Ident(String),
    Star,
    Plus,
    Minus,
    LAngle,
    RAngle,
    LParen,
    RParen,
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Ident(s) => s.clone(),
            Token::Star => "*".into(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::LAngle => "<".into(),
            Token::RAngle => ">".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
        }
    }
}

pub fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '.'
}

pub fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

/// True if `s` is a well-formed symbol name.
pub fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(ch) if is_ident_start(ch)) && chars.all(is_ident_char)
}

struct Lexer<'a> {
    iter: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(code: &'a str) -> Self {
        Lexer {
            iter: code.char_indices().peekable(),
        }
    }

    fn parse(mut self) -> Result<Vec<Token>, ExprError> {
        let mut tokens = Vec::new();
        while let Some(&(_, ch)) = self.iter.peek() {
            if ch.is_whitespace() {
                self.iter.next();
                continue;
            }
            let single = match ch {
                '*' => Some(Token::Star),
                '+' => Some(Token::Plus),
                '-' => Some(Token::Minus),
                '<' => Some(Token::LAngle),
                '>' => Some(Token::RAngle),
                '(' => Some(Token::LParen),
                ')' => Some(Token::RParen),
                _ => None,
            };
            if let Some(token) = single {
                self.iter.next();
                tokens.push(token);
                continue;
            }
            let token = match ch {
                '$' => {
                    self.iter.next();
                    self.parse_number(16)?
                }
                '%' => {
                    self.iter.next();
                    self.parse_number(2)?
                }
                '0'..='9' => self.parse_number(10)?,
                ch if is_ident_start(ch) => self.parse_ident(),
                ch => return Err(ExprError::Parse(format!("Invalid character `{ch}`"))),
            };
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn parse_ident(&mut self) -> Token {
        let mut lexeme = String::new();
        while let Some((_, ch)) = self.iter.next_if(|(_, ch)| is_ident_char(*ch)) {
            lexeme.push(ch);
        }
        Token::Ident(lexeme)
    }

    fn parse_number(&mut self, radix: u32) -> Result<Token, ExprError> {
        let mut lexeme = String::new();
        while let Some((_, ch)) = self.iter.next_if(|(_, ch)| ch.is_ascii_alphanumeric()) {
            lexeme.push(ch);
        }
        if lexeme.is_empty() {
            return Err(ExprError::Parse("Missing digits after radix prefix".into()));
        }
        match u32::from_str_radix(&lexeme, radix) {
            Ok(num) => Ok(Token::Number(num)),
            Err(_) => Err(ExprError::Parse(format!(
                "Invalid base-{radix} number `{lexeme}`"
            ))),
        }
    }
}

// ----------------------------------------------------------------------------
// Syntax tree
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Pos,
    Neg,
    /// `<x`: low byte
    Low,
    /// `>x`: high byte
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(i32),
    Symbol(String),
    /// `*`: program counter of the current statement
    Pc,
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

struct Parser {
    tokens: Peekable<IntoIter<Token>>,
}

impl Parser {
    fn peek(&mut self) -> Option<&Token> {
        self.tokens.peek()
    }

    fn next(&mut self) -> Result<Token, ExprError> {
        self.tokens
            .next()
            .ok_or_else(|| ExprError::Parse("Unexpected end of expression".into()))
    }

    /// addsub = unary { ("+" | "-") unary }
    fn parse_addsub(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.next()?;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    /// unary = ("+" | "-" | "<" | ">") unary | primary
    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek() {
            Some(Token::Plus) => UnaryOp::Pos,
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::LAngle) => UnaryOp::Low,
            Some(Token::RAngle) => UnaryOp::High,
            _ => return self.parse_primary(),
        };
        self.next()?;
        let expr = self.parse_unary()?;
        Ok(Expr::Unary(op, Box::new(expr)))
    }

    /// primary = number | ident | "*" | "(" addsub ")"
    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        match self.next()? {
            Token::Number(n) => Ok(Expr::Number(n as i32)),
            Token::Ident(name) => Ok(Expr::Symbol(name)),
            Token::Star => Ok(Expr::Pc),
            Token::LParen => {
                let inner = self.parse_addsub()?;
                match self.next()? {
                    Token::RParen => Ok(inner),
                    other => Err(ExprError::UnexpectedToken(other.text())),
                }
            }
            other => Err(ExprError::Parse(format!(
                "Expected a value, found `{}`",
                other.text()
            ))),
        }
    }
}

impl Expr {
    pub fn parse(code: &str) -> Result<Expr, ExprError> {
        let tokens = Lexer::new(code).parse()?;
        if tokens.is_empty() {
            return Err(ExprError::Parse("Empty expression".into()));
        }
        let mut parser = Parser {
            tokens: tokens.into_iter().peekable(),
        };
        let expr = parser.parse_addsub()?;
        match parser.tokens.next() {
            None => Ok(expr),
            Some(trailing) => Err(ExprError::UnexpectedToken(trailing.text())),
        }
    }

    /// True if the expression refers to any symbol.
    pub fn has_symbols(&self) -> bool {
        match self {
            Expr::Number(_) | Expr::Pc => false,
            Expr::Symbol(_) => true,
            Expr::Unary(_, expr) => expr.has_symbols(),
            Expr::Binary(_, lhs, rhs) => lhs.has_symbols() || rhs.has_symbols(),
        }
    }

    /// Negative intermediates are kept; callers mask to their operand width.
    pub fn eval(&self, symbols: &SymbolTable, pc: i32) -> Result<i32, ExprError> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Pc => Ok(pc),
            Expr::Symbol(name) => symbols
                .get(name)
                .ok_or_else(|| ExprError::UnknownSymbol(name.clone())),
            Expr::Unary(op, expr) => {
                let val = expr.eval(symbols, pc)?;
                Ok(match op {
                    UnaryOp::Pos => val,
                    UnaryOp::Neg => val.wrapping_neg(),
                    UnaryOp::Low => val & 0xFF,
                    UnaryOp::High => (val >> 8) & 0xFF,
                })
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = lhs.eval(symbols, pc)?;
                let rhs = rhs.eval(symbols, pc)?;
                Ok(match op {
                    BinaryOp::Add => lhs.wrapping_add(rhs),
                    BinaryOp::Sub => lhs.wrapping_sub(rhs),
                })
            }
        }
    }
}

/// Parse and evaluate `code` in one step.
pub fn evaluate(code: &str, symbols: &SymbolTable, pc: i32) -> Result<i32, ExprError> {
    Expr::parse(code)?.eval(symbols, pc)
}
