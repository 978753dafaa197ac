//! Constrained arithmetic for formula components.
//!
//! Formula components are evaluated by a small recursive-descent parser that
//! accepts only decimal literals, the token `basic` (bound to basic pay),
//! `+ - * /`, unary minus and parentheses. Anything else is rejected as
//! [`EngineError::InvalidFormula`]; nothing is ever executed.
//!
//! Grammar:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := ('-' | '+') unary | atom
//! atom   := NUMBER | 'basic' | '(' expr ')'
//! ```

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};

/// The token bound to basic pay.
pub const BASIC_TOKEN: &str = "basic";

const MAX_EXPRESSION_LEN: usize = 256;
const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Decimal),
    Basic,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

/// Evaluates a formula with `basic` bound to `basic_pay`.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::evaluate_formula;
/// use rust_decimal::Decimal;
///
/// let amount = evaluate_formula("basic * 0.5 + 100", Decimal::from(1000)).unwrap();
/// assert_eq!(amount, Decimal::from(600));
///
/// assert!(evaluate_formula("process.exit()", Decimal::from(1000)).is_err());
/// ```
pub fn evaluate_formula(expression: &str, basic_pay: Decimal) -> EngineResult<Decimal> {
    if expression.len() > MAX_EXPRESSION_LEN {
        return Err(invalid(expression, "expression is too long"));
    }
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(invalid(expression, "expression is empty"));
    }

    let mut parser = Parser {
        expression,
        tokens: &tokens,
        position: 0,
        basic_pay,
        depth: 0,
    };
    let value = parser.expr()?;
    if parser.position != tokens.len() {
        return Err(invalid(expression, "unexpected trailing input"));
    }
    Ok(value)
}

fn invalid(expression: &str, message: impl Into<String>) -> EngineError {
    EngineError::InvalidFormula {
        expression: expression.to_string(),
        message: message.into(),
    }
}

fn tokenize(expression: &str) -> EngineResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expression.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let number = Decimal::from_str(&literal)
                    .map_err(|_| invalid(expression, format!("invalid number '{}'", literal)))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if word.eq_ignore_ascii_case(BASIC_TOKEN) {
                    tokens.push(Token::Basic);
                } else {
                    return Err(invalid(expression, format!("unknown identifier '{}'", word)));
                }
            }
            other => {
                return Err(invalid(expression, format!("unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    expression: &'a str,
    tokens: &'a [Token],
    position: usize,
    basic_pay: Decimal,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn overflow(&self) -> EngineError {
        invalid(self.expression, "arithmetic overflow")
    }

    fn expr(&mut self) -> EngineResult<Decimal> {
        let mut value = self.term()?;
        while let Some(token) = self.peek() {
            match token {
                Token::Plus => {
                    self.advance();
                    let rhs = self.term()?;
                    value = value.checked_add(rhs).ok_or_else(|| self.overflow())?;
                }
                Token::Minus => {
                    self.advance();
                    let rhs = self.term()?;
                    value = value.checked_sub(rhs).ok_or_else(|| self.overflow())?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> EngineResult<Decimal> {
        let mut value = self.unary()?;
        while let Some(token) = self.peek() {
            match token {
                Token::Star => {
                    self.advance();
                    let rhs = self.unary()?;
                    value = value.checked_mul(rhs).ok_or_else(|| self.overflow())?;
                }
                Token::Slash => {
                    self.advance();
                    let rhs = self.unary()?;
                    if rhs.is_zero() {
                        return Err(invalid(self.expression, "division by zero"));
                    }
                    value = value.checked_div(rhs).ok_or_else(|| self.overflow())?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn unary(&mut self) -> EngineResult<Decimal> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                self.nested(|p| p.unary()).map(|v| -v)
            }
            Some(Token::Plus) => {
                self.advance();
                self.nested(|p| p.unary())
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> EngineResult<Decimal> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Basic) => Ok(self.basic_pay),
            Some(Token::LParen) => {
                let value = self.nested(|p| p.expr())?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(invalid(self.expression, "missing closing parenthesis")),
                }
            }
            Some(token) => Err(invalid(
                self.expression,
                format!("unexpected token {:?}", token),
            )),
            None => Err(invalid(self.expression, "unexpected end of expression")),
        }
    }

    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> EngineResult<Decimal>,
    ) -> EngineResult<Decimal> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(invalid(self.expression, "expression is nested too deeply"));
        }
        let result = f(self);
        self.depth -= 1;
        result
    }
}
