//! Recursive-descent parser for filter-query expressions
//!
//! Grammar (OR binds loosest, comparisons tightest):
//!
//! ```text
//! expr       := and_expr ( OR and_expr )*
//! and_expr   := primary ( AND primary )*
//! primary    := '(' expr ')' | comparison
//! comparison := reference ( op literal | LIKE string | ILIKE string )
//! reference  := ident [ '.' type_suffix ]
//! ```

use super::lexer::{tokenize, Token};
use super::FilterParseError;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Optional type disambiguation on a property reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSuffix {
    StringValue,
    IntValue,
    DoubleValue,
    BoolValue,
}

/// A reference to a built-in attribute or custom property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRef {
    pub name: String,
    pub type_suffix: Option<TypeSuffix>,
}

/// Comparison literal
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
}

/// Parsed filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare {
        target: PropertyRef,
        op: CompareOp,
        value: Literal,
    },
    Like {
        target: PropertyRef,
        pattern: String,
        case_insensitive: bool,
    },
}

/// Parse a filter query into an expression tree.
pub fn parse(input: &str) -> Result<Expr, FilterParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(FilterParseError::new("unexpected trailing tokens"));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<Expr, FilterParseError> {
        let mut left = self.and_expr()?;
        while self.peek() == Some(&Token::Or) {
            self.next();
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, FilterParseError> {
        let mut left = self.primary()?;
        while self.peek() == Some(&Token::And) {
            self.next();
            let right = self.primary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<Expr, FilterParseError> {
        if self.peek() == Some(&Token::LParen) {
            self.next();
            let expr = self.expr()?;
            match self.next() {
                Some(Token::RParen) => Ok(expr),
                _ => Err(FilterParseError::new("expected ')'")),
            }
        } else {
            self.comparison()
        }
    }

    fn comparison(&mut self) -> Result<Expr, FilterParseError> {
        let target = match self.next() {
            Some(Token::Ident(name)) => parse_reference(&name)?,
            other => {
                return Err(FilterParseError::new(format!(
                    "expected attribute or property reference, got {:?}",
                    other
                )));
            }
        };

        match self.next() {
            Some(Token::Like) => Ok(Expr::Like {
                target,
                pattern: self.string_literal()?,
                case_insensitive: false,
            }),
            Some(Token::ILike) => Ok(Expr::Like {
                target,
                pattern: self.string_literal()?,
                case_insensitive: true,
            }),
            Some(token) => {
                let op = match token {
                    Token::Eq => CompareOp::Eq,
                    Token::Ne => CompareOp::Ne,
                    Token::Lt => CompareOp::Lt,
                    Token::Le => CompareOp::Le,
                    Token::Gt => CompareOp::Gt,
                    Token::Ge => CompareOp::Ge,
                    other => {
                        return Err(FilterParseError::new(format!(
                            "expected comparison operator, got {:?}",
                            other
                        )));
                    }
                };
                let value = match self.next() {
                    Some(Token::String(s)) => Literal::String(s),
                    Some(Token::Number(n)) => Literal::Number(n),
                    Some(Token::Bool(b)) => Literal::Bool(b),
                    other => {
                        return Err(FilterParseError::new(format!(
                            "expected literal, got {:?}",
                            other
                        )));
                    }
                };
                Ok(Expr::Compare { target, op, value })
            }
            None => Err(FilterParseError::new("expected operator")),
        }
    }

    fn string_literal(&mut self) -> Result<String, FilterParseError> {
        match self.next() {
            Some(Token::String(s)) => Ok(s),
            other => Err(FilterParseError::new(format!(
                "LIKE requires a string pattern, got {:?}",
                other
            ))),
        }
    }
}

fn parse_reference(raw: &str) -> Result<PropertyRef, FilterParseError> {
    match raw.rsplit_once('.') {
        Some((name, suffix)) => {
            let type_suffix = match suffix {
                "string_value" => Some(TypeSuffix::StringValue),
                "int_value" => Some(TypeSuffix::IntValue),
                "double_value" => Some(TypeSuffix::DoubleValue),
                "bool_value" => Some(TypeSuffix::BoolValue),
                other => {
                    return Err(FilterParseError::new(format!(
                        "unknown property type suffix '{}'",
                        other
                    )));
                }
            };
            if name.is_empty() {
                return Err(FilterParseError::new("empty property reference"));
            }
            Ok(PropertyRef {
                name: name.to_string(),
                type_suffix,
            })
        }
        None => Ok(PropertyRef {
            name: raw.to_string(),
            type_suffix: None,
        }),
    }
}
