//! FILENAME: core/parser/src/parser.rs
//! PURPOSE: Recursive descent parser that converts a stream of Tokens into an AST.
//! CONTEXT: This is the second stage of the parsing pipeline. It takes tokens
//! from the Lexer and builds an Expression tree that can be evaluated.
//!
//! GRAMMAR:
//!   expression     --> additive
//!   additive       --> multiplicative ( ("+" | "-") multiplicative )*
//!   multiplicative --> unary ( ("*" | "/") unary )*
//!   unary          --> ("+" | "-") unary | primary
//!   primary        --> NUMBER | IDENTIFIER | ORDER_REF | "(" expression ")"

use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::lexer::Lexer;
use crate::token::{Spanned, Token};
use thiserror::Error;

/// Syntax error with the character offset where it was detected.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
#[error("Syntax error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// The Parser struct holds the lexer and current token state.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Spanned,
}

impl<'a> Parser<'a> {
    /// Creates a new parser from an input string.
    /// Fails if the very first token cannot be scanned.
    pub fn new(input: &'a str) -> ParseResult<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Parser { lexer, current })
    }

    /// Parses the entire input and returns the AST.
    pub fn parse(&mut self) -> ParseResult<Expression> {
        if self.current.token == Token::EOF {
            return Err(ParseError::new("Empty expression", self.current.position));
        }

        let expr = self.parse_expression()?;

        // Ensure we consumed all tokens
        if self.current.token != Token::EOF {
            return Err(ParseError::new(
                format!("Unexpected token after expression: '{}'", self.current.token),
                self.current.position,
            ));
        }

        Ok(expr)
    }

    /// Advances to the next token.
    fn advance(&mut self) -> ParseResult<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    /// Entry point for expression parsing.
    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_additive()
    }

    /// Parses additive expressions (+ and -).
    fn parse_additive(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current.token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_multiplicative()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parses multiplicative expressions (* and /).
    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current.token {
                Token::Asterisk => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_unary()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parses unary expressions (sign prefixes).
    fn parse_unary(&mut self) -> ParseResult<Expression> {
        let op = match &self.current.token {
            Token::Plus => UnaryOperator::Plus,
            Token::Minus => UnaryOperator::Negate,
            _ => return self.parse_primary(),
        };

        self.advance()?;
        let operand = self.parse_unary()?;
        Ok(Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    /// Parses primary expressions (literals, references, parentheses).
    fn parse_primary(&mut self) -> ParseResult<Expression> {
        let position = self.current.position;
        match self.current.token.clone() {
            Token::Number(n) => {
                self.advance()?;
                Ok(Expression::Number(n))
            }

            Token::Identifier(name) => {
                self.advance()?;
                Ok(Expression::Variable(name))
            }

            Token::OrderRef(order) => {
                self.advance()?;
                Ok(Expression::OrderRef(order))
            }

            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                if self.current.token != Token::RParen {
                    return Err(ParseError::new(
                        format!(
                            "Expected ')' to close '(' at position {}, found '{}'",
                            position, self.current.token
                        ),
                        self.current.position,
                    ));
                }
                self.advance()?;
                Ok(expr)
            }

            Token::EOF => Err(ParseError::new("Unexpected end of expression", position)),

            token => Err(ParseError::new(
                format!("Unexpected token: '{}'", token),
                position,
            )),
        }
    }
}

/// Convenience function to parse an expression string directly.
pub fn parse(input: &str) -> ParseResult<Expression> {
    let mut parser = Parser::new(input)?;
    parser.parse()
}
