//! FILENAME: core/parser/src/lexer.rs
//! PURPOSE: Scans a raw expression string and produces a stream of Tokens.
//! CONTEXT: This is the first stage of the parsing pipeline. It handles
//! whitespace skipping, number parsing, identifiers and order references.
//! Unlike a forgiving spreadsheet lexer, an unknown character is a hard
//! syntax error carrying its position.
//!
//! SUPPORTED TOKENS:
//! - Numbers: 12, 12.5, .5 (one decimal point at most)
//! - Identifiers: revenue, cost_of_sales, _tmp1
//! - Order references: @10
//! - Operators: + - * / ( )

use crate::parser::{ParseError, ParseResult};
use crate::token::{Spanned, Token};
use std::iter::Peekable;
use std::str::Chars;

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    /// Character offset of the next unread character.
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input: input.chars().peekable(),
            position: 0,
        }
    }

    /// Advances the lexer and returns the next token with its start position.
    pub fn next_token(&mut self) -> ParseResult<Spanned> {
        self.skip_whitespace();

        let start = self.position;
        let token = match self.bump() {
            Some('+') => Token::Plus,
            Some('-') => Token::Minus,
            Some('*') => Token::Asterisk,
            Some('/') => Token::Slash,
            Some('(') => Token::LParen,
            Some(')') => Token::RParen,

            Some('@') => self.read_order_ref(start)?,

            Some(ch) if ch.is_ascii_digit() || ch == '.' => self.read_number(ch, start)?,

            Some(ch) if is_identifier_start(ch) => self.read_identifier(ch),

            None => Token::EOF,

            Some(ch) => {
                return Err(ParseError::new(
                    format!("Unexpected character '{}'", ch),
                    start,
                ))
            }
        };

        Ok(Spanned::new(token, start))
    }

    /// Tokenizes the whole input, including the trailing EOF token.
    pub fn tokenize(mut self) -> ParseResult<Vec<Spanned>> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::EOF;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.input.next();
        if ch.is_some() {
            self.position += 1;
        }
        ch
    }

    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.input.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.bump();
        }
    }

    /// Reads the digits after '@'. A bare '@' is rejected.
    fn read_order_ref(&mut self, start: usize) -> ParseResult<Token> {
        let mut digits = String::new();
        while let Some(&ch) = self.input.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            digits.push(ch);
            self.bump();
        }

        if digits.is_empty() {
            return Err(ParseError::new(
                "Expected digits after '@' in order reference",
                start,
            ));
        }

        digits
            .parse::<u32>()
            .map(Token::OrderRef)
            .map_err(|_| ParseError::new(format!("Order reference out of range: @{}", digits), start))
    }

    fn read_number(&mut self, first_char: char, start: usize) -> ParseResult<Token> {
        let mut number_str = String::from(first_char);
        let mut has_dot = first_char == '.';

        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_digit() {
                number_str.push(ch);
                self.bump();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                number_str.push(ch);
                self.bump();
            } else {
                break;
            }
        }

        number_str
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| ParseError::new(format!("Invalid number '{}'", number_str), start))
    }

    fn read_identifier(&mut self, first_char: char) -> Token {
        let mut ident = String::from(first_char);

        while let Some(&ch) = self.input.peek() {
            if is_identifier_start(ch) || ch.is_ascii_digit() {
                ident.push(ch);
                self.bump();
            } else {
                break;
            }
        }

        // Variable names are case-sensitive, no normalization.
        Token::Identifier(ident)
    }
}

/// Returns true if `ch` can start an identifier.
fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}
