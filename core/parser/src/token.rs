//! FILENAME: core/parser/src/token.rs
//! PURPOSE: Token definitions for the expression lexer.
//! CONTEXT: Tokens are the atomic units produced by the lexer and consumed by the parser.

/// Tokens recognized by the expression lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    // Literals
    Number(f64),
    /// A named variable such as `revenue` or `cost_of_sales`.
    Identifier(String),
    /// A positional row reference: `@10`.
    OrderRef(u32),

    // Operators
    Plus,
    Minus,
    Asterisk,
    Slash,

    // Delimiters
    LParen,
    RParen,

    // Special
    EOF,
}

/// A token together with the 0-based character offset where it starts.
#[derive(Debug, PartialEq, Clone)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

impl Spanned {
    pub fn new(token: Token, position: usize) -> Self {
        Spanned { token, position }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::OrderRef(n) => write!(f, "@{}", n),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Asterisk => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::EOF => write!(f, "end of input"),
        }
    }
}
