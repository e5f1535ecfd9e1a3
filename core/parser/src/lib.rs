//! FILENAME: core/parser/src/lib.rs
//! PURPOSE: Library root for the statement expression parser.
//! CONTEXT: This module exposes the lexer, parser, and AST components
//! needed to convert calculated-row expressions into evaluatable trees.
//!
//! PIPELINE: Expression String --> Lexer --> Tokens --> Parser --> AST --> Evaluator
//!
//! SUPPORTED FEATURES:
//! - Arithmetic: +, -, *, /
//! - Unary sign: -revenue, +5
//! - Variable references: revenue, cost_of_sales
//! - Order references: @10
//! - Parentheses for grouping

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

#[cfg(test)]
mod tests;

// Re-export commonly used types for convenience
pub use ast::{BinaryOperator, Expression, UnaryOperator};
pub use lexer::Lexer;
pub use parser::{parse, ParseError, ParseResult, Parser};
pub use token::{Spanned, Token};
