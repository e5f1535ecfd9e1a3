//! FILENAME: core/parser/src/ast.rs
//! PURPOSE: Defines the Abstract Syntax Tree (AST) for statement expressions.
//! CONTEXT: After the Lexer tokenizes an expression string, the Parser converts
//! those tokens into this tree structure. The evaluator then traverses
//! this tree to compute the final result.
//!
//! SUPPORTED EXPRESSIONS:
//! - Number literals: 2, 0.25
//! - Variable references: revenue
//! - Order references: @10 (a previously computed layout row)
//! - Binary operations: +, -, *, /
//! - Unary operations: + (identity), - (negation)

/// Represents a parsed expression.
#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    /// A numeric literal.
    Number(f64),

    /// A named variable resolved from the movement data.
    Variable(String),

    /// A reference to the row with the given layout order.
    OrderRef(u32),

    /// A binary operation: left op right.
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },

    /// A unary operation: op operand.
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
}

impl Expression {
    /// The context key used for an order reference, e.g. `@10`.
    pub fn order_token(order: u32) -> String {
        format!("@{}", order)
    }
}

/// Binary operators, in precedence groups (additive below multiplicative).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOperator {
    Add,      // +
    Subtract, // -
    Multiply, // *
    Divide,   // /
}

/// Unary operators.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOperator {
    Plus,   // +
    Negate, // -
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOperator::Add => write!(f, "+"),
            BinaryOperator::Subtract => write!(f, "-"),
            BinaryOperator::Multiply => write!(f, "*"),
            BinaryOperator::Divide => write!(f, "/"),
        }
    }
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOperator::Plus => write!(f, "+"),
            UnaryOperator::Negate => write!(f, "-"),
        }
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Number(n) => write!(f, "{}", n),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::OrderRef(order) => write!(f, "@{}", order),
            Expression::BinaryOp { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Expression::UnaryOp { op, operand } => write!(f, "{}{}", op, operand),
        }
    }
}
