//! FILENAME: core/parser/src/tests.rs
//! PURPOSE: Consolidated unit tests for the parser crate.

use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::lexer::Lexer;
use crate::parser::parse;
use crate::token::Token;

fn num(n: f64) -> Box<Expression> {
    Box::new(Expression::Number(n))
}

fn var(name: &str) -> Box<Expression> {
    Box::new(Expression::Variable(name.to_string()))
}

// ========================================
// LEXER TESTS
// ========================================

#[test]
fn lexer_tokenizes_simple_math() {
    let tokens: Vec<Token> = Lexer::new("1 + 2.5")
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|s| s.token)
        .collect();

    assert_eq!(
        tokens,
        vec![Token::Number(1.0), Token::Plus, Token::Number(2.5), Token::EOF]
    );
}

#[test]
fn lexer_records_positions() {
    let tokens = Lexer::new("  revenue*@10").tokenize().unwrap();
    assert_eq!(tokens[0].token, Token::Identifier("revenue".to_string()));
    assert_eq!(tokens[0].position, 2);
    assert_eq!(tokens[1].token, Token::Asterisk);
    assert_eq!(tokens[1].position, 9);
    assert_eq!(tokens[2].token, Token::OrderRef(10));
    assert_eq!(tokens[2].position, 10);
    assert_eq!(tokens[3].token, Token::EOF);
    assert_eq!(tokens[3].position, 13);
}

#[test]
fn lexer_preserves_identifier_case() {
    let mut lexer = Lexer::new("Gross_Margin2");
    assert_eq!(
        lexer.next_token().unwrap().token,
        Token::Identifier("Gross_Margin2".to_string())
    );
}

#[test]
fn lexer_accepts_leading_decimal_point() {
    let mut lexer = Lexer::new(".25");
    assert_eq!(lexer.next_token().unwrap().token, Token::Number(0.25));
}

#[test]
fn lexer_rejects_bare_at_sign() {
    let err = Lexer::new("@ + 1").tokenize().unwrap_err();
    assert_eq!(err.position, 0);
    assert!(err.message.contains("'@'"));
}

#[test]
fn lexer_rejects_unknown_character() {
    let err = Lexer::new("revenue % 2").tokenize().unwrap_err();
    assert_eq!(err.position, 8);
    assert!(err.to_string().contains("position 8"));
    assert!(err.message.contains('%'));
}

#[test]
fn lexer_rejects_lone_dot() {
    assert!(Lexer::new(".").tokenize().is_err());
}

// ========================================
// PARSER TESTS - PRIMARIES
// ========================================

#[test]
fn parser_parses_number_literal() {
    assert_eq!(parse("42").unwrap(), Expression::Number(42.0));
}

#[test]
fn parser_parses_variable() {
    assert_eq!(
        parse("revenue").unwrap(),
        Expression::Variable("revenue".to_string())
    );
}

#[test]
fn parser_parses_order_reference() {
    assert_eq!(parse("@120").unwrap(), Expression::OrderRef(120));
}

#[test]
fn parser_parses_parenthesized_expression() {
    assert_eq!(parse("((7))").unwrap(), Expression::Number(7.0));
}

// ========================================
// PARSER TESTS - OPERATORS AND PRECEDENCE
// ========================================

#[test]
fn parser_respects_multiplicative_precedence() {
    let result = parse("2 + 3 * 4").unwrap();
    assert_eq!(
        result,
        Expression::BinaryOp {
            left: num(2.0),
            op: BinaryOperator::Add,
            right: Box::new(Expression::BinaryOp {
                left: num(3.0),
                op: BinaryOperator::Multiply,
                right: num(4.0),
            }),
        }
    );
}

#[test]
fn parser_groups_with_parentheses() {
    let result = parse("(2 + 3) * 4").unwrap();
    assert_eq!(
        result,
        Expression::BinaryOp {
            left: Box::new(Expression::BinaryOp {
                left: num(2.0),
                op: BinaryOperator::Add,
                right: num(3.0),
            }),
            op: BinaryOperator::Multiply,
            right: num(4.0),
        }
    );
}

#[test]
fn parser_is_left_associative() {
    let result = parse("a - b - c").unwrap();
    assert_eq!(
        result,
        Expression::BinaryOp {
            left: Box::new(Expression::BinaryOp {
                left: var("a"),
                op: BinaryOperator::Subtract,
                right: var("b"),
            }),
            op: BinaryOperator::Subtract,
            right: var("c"),
        }
    );
}

#[test]
fn parser_handles_nested_unary() {
    let result = parse("- -revenue").unwrap();
    assert_eq!(
        result,
        Expression::UnaryOp {
            op: UnaryOperator::Negate,
            operand: Box::new(Expression::UnaryOp {
                op: UnaryOperator::Negate,
                operand: var("revenue"),
            }),
        }
    );
}

#[test]
fn parser_unary_binds_tighter_than_multiplication() {
    let result = parse("-@10 * 2").unwrap();
    assert_eq!(
        result,
        Expression::BinaryOp {
            left: Box::new(Expression::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(Expression::OrderRef(10)),
            }),
            op: BinaryOperator::Multiply,
            right: num(2.0),
        }
    );
}

#[test]
fn parser_accepts_unary_plus() {
    let result = parse("+5").unwrap();
    assert_eq!(
        result,
        Expression::UnaryOp {
            op: UnaryOperator::Plus,
            operand: num(5.0),
        }
    );
}

// ========================================
// PARSER TESTS - ERRORS
// ========================================

#[test]
fn parser_rejects_empty_expression() {
    let err = parse("   ").unwrap_err();
    assert!(err.message.contains("Empty"));
}

#[test]
fn parser_rejects_missing_closing_paren() {
    let err = parse("(1 + 2").unwrap_err();
    assert!(err.message.contains("')'"));
    assert_eq!(err.position, 6);
}

#[test]
fn parser_rejects_unexpected_end() {
    let err = parse("revenue +").unwrap_err();
    assert!(err.message.contains("Unexpected end"));
    assert_eq!(err.position, 9);
}

#[test]
fn parser_rejects_trailing_tokens() {
    let err = parse("1 2").unwrap_err();
    assert!(err.message.contains("after expression"));
    assert_eq!(err.position, 2);
}

#[test]
fn parser_rejects_unexpected_token() {
    let err = parse("* 3").unwrap_err();
    assert!(err.message.contains("'*'"));
    assert_eq!(err.position, 0);
}

#[test]
fn parser_rejects_stray_closing_paren() {
    assert!(parse("1 + 2)").is_err());
}

#[test]
fn parser_surfaces_lexer_errors() {
    let err = parse("revenue + $").unwrap_err();
    assert_eq!(err.position, 10);
}

#[test]
fn display_round_trips_structure() {
    let expr = parse("revenue - @10 / 2").unwrap();
    assert_eq!(expr.to_string(), "(revenue - (@10 / 2))");
}
