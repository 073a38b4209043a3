//! Turns rule strings such as `temperature > 80 && vibration < 50` into an [`Expression`].

use crate::ast::Expression;
use crate::error::ConditionError;

pub mod lexer;
mod parser;

use parser::Parser;

/// Parses a rule string into its AST.
pub fn parse_rule(rule: &str) -> Result<Expression, ConditionError> {
    if rule.trim().is_empty() {
        return Err(ConditionError::Empty);
    }
    let tokens = lexer::tokenize(rule)?;
    Parser::new(&tokens, rule.chars().count()).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Value, VariablePath};

    fn var(name: &str) -> Box<Expression> {
        Box::new(Expression::Variable(VariablePath::parse(name)))
    }

    fn num(n: f64) -> Box<Expression> {
        Box::new(Expression::Literal(Value::Number(n)))
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse_rule("a > 1 || b > 2 && c > 3").unwrap();
        assert_eq!(
            expr,
            Expression::Or(
                Box::new(Expression::GreaterThan(var("a"), num(1.0))),
                Box::new(Expression::And(
                    Box::new(Expression::GreaterThan(var("b"), num(2.0))),
                    Box::new(Expression::GreaterThan(var("c"), num(3.0))),
                )),
            )
        );
    }

    #[test]
    fn arithmetic_precedence() {
        let expr = parse_rule("a + b * 2").unwrap();
        assert_eq!(
            expr,
            Expression::Sum(var("a"), Box::new(Expression::Multiply(var("b"), num(2.0))))
        );
    }

    #[test]
    fn negative_literals_fold() {
        assert_eq!(
            parse_rule("delta > -5").unwrap(),
            Expression::GreaterThan(var("delta"), num(-5.0))
        );
    }

    #[test]
    fn empty_rule_is_rejected() {
        assert_eq!(parse_rule("   "), Err(ConditionError::Empty));
    }

    #[test]
    fn chained_comparison_is_rejected() {
        assert!(matches!(
            parse_rule("1 < a < 3"),
            Err(ConditionError::Syntax { .. })
        ));
    }

    #[test]
    fn missing_parenthesis_reports_end_position() {
        assert_eq!(
            parse_rule("(a > 1"),
            Err(ConditionError::Syntax {
                position: 6,
                message: "missing closing parenthesis".to_string(),
            })
        );
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert!(parse_rule("a > 1 b").is_err());
    }
}
