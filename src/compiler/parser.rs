use super::lexer::{Operator, Token, TokenKind};
use crate::ast::{Expression, Value, VariablePath};
use crate::error::ConditionError;

/// Recursive-descent parser over a token stream.
///
/// Precedence, lowest first: `||`, `&&`, `!`, comparisons, `+ -`, `* /`, unary `-`.
pub(super) struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    source_len: usize,
}

impl<'a> Parser<'a> {
    pub(super) fn new(tokens: &'a [Token], source_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            source_len,
        }
    }

    pub(super) fn parse(mut self) -> Result<Expression, ConditionError> {
        let expr = self.parse_or()?;
        if let Some(token) = self.peek() {
            return Err(ConditionError::Syntax {
                position: token.position,
                message: format!("unexpected {}", describe(&token.kind)),
            });
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_op(&self) -> Option<Operator> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Op(op),
                ..
            }) => Some(*op),
            _ => None,
        }
    }

    fn end_position(&self) -> usize {
        self.source_len
    }

    fn parse_or(&mut self) -> Result<Expression, ConditionError> {
        let mut left = self.parse_and()?;
        while self.peek_op() == Some(Operator::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ConditionError> {
        let mut left = self.parse_not()?;
        while self.peek_op() == Some(Operator::And) {
            self.pos += 1;
            let right = self.parse_not()?;
            left = Expression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expression, ConditionError> {
        if self.peek_op() == Some(Operator::Bang) {
            self.pos += 1;
            let inner = self.parse_not()?;
            return Ok(Expression::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expression, ConditionError> {
        let left = self.parse_additive()?;
        let constructor: fn(Box<Expression>, Box<Expression>) -> Expression = match self.peek_op()
        {
            Some(Operator::Gt) => Expression::GreaterThan,
            Some(Operator::GtEq) => Expression::GreaterThanOrEqual,
            Some(Operator::Lt) => Expression::SmallerThan,
            Some(Operator::LtEq) => Expression::SmallerThanOrEqual,
            Some(Operator::Eq) => Expression::Equal,
            Some(Operator::NotEq) => Expression::NotEqual,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.parse_additive()?;

        if let Some(op) = self.peek_op() {
            if matches!(
                op,
                Operator::Gt
                    | Operator::GtEq
                    | Operator::Lt
                    | Operator::LtEq
                    | Operator::Eq
                    | Operator::NotEq
            ) {
                let position = self.peek().map_or(self.end_position(), |t| t.position);
                return Err(ConditionError::Syntax {
                    position,
                    message: "comparisons cannot be chained, combine them with '&&'".to_string(),
                });
            }
        }
        Ok(constructor(Box::new(left), Box::new(right)))
    }

    fn parse_additive(&mut self) -> Result<Expression, ConditionError> {
        let mut left = self.parse_term()?;
        loop {
            match self.peek_op() {
                Some(Operator::Plus) => {
                    self.pos += 1;
                    let right = self.parse_term()?;
                    left = Expression::Sum(Box::new(left), Box::new(right));
                }
                Some(Operator::Minus) => {
                    self.pos += 1;
                    let right = self.parse_term()?;
                    left = Expression::Subtract(Box::new(left), Box::new(right));
                }
                _ => return Ok(left),
            }
        }
    }

    fn parse_term(&mut self) -> Result<Expression, ConditionError> {
        let mut left = self.parse_unary()?;
        loop {
            match self.peek_op() {
                Some(Operator::Star) => {
                    self.pos += 1;
                    let right = self.parse_unary()?;
                    left = Expression::Multiply(Box::new(left), Box::new(right));
                }
                Some(Operator::Slash) => {
                    self.pos += 1;
                    let right = self.parse_unary()?;
                    left = Expression::Divide(Box::new(left), Box::new(right));
                }
                _ => return Ok(left),
            }
        }
    }

    fn parse_unary(&mut self) -> Result<Expression, ConditionError> {
        if self.peek_op() == Some(Operator::Minus) {
            self.pos += 1;
            let inner = self.parse_unary()?;
            return Ok(match inner {
                Expression::Literal(Value::Number(n)) => Expression::Literal(Value::Number(-n)),
                other => Expression::Negate(Box::new(other)),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expression, ConditionError> {
        let Some(token) = self.peek() else {
            return Err(ConditionError::Syntax {
                position: self.end_position(),
                message: "unexpected end of expression".to_string(),
            });
        };
        self.pos += 1;

        match &token.kind {
            TokenKind::Number(n) => Ok(Expression::Literal(Value::Number(*n))),
            TokenKind::Str(s) => Ok(Expression::Literal(Value::Str(s.clone()))),
            TokenKind::Ident(name) => Ok(match name.as_str() {
                "true" => Expression::Literal(Value::Bool(true)),
                "false" => Expression::Literal(Value::Bool(false)),
                "null" => Expression::Literal(Value::Null),
                _ => Expression::Variable(VariablePath::parse(name)),
            }),
            TokenKind::LParen => {
                let expr = self.parse_or()?;
                match self.peek() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => {
                        self.pos += 1;
                        Ok(expr)
                    }
                    Some(other) => Err(ConditionError::Syntax {
                        position: other.position,
                        message: format!("expected ')', found {}", describe(&other.kind)),
                    }),
                    None => Err(ConditionError::Syntax {
                        position: self.end_position(),
                        message: "missing closing parenthesis".to_string(),
                    }),
                }
            }
            other => Err(ConditionError::Syntax {
                position: token.position,
                message: format!("unexpected {}", describe(other)),
            }),
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(n) => format!("number {}", Value::Number(*n)),
        TokenKind::Str(s) => format!("string \"{}\"", s),
        TokenKind::Ident(name) => format!("identifier '{}'", name),
        TokenKind::Op(op) => format!("operator '{}'", op.symbol()),
        TokenKind::LParen => "'('".to_string(),
        TokenKind::RParen => "')'".to_string(),
    }
}
