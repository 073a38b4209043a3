use crate::ast::{EvaluationTrace, Expression, Value, is_truthy};
use crate::error::ConditionError;
use serde_json::Map;

/// Walks a condition AST against the global data, recording a trace as it goes.
pub(super) struct AstEngine<'a> {
    data: &'a Map<String, serde_json::Value>,
}

impl<'a> AstEngine<'a> {
    pub(super) fn new(data: &'a Map<String, serde_json::Value>) -> Self {
        Self { data }
    }

    /// Evaluates `expr` in a boolean position.
    pub(super) fn evaluate_condition(
        &self,
        expr: &Expression,
    ) -> Result<(bool, EvaluationTrace), ConditionError> {
        match expr {
            Expression::Variable(path) => {
                let raw = path
                    .resolve(self.data)
                    .ok_or_else(|| ConditionError::VariableNotFound(path.dotted()))?;
                let truthy = is_truthy(raw);
                let value = Value::from_json(raw).unwrap_or(Value::Bool(truthy));
                Ok((
                    truthy,
                    EvaluationTrace::Leaf {
                        source: path.to_string(),
                        value,
                    },
                ))
            }
            Expression::Literal(Value::Bool(b)) => Ok((
                *b,
                EvaluationTrace::Leaf {
                    source: b.to_string(),
                    value: Value::Bool(*b),
                },
            )),
            Expression::Not(inner) => {
                let (b, child) = self.evaluate_condition(inner)?;
                Ok((
                    !b,
                    EvaluationTrace::Unary {
                        symbol: "!",
                        operand: Box::new(child),
                        outcome: Value::Bool(!b),
                    },
                ))
            }
            Expression::And(l, r) => self.short_circuit("&&", l, r, false),
            Expression::Or(l, r) => self.short_circuit("||", l, r, true),
            other => {
                let trace = self.evaluate_value(other)?;
                match trace.outcome() {
                    Value::Bool(b) => Ok((b, trace)),
                    found => Err(ConditionError::TypeMismatch {
                        operation: "condition".to_string(),
                        expected: "Bool".to_string(),
                        found: found.to_string(),
                    }),
                }
            }
        }
    }

    /// `decisive` is the left-hand outcome that makes the right-hand side irrelevant.
    fn short_circuit(
        &self,
        symbol: &'static str,
        l: &Expression,
        r: &Expression,
        decisive: bool,
    ) -> Result<(bool, EvaluationTrace), ConditionError> {
        let (left, left_trace) = self.evaluate_condition(l)?;
        if left == decisive {
            return Ok((
                left,
                EvaluationTrace::Binary {
                    symbol,
                    left: Box::new(left_trace),
                    right: Box::new(EvaluationTrace::Skipped),
                    outcome: Value::Bool(left),
                },
            ));
        }
        let (right, right_trace) = self.evaluate_condition(r)?;
        Ok((
            right,
            EvaluationTrace::Binary {
                symbol,
                left: Box::new(left_trace),
                right: Box::new(right_trace),
                outcome: Value::Bool(right),
            },
        ))
    }

    /// Evaluates `expr` to a value; the trace outcome holds the result.
    pub(super) fn evaluate_value(
        &self,
        expr: &Expression,
    ) -> Result<EvaluationTrace, ConditionError> {
        match expr {
            Expression::Literal(v) => Ok(EvaluationTrace::Leaf {
                source: v.to_string(),
                value: v.clone(),
            }),
            Expression::Variable(path) => {
                let raw = path
                    .resolve(self.data)
                    .ok_or_else(|| ConditionError::VariableNotFound(path.dotted()))?;
                let value = Value::from_json(raw).ok_or_else(|| ConditionError::TypeMismatch {
                    operation: path.to_string(),
                    expected: "a scalar value".to_string(),
                    found: raw.to_string(),
                })?;
                Ok(EvaluationTrace::Leaf {
                    source: path.to_string(),
                    value,
                })
            }
            Expression::Negate(inner) => {
                let child = self.evaluate_value(inner)?;
                let n = expect_number("-", &child.outcome())?;
                Ok(EvaluationTrace::Unary {
                    symbol: "-",
                    operand: Box::new(child),
                    outcome: Value::Number(-n),
                })
            }
            Expression::Sum(l, r) => self.arithmetic("+", l, r, |a, b| Ok(a + b)),
            Expression::Subtract(l, r) => self.arithmetic("-", l, r, |a, b| Ok(a - b)),
            Expression::Multiply(l, r) => self.arithmetic("*", l, r, |a, b| Ok(a * b)),
            Expression::Divide(l, r) => self.arithmetic("/", l, r, |a, b| {
                if b == 0.0 {
                    Err(ConditionError::DivisionByZero)
                } else {
                    Ok(a / b)
                }
            }),
            Expression::Equal(l, r) => self.comparison("==", l, r),
            Expression::NotEqual(l, r) => self.comparison("!=", l, r),
            Expression::GreaterThan(l, r) => self.comparison(">", l, r),
            Expression::GreaterThanOrEqual(l, r) => self.comparison(">=", l, r),
            Expression::SmallerThan(l, r) => self.comparison("<", l, r),
            Expression::SmallerThanOrEqual(l, r) => self.comparison("<=", l, r),
            Expression::Not(_) | Expression::And(..) | Expression::Or(..) => {
                self.evaluate_condition(expr).map(|(_, trace)| trace)
            }
        }
    }

    fn arithmetic(
        &self,
        symbol: &'static str,
        l: &Expression,
        r: &Expression,
        apply: impl Fn(f64, f64) -> Result<f64, ConditionError>,
    ) -> Result<EvaluationTrace, ConditionError> {
        let left = self.evaluate_value(l)?;
        let right = self.evaluate_value(r)?;
        let a = expect_number(symbol, &left.outcome())?;
        let b = expect_number(symbol, &right.outcome())?;
        let result = apply(a, b)?;
        if !result.is_finite() {
            return Err(ConditionError::Overflow(symbol.to_string()));
        }
        Ok(EvaluationTrace::Binary {
            symbol,
            left: Box::new(left),
            right: Box::new(right),
            outcome: Value::Number(result),
        })
    }

    fn comparison(
        &self,
        symbol: &'static str,
        l: &Expression,
        r: &Expression,
    ) -> Result<EvaluationTrace, ConditionError> {
        let left = self.evaluate_value(l)?;
        let right = self.evaluate_value(r)?;
        let outcome = compare(symbol, &left.outcome(), &right.outcome())?;
        Ok(EvaluationTrace::Binary {
            symbol,
            left: Box::new(left),
            right: Box::new(right),
            outcome: Value::Bool(outcome),
        })
    }
}

fn expect_number(operation: &str, value: &Value) -> Result<f64, ConditionError> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(ConditionError::TypeMismatch {
            operation: operation.to_string(),
            expected: "Number".to_string(),
            found: other.to_string(),
        }),
    }
}

fn compare(symbol: &str, left: &Value, right: &Value) -> Result<bool, ConditionError> {
    let mismatch = || ConditionError::TypeMismatch {
        operation: symbol.to_string(),
        expected: format!("comparable operands (left is {})", left.type_name()),
        found: right.to_string(),
    };

    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(match symbol {
            ">" => a > b,
            "<" => a < b,
            ">=" => a >= b,
            "<=" => a <= b,
            "==" => (a - b).abs() < f64::EPSILON,
            "!=" => (a - b).abs() >= f64::EPSILON,
            _ => return Err(mismatch()),
        }),
        (Value::Str(a), Value::Str(b)) => Ok(match symbol {
            ">" => a > b,
            "<" => a < b,
            ">=" => a >= b,
            "<=" => a <= b,
            "==" => a == b,
            "!=" => a != b,
            _ => return Err(mismatch()),
        }),
        (Value::Bool(_), Value::Bool(_)) | (Value::Null, _) | (_, Value::Null) => {
            match symbol {
                "==" => Ok(left == right),
                "!=" => Ok(left != right),
                _ => Err(mismatch()),
            }
        }
        _ => Err(mismatch()),
    }
}
