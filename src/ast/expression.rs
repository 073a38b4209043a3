use super::Value;
use std::collections::BTreeSet;
use std::fmt;

/// A dotted reference into the global data, e.g. `sensor.temperature`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariablePath {
    pub segments: Vec<String>,
}

impl VariablePath {
    pub fn parse(raw: &str) -> Self {
        Self {
            segments: raw.split('.').map(str::to_string).collect(),
        }
    }

    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }

    /// Walks the path through nested JSON objects.
    pub fn resolve<'a>(
        &self,
        data: &'a serde_json::Map<String, serde_json::Value>,
    ) -> Option<&'a serde_json::Value> {
        let (first, rest) = self.segments.split_first()?;
        let mut current = data.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

impl fmt::Display for VariablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.dotted())
    }
}

/// The Abstract Syntax Tree of a parsed condition or computed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    // Arithmetic
    Sum(Box<Expression>, Box<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
    Multiply(Box<Expression>, Box<Expression>),
    Divide(Box<Expression>, Box<Expression>),
    Negate(Box<Expression>),

    // Logical
    Not(Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),

    // Comparison
    Equal(Box<Expression>, Box<Expression>),
    NotEqual(Box<Expression>, Box<Expression>),
    GreaterThan(Box<Expression>, Box<Expression>),
    GreaterThanOrEqual(Box<Expression>, Box<Expression>),
    SmallerThan(Box<Expression>, Box<Expression>),
    SmallerThanOrEqual(Box<Expression>, Box<Expression>),

    // Leaf nodes
    Literal(Value),
    Variable(VariablePath),
}

impl Expression {
    /// Collects the dotted names of every variable the expression reads.
    pub fn collect_variables(&self, variables: &mut BTreeSet<String>) {
        match self {
            Expression::Variable(path) => {
                variables.insert(path.dotted());
            }
            Expression::Sum(l, r)
            | Expression::Subtract(l, r)
            | Expression::Multiply(l, r)
            | Expression::Divide(l, r)
            | Expression::And(l, r)
            | Expression::Or(l, r)
            | Expression::Equal(l, r)
            | Expression::NotEqual(l, r)
            | Expression::GreaterThan(l, r)
            | Expression::GreaterThanOrEqual(l, r)
            | Expression::SmallerThan(l, r)
            | Expression::SmallerThanOrEqual(l, r) => {
                l.collect_variables(variables);
                r.collect_variables(variables);
            }
            Expression::Negate(v) | Expression::Not(v) => v.collect_variables(variables),
            Expression::Literal(_) => {}
        }
    }

    /// Whether the expression yields a boolean when it evaluates successfully.
    pub fn is_boolean(&self) -> bool {
        match self {
            Expression::Not(_)
            | Expression::And(..)
            | Expression::Or(..)
            | Expression::Equal(..)
            | Expression::NotEqual(..)
            | Expression::GreaterThan(..)
            | Expression::GreaterThanOrEqual(..)
            | Expression::SmallerThan(..)
            | Expression::SmallerThanOrEqual(..) => true,
            Expression::Literal(Value::Bool(_)) | Expression::Variable(_) => true,
            _ => false,
        }
    }
}

/// Renders an expression as an indented tree, for inspecting parsed rules.
pub struct DisplayExpression<'a> {
    pub expr: &'a Expression,
}

impl fmt::Display for DisplayExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Self::fmt_as_tree(self.expr, f, "", true)
    }
}

impl DisplayExpression<'_> {
    fn fmt_as_tree(
        expr: &Expression,
        f: &mut fmt::Formatter<'_>,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        let node_marker = if is_last { "└── " } else { "├── " };
        write!(f, "{}{}", prefix, node_marker)?;

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });

        match expr {
            Expression::Literal(v) => writeln!(f, "Literal: {}", v)?,
            Expression::Variable(p) => writeln!(f, "Variable: {}", p)?,
            Expression::Not(v) => {
                writeln!(f, "NOT")?;
                Self::fmt_as_tree(v, f, &child_prefix, true)?;
            }
            Expression::Negate(v) => {
                writeln!(f, "NEG (-)")?;
                Self::fmt_as_tree(v, f, &child_prefix, true)?;
            }
            Expression::Sum(l, r) => Self::fmt_binary(f, "SUM (+)", l, r, &child_prefix)?,
            Expression::Subtract(l, r) => Self::fmt_binary(f, "SUB (-)", l, r, &child_prefix)?,
            Expression::Multiply(l, r) => Self::fmt_binary(f, "MUL (*)", l, r, &child_prefix)?,
            Expression::Divide(l, r) => Self::fmt_binary(f, "DIV (/)", l, r, &child_prefix)?,
            Expression::And(l, r) => Self::fmt_binary(f, "AND (&&)", l, r, &child_prefix)?,
            Expression::Or(l, r) => Self::fmt_binary(f, "OR (||)", l, r, &child_prefix)?,
            Expression::Equal(l, r) => Self::fmt_binary(f, "EQ (==)", l, r, &child_prefix)?,
            Expression::NotEqual(l, r) => Self::fmt_binary(f, "NEQ (!=)", l, r, &child_prefix)?,
            Expression::GreaterThan(l, r) => Self::fmt_binary(f, "GT (>)", l, r, &child_prefix)?,
            Expression::GreaterThanOrEqual(l, r) => {
                Self::fmt_binary(f, "GTE (>=)", l, r, &child_prefix)?
            }
            Expression::SmallerThan(l, r) => Self::fmt_binary(f, "LT (<)", l, r, &child_prefix)?,
            Expression::SmallerThanOrEqual(l, r) => {
                Self::fmt_binary(f, "LTE (<=)", l, r, &child_prefix)?
            }
        }
        Ok(())
    }

    fn fmt_binary(
        f: &mut fmt::Formatter<'_>,
        name: &str,
        l: &Expression,
        r: &Expression,
        prefix: &str,
    ) -> fmt::Result {
        writeln!(f, "{}", name)?;
        Self::fmt_as_tree(l, f, prefix, false)?;
        Self::fmt_as_tree(r, f, prefix, true)?;
        Ok(())
    }
}
