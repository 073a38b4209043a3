use super::Value;

const OR_POWER: u8 = 1;
const AND_POWER: u8 = 2;
const COMPARISON_POWER: u8 = 4;
const ADDITIVE_POWER: u8 = 6;
const MULTIPLICATIVE_POWER: u8 = 7;
const UNARY_POWER: u8 = 8;
const ATOM_POWER: u8 = 9;

/// How a condition was evaluated, node by node, with every intermediate value.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationTrace {
    Binary {
        symbol: &'static str,
        left: Box<EvaluationTrace>,
        right: Box<EvaluationTrace>,
        outcome: Value,
    },
    Unary {
        symbol: &'static str,
        operand: Box<EvaluationTrace>,
        outcome: Value,
    },
    /// A literal or a variable read. Variable sources start with `$`.
    Leaf { source: String, value: Value },
    /// The right side of `&&` / `||` when the left side already decided the result.
    Skipped,
}

impl EvaluationTrace {
    pub fn outcome(&self) -> Value {
        match self {
            EvaluationTrace::Binary { outcome, .. } | EvaluationTrace::Unary { outcome, .. } => {
                outcome.clone()
            }
            EvaluationTrace::Leaf { value, .. } => value.clone(),
            EvaluationTrace::Skipped => Value::Null,
        }
    }

    /// How tightly the node binds; a child binding looser than its parent needs parentheses.
    pub fn binding_power(&self) -> u8 {
        match self {
            EvaluationTrace::Binary { symbol, .. } => match *symbol {
                "||" => OR_POWER,
                "&&" => AND_POWER,
                "+" | "-" => ADDITIVE_POWER,
                "*" | "/" => MULTIPLICATIVE_POWER,
                _ => COMPARISON_POWER,
            },
            EvaluationTrace::Unary { .. } => UNARY_POWER,
            EvaluationTrace::Leaf { .. } | EvaluationTrace::Skipped => ATOM_POWER,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, EvaluationTrace::Skipped)
    }
}
