use crate::ast::EvaluationTrace;
use std::fmt::Write;

/// Renders evaluation traces as one-line explanations such as
/// `$temperature (was 95) > 90 && $vibration (was 10) > 20`.
pub struct TraceFormatter;

impl TraceFormatter {
    pub fn format_trace(trace: &EvaluationTrace) -> String {
        let mut out = String::new();
        Self::write_node(trace, 0, &mut out);
        out
    }

    /// Appends `trace` to `out`, parenthesised when it binds looser than `min_power`.
    fn write_node(trace: &EvaluationTrace, min_power: u8, out: &mut String) {
        let power = trace.binding_power();
        let grouped = power < min_power;
        if grouped {
            out.push('(');
        }

        match trace {
            EvaluationTrace::Binary {
                symbol,
                left,
                right,
                ..
            } => {
                Self::write_node(left, power, out);
                // A skipped right side means the left side alone decided the outcome.
                if !right.is_skipped() {
                    let _ = write!(out, " {} ", symbol);
                    // Operators are left-associative, so an equal-power right child is grouped.
                    Self::write_node(right, power + 1, out);
                }
            }
            EvaluationTrace::Unary {
                symbol, operand, ..
            } => {
                out.push_str(symbol);
                Self::write_node(operand, power, out);
            }
            EvaluationTrace::Leaf { source, value } if source.starts_with('$') => {
                let _ = write!(out, "{} (was {})", source, value);
            }
            EvaluationTrace::Leaf { source, .. } => out.push_str(source),
            EvaluationTrace::Skipped => {}
        }

        if grouped {
            out.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Value;

    fn leaf(source: &str, value: Value) -> Box<EvaluationTrace> {
        Box::new(EvaluationTrace::Leaf {
            source: source.to_string(),
            value,
        })
    }

    #[test]
    fn variable_leaves_show_their_value() {
        let trace = EvaluationTrace::Binary {
            symbol: ">",
            left: leaf("$temperature", Value::Number(95.0)),
            right: leaf("90", Value::Number(90.0)),
            outcome: Value::Bool(true),
        };
        assert_eq!(
            TraceFormatter::format_trace(&trace),
            "$temperature (was 95) > 90"
        );
    }

    #[test]
    fn looser_children_are_parenthesised() {
        let or = EvaluationTrace::Binary {
            symbol: "||",
            left: leaf("$a", Value::Bool(false)),
            right: leaf("$b", Value::Bool(true)),
            outcome: Value::Bool(true),
        };
        let and = EvaluationTrace::Binary {
            symbol: "&&",
            left: Box::new(or),
            right: leaf("$c", Value::Bool(true)),
            outcome: Value::Bool(true),
        };
        assert_eq!(
            TraceFormatter::format_trace(&and),
            "($a (was false) || $b (was true)) && $c (was true)"
        );
    }

    #[test]
    fn right_nested_subtraction_keeps_its_grouping() {
        let inner = EvaluationTrace::Binary {
            symbol: "-",
            left: leaf("5", Value::Number(5.0)),
            right: leaf("2", Value::Number(2.0)),
            outcome: Value::Number(3.0),
        };
        let outer = EvaluationTrace::Binary {
            symbol: "-",
            left: leaf("10", Value::Number(10.0)),
            right: Box::new(inner),
            outcome: Value::Number(7.0),
        };
        assert_eq!(TraceFormatter::format_trace(&outer), "10 - (5 - 2)");
    }

    #[test]
    fn short_circuit_shows_only_the_decisive_side() {
        let trace = EvaluationTrace::Binary {
            symbol: "&&",
            left: leaf("$active", Value::Bool(false)),
            right: Box::new(EvaluationTrace::Skipped),
            outcome: Value::Bool(false),
        };
        assert_eq!(TraceFormatter::format_trace(&trace), "$active (was false)");
    }

    #[test]
    fn negation_hugs_its_operand() {
        let trace = EvaluationTrace::Unary {
            symbol: "!",
            operand: leaf("$idle", Value::Bool(true)),
            outcome: Value::Bool(false),
        };
        assert_eq!(TraceFormatter::format_trace(&trace), "!$idle (was true)");
    }
}
