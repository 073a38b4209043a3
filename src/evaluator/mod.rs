use crate::ast::{EvaluationTrace, Expression, Value};
use crate::compiler::parse_rule;
use crate::error::ConditionError;
use crate::trace::TraceFormatter;
use ahash::AHashMap;
use serde::Serialize;
use serde_json::Map;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

mod engine;

use engine::AstEngine;

/// The outcome of a branch decision, with an optional explanation for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub result: bool,
    pub reason: Option<String>,
}

/// Evaluates a condition string against the global data of a run.
///
/// Decision nodes delegate all branch decisions to this trait, so a host can swap in
/// any evaluator (e.g. a remote rule service). Closures with the signature of
/// [`ConditionEvaluator::evaluate`] implement it directly.
pub trait ConditionEvaluator: Send + Sync {
    fn evaluate(
        &self,
        condition: &str,
        context: &Map<String, serde_json::Value>,
    ) -> Result<bool, ConditionError>;

    /// Like `evaluate`, but may also explain how the result was reached.
    fn decide(
        &self,
        condition: &str,
        context: &Map<String, serde_json::Value>,
    ) -> Result<Decision, ConditionError> {
        self.evaluate(condition, context)
            .map(|result| Decision { result, reason: None })
    }
}

impl<F> ConditionEvaluator for F
where
    F: Fn(&str, &Map<String, serde_json::Value>) -> Result<bool, ConditionError> + Send + Sync,
{
    fn evaluate(
        &self,
        condition: &str,
        context: &Map<String, serde_json::Value>,
    ) -> Result<bool, ConditionError> {
        self(condition, context)
    }
}

/// The result of evaluating a rule, with the trace of every intermediate value.
#[derive(Debug, Clone)]
pub struct RuleOutcome {
    pub result: bool,
    pub trace: EvaluationTrace,
}

impl RuleOutcome {
    /// A human-readable explanation, e.g. `$temperature (was 95) > 90`.
    pub fn reason(&self) -> String {
        TraceFormatter::format_trace(&self.trace)
    }
}

/// Authoring-time report on a rule string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub suggestions: Vec<String>,
    /// Variables the rule reads, sorted. Empty when the rule does not parse.
    pub variables: Vec<String>,
}

/// The built-in rule language evaluator.
///
/// Parsed rules are cached by their source text, so evaluating the same decision node
/// repeatedly only parses it once.
#[derive(Debug, Default)]
pub struct RuleEngine {
    ast_cache: Mutex<AHashMap<String, Arc<Expression>>>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn compile(&self, rule: &str) -> Result<Arc<Expression>, ConditionError> {
        let mut cache = self
            .ast_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(cached) = cache.get(rule) {
            return Ok(Arc::clone(cached));
        }
        let expr = Arc::new(parse_rule(rule)?);
        cache.insert(rule.to_string(), Arc::clone(&expr));
        Ok(expr)
    }

    /// Evaluates a rule and keeps the full evaluation trace.
    pub fn explain(
        &self,
        rule: &str,
        data: &Map<String, serde_json::Value>,
    ) -> Result<RuleOutcome, ConditionError> {
        let expr = self.compile(rule)?;
        let (result, trace) = AstEngine::new(data).evaluate_condition(&expr)?;
        log::debug!("Rule '{}' evaluated to {}", rule, result);
        Ok(RuleOutcome { result, trace })
    }

    /// Evaluates an arithmetic (or any scalar) expression against the data.
    pub fn compute(
        &self,
        expression: &str,
        data: &Map<String, serde_json::Value>,
    ) -> Result<Value, ConditionError> {
        let expr = self.compile(expression)?;
        AstEngine::new(data)
            .evaluate_value(&expr)
            .map(|trace| trace.outcome())
    }

    /// Checks a rule without any data, suggesting fixes for common mistakes.
    pub fn validate(&self, rule: &str) -> RuleValidation {
        match parse_rule(rule) {
            Ok(expr) if expr.is_boolean() => {
                let mut variables = BTreeSet::new();
                expr.collect_variables(&mut variables);
                RuleValidation {
                    is_valid: true,
                    errors: Vec::new(),
                    suggestions: Vec::new(),
                    variables: variables.into_iter().collect(),
                }
            }
            Ok(_) => RuleValidation {
                is_valid: false,
                errors: vec!["Rule does not produce a true/false result".to_string()],
                suggestions: vec![
                    "Compare the value with an operator, e.g. 'temperature > 80'".to_string(),
                ],
                variables: Vec::new(),
            },
            Err(err) => RuleValidation {
                is_valid: false,
                suggestions: suggest_fixes(rule, &err),
                errors: vec![err.to_string()],
                variables: Vec::new(),
            },
        }
    }
}

impl ConditionEvaluator for RuleEngine {
    fn evaluate(
        &self,
        condition: &str,
        context: &Map<String, serde_json::Value>,
    ) -> Result<bool, ConditionError> {
        self.explain(condition, context).map(|outcome| outcome.result)
    }

    fn decide(
        &self,
        condition: &str,
        context: &Map<String, serde_json::Value>,
    ) -> Result<Decision, ConditionError> {
        let outcome = self.explain(condition, context)?;
        Ok(Decision {
            result: outcome.result,
            reason: Some(outcome.reason()),
        })
    }
}

fn suggest_fixes(rule: &str, err: &ConditionError) -> Vec<String> {
    let mut suggestions = Vec::new();
    let mut suggest = |text: &str| {
        if !suggestions.iter().any(|s| s == text) {
            suggestions.push(text.to_string());
        }
    };

    if matches!(err, ConditionError::Empty) {
        suggest("Write a condition such as 'temperature > 80'");
    }
    if let ConditionError::Syntax { message, .. } = err {
        if message.contains("'='") {
            suggest("Use '==' to compare for equality");
        }
        if message.contains("'&'") {
            suggest("Use '&&' to combine conditions");
        }
        if message.contains("'|'") {
            suggest("Use '||' for alternatives");
        }
    }
    for word in rule.split_whitespace() {
        match word.to_ascii_lowercase().as_str() {
            "and" => suggest("Use '&&' instead of 'and'"),
            "or" => suggest("Use '||' instead of 'or'"),
            "not" => suggest("Use '!' instead of 'not'"),
            _ => {}
        }
    }
    let opening = rule.chars().filter(|c| *c == '(').count();
    let closing = rule.chars().filter(|c| *c == ')').count();
    if opening != closing {
        suggest("Check that every '(' has a matching ')'");
    }
    suggestions
}
