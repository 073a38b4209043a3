//! Evaluation of rules against global data, with traces and validation.
mod common;
use common::*;
use saisei::ast::Value;
use saisei::prelude::*;
use serde_json::json;

#[cfg(test)]
mod evaluator_tests {
    use super::*;

    #[test]
    fn test_comparison_reason() {
        let engine = RuleEngine::new();
        let ctx = data(json!({ "temperature": 95, "vibration": 10 }));

        let outcome = engine
            .explain("temperature > 90 && vibration > 20", &ctx)
            .unwrap();
        assert!(!outcome.result);
        assert_eq!(
            outcome.reason(),
            "$temperature (was 95) > 90 && $vibration (was 10) > 20"
        );
    }

    #[test]
    fn test_short_circuit_skips_missing_variables() {
        let engine = RuleEngine::new();
        let ctx = data(json!({ "enabled": false }));

        assert!(!engine.evaluate("enabled && missing > 1", &ctx).unwrap());
        assert!(engine.evaluate("!enabled || missing > 1", &ctx).unwrap());
        assert_eq!(
            engine.evaluate("missing > 1", &ctx),
            Err(ConditionError::VariableNotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_truthiness_of_bare_variables() {
        let engine = RuleEngine::new();
        let ctx = data(json!({ "name": "pump", "empty": "", "items": [], "zero": 0 }));

        assert!(engine.evaluate("name", &ctx).unwrap());
        assert!(!engine.evaluate("empty", &ctx).unwrap());
        assert!(!engine.evaluate("items", &ctx).unwrap());
        assert!(!engine.evaluate("zero", &ctx).unwrap());
    }

    #[test]
    fn test_nested_paths_and_strings() {
        let engine = RuleEngine::new();
        let ctx = data(json!({ "machine": { "state": "running", "load": 0.75 } }));

        assert!(engine.evaluate("machine.state == 'running'", &ctx).unwrap());
        assert!(engine.evaluate("machine.load * 100 >= 75", &ctx).unwrap());
    }

    #[test]
    fn test_number_equality_uses_epsilon() {
        let engine = RuleEngine::new();
        let ctx = data(json!({ "a": 0.1, "b": 0.2 }));
        assert!(engine.evaluate("a + b == 0.3", &ctx).unwrap());
    }

    #[test]
    fn test_type_mismatch_and_division_by_zero() {
        let engine = RuleEngine::new();
        let ctx = data(json!({ "name": "pump", "zero": 0 }));

        assert!(matches!(
            engine.evaluate("name > 3", &ctx),
            Err(ConditionError::TypeMismatch { .. })
        ));
        assert_eq!(
            engine.evaluate("10 / zero > 1", &ctx),
            Err(ConditionError::DivisionByZero)
        );
        assert!(matches!(
            engine.evaluate("1 + 2", &ctx),
            Err(ConditionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_compute_arithmetic() {
        let engine = RuleEngine::new();
        let ctx = data(json!({ "temperature": 95, "offset": 5 }));
        assert_eq!(
            engine.compute("(temperature - offset) / 2", &ctx),
            Ok(Value::Number(45.0))
        );
        assert_eq!(engine.compute("-offset", &ctx), Ok(Value::Number(-5.0)));
    }

    #[test]
    fn test_compute_overflow_is_rejected() {
        let engine = RuleEngine::new();
        let ctx = data(json!({ "big": 1e308 }));
        assert_eq!(
            engine.compute("big + big", &ctx),
            Err(ConditionError::Overflow("+".to_string()))
        );
        assert_eq!(
            engine.evaluate("big * 10 > 1", &ctx),
            Err(ConditionError::Overflow("*".to_string()))
        );
    }

    #[test]
    fn test_validate_reports_variables() {
        let report = RuleEngine::new().validate("temperature > 80 && sensor.ok");
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert_eq!(report.variables, ["sensor.ok", "temperature"]);
    }

    #[test]
    fn test_validate_suggests_fixes() {
        let engine = RuleEngine::new();

        let report = engine.validate("a > 1 and b > 2");
        assert!(!report.is_valid);
        assert!(report.suggestions.iter().any(|s| s.contains("'&&'")));

        let report = engine.validate("(a > 1");
        assert!(!report.is_valid);
        assert!(report.suggestions.iter().any(|s| s.contains("')'")));

        let report = engine.validate("a + 1");
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_validation_serialises_camel_case() {
        let value = serde_json::to_value(RuleEngine::new().validate("a > 1")).unwrap();
        assert_eq!(value["isValid"], json!(true));
        assert!(value["suggestions"].as_array().unwrap().is_empty());
    }
}
