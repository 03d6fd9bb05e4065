//! Bound rules: length, numeric range, membership
//!
//! These only judge values of the kind they apply to. Anything else,
//! including an absent value, passes; pair them with a type rule.

use serde_json::Value;
use sieve_schema::{Outcome, Rule, RuleContext, RuleError, RuleMeta, RuleOptions, RuleSetupError};

use crate::args::{array_arg, f64_arg, usize_arg};

/// Length of text in chars, or of an array in elements.
fn measure(value: Option<&Value>) -> Option<usize> {
    match value? {
        Value::String(text) => Some(text.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn unit(value: Option<&Value>) -> &'static str {
    match value {
        Some(Value::Array(_)) => "items",
        _ => "characters",
    }
}

// =============================================================================
// Length
// =============================================================================

pub struct MinLengthRule;

impl Rule for MinLengthRule {
    fn compile(&self, args: &Value) -> Result<RuleMeta, RuleSetupError> {
        let min = usize_arg(args, "min")?;
        Ok(RuleMeta::new("min_length").with_prepared(min))
    }

    fn validate(
        &self,
        value: Option<&Value>,
        options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        let min = *options
            .prepared::<usize>()
            .ok_or(RuleError::MissingPreparedState)?;
        let Some(len) = measure(value) else {
            return Ok(Outcome::Pass);
        };
        Ok(Outcome::check(len >= min, || {
            format!("must have at least {min} {}", unit(value))
        }))
    }
}

pub struct MaxLengthRule;

impl Rule for MaxLengthRule {
    fn compile(&self, args: &Value) -> Result<RuleMeta, RuleSetupError> {
        let max = usize_arg(args, "max")?;
        Ok(RuleMeta::new("max_length").with_prepared(max))
    }

    fn validate(
        &self,
        value: Option<&Value>,
        options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        let max = *options
            .prepared::<usize>()
            .ok_or(RuleError::MissingPreparedState)?;
        let Some(len) = measure(value) else {
            return Ok(Outcome::Pass);
        };
        Ok(Outcome::check(len <= max, || {
            format!("must have at most {max} {}", unit(value))
        }))
    }
}

// =============================================================================
// Numeric range
// =============================================================================

pub struct MinRule;

impl Rule for MinRule {
    fn compile(&self, args: &Value) -> Result<RuleMeta, RuleSetupError> {
        let min = f64_arg(args, "min")?;
        Ok(RuleMeta::new("min").with_prepared(min))
    }

    fn validate(
        &self,
        value: Option<&Value>,
        options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        let min = *options
            .prepared::<f64>()
            .ok_or(RuleError::MissingPreparedState)?;
        let Some(n) = value.and_then(Value::as_f64) else {
            return Ok(Outcome::Pass);
        };
        Ok(Outcome::check(n >= min, || {
            format!("must be greater than or equal to {min}")
        }))
    }
}

pub struct MaxRule;

impl Rule for MaxRule {
    fn compile(&self, args: &Value) -> Result<RuleMeta, RuleSetupError> {
        let max = f64_arg(args, "max")?;
        Ok(RuleMeta::new("max").with_prepared(max))
    }

    fn validate(
        &self,
        value: Option<&Value>,
        options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        let max = *options
            .prepared::<f64>()
            .ok_or(RuleError::MissingPreparedState)?;
        let Some(n) = value.and_then(Value::as_f64) else {
            return Ok(Outcome::Pass);
        };
        Ok(Outcome::check(n <= max, || {
            format!("must be less than or equal to {max}")
        }))
    }
}

// =============================================================================
// Membership
// =============================================================================

/// The value must equal one of the `values` argument's entries.
pub struct InRule;

impl Rule for InRule {
    fn compile(&self, args: &Value) -> Result<RuleMeta, RuleSetupError> {
        let values = array_arg(args, "values")?;
        if values.is_empty() {
            return Err(RuleSetupError::new("'values' must not be empty"));
        }
        Ok(RuleMeta::new("in"))
    }

    fn validate(
        &self,
        value: Option<&Value>,
        options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        let Some(value) = value else {
            return Ok(Outcome::Pass);
        };
        let allowed = array_arg(&options.args, "values")
            .map_err(|err| RuleError::custom(err.reason))?;
        Ok(Outcome::check(allowed.contains(value), || {
            let listed = allowed
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("must be one of {listed}")
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sieve_schema::FieldPath;

    fn run(rule: &dyn Rule, args: Value, value: Option<&Value>) -> Outcome {
        let meta = rule.compile(&args).unwrap();
        let options = RuleOptions {
            args,
            message: None,
            prepared: meta.prepared,
        };
        let path = FieldPath::root();
        let root = Value::Null;
        let ctx = RuleContext::new(&path, &[], &root);
        rule.validate(value, &options, &ctx).unwrap()
    }

    #[test]
    fn test_length_counts_chars() {
        assert!(run(&MaxLengthRule, json!(3), Some(&json!("héé"))).is_pass());
        assert_eq!(
            run(&MinLengthRule, json!(4), Some(&json!("héé"))),
            Outcome::fail("must have at least 4 characters")
        );
    }

    #[test]
    fn test_length_on_arrays() {
        assert_eq!(
            run(&MaxLengthRule, json!({"max": 1}), Some(&json!([1, 2]))),
            Outcome::fail("must have at most 1 items")
        );
    }

    #[test]
    fn test_length_ignores_other_kinds() {
        assert!(run(&MinLengthRule, json!(2), Some(&json!(5))).is_pass());
        assert!(run(&MinLengthRule, json!(2), None).is_pass());
    }

    #[test]
    fn test_range() {
        assert!(run(&MinRule, json!(0), Some(&json!(0))).is_pass());
        assert_eq!(
            run(&MinRule, json!(0), Some(&json!(-1))),
            Outcome::fail("must be greater than or equal to 0")
        );
        assert_eq!(
            run(&MaxRule, json!({"max": 2.5}), Some(&json!(3))),
            Outcome::fail("must be less than or equal to 2.5")
        );
        assert!(run(&MaxRule, json!(2), Some(&json!("9"))).is_pass());
    }

    #[test]
    fn test_in() {
        let args = json!({"values": ["a", "b"]});
        assert!(run(&InRule, args.clone(), Some(&json!("a"))).is_pass());
        assert_eq!(
            run(&InRule, args, Some(&json!("c"))),
            Outcome::fail(r#"must be one of "a", "b""#)
        );
    }

    #[test]
    fn test_bad_args() {
        assert!(MinLengthRule.compile(&json!("x")).is_err());
        assert!(MinRule.compile(&Value::Null).is_err());
        assert!(InRule.compile(&json!({"values": []})).is_err());
    }
}
