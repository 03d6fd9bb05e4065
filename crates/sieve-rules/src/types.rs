//! Type rules
//!
//! Rules for: string, number, boolean, date, object, array.
//! None of them tolerate an absent value: absence fails the type check.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use sieve_schema::{Outcome, Rule, RuleContext, RuleError, RuleMeta, RuleOptions, RuleSetupError};

use crate::args::optional_str_arg;

// =============================================================================
// Helpers
// =============================================================================

/// User-facing name of a value's type.
pub(crate) fn value_kind(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

/// A plain keyed container: a JSON object. Arrays and null are excluded.
pub fn is_plain_object(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Object(_)))
}

fn type_check(expected: &str, ok: bool, value: Option<&Value>) -> Outcome {
    Outcome::check(ok, || {
        format!("must be {expected}, got {}", value_kind(value))
    })
}

// =============================================================================
// StringRule
// =============================================================================

pub struct StringRule;

impl Rule for StringRule {
    fn compile(&self, _args: &Value) -> Result<RuleMeta, RuleSetupError> {
        Ok(RuleMeta::new("string"))
    }

    fn validate(
        &self,
        value: Option<&Value>,
        _options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        Ok(type_check(
            "a string",
            matches!(value, Some(Value::String(_))),
            value,
        ))
    }
}

// =============================================================================
// NumberRule
// =============================================================================

pub struct NumberRule;

impl Rule for NumberRule {
    fn compile(&self, _args: &Value) -> Result<RuleMeta, RuleSetupError> {
        Ok(RuleMeta::new("number"))
    }

    fn validate(
        &self,
        value: Option<&Value>,
        _options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        Ok(type_check(
            "a number",
            matches!(value, Some(Value::Number(_))),
            value,
        ))
    }
}

// =============================================================================
// BooleanRule
// =============================================================================

pub struct BooleanRule;

impl Rule for BooleanRule {
    fn compile(&self, _args: &Value) -> Result<RuleMeta, RuleSetupError> {
        Ok(RuleMeta::new("boolean"))
    }

    fn validate(
        &self,
        value: Option<&Value>,
        _options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        Ok(type_check(
            "a boolean",
            matches!(value, Some(Value::Bool(_))),
            value,
        ))
    }
}

// =============================================================================
// DateRule
// =============================================================================

/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps, or text matching a custom
/// chrono `format` argument.
pub struct DateRule;

/// Compile-time state: the custom format, if any.
struct DateFormat(Option<String>);

impl DateRule {
    fn parses(text: &str, format: Option<&str>) -> bool {
        match format {
            Some(format) => {
                NaiveDateTime::parse_from_str(text, format).is_ok()
                    || NaiveDate::parse_from_str(text, format).is_ok()
            }
            None => {
                NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
                    || DateTime::parse_from_rfc3339(text).is_ok()
            }
        }
    }
}

impl Rule for DateRule {
    fn compile(&self, args: &Value) -> Result<RuleMeta, RuleSetupError> {
        let format = optional_str_arg(args, "format")?.map(str::to_string);
        Ok(RuleMeta::new("date").with_prepared(DateFormat(format)))
    }

    fn validate(
        &self,
        value: Option<&Value>,
        options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        let format = options
            .prepared::<DateFormat>()
            .ok_or(RuleError::MissingPreparedState)?;
        let Some(Value::String(text)) = value else {
            return Ok(type_check("a date", false, value));
        };
        Ok(Outcome::check(
            Self::parses(text, format.0.as_deref()),
            || match &format.0 {
                Some(format) => format!("must be a date in format '{format}'"),
                None => "must be a valid date".to_string(),
            },
        ))
    }
}

// =============================================================================
// ObjectRule
// =============================================================================

/// Fails unless the value is a plain keyed container ([`is_plain_object`]).
pub struct ObjectRule;

impl Rule for ObjectRule {
    fn compile(&self, _args: &Value) -> Result<RuleMeta, RuleSetupError> {
        Ok(RuleMeta::new("object"))
    }

    fn validate(
        &self,
        value: Option<&Value>,
        _options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        Ok(type_check("an object", is_plain_object(value), value))
    }
}

// =============================================================================
// ArrayRule
// =============================================================================

pub struct ArrayRule;

impl Rule for ArrayRule {
    fn compile(&self, _args: &Value) -> Result<RuleMeta, RuleSetupError> {
        Ok(RuleMeta::new("array"))
    }

    fn validate(
        &self,
        value: Option<&Value>,
        _options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        Ok(type_check(
            "an array",
            matches!(value, Some(Value::Array(_))),
            value,
        ))
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
    fn test_object_excludes_array_and_null() {
        assert!(run(&ObjectRule, Value::Null, Some(&json!({}))).is_pass());
        assert_eq!(
            run(&ObjectRule, Value::Null, Some(&json!([]))),
            Outcome::fail("must be an object, got array")
        );
        assert_eq!(
            run(&ObjectRule, Value::Null, Some(&Value::Null)),
            Outcome::fail("must be an object, got null")
        );
    }

    #[test]
    fn test_string_rejects_absent() {
        assert_eq!(
            run(&StringRule, Value::Null, None),
            Outcome::fail("must be a string, got undefined")
        );
        assert!(run(&StringRule, Value::Null, Some(&json!("x"))).is_pass());
        assert!(!run(&StringRule, Value::Null, Some(&json!(1))).is_pass());
    }

    #[test]
    fn test_number_and_boolean() {
        assert!(run(&NumberRule, Value::Null, Some(&json!(1.5))).is_pass());
        assert!(!run(&NumberRule, Value::Null, Some(&json!("1"))).is_pass());
        assert!(run(&BooleanRule, Value::Null, Some(&json!(false))).is_pass());
        assert!(!run(&BooleanRule, Value::Null, Some(&json!(0))).is_pass());
    }

    #[test]
    fn test_date_default_formats() {
        assert!(run(&DateRule, Value::Null, Some(&json!("2024-02-29"))).is_pass());
        assert!(run(&DateRule, Value::Null, Some(&json!("2024-02-29T10:00:00Z"))).is_pass());
        assert_eq!(
            run(&DateRule, Value::Null, Some(&json!("2023-02-29"))),
            Outcome::fail("must be a valid date")
        );
        assert_eq!(
            run(&DateRule, Value::Null, Some(&json!(20240229))),
            Outcome::fail("must be a date, got number")
        );
    }

    #[test]
    fn test_date_custom_format() {
        let args = json!({"format": "%d/%m/%Y"});
        assert!(run(&DateRule, args.clone(), Some(&json!("29/02/2024"))).is_pass());
        assert_eq!(
            run(&DateRule, args, Some(&json!("2024-02-29"))),
            Outcome::fail("must be a date in format '%d/%m/%Y'")
        );
    }

    #[test]
    fn test_date_rejects_bad_format_arg() {
        assert!(DateRule.compile(&json!({"format": 3})).is_err());
    }
}
