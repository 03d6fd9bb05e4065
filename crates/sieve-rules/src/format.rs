//! Text format rules
//!
//! Non-string values pass; pair these with the `string` rule.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use sieve_schema::{Outcome, Rule, RuleContext, RuleError, RuleMeta, RuleOptions, RuleSetupError};

use crate::args::str_arg;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex")
});

// =============================================================================
// RegexRule
// =============================================================================

/// Matches text against a `pattern` argument, compiled once.
pub struct RegexRule;

impl Rule for RegexRule {
    fn compile(&self, args: &Value) -> Result<RuleMeta, RuleSetupError> {
        let pattern = str_arg(args, "pattern")?;
        let regex = Regex::new(pattern)
            .map_err(|err| RuleSetupError::new(format!("invalid pattern: {err}")))?;
        Ok(RuleMeta::new("regex").with_prepared(regex))
    }

    fn validate(
        &self,
        value: Option<&Value>,
        options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        let regex = options
            .prepared::<Regex>()
            .ok_or(RuleError::MissingPreparedState)?;
        let Some(Value::String(text)) = value else {
            return Ok(Outcome::Pass);
        };
        Ok(Outcome::check(regex.is_match(text), || {
            format!("must match pattern '{}'", regex.as_str())
        }))
    }
}

// =============================================================================
// EmailRule
// =============================================================================

pub struct EmailRule;

impl Rule for EmailRule {
    fn compile(&self, _args: &Value) -> Result<RuleMeta, RuleSetupError> {
        Ok(RuleMeta::new("email"))
    }

    fn validate(
        &self,
        value: Option<&Value>,
        _options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        let Some(Value::String(text)) = value else {
            return Ok(Outcome::Pass);
        };
        Ok(Outcome::check(EMAIL_PATTERN.is_match(text), || {
            "must be a valid email address".to_string()
        }))
    }
}

// =============================================================================
// UrlRule
// =============================================================================

/// Absolute URL, as accepted by [`url::Url::parse`].
pub struct UrlRule;

impl Rule for UrlRule {
    fn compile(&self, _args: &Value) -> Result<RuleMeta, RuleSetupError> {
        Ok(RuleMeta::new("url"))
    }

    fn validate(
        &self,
        value: Option<&Value>,
        _options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        let Some(Value::String(text)) = value else {
            return Ok(Outcome::Pass);
        };
        Ok(Outcome::check(url::Url::parse(text).is_ok(), || {
            "must be a valid URL".to_string()
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
    fn test_regex() {
        let args = json!({"pattern": "^[a-z]+$"});
        assert!(run(&RegexRule, args.clone(), Some(&json!("abc"))).is_pass());
        assert_eq!(
            run(&RegexRule, args, Some(&json!("ab1"))),
            Outcome::fail("must match pattern '^[a-z]+$'")
        );
    }

    #[test]
    fn test_invalid_regex_fails_setup() {
        let err = RegexRule.compile(&json!("(")).unwrap_err();
        assert!(err.reason.starts_with("invalid pattern"));
    }

    #[test]
    fn test_email() {
        assert!(run(&EmailRule, Value::Null, Some(&json!("a@b.io"))).is_pass());
        assert!(!run(&EmailRule, Value::Null, Some(&json!("a@b"))).is_pass());
        assert!(!run(&EmailRule, Value::Null, Some(&json!("a b@c.io"))).is_pass());
        assert!(run(&EmailRule, Value::Null, Some(&json!(1))).is_pass());
    }

    #[test]
    fn test_url() {
        assert!(run(&UrlRule, Value::Null, Some(&json!("https://example.com/x"))).is_pass());
        assert_eq!(
            run(&UrlRule, Value::Null, Some(&json!("example.com"))),
            Outcome::fail("must be a valid URL")
        );
    }
}
