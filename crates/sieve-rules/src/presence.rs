//! Presence rules

use serde_json::Value;
use sieve_schema::{Outcome, Rule, RuleContext, RuleError, RuleMeta, RuleOptions, RuleSetupError};

/// Marks a field as tolerant of absence.
///
/// Never fails. Its only effect is [`RuleMeta::allow_undefined`], which makes
/// the compiler skip the node's other rules when the value is missing.
pub struct OptionalRule;

impl Rule for OptionalRule {
    fn compile(&self, _args: &Value) -> Result<RuleMeta, RuleSetupError> {
        Ok(RuleMeta::new("optional").allow_undefined())
    }

    fn validate(
        &self,
        _value: Option<&Value>,
        _options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        Ok(Outcome::Pass)
    }
}

/// Fails on an absent value or null.
pub struct RequiredRule;

impl Rule for RequiredRule {
    fn compile(&self, _args: &Value) -> Result<RuleMeta, RuleSetupError> {
        Ok(RuleMeta::new("required"))
    }

    fn validate(
        &self,
        value: Option<&Value>,
        _options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        Ok(Outcome::check(
            value.is_some_and(|value| !value.is_null()),
            || "is required".to_string(),
        ))
    }
}
