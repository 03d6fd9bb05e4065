//! Helpers for reading rule arguments.
//!
//! Arguments are either a bare value (`3`) or an object holding the value
//! under the rule's key (`{"min": 3}`).

use serde_json::Value;
use sieve_schema::RuleSetupError;

fn lookup<'a>(args: &'a Value, key: &str) -> Option<&'a Value> {
    match args {
        Value::Object(map) => map.get(key),
        Value::Null => None,
        other => Some(other),
    }
}

pub(crate) fn usize_arg(args: &Value, key: &str) -> Result<usize, RuleSetupError> {
    lookup(args, key)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| RuleSetupError::new(format!("expected a non-negative integer '{key}'")))
}

pub(crate) fn f64_arg(args: &Value, key: &str) -> Result<f64, RuleSetupError> {
    lookup(args, key)
        .and_then(Value::as_f64)
        .ok_or_else(|| RuleSetupError::new(format!("expected a number '{key}'")))
}

pub(crate) fn str_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str, RuleSetupError> {
    lookup(args, key)
        .and_then(Value::as_str)
        .ok_or_else(|| RuleSetupError::new(format!("expected a string '{key}'")))
}

pub(crate) fn optional_str_arg<'a>(
    args: &'a Value,
    key: &str,
) -> Result<Option<&'a str>, RuleSetupError> {
    match lookup(args, key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| RuleSetupError::new(format!("expected a string '{key}'"))),
    }
}

pub(crate) fn array_arg<'a>(args: &'a Value, key: &str) -> Result<&'a [Value], RuleSetupError> {
    lookup(args, key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| RuleSetupError::new(format!("expected a list '{key}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_and_keyed() {
        assert_eq!(usize_arg(&json!(3), "min"), Ok(3));
        assert_eq!(usize_arg(&json!({"min": 4}), "min"), Ok(4));
        assert!(usize_arg(&json!({"max": 4}), "min").is_err());
        assert!(usize_arg(&json!(-1), "min").is_err());
        assert!(usize_arg(&Value::Null, "min").is_err());
    }

    #[test]
    fn test_optional_str() {
        assert_eq!(optional_str_arg(&Value::Null, "format"), Ok(None));
        assert_eq!(
            optional_str_arg(&json!({"format": "%Y"}), "format"),
            Ok(Some("%Y"))
        );
        assert!(optional_str_arg(&json!({"format": 1}), "format").is_err());
    }
}
