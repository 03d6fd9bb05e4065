use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer};
use sieve::{Node, Value};

use crate::RunConfig;
use crate::scenarios::{
    AsyncParityScenario, CompileErrorScenario, DeterminismScenario, Scenario, ValidationScenario,
};

// ============================================================================
// Case files
// ============================================================================

/// One `*.json` file: an optional shared schema and its named cases.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseFile {
    #[serde(skip)]
    pub path: PathBuf,
    #[serde(default)]
    pub description: Option<String>,
    /// Schema used by cases that do not declare their own. Kept raw so a
    /// malformed schema fails its cases instead of the whole file.
    #[serde(default)]
    pub schema: Option<Value>,
    pub cases: BTreeMap<String, CaseData>,
}

impl CaseFile {
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    pub fn all_cases(&self) -> impl Iterator<Item = Case> + '_ {
        self.cases.iter().map(|(name, data)| Case {
            path: self.path.clone(),
            name: name.clone(),
            schema: data
                .schema
                .as_ref()
                .or(self.schema.as_ref())
                .map(|raw| sieve::schema_from_value(raw.clone()).map_err(|e| e.to_string())),
            data: data.clone(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseData {
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default)]
    pub input: Value,
    /// Expected output; `null` means the procedure produces none. Not
    /// checked when omitted.
    #[serde(default, deserialize_with = "present")]
    pub output: Option<Value>,
    /// Expected violations in report order; an omitted list means none.
    #[serde(default)]
    pub violations: Vec<ExpectedViolation>,
    /// Compilation must fail with a message containing this text.
    #[serde(default)]
    pub compile_error: Option<String>,
    /// Marks a case as not expected to pass yet.
    #[serde(default)]
    pub unimplemented: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedViolation {
    pub pointer: String,
    pub rule: String,
    #[serde(default)]
    pub message: Option<String>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

// ============================================================================
// Results
// ============================================================================

#[derive(Debug, Clone)]
pub enum ScenarioResult {
    Passed,
    Failed { error: String },
}

impl ScenarioResult {
    pub fn is_passed(&self) -> bool {
        matches!(self, ScenarioResult::Passed)
    }
}

#[derive(Debug, Clone)]
pub struct NamedScenarioResult {
    pub name: String,
    pub result: ScenarioResult,
}

#[derive(Debug, Clone)]
pub struct CaseResult {
    pub scenarios: Vec<NamedScenarioResult>,
}

impl CaseResult {
    pub fn passed_count(&self) -> usize {
        self.scenarios.iter().filter(|s| s.result.is_passed()).count()
    }

    pub fn total_count(&self) -> usize {
        self.scenarios.len()
    }

    pub fn all_passed(&self) -> bool {
        self.scenarios.iter().all(|s| s.result.is_passed())
    }

    pub fn failed_scenarios(&self) -> Vec<&NamedScenarioResult> {
        self.scenarios
            .iter()
            .filter(|s| !s.result.is_passed())
            .collect()
    }
}

// ============================================================================
// Case
// ============================================================================

pub struct Case {
    pub path: PathBuf,
    pub name: String,
    /// The case's own schema, or the file's shared one, parsed; `Err` holds
    /// the parse error message.
    pub schema: Option<Result<Node, String>>,
    pub data: CaseData,
}

impl Case {
    /// Scenarios that apply to this case.
    pub fn scenarios(&self) -> Vec<Scenario<'_>> {
        let Some(parsed) = &self.schema else {
            return Vec::new();
        };
        if let Some(expected) = &self.data.compile_error {
            return vec![Scenario::CompileError(CompileErrorScenario {
                schema: parsed.as_ref(),
                expected,
            })];
        }
        let Ok(schema) = parsed else {
            return Vec::new();
        };
        vec![
            Scenario::Validation(ValidationScenario {
                schema,
                input: &self.data.input,
                output: self.data.output.as_ref(),
                violations: &self.data.violations,
            }),
            Scenario::Determinism(DeterminismScenario {
                schema,
                input: &self.data.input,
            }),
            Scenario::AsyncParity(AsyncParityScenario {
                schema,
                input: &self.data.input,
            }),
        ]
    }

    pub fn run_all(&self, config: &RunConfig) -> CaseResult {
        let schema_error = match &self.schema {
            None => Some("case has no schema and the file declares none".to_string()),
            Some(Err(error)) if self.data.compile_error.is_none() => Some(error.clone()),
            Some(_) => None,
        };
        if let Some(error) = schema_error {
            return CaseResult {
                scenarios: vec![NamedScenarioResult {
                    name: "schema".to_string(),
                    result: ScenarioResult::Failed { error },
                }],
            };
        }

        let scenarios = self
            .scenarios()
            .into_iter()
            .map(|scenario| {
                let _span = tracing::debug_span!("scenario", case = %self.name, name = %scenario.name())
                    .entered();
                let result = match scenario.run() {
                    Ok(()) => ScenarioResult::Passed,
                    Err(error) => ScenarioResult::Failed {
                        error: if config.trace {
                            format!("{error}\n\nProcedure:\n{}", scenario.render())
                        } else {
                            error.to_string()
                        },
                    },
                };
                NamedScenarioResult {
                    name: scenario.name(),
                    result,
                }
            })
            .collect();
        CaseResult { scenarios }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_presence() {
        let file = CaseFile::parse(
            r#"{"schema": {"type": "literal", "subtype": "any"},
                "cases": {
                    "unchecked": {"input": 1},
                    "none": {"input": 1, "output": null},
                    "some": {"input": 1, "output": 1}
                }}"#,
        )
        .unwrap();
        assert_eq!(file.cases["unchecked"].output, None);
        assert_eq!(file.cases["none"].output, Some(Value::Null));
        assert_eq!(file.cases["some"].output, Some(Value::from(1)));
        assert!(
            file.all_cases()
                .all(|case| matches!(case.schema, Some(Ok(_))))
        );
    }

    #[test]
    fn test_malformed_schema_fails_only_its_case() {
        let file = CaseFile::parse(
            r#"{"cases": {
                    "typo": {"schema": {"type": "literal", "subtype": "any", "rule": []}, "input": 1},
                    "fine": {"schema": {"type": "literal", "subtype": "any"}, "input": 1}
                }}"#,
        )
        .unwrap();
        let config = RunConfig { trace: false };
        let results: BTreeMap<_, _> = file
            .all_cases()
            .map(|case| (case.name.clone(), case.run_all(&config)))
            .collect();
        assert!(!results["typo"].all_passed());
        assert_eq!(results["typo"].scenarios[0].name, "schema");
        assert!(results["fine"].all_passed());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(CaseFile::parse(r#"{"cases": {"a": {"inptu": 1}}}"#).is_err());
    }
}
