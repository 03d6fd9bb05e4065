//! Validation behaviour of compiled procedures

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use sieve_compiler::{Compiler, CompilerConfig, ExecutionError, Procedure, compile};
use sieve_schema::{
    LiteralType, Node, Outcome, Rule, RuleContext, RuleError, RuleMeta, RuleOptions, RuleRef,
    RuleSetupError, ViolationCollector,
};

fn field(subtype: LiteralType, rules: &[&str]) -> Node {
    rules
        .iter()
        .fold(Node::literal(subtype), |node, rule| node.rule(*rule))
}

fn procedure(schema: &Node) -> Procedure {
    compile(&sieve_rules::catalog(), schema).expect("schema should compile")
}

fn object_ab() -> Node {
    Node::object()
        .rule("object")
        .child("a", field(LiteralType::String, &["string"]))
        .child("b", field(LiteralType::Number, &["number"]))
}

fn string_list() -> Node {
    Node::array()
        .rule("array")
        .each(field(LiteralType::String, &["string"]))
}

// ===== Objects =====

#[test]
fn test_object_valid_drops_undeclared_keys() {
    let result = procedure(&object_ab())
        .run(&json!({"a": "x", "b": 1, "c": true}))
        .unwrap();
    assert!(result.is_valid);
    assert_eq!(result.output, Some(json!({"a": "x", "b": 1})));
}

#[test]
fn test_object_reports_each_bad_field() {
    let result = procedure(&object_ab())
        .run(&json!({"a": 1, "b": "y"}))
        .unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.violations.pointers(), vec!["a", "b"]);
    assert_eq!(result.violations.0[0].rule, "string");
    assert_eq!(result.violations.0[1].rule, "number");
}

#[test]
fn test_object_absent_field_is_reported() {
    let result = procedure(&object_ab()).run(&json!({"a": "x"})).unwrap();
    assert_eq!(result.violations.pointers(), vec!["b"]);
    assert_eq!(
        result.violations.0[0].message,
        "must be a number, got undefined"
    );
    assert_eq!(result.output, Some(json!({"a": "x"})));
}

#[test]
fn test_object_rejects_array_and_null() {
    let procedure = procedure(&object_ab());
    for input in [json!([]), Value::Null] {
        let result = procedure.run(&input).unwrap();
        assert_eq!(result.violations.0.len(), 1);
        assert_eq!(result.violations.0[0].pointer, "");
        assert_eq!(result.violations.0[0].rule, "object");
        assert_eq!(result.output, None);
    }
}

#[test]
fn test_children_keep_declaration_order() {
    let schema = Node::object()
        .rule("object")
        .child("z", field(LiteralType::String, &["string"]))
        .child("a", field(LiteralType::String, &["string"]));
    let result = procedure(&schema).run(&json!({"a": 1, "z": 2})).unwrap();
    assert_eq!(result.violations.pointers(), vec!["z", "a"]);
}

#[test]
fn test_empty_root_compiles_to_nothing() {
    let empty = procedure(&Node::object());
    assert_eq!(empty.stats().statements, 0);
    assert_eq!(empty.run(&json!({"a": 1})).unwrap().output, None);
}

#[test]
fn test_rule_less_fields_pass_through() {
    let schema = Node::object()
        .rule("object")
        .child("free", Node::literal(LiteralType::Any))
        .child("xs", Node::array().each(Node::literal(LiteralType::Any)))
        .child("gone", Node::literal(LiteralType::Any));
    let procedure = procedure(&schema);
    assert!(procedure.render().contains("if v1 exists { out0[\"free\"] = v1; }"));
    assert!(!procedure.render().contains("for "));

    let result = procedure
        .run(&json!({"free": 1, "xs": [1, "two"], "extra": true}))
        .unwrap();
    assert!(result.is_valid);
    assert_eq!(result.output, Some(json!({"free": 1, "xs": [1, "two"]})));
}

// ===== Arrays =====

#[test]
fn test_array_of_strings() {
    let result = procedure(&string_list()).run(&json!(["x", "y"])).unwrap();
    assert!(result.is_valid);
    assert_eq!(result.output, Some(json!(["x", "y"])));
}

#[test]
fn test_array_element_pointer_uses_literal_index() {
    let result = procedure(&string_list()).run(&json!(["x", 1])).unwrap();
    assert_eq!(result.violations.pointers(), vec!["1"]);
    assert_eq!(
        result.violations.0[0].expression_pointer.as_deref(),
        Some("[1]")
    );
    assert_eq!(result.output, Some(json!(["x"])));
}

#[test]
fn test_array_guard_skips_non_list() {
    let result = procedure(&string_list()).run(&json!("not-an-array")).unwrap();
    assert_eq!(result.violations.0.len(), 1);
    assert_eq!(result.violations.0[0].rule, "array");
    assert_eq!(result.output, None);
}

#[test]
fn test_array_without_element_schema_passes_through() {
    let schema = Node::object().rule("object").child(
        "tags",
        Node::array()
            .rule("array")
            .rule(RuleRef::new("max_length").with_args(json!(2))),
    );
    let procedure = procedure(&schema);

    let result = procedure.run(&json!({"tags": ["a", 1]})).unwrap();
    assert!(result.is_valid);
    assert_eq!(result.output, Some(json!({"tags": ["a", 1]})));

    let result = procedure.run(&json!({"tags": ["a", "b", "c"]})).unwrap();
    assert_eq!(result.violations.pointers(), vec!["tags"]);
    assert_eq!(result.violations.0[0].rule, "max_length");
    assert_eq!(result.output, Some(json!({})));
}

#[test]
fn test_failed_container_rule_still_checks_elements() {
    let schema = Node::array()
        .rule("array")
        .rule(RuleRef::new("max_length").with_args(json!(1)))
        .each(field(LiteralType::String, &["string"]));
    let result = procedure(&schema).run(&json!(["a", 2])).unwrap();
    assert_eq!(result.violations.pointers(), vec!["", "1"]);
    assert_eq!(result.output, None);
}

#[test]
fn test_nested_pointer() {
    let schema = Node::object().rule("object").child(
        "items",
        Node::array().rule("array").each(
            Node::object()
                .rule("object")
                .child("name", field(LiteralType::String, &["string"])),
        ),
    );
    let result = procedure(&schema)
        .run(&json!({"items": [{"name": "a"}, {"name": 2}]}))
        .unwrap();

    assert_eq!(result.violations.pointers(), vec!["items.1.name"]);
    assert_eq!(
        result.violations.0[0].expression_pointer.as_deref(),
        Some("items[1].name")
    );
    assert_eq!(
        result.output,
        Some(json!({"items": [{"name": "a"}, {}]}))
    );
}

#[test]
fn test_nested_arrays_track_each_index() {
    let schema = Node::array()
        .rule("array")
        .each(Node::array().rule("array").each(field(LiteralType::Number, &["number"])));
    let result = procedure(&schema)
        .run(&json!([[1, 2], [3, "x"], []]))
        .unwrap();
    assert_eq!(result.violations.pointers(), vec!["1.1"]);
    assert_eq!(result.output, Some(json!([[1, 2], [3], []])));
}

// ===== Absent values and rule chains =====

fn nickname() -> Node {
    Node::object().rule("object").child(
        "nick",
        Node::literal(LiteralType::String)
            .rule("optional")
            .rule("string")
            .rule(RuleRef::new("min_length").with_args(json!(2))),
    )
}

#[test]
fn test_tolerant_field_skips_rules_when_absent() {
    let result = procedure(&nickname()).run(&json!({})).unwrap();
    assert!(result.is_valid);
    assert_eq!(result.output, Some(json!({})));
}

#[test]
fn test_tolerant_field_checks_present_values() {
    let procedure = procedure(&nickname());

    let result = procedure.run(&json!({"nick": "a"})).unwrap();
    assert_eq!(result.violations.0[0].rule, "min_length");

    let result = procedure.run(&json!({"nick": null})).unwrap();
    assert_eq!(
        result.violations.0[0].message,
        "must be a string, got null"
    );
}

#[test]
fn test_bail_stops_after_first_violation() {
    let schema = Node::object()
        .rule("object")
        .child("name", field(LiteralType::String, &["required", "string"]));

    let result = procedure(&schema).run(&json!({})).unwrap();
    assert_eq!(result.violations.0.len(), 1);
    assert_eq!(result.violations.0[0].rule, "required");

    let registry = sieve_rules::catalog();
    let all = Compiler::new(&registry)
        .with_config(CompilerConfig::new().with_bail(false))
        .compile(&schema)
        .unwrap();
    let result = all.run(&json!({})).unwrap();
    let rules: Vec<_> = result.violations.0.iter().map(|v| v.rule.as_str()).collect();
    assert_eq!(rules, vec!["required", "string"]);
}

#[test]
fn test_message_override_substitutes_field() {
    let schema = Node::object().rule("object").child(
        "a",
        Node::literal(LiteralType::String)
            .rule(RuleRef::new("string").with_message("{field} needs text")),
    );
    let result = procedure(&schema).run(&json!({"a": 1})).unwrap();
    assert_eq!(result.violations.0[0].message, "a needs text");
}

// ===== Procedure reuse =====

#[test]
fn test_compiling_twice_is_deterministic() {
    let schema = Node::object()
        .rule("object")
        .child("a", field(LiteralType::String, &["string"]))
        .child("list", string_list());
    let input = json!({"a": 3, "list": ["x", 2, "z"]});

    let first = procedure(&schema);
    let second = procedure(&schema);
    assert_eq!(first.render(), second.render());
    assert_eq!(first.run(&input).unwrap(), second.run(&input).unwrap());
}

#[test]
fn test_procedure_is_reentrant_across_threads() {
    let procedure = procedure(&string_list());
    let inputs = [json!(["a"]), json!([1, "b"]), json!("c")];
    let expected: Vec<_> = inputs.iter().map(|i| procedure.run(i).unwrap()).collect();

    let shared = &procedure;
    std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| scope.spawn(move || shared.run(input).unwrap()))
            .collect();
        let actual: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(actual, expected);
    });
}

#[test]
fn test_validate_reports_to_given_reporter() {
    let procedure = procedure(&object_ab());
    let mut reporter = ViolationCollector::new();
    let output = procedure
        .validate(&json!({"a": "x", "b": false}), &mut reporter)
        .unwrap();
    assert_eq!(output, Some(json!({"a": "x"})));
    let violations = reporter.into_result().unwrap_err();
    assert_eq!(violations.to_string(), "b: must be a number, got boolean (number)");
}

// ===== Rule failures =====

struct Exploding;

impl Rule for Exploding {
    fn compile(&self, _args: &Value) -> Result<RuleMeta, RuleSetupError> {
        Ok(RuleMeta::new("boom"))
    }

    fn validate(
        &self,
        _value: Option<&Value>,
        _options: &RuleOptions,
        _ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError> {
        Err(RuleError::custom("exploded"))
    }
}

#[test]
fn test_rule_error_aborts_the_call() {
    let registry = sieve_rules::catalog().with("boom", Exploding);
    let schema = Node::object()
        .rule("object")
        .child("x", Node::literal(LiteralType::Any).rule("boom"))
        .child("y", field(LiteralType::String, &["string"]));
    let procedure = compile(&registry, &schema).unwrap();

    let err = procedure.run(&json!({"x": 1, "y": 2})).unwrap_err();
    assert_eq!(
        err,
        ExecutionError::Rule {
            rule: "boom".to_string(),
            pointer: "x".to_string(),
            source: RuleError::custom("exploded"),
        }
    );
}
