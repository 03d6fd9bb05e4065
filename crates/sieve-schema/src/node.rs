//! Schema node tree
//!
//! A schema is an owned tree of [`Node`]s. Each node carries a kind tag and
//! an ordered list of rule references. Only the fields belonging to the tag
//! are meaningful; object children keep their declaration order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar subtype of a literal node.
///
/// `Array` and `Object` appear when the container compilers reuse the
/// literal compiler for their own container-level rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralType {
    String,
    Number,
    Boolean,
    Date,
    Any,
    Array,
    Object,
}

impl LiteralType {
    pub fn as_str(self) -> &'static str {
        match self {
            LiteralType::String => "string",
            LiteralType::Number => "number",
            LiteralType::Boolean => "boolean",
            LiteralType::Date => "date",
            LiteralType::Any => "any",
            LiteralType::Array => "array",
            LiteralType::Object => "object",
        }
    }
}

/// A reference to a rule in the registry, with its per-node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleRef {
    pub name: String,
    /// Rule arguments (e.g. `{"min": 3}`); `null` when the rule takes none.
    #[serde(default)]
    pub args: Value,
    /// Overrides the rule's default violation message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RuleRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Value::Null,
            message: None,
        }
    }

    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl From<&str> for RuleRef {
    fn from(name: &str) -> Self {
        RuleRef::new(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Literal {
        subtype: LiteralType,
    },
    Object {
        #[serde(default)]
        children: IndexMap<String, Node>,
    },
    Array {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        each: Option<Box<Node>>,
    },
}

/// One typed unit of a schema tree.
///
/// Deserializing rejects keys that do not belong to the node's `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StrictNode")]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default)]
    pub rules: Vec<RuleRef>,
}

/// Wire form of [`Node`]. `rules` sits in every variant because
/// `deny_unknown_fields` cannot see through `flatten`.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
enum StrictNode {
    Literal {
        subtype: LiteralType,
        #[serde(default)]
        rules: Vec<RuleRef>,
    },
    Object {
        #[serde(default)]
        children: IndexMap<String, Node>,
        #[serde(default)]
        rules: Vec<RuleRef>,
    },
    Array {
        #[serde(default)]
        each: Option<Box<Node>>,
        #[serde(default)]
        rules: Vec<RuleRef>,
    },
}

impl From<StrictNode> for Node {
    fn from(node: StrictNode) -> Self {
        let (kind, rules) = match node {
            StrictNode::Literal { subtype, rules } => (NodeKind::Literal { subtype }, rules),
            StrictNode::Object { children, rules } => (NodeKind::Object { children }, rules),
            StrictNode::Array { each, rules } => (NodeKind::Array { each }, rules),
        };
        Self { kind, rules }
    }
}

impl Node {
    pub fn literal(subtype: LiteralType) -> Self {
        Self {
            kind: NodeKind::Literal { subtype },
            rules: Vec::new(),
        }
    }

    pub fn object() -> Self {
        Self {
            kind: NodeKind::Object {
                children: IndexMap::new(),
            },
            rules: Vec::new(),
        }
    }

    pub fn array() -> Self {
        Self {
            kind: NodeKind::Array { each: None },
            rules: Vec::new(),
        }
    }

    /// Append a rule reference.
    #[must_use]
    pub fn rule(mut self, rule: impl Into<RuleRef>) -> Self {
        self.rules.push(rule.into());
        self
    }

    /// Declare a child field on an object node; redeclaring a name replaces
    /// the earlier child in place.
    ///
    /// Calling this on any other kind is a bug in the caller: debug builds
    /// panic, release builds leave the node unchanged.
    #[must_use]
    pub fn child(mut self, name: impl Into<String>, node: Node) -> Self {
        debug_assert!(
            matches!(self.kind, NodeKind::Object { .. }),
            "child() called on {} node",
            self.kind_name()
        );
        if let NodeKind::Object { children } = &mut self.kind {
            children.insert(name.into(), node);
        }
        self
    }

    /// Set the element schema of an array node. Same misuse handling as
    /// [`Node::child`].
    #[must_use]
    pub fn each(mut self, node: Node) -> Self {
        debug_assert!(
            matches!(self.kind, NodeKind::Array { .. }),
            "each() called on {} node",
            self.kind_name()
        );
        if let NodeKind::Array { each } = &mut self.kind {
            *each = Some(Box::new(node));
        }
        self
    }

    /// Name of the node kind, used in compiled output and logs.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Literal { subtype } => subtype.as_str(),
            NodeKind::Object { .. } => "object",
            NodeKind::Array { .. } => "array",
        }
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + match &self.kind {
            NodeKind::Literal { .. } => 0,
            NodeKind::Object { children } => children.values().map(Node::count).sum(),
            NodeKind::Array { each } => each.as_deref().map_or(0, Node::count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_builder_keeps_declaration_order() {
        let node = Node::object()
            .child("b", Node::literal(LiteralType::Number))
            .child("a", Node::literal(LiteralType::String));
        let NodeKind::Object { children } = &node.kind else {
            panic!("expected object node");
        };
        let names: Vec<_> = children.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    #[should_panic(expected = "child() called on string node")]
    fn test_child_on_literal_panics_in_debug() {
        let _ = Node::literal(LiteralType::String).child("x", Node::object());
    }

    #[test]
    #[should_panic(expected = "each() called on object node")]
    fn test_each_on_object_panics_in_debug() {
        let _ = Node::object().each(Node::literal(LiteralType::Any));
    }

    #[test]
    fn test_count_nested() {
        let node = Node::object().child(
            "items",
            Node::array().each(Node::object().child("name", Node::literal(LiteralType::String))),
        );
        assert_eq!(node.count(), 4);
    }

    #[test]
    fn test_deserialize_tree() {
        let node: Node = serde_json::from_value(json!({
            "type": "object",
            "rules": [{"name": "object"}],
            "children": {
                "tags": {
                    "type": "array",
                    "rules": [{"name": "array"}, {"name": "max_length", "args": {"max": 2}}],
                    "each": {"type": "literal", "subtype": "string", "rules": [{"name": "string"}]}
                }
            }
        }))
        .unwrap();

        let expected = Node::object().rule("object").child(
            "tags",
            Node::array()
                .rule("array")
                .rule(RuleRef::new("max_length").with_args(json!({"max": 2})))
                .each(Node::literal(LiteralType::String).rule("string")),
        );
        assert_eq!(node, expected);
    }

    #[test]
    fn test_misspelled_rules_key_rejected() {
        let error = serde_json::from_value::<Node>(json!({
            "type": "literal",
            "subtype": "string",
            "rule": [{"name": "string"}]
        }))
        .unwrap_err();
        assert!(error.to_string().contains("unknown field `rule`"), "{error}");
    }

    #[test]
    fn test_key_of_other_kind_rejected() {
        let error = serde_json::from_value::<Node>(json!({
            "type": "literal",
            "subtype": "any",
            "each": {"type": "literal", "subtype": "any"}
        }))
        .unwrap_err();
        assert!(error.to_string().contains("unknown field `each`"), "{error}");
    }

    #[test]
    fn test_nested_unknown_key_rejected() {
        let result = serde_json::from_value::<Node>(json!({
            "type": "object",
            "children": {
                "a": {"type": "literal", "subtype": "any", "rules": [{"name": "string", "arg": 1}]}
            }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_round_trips_through_strict_form() {
        let node = Node::array()
            .rule("array")
            .each(Node::object().child("n", Node::literal(LiteralType::Number).rule("number")));
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(serde_json::from_value::<Node>(value).unwrap(), node);
    }
}
