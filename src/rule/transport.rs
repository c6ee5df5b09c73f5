//! Transport form of the AST
//!
//! The persisted / wire shape is a plain nested object with exactly four
//! fields per node: `kind`, `left`, `right`, `value`. Absent fields are `null`.
//!
//! ```json
//! {"kind": "operator", "value": "AND",
//!  "left":  {"kind": "operand", "value": "age > 30", "left": null, "right": null},
//!  "right": {"kind": "operand", "value": "department = 'Sales'", "left": null, "right": null}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, RuleError};
use crate::rule::ast::{Connective, NodeKind, RuleNode};

/// One node of the transport form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRepr {
    pub kind: String,
    #[serde(default)]
    pub left: Option<Box<NodeRepr>>,
    #[serde(default)]
    pub right: Option<Box<NodeRepr>>,
    #[serde(default)]
    pub value: Option<String>,
}

impl From<&RuleNode> for NodeRepr {
    fn from(node: &RuleNode) -> Self {
        NodeRepr {
            kind: node.kind().as_str().to_string(),
            left: node.left().map(|child| Box::new(NodeRepr::from(child))),
            right: node.right().map(|child| Box::new(NodeRepr::from(child))),
            value: Some(node.value().to_string()),
        }
    }
}

impl From<RuleNode> for NodeRepr {
    fn from(node: RuleNode) -> Self {
        NodeRepr::from(&node)
    }
}

impl TryFrom<NodeRepr> for RuleNode {
    type Error = RuleError;

    fn try_from(repr: NodeRepr) -> Result<Self> {
        match repr.kind.as_str() {
            kind if kind == NodeKind::Operand.as_str() => {
                if repr.left.is_some() || repr.right.is_some() {
                    return Err(RuleError::InvalidNode(
                        "operand node with children".to_string(),
                    ));
                }
                match repr.value {
                    Some(clause) if !clause.trim().is_empty() => Ok(RuleNode::Operand(clause)),
                    _ => Err(RuleError::InvalidNode(
                        "operand node without a clause".to_string(),
                    )),
                }
            }
            kind if kind == NodeKind::Operator.as_str() => {
                let connective: Connective = repr
                    .value
                    .as_deref()
                    .ok_or_else(|| {
                        RuleError::InvalidNode("operator node without a connective".to_string())
                    })?
                    .parse()?;

                let (Some(left), Some(right)) = (repr.left, repr.right) else {
                    return Err(RuleError::InvalidNode(format!(
                        "{} node needs two children",
                        connective
                    )));
                };

                Ok(RuleNode::operator(
                    connective,
                    RuleNode::try_from(*left)?,
                    RuleNode::try_from(*right)?,
                ))
            }
            other => Err(RuleError::InvalidNode(format!("unknown node kind: {}", other))),
        }
    }
}

/// Transport value of an optional tree; an absent tree is `null`
pub fn to_value(ast: Option<&RuleNode>) -> Result<Value> {
    Ok(serde_json::to_value(ast.map(NodeRepr::from))?)
}

/// Rebuild an optional tree from its transport value
pub fn from_value(value: Value) -> Result<Option<RuleNode>> {
    let repr: Option<NodeRepr> = serde_json::from_value(value)?;
    repr.map(RuleNode::try_from).transpose()
}

pub fn to_json(ast: Option<&RuleNode>) -> Result<String> {
    Ok(serde_json::to_string(&ast.map(NodeRepr::from))?)
}

pub fn from_json(json: &str) -> Result<Option<RuleNode>> {
    let repr: Option<NodeRepr> = serde_json::from_str(json)?;
    repr.map(RuleNode::try_from).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::evaluator::evaluate;
    use crate::rule::parser::parse;
    use serde_json::json;

    #[test]
    fn test_operand_shape() {
        let ast = parse("age > 30").unwrap();
        let value = to_value(Some(&ast)).unwrap();
        assert_eq!(
            value,
            json!({"kind": "operand", "left": null, "right": null, "value": "age > 30"})
        );
    }

    #[test]
    fn test_operator_shape() {
        let ast = parse("a > 1 AND b < 2").unwrap();
        let value = to_value(Some(&ast)).unwrap();
        assert_eq!(
            value,
            json!({
                "kind": "operator",
                "value": "AND",
                "left": {"kind": "operand", "left": null, "right": null, "value": "a > 1"},
                "right": {"kind": "operand", "left": null, "right": null, "value": "b < 2"}
            })
        );
    }

    #[test]
    fn test_absent_tree_is_null() {
        assert_eq!(to_value(None).unwrap(), Value::Null);
        assert_eq!(to_json(None).unwrap(), "null");
        assert_eq!(from_json("null").unwrap(), None);
    }

    #[test]
    fn test_round_trip_preserves_tree() {
        let ast = parse("a=1 AND b='x y' OR c>=3").unwrap();
        let json = to_json(Some(&ast)).unwrap();
        assert_eq!(from_json(&json).unwrap(), Some(ast.clone()));

        let value = to_value(Some(&ast)).unwrap();
        assert_eq!(from_value(value).unwrap(), Some(ast));
    }

    #[test]
    fn test_round_trip_evaluates_identically() {
        let ast = parse("age > '25' AND department = 'Sales' OR vip = true");
        let rebuilt = from_json(&to_json(ast.as_ref()).unwrap()).unwrap();
        let record = json!({"age": 9, "department": "Sales", "vip": true});
        assert_eq!(
            evaluate(ast.as_ref(), &record).unwrap(),
            evaluate(rebuilt.as_ref(), &record).unwrap()
        );
    }

    #[test]
    fn test_extra_fields_are_dropped() {
        let value = json!({
            "kind": "operand",
            "value": "a = 1",
            "left": null,
            "right": null,
            "id": 42
        });
        let ast = from_value(value).unwrap().unwrap();
        assert_eq!(
            to_value(Some(&ast)).unwrap(),
            json!({"kind": "operand", "left": null, "right": null, "value": "a = 1"})
        );
    }

    #[test]
    fn test_missing_optional_fields_default_to_null() {
        let ast = from_value(json!({"kind": "operand", "value": "a = 1"})).unwrap();
        assert_eq!(ast, Some(RuleNode::operand("a = 1")));
    }

    #[test]
    fn test_unknown_connective() {
        let value = json!({
            "kind": "operator",
            "value": "XOR",
            "left": {"kind": "operand", "value": "a = 1"},
            "right": {"kind": "operand", "value": "b = 2"}
        });
        assert!(matches!(
            from_value(value),
            Err(RuleError::UnknownOperator(op)) if op == "XOR"
        ));
    }

    #[test]
    fn test_invalid_nodes() {
        let one_child = json!({
            "kind": "operator",
            "value": "AND",
            "left": {"kind": "operand", "value": "a = 1"},
            "right": null
        });
        assert!(matches!(from_value(one_child), Err(RuleError::InvalidNode(_))));

        let no_clause = json!({"kind": "operand", "value": null});
        assert!(matches!(from_value(no_clause), Err(RuleError::InvalidNode(_))));

        let leaf_with_child = json!({
            "kind": "operand",
            "value": "a = 1",
            "left": {"kind": "operand", "value": "b = 2"}
        });
        assert!(matches!(
            from_value(leaf_with_child),
            Err(RuleError::InvalidNode(_))
        ));

        let bad_kind = json!({"kind": "branch", "value": "AND"});
        assert!(matches!(from_value(bad_kind), Err(RuleError::InvalidNode(_))));
    }

    #[test]
    fn test_rule_node_serde_uses_transport_form() {
        let ast = parse("a = 1 OR b = 2").unwrap();
        assert_eq!(
            serde_json::to_value(&ast).unwrap(),
            to_value(Some(&ast)).unwrap()
        );

        let rebuilt: RuleNode = serde_json::from_value(to_value(Some(&ast)).unwrap()).unwrap();
        assert_eq!(rebuilt, ast);

        let bad = json!({"kind": "operator", "value": "NOR", "left": null, "right": null});
        assert!(serde_json::from_value::<RuleNode>(bad).is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(from_json("{"), Err(RuleError::Serialization(_))));
        assert!(matches!(
            from_json(r#"{"value": "a = 1"}"#),
            Err(RuleError::Serialization(_))
        ));
    }

    #[test]
    fn test_operand_clause_is_checked_at_evaluation() {
        // reconstruction keeps the clause verbatim; evaluation rejects it
        let ast = from_value(json!({"kind": "operand", "value": "a ~ 1"})).unwrap();
        let result = evaluate(ast.as_ref(), &json!({"a": 1}));
        assert!(matches!(result, Err(RuleError::InvalidOperand(_))));
    }
}
