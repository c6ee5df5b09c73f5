//! Abstract Syntax Tree for rule expressions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::rule::transport::NodeRepr;

/// Logical connective joining two subtrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    /// AND
    And,
    /// OR
    Or,
}

impl Connective {
    pub fn as_str(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }

    /// Apply the connective to two already evaluated sides
    #[inline]
    pub fn apply(self, left: bool, right: bool) -> bool {
        match self {
            Connective::And => left && right,
            Connective::Or => left || right,
        }
    }
}

impl FromStr for Connective {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AND" => Ok(Connective::And),
            "OR" => Ok(Connective::Or),
            other => Err(RuleError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node kind as it appears in the transport form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Operand,
    Operator,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Operand => "operand",
            NodeKind::Operator => "operator",
        }
    }
}

/// AST node for rule expressions
///
/// Leaves keep the comparison clause verbatim (trimmed); the clause is only
/// broken into attribute, comparator and literal at evaluation time.
///
/// Serializes through the four-field transport form, see [`NodeRepr`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "NodeRepr", try_from = "NodeRepr")]
pub enum RuleNode {
    /// Single comparison clause like "age > 30"
    Operand(String),
    /// Two subtrees joined by AND / OR
    Operator {
        connective: Connective,
        left: Box<RuleNode>,
        right: Box<RuleNode>,
    },
}

impl RuleNode {
    pub fn operand(clause: impl Into<String>) -> Self {
        RuleNode::Operand(clause.into())
    }

    pub fn operator(connective: Connective, left: RuleNode, right: RuleNode) -> Self {
        RuleNode::Operator {
            connective,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            RuleNode::Operand(_) => NodeKind::Operand,
            RuleNode::Operator { .. } => NodeKind::Operator,
        }
    }

    /// The `value` field: clause text for leaves, connective for operators
    pub fn value(&self) -> &str {
        match self {
            RuleNode::Operand(clause) => clause,
            RuleNode::Operator { connective, .. } => connective.as_str(),
        }
    }

    pub fn left(&self) -> Option<&RuleNode> {
        match self {
            RuleNode::Operand(_) => None,
            RuleNode::Operator { left, .. } => Some(left),
        }
    }

    pub fn right(&self) -> Option<&RuleNode> {
        match self {
            RuleNode::Operand(_) => None,
            RuleNode::Operator { right, .. } => Some(right),
        }
    }

    /// Height of the tree; for a parsed rule this is its connective count
    pub fn depth(&self) -> usize {
        match self {
            RuleNode::Operand(_) => 0,
            RuleNode::Operator { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Leaf clauses in left-to-right order
    pub fn clauses(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_clauses(&mut out);
        out
    }

    fn collect_clauses<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            RuleNode::Operand(clause) => out.push(clause),
            RuleNode::Operator { left, right, .. } => {
                left.collect_clauses(out);
                right.collect_clauses(out);
            }
        }
    }
}
