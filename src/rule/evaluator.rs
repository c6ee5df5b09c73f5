//! Rule evaluator

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::str::FromStr;

use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Result, RuleError};
use crate::rule::ast::RuleNode;
use crate::rule::coerce::{loose_equals, relational_order};

/// Clause grammar used at evaluation time. The comparator capture is loose so
/// that unsupported symbols surface as `UnknownOperator` rather than
/// `InvalidOperand`; the value capture is non-greedy and stops before an
/// optional closing quote.
static CLAUSE_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([a-zA-Z_][a-zA-Z0-9_.]*)\s*([<>=!]+)\s*'?(.*?)'?\s*$")
        .expect("clause grammar is a valid regex")
});

/// Attribute lookup for evaluation.
///
/// Keys are opaque: `user.age` is looked up as-is, never as a nested path.
pub trait Record {
    fn attribute(&self, key: &str) -> Option<&Value>;
}

impl Record for Map<String, Value> {
    fn attribute(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

impl<S: BuildHasher> Record for HashMap<String, Value, S> {
    fn attribute(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

impl Record for AHashMap<String, Value> {
    fn attribute(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

/// Only objects carry attributes
impl Record for Value {
    fn attribute(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn attribute(&self, key: &str) -> Option<&Value> {
        (**self).attribute(key)
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// Greater than (>)
    Greater,
    /// Less than (<)
    Less,
    /// Greater than or equal (>=)
    GreaterEqual,
    /// Less than or equal (<=)
    LessEqual,
    /// Equal (=)
    Equal,
    /// Not equal (!=)
    NotEqual,
}

impl FromStr for Comparator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            ">" => Ok(Comparator::Greater),
            "<" => Ok(Comparator::Less),
            ">=" => Ok(Comparator::GreaterEqual),
            "<=" => Ok(Comparator::LessEqual),
            "=" => Ok(Comparator::Equal),
            "!=" => Ok(Comparator::NotEqual),
            other => Err(RuleError::UnknownOperator(other.to_string())),
        }
    }
}

impl Comparator {
    /// Compare a present record value against the literal text
    pub fn compare(self, value: &Value, literal: &str) -> bool {
        match self {
            Comparator::Equal => loose_equals(value, literal),
            Comparator::NotEqual => !loose_equals(value, literal),
            Comparator::Greater => {
                matches!(relational_order(value, literal), Some(Ordering::Greater))
            }
            Comparator::Less => matches!(relational_order(value, literal), Some(Ordering::Less)),
            Comparator::GreaterEqual => matches!(
                relational_order(value, literal),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Comparator::LessEqual => matches!(
                relational_order(value, literal),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

/// Operand clause broken into its parts
#[derive(Debug, Clone, PartialEq)]
pub struct Clause<'a> {
    pub attribute: &'a str,
    pub comparator: Comparator,
    pub literal: &'a str,
}

impl<'a> Clause<'a> {
    /// Split a clause like `age >= '30'` into attribute, comparator and literal
    pub fn parse(text: &'a str) -> Result<Self> {
        let caps = CLAUSE_GRAMMAR
            .captures(text)
            .ok_or_else(|| RuleError::InvalidOperand(text.to_string()))?;

        let (Some(attribute), Some(comparator), Some(literal)) =
            (caps.get(1), caps.get(2), caps.get(3))
        else {
            return Err(RuleError::InvalidOperand(text.to_string()));
        };

        Ok(Clause {
            attribute: attribute.as_str(),
            comparator: comparator.as_str().parse()?,
            literal: literal.as_str(),
        })
    }

    /// Missing attributes never satisfy any comparator
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        match record.attribute(self.attribute) {
            Some(value) => self.comparator.compare(value, self.literal),
            None => false,
        }
    }
}

/// Evaluate an AST against a record. An absent tree is `false`.
///
/// Both sides of every connective are evaluated, so a malformed clause on
/// either side is reported even when the other side decides the result.
pub fn evaluate<R: Record + ?Sized>(ast: Option<&RuleNode>, record: &R) -> Result<bool> {
    match ast {
        Some(node) => check(node, record),
        None => Ok(false),
    }
}

/// Evaluate a present tree against a record
pub fn check<R: Record + ?Sized>(node: &RuleNode, record: &R) -> Result<bool> {
    match node {
        RuleNode::Operand(clause) => check_operand(clause, record),
        RuleNode::Operator {
            connective,
            left,
            right,
        } => {
            let left = check(left, record)?;
            let right = check(right, record)?;
            Ok(connective.apply(left, right))
        }
    }
}

/// Evaluate a single clause like "age > 30"
pub fn check_operand<R: Record + ?Sized>(clause: &str, record: &R) -> Result<bool> {
    Ok(Clause::parse(clause)?.matches(record))
}
