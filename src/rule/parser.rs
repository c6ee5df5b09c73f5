//! Rule string parser
//!
//! Builds a strictly left-associative tree: no precedence, no grouping.
//! `a AND b OR c` is `(a AND b) OR c`.

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::rule::ast::{Connective, RuleNode};
use crate::rule::lexer::{tokenize, Token};

/// Parse a rule string into an AST.
///
/// Returns `None` when the string holds no operand clause.
pub fn parse(rule: &str) -> Option<RuleNode> {
    let tokens = tokenize(rule);
    build(tokens)
}

/// Fold a token stream into a tree.
///
/// Each operand after the first is joined to the tree built so far using the
/// most recently seen connective. Connectives that are never consumed (a
/// trailing one, or all but the last of a run) are dropped.
pub fn build<I>(tokens: I) -> Option<RuleNode>
where
    I: IntoIterator<Item = Token>,
{
    let mut current: Option<RuleNode> = None;
    let mut operators: SmallVec<[Connective; 4]> = SmallVec::new();

    for token in tokens {
        match token {
            Token::Operand(clause) => {
                let leaf = RuleNode::Operand(clause);
                current = Some(match current.take() {
                    None => leaf,
                    Some(tree) => match operators.pop() {
                        Some(connective) => RuleNode::operator(connective, tree, leaf),
                        None => {
                            // Two operands with nothing between them: keep the
                            // tree built so far and drop the newcomer.
                            trace!(clause = leaf.value(), "operand without connective dropped");
                            tree
                        }
                    },
                });
            }
            Token::Connective(connective) => operators.push(connective),
        }
    }

    if !operators.is_empty() {
        trace!(stranded = operators.len(), "connectives left without an operand");
    }

    current
}

/// Parse each rule and fold the trees left to right under an implicit AND:
/// `((r1 AND r2) AND r3) ...`
///
/// Returns `None` for an empty list, and when no rule yields a tree.
pub fn combine<S: AsRef<str>>(rules: &[S]) -> Option<RuleNode> {
    let combined = rules
        .iter()
        .filter_map(|rule| parse(rule.as_ref()))
        .reduce(|acc, tree| RuleNode::operator(Connective::And, acc, tree));

    debug!(
        rules = rules.len(),
        combined = combined.is_some(),
        "combined rules"
    );
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::ast::NodeKind;

    fn leaf(text: &str) -> RuleNode {
        RuleNode::operand(text)
    }

    #[test]
    fn test_parse_single_clause() {
        assert_eq!(parse("  age > 30 "), Some(leaf("age > 30")));
        assert_eq!(parse("department = 'Sales'"), Some(leaf("department = 'Sales'")));
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("    "), None);
        assert_eq!(parse("AND OR"), None);
        assert_eq!(parse("nonsense"), None);
    }

    #[test]
    fn test_parse_and_condition() {
        let ast = parse("a > 1 AND b < 2").unwrap();
        assert_eq!(ast.kind(), NodeKind::Operator);
        assert_eq!(ast.value(), "AND");
        assert_eq!(ast.left().unwrap().value(), "a > 1");
        assert_eq!(ast.right().unwrap().value(), "b < 2");
    }

    #[test]
    fn test_parse_is_left_associative() {
        let ast = parse("a=1 AND b=2 OR c=3").unwrap();
        let expected = RuleNode::operator(
            Connective::Or,
            RuleNode::operator(Connective::And, leaf("a=1"), leaf("b=2")),
            leaf("c=3"),
        );
        assert_eq!(ast, expected);

        // OR before AND folds the same way, no precedence
        let ast = parse("a=1 OR b=2 AND c=3").unwrap();
        let expected = RuleNode::operator(
            Connective::And,
            RuleNode::operator(Connective::Or, leaf("a=1"), leaf("b=2")),
            leaf("c=3"),
        );
        assert_eq!(ast, expected);
    }

    #[test]
    fn test_parse_depth_matches_connectives() {
        let ast = parse("a=1 AND b=2 AND c=3 OR d=4").unwrap();
        assert_eq!(ast.depth(), 3);
        assert_eq!(ast.clauses(), vec!["a=1", "b=2", "c=3", "d=4"]);
    }

    #[test]
    fn test_parse_trailing_connective_is_ignored() {
        assert_eq!(parse("a=1 AND"), Some(leaf("a=1")));
        assert_eq!(parse("a=1 AND b=2 OR"), parse("a=1 AND b=2"));
    }

    #[test]
    fn test_parse_leading_connective_is_ignored_until_needed() {
        // The leading OR sits on the stack; the AND pushed later is popped first.
        let ast = parse("OR a=1 AND b=2").unwrap();
        assert_eq!(
            ast,
            RuleNode::operator(Connective::And, leaf("a=1"), leaf("b=2"))
        );
    }

    #[test]
    fn test_parse_consecutive_connectives_use_latest() {
        let ast = parse("a=1 AND OR b=2").unwrap();
        assert_eq!(ast, RuleNode::operator(Connective::Or, leaf("a=1"), leaf("b=2")));

        // The earlier AND stays stranded below the later one
        let ast = parse("a=1 AND OR b=2 AND c=3").unwrap();
        assert_eq!(
            ast,
            RuleNode::operator(
                Connective::And,
                RuleNode::operator(Connective::Or, leaf("a=1"), leaf("b=2")),
                leaf("c=3"),
            )
        );
    }

    #[test]
    fn test_build_operand_without_connective_keeps_tree() {
        let tokens = vec![
            Token::Operand("a=1".to_string()),
            Token::Operand("b=2".to_string()),
        ];
        assert_eq!(build(tokens), Some(leaf("a=1")));
    }

    #[test]
    fn test_parse_discarded_token_between_connectives() {
        let ast = parse("a=1 AND ??? OR b=2").unwrap();
        assert_eq!(ast, RuleNode::operator(Connective::Or, leaf("a=1"), leaf("b=2")));
    }

    #[test]
    fn test_parse_keeps_clauses_after_stray_apostrophe() {
        let ast = parse("a=1 AND it's junk OR b=2 AND c=3").unwrap();
        assert_eq!(
            ast,
            RuleNode::operator(
                Connective::And,
                RuleNode::operator(Connective::Or, leaf("a=1"), leaf("b=2")),
                leaf("c=3"),
            )
        );

        let ast = parse("a=1 AND b = 'open OR c=3").unwrap();
        assert_eq!(ast, RuleNode::operator(Connective::Or, leaf("a=1"), leaf("c=3")));
    }

    #[test]
    fn test_combine_empty() {
        let rules: [&str; 0] = [];
        assert_eq!(combine(&rules), None);
    }

    #[test]
    fn test_combine_single() {
        assert_eq!(combine(&["a=1"]), parse("a=1"));
        assert_eq!(combine(&["a=1 OR b=2"]), parse("a=1 OR b=2"));
    }

    #[test]
    fn test_combine_folds_left_under_and() {
        let ast = combine(&["a=1", "b=2", "c=3"]).unwrap();
        let expected = RuleNode::operator(
            Connective::And,
            RuleNode::operator(Connective::And, leaf("a=1"), leaf("b=2")),
            leaf("c=3"),
        );
        assert_eq!(ast, expected);
    }

    #[test]
    fn test_combine_keeps_inner_structure() {
        let ast = combine(&["a=1 OR b=2".to_string(), "c=3".to_string()]).unwrap();
        let expected = RuleNode::operator(
            Connective::And,
            RuleNode::operator(Connective::Or, leaf("a=1"), leaf("b=2")),
            leaf("c=3"),
        );
        assert_eq!(ast, expected);
    }

    #[test]
    fn test_combine_skips_rules_without_tree() {
        assert_eq!(combine(&["", "a=1", "   "]), Some(leaf("a=1")));
        assert_eq!(combine(&["", "garbage"]), None);
    }
}
