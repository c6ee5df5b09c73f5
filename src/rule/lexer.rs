//! Rule string tokenizer

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use tracing::trace;

use crate::rule::ast::Connective;

/// `IDENTIFIER COMPARATOR VALUE`, anchored. Two-character comparators are
/// listed before their one-character prefixes.
static OPERAND_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_.]*\s*(?:>=|<=|!=|>|<|=)\s*(?:'[^']*'|[a-zA-Z0-9_.]+)$")
        .expect("operand grammar is a valid regex")
});

/// Typed token stream element
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Trimmed comparison clause, e.g. "age > 30"
    Operand(String),
    /// AND / OR
    Connective(Connective),
}

pub type Tokens = SmallVec<[Token; 8]>;

/// Whether a trimmed piece of text is a well-formed operand clause
#[inline]
pub fn is_operand(text: &str) -> bool {
    OPERAND_GRAMMAR.is_match(text)
}

/// Split a rule string into operand clauses and connectives.
///
/// Connectives are the literal words `AND` / `OR` (case-sensitive) outside of
/// single-quoted literals. A quote opens a literal only right after a
/// comparator and only when it is closed later; any other apostrophe is plain
/// text. Text between connectives is trimmed; pieces that do not match the
/// operand grammar are dropped.
pub fn tokenize(rule: &str) -> Tokens {
    let mut tokens = Tokens::new();
    let bytes = rule.as_bytes();
    let mut segment_start = 0;
    let mut in_quote = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' if in_quote => {
                in_quote = false;
                i += 1;
            }
            b'\'' if opens_literal(bytes, i) => {
                in_quote = true;
                i += 1;
            }
            _ if !in_quote => {
                if let Some(connective) = connective_at(bytes, i) {
                    push_segment(&mut tokens, &rule[segment_start..i]);
                    tokens.push(Token::Connective(connective));
                    i += connective.as_str().len();
                    segment_start = i;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }

    push_segment(&mut tokens, &rule[segment_start..]);
    tokens
}

fn push_segment(tokens: &mut Tokens, segment: &str) {
    let segment = segment.trim();
    if segment.is_empty() {
        return;
    }

    if is_operand(segment) {
        tokens.push(Token::Operand(segment.to_string()));
    } else {
        trace!(token = segment, "discarding unrecognised token");
    }
}

/// Whether the quote at `pos` starts a literal: it follows a comparator and
/// has a closing quote somewhere after it
fn opens_literal(bytes: &[u8], pos: usize) -> bool {
    let after_comparator = bytes[..pos]
        .iter()
        .rev()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| matches!(b, b'=' | b'<' | b'>'));

    after_comparator && bytes[pos + 1..].contains(&b'\'')
}

#[inline]
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// Connective starting at `pos`, if the word stands on its own
fn connective_at(bytes: &[u8], pos: usize) -> Option<Connective> {
    if pos > 0 && is_word_byte(bytes[pos - 1]) {
        return None;
    }

    [Connective::And, Connective::Or]
        .into_iter()
        .find(|connective| {
            let word = connective.as_str().as_bytes();
            bytes[pos..].starts_with(word)
                && bytes
                    .get(pos + word.len())
                    .map_or(true, |&next| !is_word_byte(next))
        })
}
