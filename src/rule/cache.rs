//! Rule parsing cache - keyed by the raw rule string

use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::config::{self, DEFAULT_CACHE_CAPACITY};
use crate::error::Result;
use crate::rule::ast::RuleNode;
use crate::rule::evaluator::{evaluate, Record};
use crate::rule::parser;

/// Parsed trees by rule string. Rules that parse to nothing are cached too.
pub struct RuleCache {
    entries: RwLock<AHashMap<String, Option<RuleNode>>>,
    capacity: AtomicUsize,
}

impl RuleCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(AHashMap::with_capacity(capacity)),
            capacity: AtomicUsize::new(capacity),
        }
    }

    /// Entries held before the cache is cleared
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Relaxed)
    }

    /// Change the limit; held entries stay until the next insert finds the
    /// cache full
    pub fn set_capacity(&self, capacity: usize) {
        self.capacity.store(capacity, Ordering::Relaxed);
    }

    /// Get or parse a rule. When `capacity` entries are held the cache is
    /// cleared before the new entry goes in.
    pub fn get_or_parse(&self, rule: &str) -> Option<RuleNode> {
        // Fast path: read lock only
        {
            let entries = self.entries.read();
            if let Some(ast) = entries.get(rule) {
                trace!(rule, "rule cache hit");
                return ast.clone();
            }
        }

        let ast = parser::parse(rule);

        {
            let mut entries = self.entries.write();
            if entries.len() >= self.capacity() {
                debug!(evicted = entries.len(), "rule cache full, clearing");
                entries.clear();
            }
            entries.insert(rule.to_string(), ast.clone());
        }

        ast
    }

    pub fn contains(&self, rule: &str) -> bool {
        self.entries.read().contains_key(rule)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

static RULE_CACHE: Lazy<RuleCache> = Lazy::new(|| RuleCache::with_capacity(DEFAULT_CACHE_CAPACITY));

/// Parse a rule through the process-wide cache
#[inline]
pub fn get_or_parse(rule: &str) -> Option<RuleNode> {
    if !config::current().cache_enabled {
        return parser::parse(rule);
    }
    RULE_CACHE.get_or_parse(rule)
}

/// Parse (cached) and evaluate a rule string against a record.
/// A blank rule is `false`, like any absent tree.
#[inline]
pub fn check_rule<R: Record + ?Sized>(rule: &str, record: &R) -> Result<bool> {
    if rule.trim().is_empty() {
        return Ok(false);
    }

    let ast = get_or_parse(rule);
    evaluate(ast.as_ref(), record)
}

/// Set the process-wide cache limit
pub fn set_cache_capacity(capacity: usize) {
    RULE_CACHE.set_capacity(capacity);
}

/// Clear the process-wide cache
pub fn clear_cache() {
    RULE_CACHE.clear();
}

/// Entries in the process-wide cache
pub fn cache_size() -> usize {
    RULE_CACHE.len()
}
