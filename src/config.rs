//! Engine configuration
//!
//! Configuration only tunes the parse cache; it never changes how a rule is
//! parsed or evaluated.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, RuleError};

pub const DEFAULT_CACHE_CAPACITY: usize = 2048;

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cache parsed trees by rule string
    pub cache_enabled: bool,
    /// Entries kept before the cache is cleared
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(RuleError::InvalidConfig(
                "cache_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a JSON object; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

static ENGINE_CONFIG: Lazy<RwLock<EngineConfig>> =
    Lazy::new(|| RwLock::new(EngineConfig::default()));

/// Replace the process-wide configuration
pub fn configure(config: EngineConfig) -> Result<()> {
    config.validate()?;

    {
        let mut guard = ENGINE_CONFIG.write();
        *guard = config;
    }

    crate::rule::cache::set_cache_capacity(config.cache_capacity);
    if !config.cache_enabled {
        crate::rule::cache::clear_cache();
    }

    debug!(
        cache_enabled = config.cache_enabled,
        cache_capacity = config.cache_capacity,
        "engine configured"
    );
    Ok(())
}

/// Current process-wide configuration
#[inline]
pub fn current() -> EngineConfig {
    *ENGINE_CONFIG.read()
}
