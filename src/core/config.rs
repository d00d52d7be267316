//! Resource cache configuration
//!
//! Configuration can be built in code or read from TOML:
//!
//! ```toml
//! budget_bytes = 67108864
//! reclaim = "deferred"
//! ```

use crate::error::{ResourceError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// When an evicted entry's bytes are returned to the budget
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReclaimMode {
    /// Return the charge as soon as the cache drops its reference
    ///
    /// External holders may keep the buffer alive past eviction, so real
    /// memory use can temporarily exceed the budget.
    #[default]
    Eager,

    /// Return the charge only when the last holder drops the handle
    ///
    /// Evicting an entry that is still held elsewhere frees no budget, so a
    /// load may fail after evicting everything.
    Deferred,
}

/// Configuration for a [`ResourceCache`](crate::ResourceCache)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum bytes charged against the cache at any time
    pub budget_bytes: usize,

    /// Eviction accounting
    #[serde(default)]
    pub reclaim: ReclaimMode,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::from_megabytes(64)
    }
}

impl CacheConfig {
    /// Budget given in bytes
    pub fn new(budget_bytes: usize) -> Self {
        CacheConfig {
            budget_bytes,
            reclaim: ReclaimMode::default(),
        }
    }

    /// Budget given in MiB
    pub fn from_megabytes(megabytes: usize) -> Self {
        Self::new(megabytes.saturating_mul(1024 * 1024))
    }

    /// Set the reclaim mode
    pub fn with_reclaim(mut self, reclaim: ReclaimMode) -> Self {
        self.reclaim = reclaim;
        self
    }

    /// Parse and validate TOML configuration
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: CacheConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.budget_bytes == 0 {
            return Err(ResourceError::InvalidConfig(
                "budget_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
