//! # resource-cache - Byte-Budgeted LRU Resource Cache
//!
//! `resource-cache` loads named assets on demand from an archive container,
//! runs them through a pattern-matched loader pipeline and hands out shared
//! handles to the resulting buffers:
//!
//! - **Byte budget** with least-recently-used eviction
//! - **Pluggable containers**: zip archives, directories, in-memory entries
//! - **Ordered loaders**: first matching pattern wins, development fallback last
//! - **Shared handles** that stay valid after eviction while anyone holds them
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resource_cache::{ResourceCache, Result, ZipContainer};
//!
//! # fn main() -> Result<()> {
//! // 32 MiB budget over a zip archive
//! let mut cache = ResourceCache::with_budget(32 * 1024 * 1024, ZipContainer::new("assets.zip"))?;
//! cache.initialize()?;
//!
//! let hero = cache.get_handle("textures/hero.png")?;
//! println!("{} is {} bytes", hero.name(), hero.size());
//! # Ok(())
//! # }
//! ```
//!
//! ## Advanced Usage
//!
//! ```rust,no_run
//! use resource_cache::{NamePattern, ReclaimMode, ResourceCacheBuilder, Result, TextLoader, ZipContainer};
//!
//! # fn main() -> Result<()> {
//! let mut cache = ResourceCacheBuilder::new()
//!     .budget_megabytes(64)
//!     .reclaim(ReclaimMode::Deferred)
//!     .loader(TextLoader::new())
//!     .build(ZipContainer::new("assets.zip").with_password("hunter2"))?;
//! cache.initialize()?;
//!
//! // Warm every shader, with a progress callback that can cancel
//! let loaded = cache.preload(&NamePattern::glob("shaders/**")?, |percent, _cancel| {
//!     println!("{}%", percent);
//! });
//! println!("{} shaders matched", loaded);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;

pub use crate::core::{
    cache::{CacheStats, ResourceCache},
    config::{CacheConfig, ReclaimMode},
    container::{DirectoryContainer, MemoryContainer, ResourceContainer, ZipContainer},
    handle::{Handle, ResourceHandle},
    loader::{DevelopmentLoader, LoaderRegistry, ResourceLoader, TextLoader},
    pattern::NamePattern,
};
pub use crate::error::{ResourceError, Result};

use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Builder for customizing cache creation
///
/// Provides a fluent API for the budget, reclaim mode and loaders.
///
/// # Examples
///
/// ```rust,no_run
/// use resource_cache::{DirectoryContainer, ResourceCacheBuilder, TextLoader};
///
/// # fn main() -> resource_cache::Result<()> {
/// let mut cache = ResourceCacheBuilder::new()
///     .budget_bytes(8 * 1024 * 1024)
///     .loader(TextLoader::new())
///     .build(DirectoryContainer::new("assets"))?;
/// cache.initialize()?;
/// # Ok(())
/// # }
/// ```
pub struct ResourceCacheBuilder {
    config: CacheConfig,
    loaders: Vec<Arc<dyn ResourceLoader>>,
}

impl ResourceCacheBuilder {
    /// Create a new ResourceCacheBuilder with default settings
    pub fn new() -> Self {
        ResourceCacheBuilder {
            config: CacheConfig::default(),
            loaders: Vec::new(),
        }
    }

    /// Start from an existing configuration
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Start from a TOML configuration file
    pub fn config_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        Ok(self.config(CacheConfig::from_file(path)?))
    }

    /// Set the budget in bytes
    pub fn budget_bytes(mut self, bytes: usize) -> Self {
        self.config.budget_bytes = bytes;
        self
    }

    /// Set the budget in MiB
    pub fn budget_megabytes(mut self, megabytes: usize) -> Self {
        self.config.budget_bytes = CacheConfig::from_megabytes(megabytes).budget_bytes;
        self
    }

    /// Set the eviction accounting mode
    pub fn reclaim(mut self, reclaim: ReclaimMode) -> Self {
        self.config.reclaim = reclaim;
        self
    }

    /// Register a loader; loaders are tried in the order they are added
    pub fn loader<L: ResourceLoader + 'static>(mut self, loader: L) -> Self {
        self.loaders.push(Arc::new(loader));
        self
    }

    /// Build the cache around `container` (not initialized yet)
    pub fn build<C: ResourceContainer>(self, container: C) -> Result<ResourceCache<C>> {
        debug!(
            "Building resource cache for {} with {} loaders",
            container.location(),
            self.loaders.len()
        );

        let mut cache = ResourceCache::new(self.config, container)?;
        for loader in self.loaders {
            cache.register_shared_loader(loader);
        }
        Ok(cache)
    }
}

impl Default for ResourceCacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}
