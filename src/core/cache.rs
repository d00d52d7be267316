//! Byte-budgeted LRU resource cache
//!
//! Resources are looked up by name. A hit promotes the entry to most recently
//! used. A miss runs the load pipeline:
//!
//! 1. pick the first loader whose pattern matches the name
//! 2. ask the container for the raw size (missing or empty = not found)
//! 3. read the raw bytes (+1 byte for NUL-terminating loaders)
//! 4. raw loaders charge the raw buffer, evicting least recently used
//!    entries until it fits; decoding loaders charge raw and decoded buffers
//!    together, fill the decoded one, then drop or keep the raw bytes as the
//!    loader asks
//! 5. wrap the final buffer in a handle at the most recently used position
//!
//! Requests that can never fit the budget fail before anything is evicted.
//! Every failure releases the charges taken so far before returning.
//!
//! The cache is single threaded. Share it behind a mutex if several threads
//! need to load; handles themselves are `Send + Sync`.

use crate::core::budget::{Allocation, MemoryBudget};
use crate::core::config::{CacheConfig, ReclaimMode};
use crate::core::container::ResourceContainer;
use crate::core::handle::{Handle, ResourceHandle};
use crate::core::loader::{DevelopmentLoader, LoaderRegistry, ResourceLoader};
use crate::core::pattern::NamePattern;
use crate::error::{ResourceError, Result};
use lru::LruCache;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Resident entries
    pub entries: usize,
    /// Bytes charged against the budget
    pub allocated_bytes: usize,
    /// Total budget
    pub max_bytes: usize,
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that went to the container
    pub misses: u64,
    /// Entries evicted (budget pressure, `remove` or `clear`)
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// LRU resource cache over a container
pub struct ResourceCache<C: ResourceContainer> {
    container: C,
    loaders: LoaderRegistry,
    /// Name index and recency order in one structure (front = MRU)
    entries: LruCache<String, Handle>,
    budget: Arc<MemoryBudget>,
    reclaim: ReclaimMode,
    initialized: bool,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<C: ResourceContainer> ResourceCache<C> {
    /// Create a cache that owns `container`
    ///
    /// The container must not be open yet; [`ResourceCache::initialize`]
    /// opens it.
    pub fn new(config: CacheConfig, container: C) -> Result<Self> {
        config.validate()?;
        Ok(ResourceCache {
            container,
            loaders: LoaderRegistry::new(),
            entries: LruCache::unbounded(),
            budget: MemoryBudget::new(config.budget_bytes),
            reclaim: config.reclaim,
            initialized: false,
            hits: 0,
            misses: 0,
            evictions: 0,
        })
    }

    /// Create a cache with a budget in bytes and default settings
    pub fn with_budget(max_bytes: usize, container: C) -> Result<Self> {
        Self::new(CacheConfig::new(max_bytes), container)
    }

    /// Open the container and install the development fallback loader
    ///
    /// If this fails the cache stays unusable: every load reports
    /// `NotInitialized`.
    pub fn initialize(&mut self) -> Result<()> {
        if let Err(err) = self.container.open() {
            warn!(
                "Failed to initialize resource cache on {}: {}",
                self.container.location(),
                err
            );
            return Err(err);
        }

        self.loaders.set_fallback(DevelopmentLoader::new());
        self.initialized = true;
        info!(
            "Resource cache ready: {} entries in {}, budget {} bytes",
            self.container.entry_count(),
            self.container.location(),
            self.budget.max_bytes()
        );
        Ok(())
    }

    /// Whether `initialize` succeeded
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Register a loader; loaders are tried in registration order
    pub fn register_loader<L: ResourceLoader + 'static>(&mut self, loader: L) {
        debug!("Registering loader '{}'", loader.name());
        self.loaders.register(loader);
    }

    /// Register an already shared loader
    pub fn register_shared_loader(&mut self, loader: Arc<dyn ResourceLoader>) {
        debug!("Registering loader '{}'", loader.name());
        self.loaders.register_shared(loader);
    }

    /// The loader registry
    pub fn loaders(&self) -> &LoaderRegistry {
        &self.loaders
    }

    /// The backing container
    pub fn container(&self) -> &C {
        &self.container
    }

    /// Get the handle for `name`, loading it on a miss
    pub fn get_handle(&mut self, name: &str) -> Result<Handle> {
        if !self.initialized {
            return Err(ResourceError::NotInitialized);
        }

        if let Some(handle) = self.entries.get(name) {
            self.hits += 1;
            debug!("Cache hit for {}", name);
            return Ok(Arc::clone(handle));
        }

        self.misses += 1;
        debug!("Cache miss for {}", name);
        self.load(name).map_err(|err| {
            warn!("Failed to load {}: {}", name, err);
            err
        })
    }

    /// Load every container entry matching `pattern`
    ///
    /// Entries are visited in container order. After each entry `progress`
    /// receives the percentage of entries visited and a cancel flag; setting
    /// the flag stops the preload. Individual load failures are logged and
    /// skipped. Returns the number of entries that matched.
    pub fn preload<F>(&mut self, pattern: &NamePattern, mut progress: F) -> usize
    where
        F: FnMut(u8, &mut bool),
    {
        if !self.initialized {
            warn!("Preload of '{}' skipped: cache is not initialized", pattern);
            return 0;
        }

        let total = self.container.entry_count();
        let mut matched = 0;
        let mut loaded = 0;
        let mut cancel = false;

        for index in 0..total {
            let name = self.container.entry_name(index).map(str::to_string);
            if let Some(name) = name.filter(|name| pattern.matches(name)) {
                matched += 1;
                if self.get_handle(&name).is_ok() {
                    loaded += 1;
                }
            }

            let percent = ((index + 1) * 100 / total) as u8;
            progress(percent, &mut cancel);
            if cancel {
                info!(
                    "Preload of '{}' cancelled after {} of {} entries",
                    pattern,
                    index + 1,
                    total
                );
                break;
            }
        }

        info!(
            "Preloaded '{}': {} matched, {} loaded",
            pattern, matched, loaded
        );
        matched
    }

    /// Names of container entries matching `pattern`, in container order
    pub fn names_matching(&self, pattern: &NamePattern) -> Vec<String> {
        (0..self.container.entry_count())
            .filter_map(|index| self.container.entry_name(index))
            .filter(|name| pattern.matches(name))
            .map(str::to_string)
            .collect()
    }

    /// Evict every entry, least recently used first
    pub fn clear(&mut self) {
        let count = self.entries.len();
        while self.evict_one() {}
        if count > 0 {
            info!("Cleared {} entries from resource cache", count);
        }
    }

    /// Evict one entry by name, returning whether it was resident
    pub fn remove(&mut self, name: &str) -> bool {
        match self.entries.pop_entry(name) {
            Some((name, handle)) => {
                self.retire(&name, handle);
                true
            }
            None => false,
        }
    }

    /// Whether `name` is resident (does not affect recency)
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(name)
    }

    /// Number of resident entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entry is resident
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resident names, most recently used first
    pub fn resident_names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Bytes charged against the budget
    pub fn allocated_bytes(&self) -> usize {
        self.budget.allocated()
    }

    /// Total budget
    pub fn max_bytes(&self) -> usize {
        self.budget.max_bytes()
    }

    /// Eviction accounting mode
    pub fn reclaim_mode(&self) -> ReclaimMode {
        self.reclaim
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            allocated_bytes: self.budget.allocated(),
            max_bytes: self.budget.max_bytes(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }

    fn load(&mut self, name: &str) -> Result<Handle> {
        let loader = self
            .loaders
            .find(name)
            .ok_or_else(|| ResourceError::NoLoaderMatched(name.to_string()))?;

        let raw_size = match self.container.size_of(name) {
            Some(size) if size > 0 => size,
            _ => return Err(ResourceError::ResourceNotFound(name.to_string())),
        };
        let raw_len = raw_size + usize::from(loader.null_terminate());
        debug!(
            "Loading {} ({} bytes) with loader '{}'",
            name,
            raw_size,
            loader.name()
        );

        if raw_len > self.budget.max_bytes() {
            return Err(self.allocation_failure(raw_len));
        }

        // Read before charging so a failed read or an impossible decode
        // never evicts anything
        let mut raw = vec![0u8; raw_len].into_boxed_slice();
        let read = self.container.read_into(name, &mut raw)?;
        if read < raw_size {
            return Err(ResourceError::read_failure(
                name,
                format!("short read: {} of {} bytes", read, raw_size),
            ));
        }

        let (buffer, retained, charge) = if loader.use_raw() {
            let charge = self.allocate(raw_len)?;
            (raw, None, charge)
        } else {
            let decoded_len = loader.decoded_size(&raw);
            // The raw buffer stays charged while decoding
            let peak = raw_len.saturating_add(decoded_len);
            self.make_room(peak)?;
            let raw_charge = self.budget.charge(raw_len);
            let mut charge = self.budget.charge(decoded_len);

            let mut decoded = vec![0u8; decoded_len].into_boxed_slice();
            loader
                .decode(&raw, &mut decoded)
                .map_err(|err| ResourceError::DecodeFailed {
                    name: name.to_string(),
                    loader: loader.name().to_string(),
                    reason: format!("{:#}", err),
                })?;

            if loader.discard_raw_after_decode() {
                drop(raw_charge);
                (decoded, None, charge)
            } else {
                charge.absorb(raw_charge);
                (decoded, Some(raw), charge)
            }
        };

        let handle = Arc::new(ResourceHandle::new(name, buffer, retained, charge));
        self.entries.push(name.to_string(), Arc::clone(&handle));
        debug!(
            "Cached {} ({} bytes, {} of {} bytes allocated)",
            name,
            handle.size(),
            self.budget.allocated(),
            self.budget.max_bytes()
        );
        Ok(handle)
    }

    fn allocate(&mut self, bytes: usize) -> Result<Allocation> {
        self.make_room(bytes)?;
        Ok(self.budget.charge(bytes))
    }

    /// Evict least recently used entries until `requested` more bytes fit
    fn make_room(&mut self, requested: usize) -> Result<()> {
        if requested > self.budget.max_bytes() {
            return Err(self.allocation_failure(requested));
        }

        while !self.budget.fits(requested) {
            if !self.evict_one() {
                return Err(self.allocation_failure(requested));
            }
        }
        Ok(())
    }

    fn evict_one(&mut self) -> bool {
        match self.entries.pop_lru() {
            Some((name, handle)) => {
                self.retire(&name, handle);
                true
            }
            None => false,
        }
    }

    fn retire(&mut self, name: &str, handle: Handle) {
        self.evictions += 1;
        let released = match self.reclaim {
            ReclaimMode::Eager => handle.release_charge(),
            ReclaimMode::Deferred => {
                // Only the last holder gives the bytes back
                if Arc::strong_count(&handle) == 1 {
                    handle.charged_bytes()
                } else {
                    0
                }
            }
        };
        debug!("Evicted {} (released {} bytes)", name, released);
    }

    fn allocation_failure(&self, requested: usize) -> ResourceError {
        ResourceError::AllocationFailure {
            requested,
            allocated: self.budget.allocated(),
            max_bytes: self.budget.max_bytes(),
        }
    }
}

impl<C: ResourceContainer> Drop for ResourceCache<C> {
    fn drop(&mut self) {
        self.clear();
    }
}
