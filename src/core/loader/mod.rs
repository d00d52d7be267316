//! Resource loaders and the ordered registry that selects them
//!
//! A loader decides which names it accepts and how the raw container bytes
//! become the buffer stored in a handle. The registry tries loaders in
//! registration order and picks the first whose pattern matches, so specific
//! loaders must be registered before generic ones. The fallback loader, when
//! installed, is always tried last.

mod builtin;

pub use builtin::{DevelopmentLoader, TextLoader};

use std::sync::Arc;

/// Transformation policy for one family of resources
///
/// The cache calls `decoded_size` and `decode` only for loaders that don't
/// use the raw buffer directly, and only after a successful container read.
pub trait ResourceLoader: Send + Sync {
    /// Loader name for diagnostics
    fn name(&self) -> &str;

    /// Whether this loader accepts `resource`
    fn matches(&self, resource: &str) -> bool;

    /// Use the raw container bytes as the final buffer, skipping `decode`
    fn use_raw(&self) -> bool;

    /// Drop the raw bytes (and their budget charge) once decoding succeeded
    fn discard_raw_after_decode(&self) -> bool {
        true
    }

    /// Append a NUL byte after the raw bytes
    fn null_terminate(&self) -> bool {
        false
    }

    /// Size of the decoded buffer for the given raw bytes
    ///
    /// `raw` includes the trailing NUL when `null_terminate` is set.
    fn decoded_size(&self, raw: &[u8]) -> usize {
        raw.len()
    }

    /// Fill `target` (exactly `decoded_size(raw)` bytes, zeroed) from `raw`
    ///
    /// Defaults to copying as many raw bytes as fit.
    fn decode(&self, raw: &[u8], target: &mut [u8]) -> anyhow::Result<()> {
        let len = target.len().min(raw.len());
        target[..len].copy_from_slice(&raw[..len]);
        Ok(())
    }
}

/// Ordered set of loaders, first match wins
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: Vec<Arc<dyn ResourceLoader>>,
    fallback: Option<Arc<dyn ResourceLoader>>,
}

impl LoaderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a loader; it is tried after every loader registered before it
    pub fn register<L: ResourceLoader + 'static>(&mut self, loader: L) {
        self.register_shared(Arc::new(loader));
    }

    /// Append an already shared loader
    pub fn register_shared(&mut self, loader: Arc<dyn ResourceLoader>) {
        self.loaders.push(loader);
    }

    /// Install the loader consulted after all registered loaders
    pub fn set_fallback<L: ResourceLoader + 'static>(&mut self, loader: L) {
        self.fallback = Some(Arc::new(loader));
    }

    /// Whether a fallback loader is installed
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// First loader accepting `resource`
    pub fn find(&self, resource: &str) -> Option<Arc<dyn ResourceLoader>> {
        self.iter()
            .find(|loader| loader.matches(resource))
            .map(Arc::clone)
    }

    /// Loaders in the order they are tried
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ResourceLoader>> {
        self.loaders.iter().chain(self.fallback.iter())
    }

    /// Loader names in the order they are tried
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|loader| loader.name()).collect()
    }

    /// Number of loaders, fallback included
    pub fn len(&self) -> usize {
        self.loaders.len() + usize::from(self.fallback.is_some())
    }

    /// Check if no loader is available
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
