//! Backing stores that resources are read from
//!
//! A container is pure I/O: it enumerates entries, reports sizes and copies
//! raw bytes into caller-provided buffers. Caching policy lives in the cache.
//!
//! Implementations:
//! - [`ZipContainer`]: zip archives, optionally password protected
//! - [`DirectoryContainer`]: a directory tree on disk
//! - [`MemoryContainer`]: entries held in memory

mod directory;
mod memory;
mod zip_archive;

pub use directory::DirectoryContainer;
pub use memory::MemoryContainer;
pub use zip_archive::ZipContainer;

use crate::error::Result;

/// Archive abstraction used by the resource cache
///
/// Enumeration order must be stable for a given archive: `entry_name(i)`
/// returns the same name for the same `i` until the container is dropped.
pub trait ResourceContainer: Send {
    /// Human-readable location for diagnostics (path, label, ...)
    fn location(&self) -> &str;

    /// Open the backing store
    ///
    /// Single use: calling `open` again after a successful open fails with
    /// `ContainerAlreadyOpen` and changes nothing.
    fn open(&mut self) -> Result<()>;

    /// Whether `open` has succeeded
    fn is_open(&self) -> bool;

    /// Size in bytes of the named entry, `None` if absent
    fn size_of(&self, name: &str) -> Option<usize>;

    /// Copy the named entry into `buffer`, returning the bytes written
    ///
    /// `buffer` must hold at least `size_of(name)` bytes. Missing entries,
    /// corrupt streams and bad credentials are errors; there is no partial
    /// success.
    fn read_into(&mut self, name: &str, buffer: &mut [u8]) -> Result<usize>;

    /// Number of entries
    fn entry_count(&self) -> usize;

    /// Name of the entry at `index`
    fn entry_name(&self, index: usize) -> Option<&str>;

    /// All entry names in enumeration order
    fn entry_names(&self) -> Vec<String> {
        (0..self.entry_count())
            .filter_map(|index| self.entry_name(index).map(str::to_string))
            .collect()
    }
}

/// Ordered name index shared by the container implementations
#[derive(Debug, Default)]
pub(crate) struct EntryIndex {
    names: Vec<String>,
    sizes: Vec<usize>,
    positions: ahash::AHashMap<String, usize>,
}

impl EntryIndex {
    /// Insert or replace an entry, returning its position
    pub(crate) fn upsert(&mut self, name: &str, size: usize) -> usize {
        if let Some(&position) = self.positions.get(name) {
            self.sizes[position] = size;
            return position;
        }
        let position = self.names.len();
        self.names.push(name.to_string());
        self.sizes.push(size);
        self.positions.insert(name.to_string(), position);
        position
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub(crate) fn size_of(&self, name: &str) -> Option<usize> {
        self.position(name).map(|position| self.sizes[position])
    }

    pub(crate) fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_index_keeps_insertion_order() {
        let mut index = EntryIndex::default();
        index.upsert("b.bin", 2);
        index.upsert("a.bin", 1);
        index.upsert("c.bin", 3);

        assert_eq!(index.len(), 3);
        assert_eq!(index.name(0), Some("b.bin"));
        assert_eq!(index.name(1), Some("a.bin"));
        assert_eq!(index.name(2), Some("c.bin"));
        assert_eq!(index.name(3), None);
    }

    #[test]
    fn test_entry_index_upsert_replaces_size() {
        let mut index = EntryIndex::default();
        assert_eq!(index.upsert("a.bin", 1), 0);
        assert_eq!(index.upsert("a.bin", 10), 0);

        assert_eq!(index.len(), 1);
        assert_eq!(index.size_of("a.bin"), Some(10));
        assert_eq!(index.size_of("missing.bin"), None);
    }
}
