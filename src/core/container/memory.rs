//! In-memory container

use super::{EntryIndex, ResourceContainer};
use crate::error::{ResourceError, Result};
use tracing::debug;

/// Container whose entries live in memory
///
/// Entries enumerate in insertion order. Useful for embedded assets and for
/// tests, which can inspect [`MemoryContainer::read_count`] to see how often
/// the cache went to the container.
#[derive(Debug)]
pub struct MemoryContainer {
    label: String,
    index: EntryIndex,
    data: Vec<Vec<u8>>,
    open: bool,
    reads: usize,
}

impl MemoryContainer {
    /// Create an empty container
    pub fn new(label: impl Into<String>) -> Self {
        MemoryContainer {
            label: label.into(),
            index: EntryIndex::default(),
            data: Vec::new(),
            open: false,
            reads: 0,
        }
    }

    /// Builder-style [`MemoryContainer::insert`]
    pub fn with_entry(mut self, name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    /// Add an entry, replacing any entry with the same name in place
    pub fn insert(&mut self, name: &str, bytes: impl Into<Vec<u8>>) {
        let bytes = bytes.into();
        let position = self.index.upsert(name, bytes.len());
        if position == self.data.len() {
            self.data.push(bytes);
        } else {
            self.data[position] = bytes;
        }
    }

    /// Number of successful `read_into` calls so far
    pub fn read_count(&self) -> usize {
        self.reads
    }
}

impl ResourceContainer for MemoryContainer {
    fn location(&self) -> &str {
        &self.label
    }

    fn open(&mut self) -> Result<()> {
        if self.open {
            return Err(ResourceError::ContainerAlreadyOpen(self.label.clone()));
        }
        self.open = true;
        debug!("Opened memory container '{}' with {} entries", self.label, self.index.len());
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn size_of(&self, name: &str) -> Option<usize> {
        self.index.size_of(name)
    }

    fn read_into(&mut self, name: &str, buffer: &mut [u8]) -> Result<usize> {
        if !self.open {
            return Err(ResourceError::read_failure(name, "container is not open"));
        }
        let position = self
            .index
            .position(name)
            .ok_or_else(|| ResourceError::read_failure(name, "no such entry"))?;
        let bytes = &self.data[position];
        if buffer.len() < bytes.len() {
            return Err(ResourceError::read_failure(
                name,
                format!("buffer holds {} of {} bytes", buffer.len(), bytes.len()),
            ));
        }

        buffer[..bytes.len()].copy_from_slice(bytes);
        self.reads += 1;
        Ok(bytes.len())
    }

    fn entry_count(&self) -> usize {
        self.index.len()
    }

    fn entry_name(&self, index: usize) -> Option<&str> {
        self.index.name(index)
    }
}
