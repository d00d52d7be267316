//! Reference-counted handles to loaded resources

use crate::core::budget::Allocation;
use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::fmt;
use std::sync::Arc;

/// Shared handle to a loaded resource
pub type Handle = Arc<ResourceHandle>;

/// One resource's in-memory buffer plus its metadata
///
/// Handles are shared by the cache and by every consumer that asked for the
/// resource. The buffer stays valid for as long as any holder keeps the
/// handle, even after the cache has evicted it.
///
/// The buffer length is fixed at construction. Its contents can be written
/// through [`ResourceHandle::bytes_mut`].
pub struct ResourceHandle {
    name: String,
    buffer: RwLock<Box<[u8]>>,
    size: usize,
    /// Raw container bytes kept by loaders that don't discard them
    raw: Option<Box<[u8]>>,
    charge: Allocation,
}

impl ResourceHandle {
    pub(crate) fn new(
        name: impl Into<String>,
        buffer: Box<[u8]>,
        raw: Option<Box<[u8]>>,
        charge: Allocation,
    ) -> Self {
        let size = buffer.len();
        ResourceHandle {
            name: name.into(),
            buffer: RwLock::new(buffer),
            size,
            raw,
            charge,
        }
    }

    /// Resource name (the cache key)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Buffer length in bytes
    ///
    /// Includes the trailing NUL for null-terminating loaders.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Read-only view over the buffer
    pub fn bytes(&self) -> MappedRwLockReadGuard<'_, [u8]> {
        RwLockReadGuard::map(self.buffer.read(), |buffer| &buffer[..])
    }

    /// Writable view over the buffer
    ///
    /// The view can change contents but never the length.
    pub fn bytes_mut(&self) -> MappedRwLockWriteGuard<'_, [u8]> {
        RwLockWriteGuard::map(self.buffer.write(), |buffer| &mut buffer[..])
    }

    /// Copy the buffer out
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes().to_vec()
    }

    /// Raw container bytes, if the loader kept them after decoding
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }

    /// Bytes this handle still has charged against the cache budget
    pub fn charged_bytes(&self) -> usize {
        self.charge.outstanding()
    }

    /// Give the budget charge back early (eager eviction accounting)
    pub(crate) fn release_charge(&self) -> usize {
        self.charge.release()
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("raw", &self.raw.as_ref().map(|raw| raw.len()))
            .field("charged", &self.charge.outstanding())
            .finish()
    }
}
