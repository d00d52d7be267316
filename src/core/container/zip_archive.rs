//! Zip archive container
//!
//! Decompression (and decryption, when a password is configured) is handled
//! by the `zip` crate; the container only maps names to entries.

use super::{EntryIndex, ResourceContainer};
use crate::error::{ResourceError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Container backed by a zip file on disk
pub struct ZipContainer {
    path: PathBuf,
    location: String,
    password: Option<Vec<u8>>,
    archive: Option<ZipArchive<BufReader<File>>>,
    index: EntryIndex,
}

impl ZipContainer {
    /// Create a container for the archive at `path`; the file is opened by `open`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        ZipContainer {
            location: path.display().to_string(),
            path,
            password: None,
            archive: None,
            index: EntryIndex::default(),
        }
    }

    /// Decrypt entries with `password`
    ///
    /// Without a password (or with the wrong one) reads of encrypted entries
    /// fail with `ContainerRead`.
    pub fn with_password(mut self, password: impl Into<Vec<u8>>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Archive path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_failure(&self, reason: impl ToString) -> ResourceError {
        ResourceError::ContainerOpen {
            path: self.location.clone(),
            reason: reason.to_string(),
        }
    }
}

impl std::fmt::Debug for ZipContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipContainer")
            .field("path", &self.path)
            .field("encrypted", &self.password.is_some())
            .field("open", &self.archive.is_some())
            .field("entries", &self.index.len())
            .finish()
    }
}

impl ResourceContainer for ZipContainer {
    fn location(&self) -> &str {
        &self.location
    }

    fn open(&mut self) -> Result<()> {
        if self.archive.is_some() {
            warn!("Zip container {} is already open", self.location);
            return Err(ResourceError::ContainerAlreadyOpen(self.location.clone()));
        }

        let file = File::open(&self.path).map_err(|err| self.open_failure(err))?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|err| self.open_failure(err))?;

        let mut index = EntryIndex::default();
        for position in 0..archive.len() {
            let entry = archive
                .by_index_raw(position)
                .map_err(|err| self.open_failure(err))?;
            if entry.is_dir() {
                continue;
            }
            index.upsert(entry.name(), entry.size() as usize);
        }

        info!(
            "Opened zip container {} with {} entries",
            self.location,
            index.len()
        );
        self.index = index;
        self.archive = Some(archive);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.archive.is_some()
    }

    fn size_of(&self, name: &str) -> Option<usize> {
        self.index.size_of(name)
    }

    fn read_into(&mut self, name: &str, buffer: &mut [u8]) -> Result<usize> {
        let archive = self
            .archive
            .as_mut()
            .ok_or_else(|| ResourceError::read_failure(name, "container is not open"))?;

        let entry = match self.password.as_deref() {
            Some(password) => archive.by_name_decrypt(name, password),
            None => archive.by_name(name),
        };
        let mut entry = entry.map_err(|err| ResourceError::read_failure(name, err))?;

        let size = entry.size() as usize;
        if buffer.len() < size {
            return Err(ResourceError::read_failure(
                name,
                format!("buffer holds {} of {} bytes", buffer.len(), size),
            ));
        }

        debug!("Extracting {} ({} bytes)", name, size);
        entry
            .read_exact(&mut buffer[..size])
            .map_err(|err| ResourceError::read_failure(name, err))?;
        Ok(size)
    }

    fn entry_count(&self) -> usize {
        self.index.len()
    }

    fn entry_name(&self, index: usize) -> Option<&str> {
        self.index.name(index)
    }
}
