//! Directory-backed container
//!
//! Serves the files under a root directory, named by their forward-slash
//! path relative to the root. Handy during development when assets are not
//! packed into an archive yet.

use super::{EntryIndex, ResourceContainer};
use crate::error::{ResourceError, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Container over a directory tree
#[derive(Debug)]
pub struct DirectoryContainer {
    root: PathBuf,
    location: String,
    index: EntryIndex,
    open: bool,
}

impl DirectoryContainer {
    /// Create a container for `root`; nothing is touched until `open`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        DirectoryContainer {
            location: root.display().to_string(),
            root,
            index: EntryIndex::default(),
            open: false,
        }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn open_failure(&self, reason: impl ToString) -> ResourceError {
        ResourceError::ContainerOpen {
            path: self.location.clone(),
            reason: reason.to_string(),
        }
    }

    fn scan(&self) -> Result<EntryIndex> {
        let mut index = EntryIndex::default();

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|err| self.open_failure(err))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|err| self.open_failure(err))?;
            let name = relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let size = entry.metadata().map_err(|err| self.open_failure(err))?.len();

            index.upsert(&name, size as usize);
        }

        Ok(index)
    }
}

impl ResourceContainer for DirectoryContainer {
    fn location(&self) -> &str {
        &self.location
    }

    fn open(&mut self) -> Result<()> {
        if self.open {
            return Err(ResourceError::ContainerAlreadyOpen(self.location.clone()));
        }
        if !self.root.is_dir() {
            return Err(self.open_failure("not a directory"));
        }

        self.index = self.scan()?;
        self.open = true;
        info!(
            "Opened directory container {} with {} entries",
            self.location,
            self.index.len()
        );
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn size_of(&self, name: &str) -> Option<usize> {
        self.index.size_of(name)
    }

    fn read_into(&mut self, name: &str, buffer: &mut [u8]) -> Result<usize> {
        // Only names found by the scan are served, so `..` can't escape the root
        let size = self
            .index
            .size_of(name)
            .ok_or_else(|| ResourceError::read_failure(name, "no such entry"))?;
        if buffer.len() < size {
            return Err(ResourceError::read_failure(
                name,
                format!("buffer holds {} of {} bytes", buffer.len(), size),
            ));
        }

        debug!("Reading {} bytes from {}", size, name);
        let mut file =
            File::open(self.root.join(name)).map_err(|err| ResourceError::read_failure(name, err))?;
        file.read_exact(&mut buffer[..size])
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
