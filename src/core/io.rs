//! File-backed byte sources

use crate::error::{MsfError, Result};
use crate::source::{clip, ByteSource, ADDRESS_LIMIT};
use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Read-only memory map of a container file
pub struct MappedFile {
    map: Option<Mmap>,
    path: PathBuf,
    modified: Option<SystemTime>,
}

impl MappedFile {
    /// Map an existing file read-only
    ///
    /// Files of 4 GiB or more cannot be addressed by 32-bit page numbers and
    /// are rejected.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let metadata = file.metadata()?;

        if metadata.len() >= ADDRESS_LIMIT {
            return Err(MsfError::invalid(format!(
                "file is {} bytes, larger than the 4 GiB MSF address space",
                metadata.len()
            )));
        }

        // Zero-length files cannot be mapped on every platform
        let map = if metadata.len() == 0 {
            None
        } else {
            // SAFETY: the map is read-only; the file is expected not to be
            // truncated by another process while the archive is open.
            Some(unsafe { Mmap::map(&file)? })
        };

        Ok(MappedFile {
            map,
            path: path.as_ref().to_path_buf(),
            modified: metadata.modified().ok(),
        })
    }

    /// Get file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last modification time reported by the filesystem
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    fn bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }
}

impl ByteSource for MappedFile {
    fn len(&self) -> u64 {
        self.bytes().len() as u64
    }

    fn read(&self, offset: u64, size: usize) -> Cow<'_, [u8]> {
        Cow::Borrowed(clip(self.bytes(), offset, size))
    }
}
