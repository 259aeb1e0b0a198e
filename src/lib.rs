//! # msf-rs - Multi-Stream File Reader
//!
//! `msf-rs` reads the Multi-Stream File (MSF) container that Microsoft Program
//! Database (`.pdb`) files are built on. An MSF file is a paged virtual
//! filesystem holding numbered streams; this crate exposes those streams as
//! archive entries without interpreting their contents.
//!
//! - **Zero-copy reads** for streams stored on consecutive pages
//! - **Memory-mapped** file access
//! - **Hardened parsing**: page numbers are checked against the file size
//! - **Stable slot numbering**: unused slots keep their index
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use msf_rs::{MsfArchive, Result};
//!
//! # fn main() -> Result<()> {
//! let archive = MsfArchive::open("app.pdb")?;
//!
//! for entry in archive.entries() {
//!     println!("stream {} - {} bytes", entry.name, entry.size);
//! }
//!
//! // Stream 1 is the PDB info stream
//! let info = archive.read_stream(1)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Working with the directory directly
//!
//! ```rust,no_run
//! use msf_rs::{MsfDirectory, Result};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let bytes = std::fs::read("app.pdb")?;
//! let directory = MsfDirectory::open(Arc::new(bytes))?;
//!
//! let stream = directory.open_stream(2)?;
//! let first_page = stream.read(0, directory.page_size() as usize);
//! # Ok(())
//! # }
//! ```

// Container decoding
pub mod core;

// Re-export core modules internally so crate:: paths in core still work
#[allow(unused_imports)]
pub(crate) use crate::core::{array, directory, dostime, error, header, io, options, source, stream};

// Re-export core types that users need
pub use crate::core::{
    array::{load_array, load_array_chunked, load_value, LeInt},
    directory::MsfDirectory,
    dostime::{from_dos_datetime, to_dos_datetime},
    error::{MsfError, Result},
    header::{MsfHeader, ABSENT_STREAM_SIZE, MAGIC},
    io::MappedFile,
    options::DirectoryOptions,
    source::ByteSource,
    stream::PagedStream,
};

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Bytes copied per read when extracting a stream
pub const EXTRACT_CHUNK_SIZE: usize = 64 * 1024;

/// A present stream viewed as an archive entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entry {
    /// Slot index in the stream table
    pub index: usize,

    /// Entry name: the slot index in decimal
    pub name: String,

    /// Stream size in bytes
    pub size: u32,

    /// Archive modification time as a DOS date/time (None if unavailable)
    pub modified: Option<u32>,
}

/// An opened MSF container
///
/// # Examples
///
/// ```rust,no_run
/// use msf_rs::MsfArchive;
///
/// # fn main() -> msf_rs::Result<()> {
/// let archive = MsfArchive::open("app.pdb")?;
/// let written = archive.extract_all("app.streams")?;
/// println!("extracted {} streams", written);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MsfArchive {
    directory: MsfDirectory,
    path: Option<PathBuf>,
    modified: Option<u32>,
}

impl MsfArchive {
    /// Open a container file with default options
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &DirectoryOptions::default())
    }

    /// Open a container file
    pub fn open_with<P: AsRef<Path>>(path: P, options: &DirectoryOptions) -> Result<Self> {
        info!("Opening MSF archive at {:?}", path.as_ref());

        let file = MappedFile::open(&path)?;
        let modified = file.modified().and_then(to_dos_datetime);
        let directory = MsfDirectory::open_with(Arc::new(file), options)?;

        info!(
            "Opened {:?}: {} stream slots, page size {}",
            path.as_ref(),
            directory.stream_count(),
            directory.page_size()
        );

        Ok(MsfArchive {
            directory,
            path: Some(path.as_ref().to_path_buf()),
            modified,
        })
    }

    /// Open a container held by any byte source
    pub fn from_source(source: Arc<dyn ByteSource>, options: &DirectoryOptions) -> Result<Self> {
        let directory = MsfDirectory::open_with(source, options)?;
        Ok(MsfArchive {
            directory,
            path: None,
            modified: None,
        })
    }

    pub fn directory(&self) -> &MsfDirectory {
        &self.directory
    }

    /// Path the archive was opened from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// File modification time as a DOS date/time
    pub fn modified(&self) -> Option<u32> {
        self.modified
    }

    /// Entries for every present stream, in slot order
    ///
    /// Unused slots are skipped; the remaining entries keep their slot index.
    pub fn entries(&self) -> Vec<Entry> {
        self.directory
            .streams()
            .map(|(index, stream)| Entry {
                index,
                name: index.to_string(),
                size: stream.size(),
                modified: self.modified,
            })
            .collect()
    }

    /// Read a whole stream into memory
    pub fn read_stream(&self, index: usize) -> Result<Vec<u8>> {
        debug!("Reading stream {}", index);
        Ok(self.directory.open_stream(index)?.read_all())
    }

    /// Copy a stream to `writer`, returning the number of bytes written
    ///
    /// Copies in [`EXTRACT_CHUNK_SIZE`] pieces and stops at the first short
    /// piece. A short total means the file is truncated.
    pub fn extract_to<W: Write + ?Sized>(&self, index: usize, writer: &mut W) -> Result<u64> {
        let stream = self.directory.open_stream(index)?;

        let mut offset = 0u64;
        loop {
            let chunk = stream.read(offset, EXTRACT_CHUNK_SIZE);
            writer.write_all(&chunk)?;
            offset += chunk.len() as u64;
            if chunk.len() < EXTRACT_CHUNK_SIZE {
                break;
            }
        }

        if offset < stream.size() as u64 {
            warn!(
                "Stream {} is truncated: {} of {} bytes present",
                index,
                offset,
                stream.size()
            );
        }

        Ok(offset)
    }

    /// Extract every present stream to `dir/<index>`
    ///
    /// Creates `dir` if needed. Returns the number of streams written.
    pub fn extract_all<P: AsRef<Path>>(&self, dir: P) -> Result<usize> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        info!("Extracting streams to {:?}", dir);

        let mut written = 0;
        for (index, _) in self.directory.streams() {
            let file = File::create(dir.join(index.to_string()))?;
            let mut writer = BufWriter::new(file);
            self.extract_to(index, &mut writer)?;
            writer.flush()?;
            written += 1;
        }

        info!("Extracted {} streams", written);
        Ok(written)
    }

    /// CRC-32 of a stream's contents
    pub fn checksum(&self, index: usize) -> Result<u32> {
        let stream = self.directory.open_stream(index)?;
        let mut hasher = crc32fast::Hasher::new();

        let mut offset = 0u64;
        loop {
            let chunk = stream.read(offset, EXTRACT_CHUNK_SIZE);
            hasher.update(&chunk);
            offset += chunk.len() as u64;
            if chunk.len() < EXTRACT_CHUNK_SIZE {
                break;
            }
        }

        Ok(hasher.finalize())
    }
}

/// Builder for opening archives with custom options
///
/// # Examples
///
/// ```rust,no_run
/// use msf_rs::ArchiveBuilder;
///
/// # fn main() -> msf_rs::Result<()> {
/// let archive = ArchiveBuilder::new()
///     .path("app.pdb")
///     .verify_page_bounds(false)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    path: Option<PathBuf>,
    options: DirectoryOptions,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        ArchiveBuilder {
            path: None,
            options: DirectoryOptions::default(),
        }
    }

    /// Set the container file to open
    pub fn path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Replace all options
    pub fn options(mut self, options: DirectoryOptions) -> Self {
        self.options = options;
        self
    }

    /// Load options from a TOML file
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        self.options = DirectoryOptions::from_toml_file(path)?;
        Ok(self)
    }

    /// Check page numbers against the file size while opening
    pub fn verify_page_bounds(mut self, verify: bool) -> Self {
        self.options.verify_page_bounds = verify;
        self
    }

    /// Cap the size of individual reads while loading the directory
    pub fn max_chunk_size(mut self, size: usize) -> Self {
        self.options.max_chunk_size = size;
        self
    }

    /// Open the archive
    pub fn build(self) -> Result<MsfArchive> {
        let path = self.path.ok_or(MsfError::MissingPath)?;

        MsfArchive::open_with(path, &self.options)
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}
