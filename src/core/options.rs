//! Open-time configuration
//!
//! ```toml
//! verify_page_bounds = true
//! max_chunk_size = 65536
//! ```

use crate::array::MAX_CHUNK_SIZE;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest accepted chunk cap: one u64
const MIN_CHUNK_SIZE: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryOptions {
    /// Reject page numbers that point past the end of the source
    pub verify_page_bounds: bool,

    /// Largest single read issued while loading directory tables
    pub max_chunk_size: usize,
}

impl DirectoryOptions {
    pub fn new() -> Self {
        DirectoryOptions {
            verify_page_bounds: true,
            max_chunk_size: MAX_CHUNK_SIZE,
        }
    }

    /// Parse options from TOML; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: DirectoryOptions = toml::from_str(text)?;
        Ok(options.normalized())
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Chunk cap actually used by the loader
    pub fn chunk_size(&self) -> usize {
        self.max_chunk_size.max(MIN_CHUNK_SIZE)
    }

    fn normalized(mut self) -> Self {
        self.max_chunk_size = self.chunk_size();
        self
    }
}

impl Default for DirectoryOptions {
    fn default() -> Self {
        Self::new()
    }
}
