//! MSF Container Core
//!
//! Decoding of the Multi-Stream File container used by Program Database
//! files. An MSF file is a small paged filesystem: fixed-size pages, a header
//! on page 0, and a directory describing which pages make up each stream.
//!
//! - [`error`] - Error types for container decoding
//! - [`header`] - Superblock layout and validation
//! - [`source`] - The [`source::ByteSource`] abstraction and in-memory sources
//! - [`io`] - Memory-mapped file source
//! - [`array`] - Chunked little-endian array loading
//! - [`stream`] - Logical streams over scattered pages
//! - [`directory`] - Directory bootstrap and stream table
//! - [`options`] - Open-time configuration
//! - [`dostime`] - DOS timestamps for archive listings

pub mod array;
pub mod directory;
pub mod dostime;
pub mod error;
pub mod header;
pub mod io;
pub mod options;
pub mod source;
pub mod stream;

pub use directory::MsfDirectory;
pub use error::{MsfError, Result};
pub use options::DirectoryOptions;
pub use source::ByteSource;
pub use stream::PagedStream;
