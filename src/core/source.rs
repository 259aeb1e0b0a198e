//! Random-access byte sources
//!
//! Everything in the container is addressed through [`ByteSource`]: the raw
//! file, and each decoded [`PagedStream`](crate::stream::PagedStream) once it
//! has been built. Reads past the end are truncated rather than rejected.

use std::borrow::Cow;
use std::sync::Arc;

/// Offsets at or beyond this bound are out of range.
///
/// MSF addresses pages with 32-bit numbers and the reader treats the whole
/// file as a 32-bit address space.
pub const ADDRESS_LIMIT: u64 = 1 << 32;

/// Read-only random-access byte provider of fixed length
///
/// `read` returns up to `size` bytes starting at `offset`. A request that
/// starts at or past the end returns an empty slice, and one that runs past the
/// end returns only the bytes that exist. Implementations must not keep a
/// cursor: the same call always yields the same bytes.
pub trait ByteSource: Send + Sync {
    /// Total length in bytes
    fn len(&self) -> u64;

    /// Read up to `size` bytes at `offset`
    fn read(&self, offset: u64, size: usize) -> Cow<'_, [u8]>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clip `offset..offset + size` to `data`, honoring [`ADDRESS_LIMIT`]
pub fn clip(data: &[u8], offset: u64, size: usize) -> &[u8] {
    if offset >= ADDRESS_LIMIT || offset >= data.len() as u64 {
        return &[];
    }

    let start = offset as usize;
    let end = start.saturating_add(size).min(data.len());
    &data[start..end]
}

impl ByteSource for Vec<u8> {
    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    fn read(&self, offset: u64, size: usize) -> Cow<'_, [u8]> {
        Cow::Borrowed(clip(self, offset, size))
    }
}

impl ByteSource for Box<[u8]> {
    fn len(&self) -> u64 {
        (**self).len() as u64
    }

    fn read(&self, offset: u64, size: usize) -> Cow<'_, [u8]> {
        Cow::Borrowed(clip(self, offset, size))
    }
}

impl ByteSource for &'static [u8] {
    fn len(&self) -> u64 {
        (**self).len() as u64
    }

    fn read(&self, offset: u64, size: usize) -> Cow<'_, [u8]> {
        Cow::Borrowed(clip(self, offset, size))
    }
}

impl<T: ByteSource + ?Sized> ByteSource for Arc<T> {
    fn len(&self) -> u64 {
        ByteSource::len(&**self)
    }

    fn read(&self, offset: u64, size: usize) -> Cow<'_, [u8]> {
        ByteSource::read(&**self, offset, size)
    }
}
