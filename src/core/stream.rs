//! Logical streams reassembled from container pages
//!
//! A [`PagedStream`] maps a logical byte range onto the physical pages listed
//! in its page index. When the pages touched by a read are consecutive in the
//! file, the read is passed straight through to the underlying source and the
//! returned bytes are borrowed from it. Otherwise the pages are gathered one at
//! a time into an owned buffer.

use crate::error::{MsfError, Result};
use crate::header::pages_needed;
use crate::source::ByteSource;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// One logical stream of an MSF container
pub struct PagedStream {
    size: u32,
    page_size: u32,
    page_index: Vec<u32>,
    source: Arc<dyn ByteSource>,
}

impl PagedStream {
    /// Build a stream of `size` bytes backed by `page_index`
    ///
    /// The page index must hold exactly `ceil(size / page_size)` entries.
    pub fn new(
        size: u32,
        page_size: u32,
        page_index: Vec<u32>,
        source: Arc<dyn ByteSource>,
    ) -> Result<Self> {
        if page_size == 0 {
            return Err(MsfError::invalid("page size is zero"));
        }

        let expected = pages_needed(size, page_size);
        if page_index.len() != expected {
            return Err(MsfError::invalid(format!(
                "stream of {} bytes needs {} pages, page index has {}",
                size,
                expected,
                page_index.len()
            )));
        }

        Ok(PagedStream {
            size,
            page_size,
            page_index,
            source,
        })
    }

    /// Logical size in bytes
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Physical page numbers, in logical order
    pub fn page_index(&self) -> &[u32] {
        &self.page_index
    }

    pub fn page_count(&self) -> usize {
        self.page_index.len()
    }

    /// True if the whole stream occupies one run of consecutive pages
    pub fn is_contiguous(&self) -> bool {
        is_run(&self.page_index)
    }

    /// Read `size` logical bytes starting at logical `offset`
    ///
    /// Requests past the end are clipped; a request starting at or past the
    /// end yields an empty slice. The result borrows from the source when the
    /// touched pages are contiguous.
    pub fn read(&self, offset: u64, size: usize) -> Cow<'_, [u8]> {
        let stream_size = self.size as u64;
        if size == 0 || offset >= stream_size {
            return Cow::Borrowed(&[]);
        }

        let size = (size as u64).min(stream_size - offset) as usize;
        let page_size = self.page_size as u64;

        let first_page = (offset / page_size) as usize;
        let first_page_offset = offset % page_size;
        let last_page = ((offset + size as u64 - 1) / page_size) as usize + 1;
        let last_page = last_page.min(self.page_index.len());

        let pages = &self.page_index[first_page..last_page];
        if is_run(pages) {
            return self
                .source
                .read(self.physical_offset(first_page, first_page_offset), size);
        }

        Cow::Owned(self.gather(first_page, first_page_offset, size))
    }

    /// Read the entire stream
    pub fn read_all(&self) -> Vec<u8> {
        self.read(0, self.size as usize).into_owned()
    }

    /// Scatter path: copy page by page into an owned buffer
    ///
    /// Stops early if the source comes back short, so the buffer never
    /// contains bytes the source did not provide.
    fn gather(&self, mut page: usize, mut page_offset: u64, size: usize) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size);
        let mut remaining = size;

        while remaining != 0 {
            let chunk = ((self.page_size as u64 - page_offset) as usize).min(remaining);
            let bytes = self
                .source
                .read(self.physical_offset(page, page_offset), chunk);
            buf.extend_from_slice(&bytes);
            if bytes.len() != chunk {
                break;
            }

            page += 1;
            page_offset = 0;
            remaining -= chunk;
        }

        buf
    }

    fn physical_offset(&self, page: usize, page_offset: u64) -> u64 {
        self.page_index[page] as u64 * self.page_size as u64 + page_offset
    }
}

impl ByteSource for PagedStream {
    fn len(&self) -> u64 {
        self.size as u64
    }

    fn read(&self, offset: u64, size: usize) -> Cow<'_, [u8]> {
        PagedStream::read(self, offset, size)
    }
}

impl fmt::Debug for PagedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedStream")
            .field("size", &self.size)
            .field("page_size", &self.page_size)
            .field("page_index", &self.page_index)
            .finish_non_exhaustive()
    }
}

fn is_run(pages: &[u32]) -> bool {
    pages
        .windows(2)
        .all(|pair| pair[0].checked_add(1) == Some(pair[1]))
}
