//! MSF stream directory
//!
//! Opening a container is a fixed sequence of steps, each built on the one
//! before:
//!
//! 1. decode the header at offset 0;
//! 2. build the root-stream-index stream, whose page list sits in the header
//!    region at [`ROOT_INDEX_PAGES_OFFSET`];
//! 3. build the root directory stream, whose page list is the content of the
//!    root-stream-index stream;
//! 4. decode the stream table from the root directory stream.
//!
//! Any failure aborts the open. Nothing is retained from a failed attempt.

use crate::array::{load_array_chunked, load_value};
use crate::error::{MsfError, Result};
use crate::header::{
    pages_needed, MsfHeader, ABSENT_STREAM_SIZE, HEADER_SIZE, ROOT_INDEX_PAGES_OFFSET,
};
use crate::options::DirectoryOptions;
use crate::source::ByteSource;
use crate::stream::PagedStream;
use std::sync::Arc;
use tracing::debug;

/// Index of the streams stored in an MSF container
///
/// Slot indices are stable: an unused slot stays in place and reports
/// `stream_valid(i) == false`.
#[derive(Debug)]
pub struct MsfDirectory {
    header: MsfHeader,
    streams: Vec<Option<Arc<PagedStream>>>,
}

impl MsfDirectory {
    /// Open a container with default options
    pub fn open(source: Arc<dyn ByteSource>) -> Result<Self> {
        Self::open_with(source, &DirectoryOptions::default())
    }

    /// Open a container
    pub fn open_with(source: Arc<dyn ByteSource>, options: &DirectoryOptions) -> Result<Self> {
        let header = read_header(&*source)?;
        debug!(
            "MSF header: page size {}, directory {} bytes, {} pages recorded",
            header.page_size, header.directory_size, header.page_count
        );

        let bootstrap = Bootstrap::new(header, &source, options);
        let root_index = bootstrap.root_index_stream()?;
        let root = bootstrap.root_stream(&root_index)?;
        let streams = bootstrap.stream_table(&root)?;

        debug!(
            "Stream table: {} slots, {} present",
            streams.len(),
            streams.iter().filter(|s| s.is_some()).count()
        );

        Ok(MsfDirectory { header, streams })
    }

    pub fn header(&self) -> &MsfHeader {
        &self.header
    }

    pub fn page_size(&self) -> u32 {
        self.header.page_size
    }

    /// Number of slots in the stream table, present or not
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// True if slot `index` exists and holds a stream
    pub fn stream_valid(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Size of the stream in slot `index`
    pub fn stream_size(&self, index: usize) -> Result<u32> {
        self.get(index)
            .map(|stream| stream.size())
            .ok_or_else(|| self.out_of_range(index))
    }

    /// Shared handle to the stream in slot `index`
    pub fn open_stream(&self, index: usize) -> Result<Arc<PagedStream>> {
        self.get(index)
            .cloned()
            .ok_or_else(|| self.out_of_range(index))
    }

    pub fn get(&self, index: usize) -> Option<&Arc<PagedStream>> {
        self.streams.get(index).and_then(Option::as_ref)
    }

    /// Present streams with their slot indices, in slot order
    pub fn streams(&self) -> impl Iterator<Item = (usize, &Arc<PagedStream>)> + '_ {
        self.streams
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|stream| (index, stream)))
    }

    fn out_of_range(&self, index: usize) -> MsfError {
        MsfError::IndexOutOfRange {
            index,
            count: self.streams.len(),
        }
    }
}

fn read_header(source: &dyn ByteSource) -> Result<MsfHeader> {
    let bytes = source.read(0, HEADER_SIZE);
    MsfHeader::from_bytes(&bytes)
}

/// Shared state for the construction steps of [`MsfDirectory::open_with`]
struct Bootstrap<'a> {
    header: MsfHeader,
    source: &'a Arc<dyn ByteSource>,
    chunk_size: usize,
    /// Whole pages present in the source, when page numbers are verified
    page_limit: Option<u64>,
}

impl<'a> Bootstrap<'a> {
    fn new(
        header: MsfHeader,
        source: &'a Arc<dyn ByteSource>,
        options: &DirectoryOptions,
    ) -> Self {
        let page_limit = options
            .verify_page_bounds
            .then(|| source.len() / header.page_size as u64);

        Bootstrap {
            header,
            source,
            chunk_size: options.chunk_size(),
            page_limit,
        }
    }

    /// Base case: the page list comes straight from the file, not from
    /// another stream.
    fn root_index_stream(&self) -> Result<PagedStream> {
        let size = self.header.root_index_size();
        let page_count = pages_needed(size, self.header.page_size);
        let pages = load_array_chunked::<u32, _>(
            &**self.source,
            ROOT_INDEX_PAGES_OFFSET,
            page_count,
            self.chunk_size,
        )?;
        self.check_pages(&pages, "root stream index")?;

        self.stream(size, pages)
    }

    fn root_stream(&self, root_index: &PagedStream) -> Result<PagedStream> {
        let pages = load_array_chunked::<u32, _>(
            root_index,
            0,
            self.header.directory_page_count(),
            self.chunk_size,
        )?;
        self.check_pages(&pages, "root directory")?;

        debug!(
            "Root directory spans {} pages (contiguous: {})",
            pages.len(),
            pages.windows(2).all(|w| w[0].checked_add(1) == Some(w[1]))
        );

        self.stream(self.header.directory_size, pages)
    }

    /// Decode `count`, the per-slot sizes and the packed page lists
    fn stream_table(&self, root: &PagedStream) -> Result<Vec<Option<Arc<PagedStream>>>> {
        let count = load_value::<u32, _>(root, 0)? as usize;
        let sizes = load_array_chunked::<u32, _>(root, 4, count, self.chunk_size)?;

        let mut offset = 4 + count as u64 * 4;
        let mut streams = Vec::with_capacity(count);

        for (index, &size) in sizes.iter().enumerate() {
            if size == ABSENT_STREAM_SIZE {
                streams.push(None);
                continue;
            }

            let page_count = pages_needed(size, self.header.page_size);
            let pages = load_array_chunked::<u32, _>(root, offset, page_count, self.chunk_size)?;
            offset += page_count as u64 * 4;
            self.check_pages(&pages, &format!("stream {}", index))?;

            streams.push(Some(Arc::new(self.stream(size, pages)?)));
        }

        Ok(streams)
    }

    fn stream(&self, size: u32, pages: Vec<u32>) -> Result<PagedStream> {
        PagedStream::new(size, self.header.page_size, pages, Arc::clone(self.source))
    }

    fn check_pages(&self, pages: &[u32], owner: &str) -> Result<()> {
        let Some(limit) = self.page_limit else {
            return Ok(());
        };

        match pages.iter().find(|&&page| page as u64 >= limit) {
            Some(page) => Err(MsfError::invalid(format!(
                "{} references page {} but the file holds {} pages",
                owner, page, limit
            ))),
            None => Ok(()),
        }
    }
}
