use crate::error::{MsfError, Result};

/// MSF 7.00 signature occupying the first 32 bytes of the file
pub const MAGIC: [u8; 32] = *b"Microsoft C/C++ MSF 7.00\r\n\x1aDS\0\0\0";

/// Bytes read from offset 0 to decode the header
pub const HEADER_SIZE: usize = 0x30;

pub const PAGE_SIZE_OFFSET: usize = 0x20;
pub const FREE_PAGE_MAP_OFFSET: usize = 0x24;
pub const PAGE_COUNT_OFFSET: usize = 0x28;
pub const DIRECTORY_SIZE_OFFSET: usize = 0x2C;

/// File offset of the page list backing the root-stream-index stream
pub const ROOT_INDEX_PAGES_OFFSET: u64 = 0x34;

/// Stream size marking an unused slot in the stream table
pub const ABSENT_STREAM_SIZE: u32 = 0xFFFF_FFFF;

/// MSF superblock
///
/// Only `page_size` and `directory_size` drive decoding. The free page map and
/// page count are kept for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsfHeader {
    /// Signature: "Microsoft C/C++ MSF 7.00\r\n\x1aDS\0\0\0"
    pub magic: [u8; 32],

    /// Page size in bytes (commonly 512, 1024 or 4096)
    pub page_size: u32,

    /// Page number of the active free page map
    pub free_page_map: u32,

    /// Number of pages the writer recorded for the file
    pub page_count: u32,

    /// Byte length of the root directory stream
    pub directory_size: u32,
}

impl MsfHeader {
    /// Validate magic and page size
    pub fn validate(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(MsfError::invalid("signature does not match MSF 7.00"));
        }

        if self.page_size == 0 {
            return Err(MsfError::invalid("page size is zero"));
        }

        Ok(())
    }

    /// Deserialize header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(MsfError::TruncatedData {
                offset: 0,
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let mut magic = [0u8; 32];
        magic.copy_from_slice(&bytes[..32]);

        let header = MsfHeader {
            magic,
            page_size: read_u32(bytes, PAGE_SIZE_OFFSET),
            free_page_map: read_u32(bytes, FREE_PAGE_MAP_OFFSET),
            page_count: read_u32(bytes, PAGE_COUNT_OFFSET),
            directory_size: read_u32(bytes, DIRECTORY_SIZE_OFFSET),
        };

        header.validate()?;

        Ok(header)
    }

    /// Number of pages in the root directory stream
    pub fn directory_page_count(&self) -> usize {
        pages_needed(self.directory_size, self.page_size)
    }

    /// Byte length of the root-stream-index stream (one u32 per directory page)
    pub fn root_index_size(&self) -> u32 {
        (self.directory_page_count() as u64 * 4).min(u32::MAX as u64) as u32
    }
}

/// Number of `page_size` pages needed to hold `size` bytes
pub fn pages_needed(size: u32, page_size: u32) -> usize {
    if page_size == 0 {
        return 0;
    }
    (size as u64).div_ceil(page_size as u64) as usize
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
