//! Synthetic MSF image builder shared by the integration tests
//!
//! Streams are placed on caller-chosen pages. The root directory and its page
//! index go on the pages after the highest one in use unless placed
//! explicitly.

#![allow(dead_code)]

use msf_rs::{ABSENT_STREAM_SIZE, MAGIC};

pub fn pages_for(size: usize, page_size: u32) -> usize {
    size.div_ceil(page_size as usize)
}

/// Deterministic, page-distinguishable test payload
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed) ^ (i >> 8) as u8)
        .collect()
}

pub struct MsfImageBuilder {
    page_size: u32,
    streams: Vec<Option<(Vec<u8>, Vec<u32>)>>,
    directory_pages: Option<Vec<u32>>,
    index_pages: Option<Vec<u32>>,
}

impl MsfImageBuilder {
    pub fn new(page_size: u32) -> Self {
        MsfImageBuilder {
            page_size,
            streams: Vec::new(),
            directory_pages: None,
            index_pages: None,
        }
    }

    /// Add a stream stored on `pages`, in logical order
    pub fn stream(mut self, data: &[u8], pages: &[u32]) -> Self {
        assert_eq!(
            pages.len(),
            pages_for(data.len(), self.page_size),
            "page list does not fit stream size"
        );
        self.streams.push(Some((data.to_vec(), pages.to_vec())));
        self
    }

    /// Add an unused slot
    pub fn absent(mut self) -> Self {
        self.streams.push(None);
        self
    }

    /// Place the root directory on explicit pages
    pub fn directory_pages(mut self, pages: &[u32]) -> Self {
        self.directory_pages = Some(pages.to_vec());
        self
    }

    /// Place the root directory's page index on explicit pages
    pub fn index_pages(mut self, pages: &[u32]) -> Self {
        self.index_pages = Some(pages.to_vec());
        self
    }

    /// Serialized stream table
    pub fn directory_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.streams.len() as u32).to_le_bytes());
        for slot in &self.streams {
            let size = match slot {
                Some((data, _)) => data.len() as u32,
                None => ABSENT_STREAM_SIZE,
            };
            out.extend_from_slice(&size.to_le_bytes());
        }
        for (_, pages) in self.streams.iter().flatten() {
            for page in pages {
                out.extend_from_slice(&page.to_le_bytes());
            }
        }
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let ps = self.page_size as usize;
        let directory = self.directory_bytes();

        let mut highest = self
            .streams
            .iter()
            .flatten()
            .flat_map(|(_, pages)| pages.iter().copied())
            .chain(self.directory_pages.iter().flatten().copied())
            .chain(self.index_pages.iter().flatten().copied())
            .max()
            .unwrap_or(0);

        let dir_pages = match &self.directory_pages {
            Some(pages) => pages.clone(),
            None => allocate(&mut highest, pages_for(directory.len(), self.page_size)),
        };
        assert_eq!(dir_pages.len(), pages_for(directory.len(), self.page_size));

        let index: Vec<u8> = dir_pages.iter().flat_map(|p| p.to_le_bytes()).collect();
        let index_pages = match &self.index_pages {
            Some(pages) => pages.clone(),
            None => allocate(&mut highest, pages_for(index.len(), self.page_size)),
        };
        assert_eq!(index_pages.len(), pages_for(index.len(), self.page_size));
        assert!(
            0x34 + index_pages.len() * 4 <= ps,
            "root index page list does not fit in the header page"
        );

        let total_pages = highest as usize + 1;
        let mut file = vec![0u8; total_pages * ps];

        file[..32].copy_from_slice(&MAGIC);
        file[0x20..0x24].copy_from_slice(&self.page_size.to_le_bytes());
        file[0x24..0x28].copy_from_slice(&1u32.to_le_bytes());
        file[0x28..0x2C].copy_from_slice(&(total_pages as u32).to_le_bytes());
        file[0x2C..0x30].copy_from_slice(&(directory.len() as u32).to_le_bytes());
        for (i, page) in index_pages.iter().enumerate() {
            let at = 0x34 + i * 4;
            file[at..at + 4].copy_from_slice(&page.to_le_bytes());
        }

        for (data, pages) in self.streams.iter().flatten() {
            place(&mut file, ps, data, pages);
        }
        place(&mut file, ps, &directory, &dir_pages);
        place(&mut file, ps, &index, &index_pages);

        file
    }

    /// File offset of the first root directory page in the built image
    pub fn directory_offset(&self, image: &[u8]) -> usize {
        let index_page = u32::from_le_bytes(image[0x34..0x38].try_into().unwrap()) as usize;
        let at = index_page * self.page_size as usize;
        let first = u32::from_le_bytes(image[at..at + 4].try_into().unwrap()) as usize;
        first * self.page_size as usize
    }
}

fn allocate(highest: &mut u32, count: usize) -> Vec<u32> {
    let pages: Vec<u32> = (*highest + 1..*highest + 1 + count as u32).collect();
    if let Some(&last) = pages.last() {
        *highest = last;
    }
    pages
}

fn place(file: &mut [u8], page_size: usize, data: &[u8], pages: &[u32]) {
    for (chunk, &page) in data.chunks(page_size).zip(pages) {
        let at = page as usize * page_size;
        file[at..at + chunk.len()].copy_from_slice(chunk);
    }
}
