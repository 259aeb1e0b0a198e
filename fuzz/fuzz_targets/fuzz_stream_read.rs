#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use msf_rs::{ByteSource, PagedStream};
use std::sync::Arc;

#[derive(Arbitrary, Debug)]
struct Input {
    page_size: u16,
    size: u16,
    pages: Vec<u16>,
    reads: Vec<(u32, u16)>,
    file: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let source: Arc<dyn ByteSource> = Arc::new(input.file);
    let pages: Vec<u32> = input.pages.iter().map(|&p| p as u32).collect();

    let stream = match PagedStream::new(input.size as u32, input.page_size as u32, pages, source) {
        Ok(stream) => stream,
        Err(_) => return,
    };

    for (offset, size) in input.reads {
        let bytes = stream.read(offset as u64, size as usize);
        assert!(bytes.len() <= size as usize);
    }
});
