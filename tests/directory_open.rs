//! Directory bootstrap tests over synthetic containers

mod common;

use common::{pattern, MsfImageBuilder};
use msf_rs::{ByteSource, DirectoryOptions, MsfDirectory, MsfError};
use std::sync::Arc;

fn open(image: Vec<u8>) -> msf_rs::Result<MsfDirectory> {
    MsfDirectory::open(Arc::new(image))
}

#[test]
fn test_two_stream_container() {
    let first = pattern(1000, 1);
    let second = pattern(50, 2);
    let image = MsfImageBuilder::new(512)
        .stream(&first, &[2, 3, 4])
        .stream(&second, &[10])
        .build();

    // Stream 0 bytes live verbatim on pages 2..=4
    assert_eq!(&image[2 * 512..2 * 512 + 1000], &first[..]);

    let dir = open(image).unwrap();
    assert_eq!(dir.stream_count(), 2);
    assert_eq!(dir.stream_size(0).unwrap(), 1000);
    assert_eq!(dir.stream_size(1).unwrap(), 50);

    let stream0 = dir.open_stream(0).unwrap();
    assert!(stream0.is_contiguous());
    assert_eq!(&*stream0.read(0, 1000), &first[..]);

    let stream1 = dir.open_stream(1).unwrap();
    let bytes = stream1.read(0, 100);
    assert_eq!(bytes.len(), 50);
    assert_eq!(&*bytes, &second[..]);
}

#[test]
fn test_absent_slots_do_not_shift_indices() {
    let a = pattern(300, 3);
    let d = pattern(700, 4);
    let image = MsfImageBuilder::new(512)
        .stream(&a, &[1])
        .absent()
        .absent()
        .stream(&d, &[5, 6])
        .build();

    let dir = open(image).unwrap();
    assert_eq!(dir.stream_count(), 4);
    assert!(dir.stream_valid(0));
    assert!(!dir.stream_valid(1));
    assert!(!dir.stream_valid(2));
    assert!(dir.stream_valid(3));
    assert_eq!(dir.stream_size(3).unwrap(), 700);
    assert_eq!(dir.open_stream(3).unwrap().read_all(), d);

    let present: Vec<usize> = dir.streams().map(|(index, _)| index).collect();
    assert_eq!(present, vec![0, 3]);

    assert!(matches!(
        dir.open_stream(2),
        Err(MsfError::IndexOutOfRange { index: 2, count: 4 })
    ));
}

#[test]
fn test_open_is_idempotent() {
    let image = MsfImageBuilder::new(1024)
        .stream(&pattern(5000, 5), &[9, 3, 4, 12, 1])
        .absent()
        .stream(&pattern(1, 6), &[7])
        .stream(&[], &[])
        .build();

    let a = open(image.clone()).unwrap();
    let b = open(image).unwrap();

    assert_eq!(a.stream_count(), b.stream_count());
    for i in 0..a.stream_count() {
        assert_eq!(a.stream_valid(i), b.stream_valid(i));
        if !a.stream_valid(i) {
            continue;
        }
        assert_eq!(a.stream_size(i).unwrap(), b.stream_size(i).unwrap());
        let sa = a.open_stream(i).unwrap();
        let sb = b.open_stream(i).unwrap();
        assert_eq!(sa.read_all(), sb.read_all());
        assert_eq!(&*sa.read(100, 2000), &*sb.read(100, 2000));
    }
}

#[test]
fn test_fragmented_root_directory() {
    // Enough slots that the directory spans 157 pages and its page index
    // needs two pages of its own.
    let mut builder = MsfImageBuilder::new(512);
    let payload = pattern(1500, 7);
    builder = builder.stream(&payload, &[3, 1, 2]);
    for _ in 0..19_999 {
        builder = builder.absent();
    }

    let dir_len = builder.directory_bytes().len();
    let dir_pages: Vec<u32> = (0..dir_len.div_ceil(512) as u32).rev().map(|p| 10 + p * 2).collect();
    let image = builder
        .directory_pages(&dir_pages)
        .index_pages(&[5, 8])
        .build();

    let dir = open(image).unwrap();
    assert_eq!(dir.stream_count(), 20_000);
    assert_eq!(dir.streams().count(), 1);
    assert_eq!(dir.open_stream(0).unwrap().read_all(), payload);
    assert!(!dir.stream_valid(19_999));
}

#[test]
fn test_multi_page_root_index_matches_small_chunks() {
    let mut builder = MsfImageBuilder::new(512).stream(&pattern(40, 8), &[1]);
    for _ in 0..17_000 {
        builder = builder.absent();
    }
    let image: Arc<dyn ByteSource> = Arc::new(builder.build());

    let options = DirectoryOptions {
        max_chunk_size: 12,
        ..DirectoryOptions::default()
    };
    let small = MsfDirectory::open_with(image.clone(), &options).unwrap();
    let default = MsfDirectory::open(image).unwrap();

    assert_eq!(small.stream_count(), default.stream_count());
    assert_eq!(
        small.open_stream(0).unwrap().read_all(),
        default.open_stream(0).unwrap().read_all()
    );
}

#[test]
fn test_header_accessors() {
    let image = MsfImageBuilder::new(4096).stream(b"hello", &[1]).build();
    let pages = (image.len() / 4096) as u32;

    let dir = open(image).unwrap();
    assert_eq!(dir.page_size(), 4096);
    assert_eq!(dir.header().page_count, pages);
    assert_eq!(dir.header().directory_size, 4 + 4 + 4);
}

#[test]
fn test_bad_magic_is_invalid_format() {
    let mut image = MsfImageBuilder::new(512).stream(b"data", &[1]).build();
    image[24] = b'!';
    assert!(matches!(open(image), Err(MsfError::InvalidFormat(_))));
}

#[test]
fn test_short_source_is_truncated_data() {
    let image = MsfImageBuilder::new(512).stream(b"data", &[1]).build();
    let err = open(image[..0x2F].to_vec()).unwrap_err();
    assert!(matches!(err, MsfError::TruncatedData { .. }));
    assert!(err.is_corrupt_input());
}

#[test]
fn test_truncated_directory_pages() {
    let builder = MsfImageBuilder::new(512).stream(&pattern(2000, 9), &[1, 2, 3, 4]);
    let image = builder.build();
    let dir_offset = builder.directory_offset(&image);

    // Drop the file from the middle of the root directory onward: the root
    // index now points at pages that do not exist.
    let cut = image[..dir_offset + 4].to_vec();
    let err = open(cut.clone()).unwrap_err();
    assert!(err.is_corrupt_input(), "unexpected error: {err}");

    let options = DirectoryOptions {
        verify_page_bounds: false,
        ..DirectoryOptions::default()
    };
    assert!(matches!(
        MsfDirectory::open_with(Arc::new(cut), &options),
        Err(MsfError::TruncatedData { .. })
    ));
}

#[test]
fn test_page_number_past_end_rejected() {
    let builder = MsfImageBuilder::new(512).stream(&pattern(600, 10), &[1, 2]);
    let mut image = builder.build();
    let at = builder.directory_offset(&image) + 8 + 4;
    image[at..at + 4].copy_from_slice(&70_000u32.to_le_bytes());

    let err = open(image.clone()).unwrap_err();
    assert!(matches!(err, MsfError::InvalidFormat(ref msg) if msg.contains("stream 0")));

    // Trusting the container: the bad page reads as missing data
    let options = DirectoryOptions {
        verify_page_bounds: false,
        ..DirectoryOptions::default()
    };
    let dir = MsfDirectory::open_with(Arc::new(image), &options).unwrap();
    assert_eq!(dir.open_stream(0).unwrap().read(0, 600).len(), 512);
}

#[test]
fn test_partially_present_last_page_rejected() {
    let data = pattern(512, 12);
    let image = MsfImageBuilder::new(512)
        .stream(&data, &[5])
        .directory_pages(&[2])
        .index_pages(&[3])
        .build();
    assert_eq!(image.len(), 6 * 512);

    // Only the first 100 bytes of page 5 survive
    let cut = image[..5 * 512 + 100].to_vec();
    let err = open(cut.clone()).unwrap_err();
    assert!(matches!(err, MsfError::InvalidFormat(ref msg) if msg.contains("stream 0")));

    let options = DirectoryOptions {
        verify_page_bounds: false,
        ..DirectoryOptions::default()
    };
    let dir = MsfDirectory::open_with(Arc::new(cut), &options).unwrap();
    let stream = dir.open_stream(0).unwrap();
    assert_eq!(stream.size(), 512);
    assert_eq!(stream.read_all(), &data[..100]);
}

#[test]
fn test_zero_page_size_rejected() {
    let mut image = MsfImageBuilder::new(512).build();
    image[0x20..0x24].copy_from_slice(&0u32.to_le_bytes());
    assert!(matches!(open(image), Err(MsfError::InvalidFormat(_))));
}

#[test]
fn test_directory_is_shareable_across_threads() {
    let data = pattern(4096, 11);
    let image = MsfImageBuilder::new(512)
        .stream(&data, &[8, 1, 2, 3, 9, 10, 4, 5])
        .build();
    let dir = Arc::new(open(image).unwrap());

    std::thread::scope(|scope| {
        for t in 0..4u64 {
            let dir = Arc::clone(&dir);
            let data = &data;
            scope.spawn(move || {
                let stream = dir.open_stream(0).unwrap();
                for i in 0..64u64 {
                    let offset = (t * 997 + i * 61) % 4096;
                    let end = (offset as usize + 300).min(4096);
                    assert_eq!(&*stream.read(offset, 300), &data[offset as usize..end]);
                }
            });
        }
    });
}
