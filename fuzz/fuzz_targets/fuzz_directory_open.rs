#![no_main]
use libfuzzer_sys::fuzz_target;
use msf_rs::{DirectoryOptions, MsfDirectory};
use std::sync::Arc;

// Arbitrary bytes must either open or fail cleanly, with or without
// page-number verification.
fuzz_target!(|data: &[u8]| {
    for verify in [true, false] {
        let options = DirectoryOptions {
            verify_page_bounds: verify,
            ..DirectoryOptions::default()
        };

        let dir = match MsfDirectory::open_with(Arc::new(data.to_vec()), &options) {
            Ok(dir) => dir,
            Err(_) => continue,
        };

        for (_, stream) in dir.streams().take(64) {
            let _ = stream.read(0, 4096);
        }
    }
});
