#![no_main]

use cb_format::Limits;
use cb_io::{PackageReader, ReadOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let opts = ReadOptions {
        limits: Limits {
            max_attachment_size: 1 << 20,
            max_attachment_count: 1 << 10,
            ..Limits::default()
        },
        verify_hashes: true,
    };
    if let Ok(mut reader) = PackageReader::new(data, opts) {
        let _ = reader.root().to_json();
        for attachment in reader.attachments() {
            if attachment.is_err() {
                break;
            }
        }
    }
});
