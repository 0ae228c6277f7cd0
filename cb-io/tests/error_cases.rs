//! Negative package decoding tests covering the `CbError` variants a reader can raise

use cb_codec::CbWriter;
use cb_format::constants::{ATTACHMENT_ENTRY_LEN, FLAG_IS_COMPRESSED, PACKAGE_HEADER_LEN};
use cb_format::{CbError, CbObject, Limits};
use cb_io::{PackageReader, PackageWriter, ReadOptions};
use std::io::{self, Read};

fn root() -> CbObject {
    let mut writer = CbWriter::new();
    writer.begin_object().expect("begin");
    writer.name("id").write_u64(1).expect("write");
    writer.end_object().expect("end");
    writer.save_object().expect("save")
}

fn encode_package(blobs: &[&[u8]]) -> Vec<u8> {
    let mut writer = PackageWriter::new();
    writer.add_root(&root()).expect("root");
    for blob in blobs {
        writer.add_binary(blob.to_vec()).expect("binary");
    }
    writer.to_vec().expect("encode")
}

fn entry_offset(index: usize) -> usize {
    PACKAGE_HEADER_LEN + index * ATTACHMENT_ENTRY_LEN
}

/// Counts bytes pulled from the inner reader.
struct CountingReader<R> {
    inner: R,
    consumed: usize,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed += n;
        Ok(n)
    }
}

#[test]
fn corrupted_magic_is_rejected_before_any_attachment() {
    let mut bytes = encode_package(&[b"first", b"second"]);
    bytes[0] ^= 0xff;

    let mut counting = CountingReader {
        inner: bytes.as_slice(),
        consumed: 0,
    };
    let err = PackageReader::new(&mut counting, ReadOptions::default())
        .err()
        .expect("bad magic must fail");
    assert!(matches!(err, CbError::Format(_)));
    assert_eq!(counting.consumed, PACKAGE_HEADER_LEN);
}

#[test]
fn empty_stream_is_a_format_error() {
    let err = PackageReader::new(&[][..], ReadOptions::default())
        .err()
        .expect("empty input must fail");
    assert!(matches!(err, CbError::Format(_)));
}

#[test]
fn truncated_root_is_a_format_error() {
    let bytes = encode_package(&[]);
    let cut = &bytes[..bytes.len() - 1];
    let err = PackageReader::new(cut, ReadOptions::default())
        .err()
        .expect("truncated root must fail");
    assert!(matches!(err, CbError::Format(_)));
}

#[test]
fn root_must_be_flagged_as_object() {
    let mut bytes = encode_package(&[]);
    // Clear the object flag on entry 0
    let flags = entry_offset(0) + 8;
    bytes[flags..flags + 4].copy_from_slice(&0u32.to_le_bytes());
    let err = PackageReader::new(bytes.as_slice(), ReadOptions::default())
        .err()
        .expect("binary root must fail");
    assert!(matches!(err, CbError::Format(_)));
}

#[test]
fn compressed_root_is_rejected() {
    let mut bytes = encode_package(&[]);
    let flags = entry_offset(0) + 8;
    let value =
        u32::from_le_bytes(bytes[flags..flags + 4].try_into().unwrap()) | FLAG_IS_COMPRESSED;
    bytes[flags..flags + 4].copy_from_slice(&value.to_le_bytes());
    assert!(matches!(
        PackageReader::new(bytes.as_slice(), ReadOptions::default()).err(),
        Some(CbError::Format(_))
    ));
}

#[test]
fn unknown_entry_flags_are_rejected() {
    let mut bytes = encode_package(&[b"x"]);
    let flags = entry_offset(1) + 8;
    bytes[flags..flags + 4].copy_from_slice(&0x100u32.to_le_bytes());
    assert!(matches!(
        PackageReader::new(bytes.as_slice(), ReadOptions::default()).err(),
        Some(CbError::Format(_))
    ));
}

#[test]
fn attachment_count_limit_is_enforced() {
    let bytes = encode_package(&[b"a", b"b", b"c"]);
    let opts = ReadOptions {
        limits: Limits {
            max_attachment_count: 2,
            ..Limits::default()
        },
        ..ReadOptions::default()
    };
    assert!(matches!(
        PackageReader::new(bytes.as_slice(), opts).err(),
        Some(CbError::LimitExceeded(_))
    ));
}

#[test]
fn attachment_size_limit_is_enforced() {
    let bytes = encode_package(&[&[0u8; 100][..]]);
    let opts = ReadOptions {
        limits: Limits {
            max_attachment_size: 64,
            ..Limits::default()
        },
        ..ReadOptions::default()
    };
    assert!(matches!(
        PackageReader::new(bytes.as_slice(), opts).err(),
        Some(CbError::LimitExceeded(_))
    ));
}

#[test]
fn hash_mismatch_is_detected_when_verifying() {
    let mut bytes = encode_package(&[b"genuine"]);
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;

    let mut reader = PackageReader::new(bytes.as_slice(), ReadOptions::default()).expect("open");
    let err = reader
        .next_attachment()
        .expect("one attachment")
        .expect_err("tampered payload");
    assert!(matches!(err, CbError::Format(_)));
    assert!(reader.next_attachment().is_none());

    let opts = ReadOptions {
        verify_hashes: false,
        ..ReadOptions::default()
    };
    let mut reader = PackageReader::new(bytes.as_slice(), opts).expect("open");
    let (_, data) = reader.next_attachment().expect("one").expect("unverified read");
    assert_eq!(data.as_ref(), b"genuinf");
}

#[test]
fn attachments_are_read_lazily() {
    let bytes = encode_package(&[&[1u8; 1000][..], &[2u8; 1000][..]]);
    let directory_and_root = bytes.len() - 2000;

    let mut counting = CountingReader {
        inner: bytes.as_slice(),
        consumed: 0,
    };
    {
        let mut reader = PackageReader::new(&mut counting, ReadOptions::default()).expect("open");
        let (_, first) = reader.next_attachment().expect("first").expect("ok");
        assert_eq!(first.len(), 1000);
        reader.close();
    }
    assert_eq!(counting.consumed, directory_and_root + 1000);
}
