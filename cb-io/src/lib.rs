//! Compact Binary I/O - package streaming and high-level APIs
//!
//! A package is one root object plus any number of attachments, each listed
//! in a fixed-size directory ahead of the payload bytes:
//!
//! - [`PackageWriter`] accumulates attachments and serializes them in order
//! - [`PackageReader`] reads the directory and root eagerly, then streams the
//!   remaining attachments lazily
//! - [`write_package`] / [`read_package`] move a whole [`CbPackage`] at once

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod reader;
pub mod writer;

// Re-export commonly used types
pub use cb_format::{AttachmentEntry, CbError, CbHash, CbObject, Limits, PackageHeader, Result};
pub use reader::{Attachments, PackageReader};
pub use writer::PackageWriter;

use bytes::Bytes;
use std::io::{Read, Write};

/// Package read options
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Security limits
    pub limits: Limits,
    /// Recompute content hashes of uncompressed attachments and compare them
    /// with the directory
    pub verify_hashes: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            verify_hashes: true,
        }
    }
}

/// One package attachment: its directory entry and payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CbAttachment {
    entry: AttachmentEntry,
    data: Bytes,
}

impl CbAttachment {
    /// Raw binary attachment hashed over its bytes.
    pub fn binary(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let entry = AttachmentEntry::binary(data.len() as u64, CbHash::of(&data));
        Self { entry, data }
    }

    /// Object attachment stored as its canonical bytes.
    pub fn object(object: &CbObject) -> Self {
        let data = object.to_bytes();
        let entry = AttachmentEntry::object(data.len() as u64, object.hash());
        Self { entry, data }
    }

    /// Pair an entry with payload bytes read from a package.
    ///
    /// The declared size must match the payload length.
    pub fn from_parts(entry: AttachmentEntry, data: Bytes) -> Result<Self> {
        if entry.payload_size != data.len() as u64 {
            return Err(CbError::Format(format!(
                "attachment declares {} bytes but carries {}",
                entry.payload_size,
                data.len()
            )));
        }
        Ok(Self { entry, data })
    }

    /// Directory entry
    pub fn entry(&self) -> &AttachmentEntry {
        &self.entry
    }

    /// Content hash recorded in the directory
    pub fn hash(&self) -> CbHash {
        self.entry.hash
    }

    /// Payload bytes
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Whether the payload is a serialized object
    pub fn is_object(&self) -> bool {
        self.entry.is_object()
    }

    /// Parse the payload as an object.
    pub fn as_object(&self) -> Result<CbObject> {
        if !self.entry.is_object() || self.entry.is_compressed() {
            return Err(CbError::Format(format!(
                "attachment {} is not an uncompressed object",
                self.entry.hash
            )));
        }
        object_payload(&self.data)
            .map_err(|err| CbError::Format(format!("attachment {}: {}", self.entry.hash, err)))
    }
}

/// Parse an object payload that must be exactly one unnamed object.
pub(crate) fn object_payload(data: &Bytes) -> std::result::Result<CbObject, String> {
    let object = CbObject::from_bytes(data.clone()).map_err(|err| err.to_string())?;
    let field = object.as_field();
    if field.has_name() {
        return Err("object payload carries a field name".to_string());
    }
    if field.encoded_len() != data.len() {
        return Err(format!(
            "object spans {} of {} payload bytes",
            field.encoded_len(),
            data.len()
        ));
    }
    Ok(object)
}

/// A root object with its attachments, in declared order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CbPackage {
    /// Document root
    pub root: CbObject,
    /// Attachments after the root
    pub attachments: Vec<CbAttachment>,
}

impl CbPackage {
    /// Package holding only `root`
    pub fn new(root: CbObject) -> Self {
        Self {
            root,
            attachments: Vec::new(),
        }
    }

    /// Append an attachment, returning its hash
    pub fn add_attachment(&mut self, attachment: CbAttachment) -> CbHash {
        let hash = attachment.hash();
        self.attachments.push(attachment);
        hash
    }

    /// First attachment with the given hash
    pub fn find(&self, hash: &CbHash) -> Option<&CbAttachment> {
        self.attachments.iter().find(|a| a.hash() == *hash)
    }
}

/// Serialize `package` to `output`, returning the bytes written
pub fn write_package<W: Write>(package: &CbPackage, output: W) -> Result<u64> {
    let mut writer = PackageWriter::new();
    writer.add_root(&package.root)?;
    for attachment in &package.attachments {
        writer.add(attachment.clone())?;
    }
    writer.write_to(output)
}

/// Read a whole package from `input`
pub fn read_package<R: Read>(input: R, opts: ReadOptions) -> Result<CbPackage> {
    let mut reader = PackageReader::new(input, opts)?;
    let mut package = CbPackage::new(reader.root().clone());
    package.attachments.reserve(reader.remaining());
    while let Some(next) = reader.next_attachment() {
        let (entry, data) = next?;
        package.attachments.push(CbAttachment::from_parts(entry, data)?);
    }
    Ok(package)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_codec::CbWriter;

    fn sample_root() -> CbObject {
        let mut writer = CbWriter::new();
        writer.begin_object().unwrap();
        writer.name("title").write_str("report").unwrap();
        writer.end_object().unwrap();
        writer.save_object().unwrap()
    }

    #[test]
    fn test_package_roundtrip_in_memory() {
        let mut package = CbPackage::new(sample_root());
        let blob = package.add_attachment(CbAttachment::binary(vec![1u8, 2, 3]));
        let nested = package.add_attachment(CbAttachment::object(&sample_root()));

        let mut bytes = Vec::new();
        let written = write_package(&package, &mut bytes).unwrap();
        assert_eq!(written, bytes.len() as u64);

        let decoded = read_package(bytes.as_slice(), ReadOptions::default()).unwrap();
        assert_eq!(decoded, package);
        assert_eq!(decoded.find(&blob).unwrap().data().as_ref(), &[1, 2, 3]);
        assert_eq!(
            decoded.find(&nested).unwrap().as_object().unwrap(),
            sample_root()
        );
    }

    #[test]
    fn test_binary_attachment_is_not_an_object() {
        let attachment = CbAttachment::binary(vec![0u8; 4]);
        assert!(!attachment.is_object());
        assert!(matches!(attachment.as_object(), Err(CbError::Format(_))));
    }

    #[test]
    fn test_object_with_trailing_bytes_is_rejected() {
        let object = sample_root();
        let mut data = object.to_bytes().to_vec();
        data.extend_from_slice(b"junk");
        let entry = AttachmentEntry::object(data.len() as u64, object.hash());
        let padded = CbAttachment::from_parts(entry, Bytes::from(data)).unwrap();
        assert!(matches!(padded.as_object(), Err(CbError::Format(_))));

        let mut package = CbPackage::new(sample_root());
        package.add_attachment(padded);
        let mut bytes = Vec::new();
        write_package(&package, &mut bytes).unwrap();

        let err = read_package(bytes.as_slice(), ReadOptions::default()).unwrap_err();
        assert!(matches!(err, CbError::Format(_)));

        let unverified = ReadOptions {
            verify_hashes: false,
            ..ReadOptions::default()
        };
        let decoded = read_package(bytes.as_slice(), unverified).unwrap();
        assert!(decoded.attachments[0].as_object().is_err());
    }

    #[test]
    fn test_from_parts_checks_size() {
        let entry = AttachmentEntry::binary(5, CbHash::of(b"abc"));
        let err = CbAttachment::from_parts(entry, Bytes::from_static(b"abc")).unwrap_err();
        assert!(matches!(err, CbError::Format(_)));
    }
}
