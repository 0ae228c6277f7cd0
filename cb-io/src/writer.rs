//! Package writer

use std::io::Write;

use cb_format::constants::{ATTACHMENT_ENTRY_LEN, PACKAGE_HEADER_LEN};
use cb_format::{AttachmentEntry, CbError, CbHash, CbObject, PackageHeader, Result};

use crate::CbAttachment;

/// Accumulates a root object and its attachments, then serializes them.
///
/// Entries are written in insertion order; the first must be the root.
#[derive(Debug, Default)]
pub struct PackageWriter {
    attachments: Vec<CbAttachment>,
}

impl PackageWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the root object. Must be the first call.
    pub fn add_root(&mut self, root: &CbObject) -> Result<CbHash> {
        if !self.attachments.is_empty() {
            return Err(CbError::Format("package root already added".to_string()));
        }
        let attachment = CbAttachment::object(root);
        let hash = attachment.hash();
        self.attachments.push(attachment);
        Ok(hash)
    }

    /// Add a raw binary attachment
    pub fn add_binary(&mut self, data: impl Into<bytes::Bytes>) -> Result<CbHash> {
        self.add(CbAttachment::binary(data))
    }

    /// Add an object attachment
    pub fn add_object(&mut self, object: &CbObject) -> Result<CbHash> {
        self.add(CbAttachment::object(object))
    }

    /// Add a prepared attachment.
    ///
    /// When no root has been added yet, the attachment becomes the root and
    /// must be an uncompressed, error-free object.
    pub fn add(&mut self, attachment: CbAttachment) -> Result<CbHash> {
        if self.attachments.is_empty() {
            attachment.entry().validate_root()?;
        }
        if self.attachments.len() > u32::MAX as usize {
            return Err(CbError::LimitExceeded(
                "package attachment count overflows u32".to_string(),
            ));
        }
        let hash = attachment.hash();
        self.attachments.push(attachment);
        Ok(hash)
    }

    /// Number of attachments after the root
    pub fn attachment_count(&self) -> usize {
        self.attachments.len().saturating_sub(1)
    }

    /// Serialized size in bytes
    pub fn encoded_len(&self) -> u64 {
        let directory = PACKAGE_HEADER_LEN + self.attachments.len() * ATTACHMENT_ENTRY_LEN;
        let payloads: u64 = self
            .attachments
            .iter()
            .map(|a| a.entry().payload_size)
            .sum();
        directory as u64 + payloads
    }

    /// Write the header, the directory and the payloads, returning the bytes written
    pub fn write_to<W: Write>(&self, mut output: W) -> Result<u64> {
        if self.attachments.is_empty() {
            return Err(CbError::Format("package has no root object".to_string()));
        }
        let header = PackageHeader {
            attachment_count: u32::try_from(self.attachment_count()).map_err(|_| {
                CbError::LimitExceeded("package attachment count overflows u32".to_string())
            })?,
        };

        output.write_all(&header.encode())?;
        for attachment in &self.attachments {
            output.write_all(&attachment.entry().encode())?;
        }
        for attachment in &self.attachments {
            output.write_all(attachment.data())?;
        }
        output.flush()?;

        let written = self.encoded_len();
        tracing::debug!(
            attachments = header.attachment_count,
            bytes = written,
            "wrote package"
        );
        Ok(written)
    }

    /// Serialize to a new buffer
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(usize::try_from(self.encoded_len()).unwrap_or(0));
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Entries in write order, root first
    pub fn entries(&self) -> impl Iterator<Item = &AttachmentEntry> {
        self.attachments.iter().map(|a| a.entry())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_codec::CbWriter;
    use cb_format::constants::PACKAGE_MAGIC;

    fn root() -> CbObject {
        let mut writer = CbWriter::new();
        writer.begin_object().unwrap();
        writer.name("n").write_u64(7).unwrap();
        writer.end_object().unwrap();
        writer.save_object().unwrap()
    }

    #[test]
    fn test_layout() {
        let mut writer = PackageWriter::new();
        writer.add_root(&root()).unwrap();
        writer.add_binary(vec![9u8; 3]).unwrap();
        let bytes = writer.to_vec().unwrap();

        let root_len = root().to_bytes().len();
        assert_eq!(bytes.len(), 16 + 2 * 32 + root_len + 3);
        assert_eq!(&bytes[0..4], &PACKAGE_MAGIC.to_le_bytes());
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        assert_eq!(&bytes[8..16], &[0u8; 8]);
        // Root entry size then object flag
        assert_eq!(&bytes[16..24], &(root_len as u64).to_le_bytes());
        assert_eq!(&bytes[24..28], &2u32.to_le_bytes());
        assert_eq!(&bytes[bytes.len() - 3..], &[9, 9, 9]);
    }

    #[test]
    fn test_root_must_come_first() {
        let mut writer = PackageWriter::new();
        let err = writer.add_binary(vec![1u8]).unwrap_err();
        assert!(matches!(err, CbError::Format(_)));

        writer.add_root(&root()).unwrap();
        assert!(writer.add_root(&root()).is_err());
    }

    #[test]
    fn test_empty_writer_is_rejected() {
        let writer = PackageWriter::new();
        assert!(matches!(writer.to_vec(), Err(CbError::Format(_))));
    }
}
