//! Package header and attachment directory records

use crate::constants::{
    ATTACHMENT_ENTRY_LEN, ATTACHMENT_FLAGS_MASK, FLAG_IS_COMPRESSED, FLAG_IS_ERROR,
    FLAG_IS_OBJECT, HASH_LEN, PACKAGE_HEADER_LEN, PACKAGE_MAGIC,
};
use crate::error::{CbError, Result};
use crate::hash::CbHash;
use crate::limits::Limits;

/// Fixed package header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageHeader {
    /// Number of attachments after the root
    pub attachment_count: u32,
}

impl PackageHeader {
    /// Encode header to bytes
    pub fn encode(&self) -> [u8; PACKAGE_HEADER_LEN] {
        let mut out = [0u8; PACKAGE_HEADER_LEN];

        // Magic (little-endian u32)
        out[0..4].copy_from_slice(&PACKAGE_MAGIC.to_le_bytes());

        // Attachment count (little-endian u32)
        out[4..8].copy_from_slice(&self.attachment_count.to_le_bytes());

        // Two reserved words stay zero
        out
    }

    /// Decode header from bytes, rejecting a bad magic or an excessive count
    pub fn decode(bytes: &[u8], limits: &Limits) -> Result<Self> {
        if bytes.len() < PACKAGE_HEADER_LEN {
            return Err(CbError::UnexpectedEof);
        }

        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != PACKAGE_MAGIC {
            return Err(CbError::Format(format!(
                "bad package magic {:#010x}, expected {:#010x}",
                magic, PACKAGE_MAGIC
            )));
        }

        let attachment_count = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if attachment_count > limits.max_attachment_count {
            return Err(CbError::LimitExceeded(format!(
                "package declares {} attachments, limit is {}",
                attachment_count, limits.max_attachment_count
            )));
        }

        Ok(Self { attachment_count })
    }

    /// Number of directory entries, root included
    pub fn entry_count(&self) -> usize {
        self.attachment_count as usize + 1
    }
}

/// One attachment directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentEntry {
    /// Payload size in bytes
    pub payload_size: u64,
    /// `FLAG_IS_*` bits
    pub flags: u32,
    /// Content hash of the payload
    pub hash: CbHash,
}

impl AttachmentEntry {
    /// Entry for a serialized object.
    pub fn object(payload_size: u64, hash: CbHash) -> Self {
        Self {
            payload_size,
            flags: FLAG_IS_OBJECT,
            hash,
        }
    }

    /// Entry for a raw binary.
    pub fn binary(payload_size: u64, hash: CbHash) -> Self {
        Self {
            payload_size,
            flags: 0,
            hash,
        }
    }

    /// Whether the payload is a serialized object
    pub fn is_object(&self) -> bool {
        self.flags & FLAG_IS_OBJECT != 0
    }

    /// Whether the payload is a compressed buffer
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_IS_COMPRESSED != 0
    }

    /// Whether the payload describes an error
    pub fn is_error(&self) -> bool {
        self.flags & FLAG_IS_ERROR != 0
    }

    /// Encode entry to bytes
    pub fn encode(&self) -> [u8; ATTACHMENT_ENTRY_LEN] {
        let mut out = [0u8; ATTACHMENT_ENTRY_LEN];

        // Payload size (little-endian u64)
        out[0..8].copy_from_slice(&self.payload_size.to_le_bytes());

        // Flags (little-endian u32)
        out[8..12].copy_from_slice(&self.flags.to_le_bytes());

        // Hash
        out[12..12 + HASH_LEN].copy_from_slice(self.hash.as_bytes());

        out
    }

    /// Decode entry from bytes
    pub fn decode(bytes: &[u8], limits: &Limits) -> Result<Self> {
        if bytes.len() < ATTACHMENT_ENTRY_LEN {
            return Err(CbError::UnexpectedEof);
        }

        let mut size = [0u8; 8];
        size.copy_from_slice(&bytes[0..8]);
        let payload_size = u64::from_le_bytes(size);
        if payload_size > limits.max_attachment_size {
            return Err(CbError::LimitExceeded(format!(
                "attachment of {} bytes exceeds {}",
                payload_size, limits.max_attachment_size
            )));
        }

        let flags = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        if flags & !ATTACHMENT_FLAGS_MASK != 0 {
            return Err(CbError::Format(format!(
                "unknown attachment flags {:#x}",
                flags & !ATTACHMENT_FLAGS_MASK
            )));
        }

        let hash = CbHash::from_slice(&bytes[12..12 + HASH_LEN])
            .ok_or_else(|| CbError::Internal("hash slice length".to_string()))?;

        Ok(Self {
            payload_size,
            flags,
            hash,
        })
    }

    /// Check the constraints on entry 0: an uncompressed, error-free object
    pub fn validate_root(&self) -> Result<()> {
        if !self.is_object() {
            return Err(CbError::Format(
                "root attachment is not flagged as an object".to_string(),
            ));
        }
        if self.is_error() || self.is_compressed() {
            return Err(CbError::Format(format!(
                "root attachment has invalid flags {:#x}",
                self.flags
            )));
        }
        Ok(())
    }
}
