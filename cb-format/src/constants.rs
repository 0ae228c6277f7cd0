//! Constants and magic numbers for the Compact Binary package format

/// Package header magic (little-endian u32 on the wire).
pub const PACKAGE_MAGIC: u32 = 0xaa77_aacc;

/// Size of the fixed package header in bytes.
pub const PACKAGE_HEADER_LEN: usize = 16;

/// Size of one attachment directory entry in bytes.
pub const ATTACHMENT_ENTRY_LEN: usize = 32;

/// Attachment payload is a compressed buffer, opaque to this crate.
pub const FLAG_IS_COMPRESSED: u32 = 1 << 0;
/// Attachment payload is a serialized object.
pub const FLAG_IS_OBJECT: u32 = 1 << 1;
/// Attachment payload describes an error instead of content.
pub const FLAG_IS_ERROR: u32 = 1 << 2;

/// Mask of all defined attachment flags.
pub const ATTACHMENT_FLAGS_MASK: u32 = FLAG_IS_COMPRESSED | FLAG_IS_OBJECT | FLAG_IS_ERROR;

/// Size of a content hash in bytes.
pub const HASH_LEN: usize = 20;

/// Size of an object id in bytes.
pub const OBJECT_ID_LEN: usize = 12;
