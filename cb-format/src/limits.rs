//! Limits applied when parsing untrusted input

use serde::{Deserialize, Serialize};

/// Hard caps that bound allocation and recursion when reading documents and packages
///
/// Deserializes from partial JSON; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum payload size of a single package attachment, root included (default: 1 GiB)
    pub max_attachment_size: u64,
    /// Maximum number of attachments declared by a package header (default: 1,000,000)
    pub max_attachment_count: u32,
    /// Maximum length of a field name in bytes (default: 64 KiB)
    pub max_name_length: usize,
    /// Maximum container nesting depth for validation and JSON rendering (default: 1,024)
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_attachment_size: 1024 * 1024 * 1024,
            max_attachment_count: 1_000_000,
            max_name_length: 64 * 1024,
            max_depth: 1_024,
        }
    }
}
