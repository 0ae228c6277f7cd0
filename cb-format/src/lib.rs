//! CB Format - Core primitives for the Compact Binary encoding
//!
//! This crate provides the read side of the Compact Binary format with no
//! I/O dependencies. It includes:
//!
//! - Field type tags and mask/base classification
//! - Variable-length unsigned integers (VarUInt)
//! - Zero-copy field, object and array views over shared buffers
//! - Content hashing with a pluggable hash primitive
//! - JSON rendering and opt-in structural validation
//! - Package header and attachment directory records
//! - Error types and parsing limits

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod container;
pub mod error;
pub mod field;
pub mod field_type;
pub mod hash;
pub mod iter;
pub mod json;
pub mod limits;
pub mod package;
pub mod validate;
pub mod value;
pub mod varint;

// Re-export commonly used types
pub use container::{CbArray, CbObject};
pub use error::{CbError, FieldError, Result};
pub use field::CbField;
pub use field_type::{CbFieldType, HAS_FIELD_NAME, HAS_FIELD_TYPE};
pub use hash::{Blake3Hasher, CbHash, HashBuilder};
pub use iter::CbFieldIter;
pub use limits::Limits;
pub use package::{AttachmentEntry, PackageHeader};
pub use validate::{validate, validate_field, ValidateMode};
pub use value::{CbDateTime, CbObjectId, CbTimeSpan};

pub use bytes::Bytes;
pub use uuid::Uuid;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports_cover_a_document() {
        // {"n": 7}
        let object = CbObject::from_bytes(vec![
            CbFieldType::Object as u8,
            4,
            CbFieldType::IntegerPositive as u8 | HAS_FIELD_NAME,
            1,
            b'n',
            7,
        ])
        .unwrap();
        assert_eq!(object.find("n").as_i32(), 7);
        assert!(validate(object.to_bytes(), ValidateMode::ALL, &Limits::default()).is_ok());
    }
}
