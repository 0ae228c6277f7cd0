//! CB Codec - Writer and typed mapping for Compact Binary
//!
//! This crate provides the encoding side of the Compact Binary format:
//!
//! - A scope-stack writer that emits well-formed fields, objects and arrays
//! - Typed mapping traits between Rust values and fields
//! - Conversion from JSON values

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod convert;
pub mod json;
pub mod writer;

// Re-export commonly used types
pub use cb_format::{
    CbArray, CbError, CbField, CbFieldType, CbHash, CbObject, FieldError, Limits, Result,
};

// Re-export our own types
pub use convert::{from_field, to_field, CbDecode, CbEncode};
pub use json::{from_json, from_json_str, write_json};
pub use writer::CbWriter;
