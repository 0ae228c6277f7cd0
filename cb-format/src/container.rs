//! Object and array views

use crate::error::{CbError, Result};
use crate::field::CbField;
use crate::field_type;
use crate::hash::{CbHash, HashBuilder};
use crate::iter::CbFieldIter;
use bytes::Bytes;
use std::fmt;

/// View of an object or uniform object.
///
/// Names are not checked for uniqueness; lookups return the first match.
#[derive(Clone, PartialEq, Eq)]
pub struct CbObject {
    field: CbField,
}

impl CbObject {
    pub(crate) fn from_field_unchecked(field: CbField) -> Self {
        Self { field }
    }

    /// Wrap a field that must be an object.
    pub fn from_field(field: CbField) -> Result<Self> {
        if !field_type::is_object(field.type_with_flags()) {
            return Err(CbError::InvalidFieldType(field.type_with_flags()));
        }
        Ok(Self { field })
    }

    /// Parse a self-typed object from `bytes`.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self> {
        Self::from_field(CbField::from_bytes(bytes)?)
    }

    /// The underlying field.
    pub fn as_field(&self) -> &CbField {
        &self.field
    }

    /// Unwrap into the underlying field.
    pub fn into_field(self) -> CbField {
        self.field
    }

    /// Iterate fields in encoded order.
    pub fn iter(&self) -> CbFieldIter {
        self.field.iter()
    }

    /// Number of fields. Objects do not store a count, so this scans.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether the object has no fields.
    pub fn is_empty(&self) -> bool {
        self.iter().is_empty()
    }

    /// First field named `name`, or the absent field.
    pub fn find(&self, name: &str) -> CbField {
        self.get(name).unwrap_or_default()
    }

    /// First field named `name`.
    pub fn get(&self, name: &str) -> Option<CbField> {
        self.iter().find(|f| f.name_bytes() == name.as_bytes())
    }

    /// First field whose name matches `name` ignoring ASCII case, or the absent field.
    pub fn find_ignore_case(&self, name: &str) -> CbField {
        self.iter()
            .find(|f| f.name_bytes().eq_ignore_ascii_case(name.as_bytes()))
            .unwrap_or_default()
    }

    /// Canonical bytes of the object: type byte then payload.
    pub fn to_bytes(&self) -> Bytes {
        self.field.canonical_bytes()
    }

    /// See [`CbField::append_hash`].
    pub fn append_hash<H: HashBuilder>(&self, hasher: &mut H) {
        self.field.append_hash(hasher)
    }

    /// Content hash of the object.
    pub fn hash(&self) -> CbHash {
        self.field.hash()
    }

    /// See [`CbField::iterate_attachments`].
    pub fn iterate_attachments<F: FnMut(&CbField)>(&self, visitor: F) {
        self.field.iterate_attachments(visitor)
    }
}

impl Default for CbObject {
    fn default() -> Self {
        Self {
            field: CbField::empty_object(),
        }
    }
}

impl fmt::Debug for CbObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|field| (field.name().to_string(), field)))
            .finish()
    }
}

impl<'a> IntoIterator for &'a CbObject {
    type Item = CbField;
    type IntoIter = CbFieldIter;

    fn into_iter(self) -> CbFieldIter {
        self.iter()
    }
}

/// View of an array or uniform array
#[derive(Clone, PartialEq, Eq)]
pub struct CbArray {
    field: CbField,
}

impl CbArray {
    pub(crate) fn from_field_unchecked(field: CbField) -> Self {
        Self { field }
    }

    /// Wrap a field that must be an array.
    pub fn from_field(field: CbField) -> Result<Self> {
        if !field_type::is_array(field.type_with_flags()) {
            return Err(CbError::InvalidFieldType(field.type_with_flags()));
        }
        Ok(Self { field })
    }

    /// Parse a self-typed array from `bytes`.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self> {
        Self::from_field(CbField::from_bytes(bytes)?)
    }

    /// The underlying field.
    pub fn as_field(&self) -> &CbField {
        &self.field
    }

    /// Unwrap into the underlying field.
    pub fn into_field(self) -> CbField {
        self.field
    }

    /// Iterate items in encoded order.
    pub fn iter(&self) -> CbFieldIter {
        self.field.iter()
    }

    /// Item count as declared in the payload; no scan.
    pub fn len(&self) -> usize {
        self.field
            .declared_item_count()
            .and_then(|count| usize::try_from(count).ok())
            .unwrap_or(0)
    }

    /// Whether the array declares no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Canonical bytes of the array: type byte then payload.
    pub fn to_bytes(&self) -> Bytes {
        self.field.canonical_bytes()
    }

    /// See [`CbField::append_hash`].
    pub fn append_hash<H: HashBuilder>(&self, hasher: &mut H) {
        self.field.append_hash(hasher)
    }

    /// Content hash of the array.
    pub fn hash(&self) -> CbHash {
        self.field.hash()
    }

    /// See [`CbField::iterate_attachments`].
    pub fn iterate_attachments<F: FnMut(&CbField)>(&self, visitor: F) {
        self.field.iterate_attachments(visitor)
    }
}

impl Default for CbArray {
    fn default() -> Self {
        Self {
            field: CbField::empty_array(),
        }
    }
}

impl fmt::Debug for CbArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a CbArray {
    type Item = CbField;
    type IntoIter = CbFieldIter;

    fn into_iter(self) -> CbFieldIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_type::{CbFieldType, HAS_FIELD_NAME};

    const NAMED_INT: u8 = CbFieldType::IntegerPositive as u8 | HAS_FIELD_NAME;

    // {"a": 1, "B": 2, "a": 3}
    fn sample_object() -> CbObject {
        CbObject::from_bytes(vec![
            CbFieldType::Object as u8,
            12,
            NAMED_INT,
            1,
            b'a',
            1,
            NAMED_INT,
            1,
            b'B',
            2,
            NAMED_INT,
            1,
            b'a',
            3,
        ])
        .unwrap()
    }

    #[test]
    fn test_object_lookup() {
        let object = sample_object();
        assert_eq!(object.len(), 3);
        assert_eq!(object.find("a").as_u8(), 1);
        assert_eq!(object.find("B").as_u8(), 2);
        assert!(!object.find("b").has_value());
        assert_eq!(object.find_ignore_case("b").as_u8(), 2);
        assert!(object.get("missing").is_none());
    }

    #[test]
    fn test_empty_defaults() {
        let object = CbObject::default();
        assert!(object.is_empty());
        assert_eq!(object.to_bytes().as_ref(), &[0x02, 0x00]);

        let array = CbArray::default();
        assert!(array.is_empty());
        assert_eq!(array.iter().count(), 0);
        assert_eq!(array.to_bytes().as_ref(), &[0x04, 0x01, 0x00]);
    }

    #[test]
    fn test_wrong_kind_is_rejected() {
        assert!(CbArray::from_bytes(vec![0x02, 0x00]).is_err());
        assert!(CbObject::from_bytes(vec![0x04, 0x01, 0x00]).is_err());
    }

    #[test]
    fn test_uniform_array() {
        let array = CbArray::from_bytes(vec![
            CbFieldType::UniformArray as u8,
            5,
            3,
            CbFieldType::IntegerPositive as u8,
            10,
            20,
            30,
        ])
        .unwrap();
        assert_eq!(array.len(), 3);
        let values: Vec<u8> = array.iter().map(|f| f.as_u8()).collect();
        assert_eq!(values, vec![10, 20, 30]);
    }

    #[test]
    fn test_uniform_and_plain_arrays_differ_in_bytes() {
        let uniform = CbArray::from_bytes(vec![0x05, 0x04, 0x02, 0x08, 0x01, 0x02]).unwrap();
        let plain = CbArray::from_bytes(vec![0x04, 0x05, 0x02, 0x08, 0x01, 0x08, 0x02]).unwrap();
        let a: Vec<u8> = uniform.iter().map(|f| f.as_u8()).collect();
        let b: Vec<u8> = plain.iter().map(|f| f.as_u8()).collect();
        assert_eq!(a, b);
        assert_ne!(uniform, plain);
    }

    #[test]
    fn test_attachment_visitation() {
        let mut bytes = vec![CbFieldType::Array as u8, 43, 2];
        bytes.push(CbFieldType::BinaryAttachment as u8);
        bytes.extend_from_slice(&[1u8; 20]);
        bytes.push(CbFieldType::ObjectAttachment as u8);
        bytes.extend_from_slice(&[2u8; 20]);
        let array = CbArray::from_bytes(bytes).unwrap();

        let mut seen = Vec::new();
        array.iterate_attachments(|f| seen.push(f.as_attachment()));
        assert_eq!(seen, vec![CbHash([1u8; 20]), CbHash([2u8; 20])]);
    }

    #[test]
    fn test_uniform_integers_skip_attachment_scan() {
        let array = CbArray::from_bytes(vec![0x05, 0x03, 0x01, 0x08, 0x01]).unwrap();
        let mut seen = 0;
        array.iterate_attachments(|_| seen += 1);
        assert_eq!(seen, 0);
    }
}
