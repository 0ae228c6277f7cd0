//! Iteration over the children of a container

use crate::field::CbField;
use crate::field_type::HAS_FIELD_TYPE;
use bytes::Bytes;
use std::iter::FusedIterator;

/// Forward iterator over consecutive fields.
///
/// Cloning is cheap and yields an independent cursor over the same buffer.
/// Iteration ends early at the first child that fails to parse.
#[derive(Clone, Default)]
pub struct CbFieldIter {
    remaining: Bytes,
    uniform_type: Option<u8>,
}

impl CbFieldIter {
    /// Iterate `bytes`; children carry no type byte when `uniform_type` is set.
    pub fn new(bytes: Bytes, uniform_type: Option<u8>) -> Self {
        Self {
            remaining: bytes,
            uniform_type,
        }
    }

    /// Iterate a run of self-typed fields, such as the output of a builder
    /// that wrote several top-level fields.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::new(bytes.into(), None)
    }

    /// Shared child type for uniform containers.
    pub fn uniform_type(&self) -> Option<u8> {
        self.uniform_type
    }

    /// Bytes not yet visited.
    pub fn remaining(&self) -> &[u8] {
        &self.remaining
    }

    /// Whether every child has been visited.
    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }
}

impl Iterator for CbFieldIter {
    type Item = CbField;

    fn next(&mut self) -> Option<CbField> {
        if self.remaining.is_empty() {
            return None;
        }
        let hint = self.uniform_type.unwrap_or(HAS_FIELD_TYPE);
        match CbField::parse(self.remaining.clone(), hint) {
            // A zero-length uniform child (e.g. null) with bytes left means the
            // container is malformed; stop rather than loop forever.
            Ok(field) if field.encoded_len() > 0 => {
                let _ = self.remaining.split_to(field.encoded_len());
                Some(field)
            }
            _ => {
                self.remaining = Bytes::new();
                None
            }
        }
    }
}

impl FusedIterator for CbFieldIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_type::CbFieldType;

    #[test]
    fn test_self_typed_run() {
        let bytes = vec![
            CbFieldType::IntegerPositive as u8,
            0x01,
            CbFieldType::BoolTrue as u8,
            CbFieldType::Null as u8,
        ];
        let fields: Vec<_> = CbFieldIter::from_bytes(bytes).collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].as_u8(), 1);
        assert!(fields[1].as_bool());
        assert_eq!(fields[2].field_type(), CbFieldType::Null);
    }

    #[test]
    fn test_uniform_children() {
        let iter = CbFieldIter::new(
            Bytes::from_static(&[0x01, 0x02, 0x03]),
            Some(CbFieldType::IntegerPositive as u8),
        );
        let values: Vec<u8> = iter.map(|f| f.as_u8()).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_stops_at_malformed_child() {
        let bytes = vec![CbFieldType::IntegerPositive as u8, 0x01, 0x1d];
        let mut iter = CbFieldIter::from_bytes(bytes);
        assert!(iter.next().is_some());
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_zero_length_uniform_child_terminates() {
        let iter = CbFieldIter::new(
            Bytes::from_static(&[0x00, 0x00]),
            Some(CbFieldType::Null as u8),
        );
        assert_eq!(iter.count(), 0);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut iter = CbFieldIter::from_bytes(vec![0x0c, 0x0d]);
        let copy = iter.clone();
        iter.next();
        assert_eq!(copy.count(), 2);
        assert_eq!(iter.count(), 1);
    }
}
