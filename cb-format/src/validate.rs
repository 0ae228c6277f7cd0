//! Opt-in structural validation
//!
//! Reading is permissive: views accept duplicate object names, missing names
//! and non-UTF-8 text, and iteration quietly stops at the first malformed
//! child. [`validate`] walks a whole document up front and reports the first
//! defect instead, with the checks selected by [`ValidateMode`].

use crate::error::{CbError, Result};
use crate::field::CbField;
use crate::field_type::{self, CbFieldType, HAS_FIELD_TYPE};
use crate::limits::Limits;
use bytes::Bytes;
use std::collections::HashSet;
use std::ops::{BitOr, BitOrAssign};

/// Set of checks performed by [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidateMode(u8);

impl ValidateMode {
    /// Extents, type codes, VarUInt lengths, array item counts and the depth limit.
    /// Always performed.
    pub const DEFAULT: Self = Self(0);
    /// Object fields are named, names are unique, array items are unnamed.
    pub const NAMES: Self = Self(1 << 0);
    /// Strings and names are UTF-8; uniform arrays do not use zero-size element types.
    pub const FORMAT: Self = Self(1 << 1);
    /// No bytes follow the top-level field.
    pub const PADDING: Self = Self(1 << 2);
    /// Every check.
    pub const ALL: Self = Self(Self::NAMES.0 | Self::FORMAT.0 | Self::PADDING.0);

    /// Whether every check in `other` is enabled.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ValidateMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ValidateMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

struct Frame {
    remaining: Bytes,
    offset: usize,
    uniform_type: Option<u8>,
    is_object: bool,
    names: HashSet<Bytes>,
    declared_count: Option<u64>,
    seen: u64,
}

/// Validate the self-typed field at the start of `data`.
pub fn validate(data: impl Into<Bytes>, mode: ValidateMode, limits: &Limits) -> Result<()> {
    let data = data.into();
    let field = CbField::from_bytes(data.clone())
        .map_err(|err| CbError::Validation(format!("top-level field: {}", err)))?;
    if mode.contains(ValidateMode::PADDING) && field.encoded_len() != data.len() {
        return Err(CbError::Validation(format!(
            "{} trailing bytes after top-level field",
            data.len() - field.encoded_len()
        )));
    }
    validate_field(&field, mode, limits)
}

/// Validate an already parsed field and everything nested in it.
pub fn validate_field(field: &CbField, mode: ValidateMode, limits: &Limits) -> Result<()> {
    check_field(field, mode, limits)?;
    let mut stack = Vec::new();
    if field_type::has_fields(field.type_with_flags()) {
        stack.push(open(field, mode, limits, 0)?);
    }

    while let Some(frame) = stack.last_mut() {
        if frame.remaining.is_empty() {
            if let Some(declared) = frame.declared_count {
                let zero_size_items = frame
                    .uniform_type
                    .and_then(|tag| CbFieldType::from_u8(tag).ok())
                    .and_then(CbFieldType::fixed_payload_size)
                    == Some(0);
                if !zero_size_items && declared != frame.seen {
                    return Err(CbError::Validation(format!(
                        "array declares {} items but holds {}",
                        declared, frame.seen
                    )));
                }
            }
            stack.pop();
            continue;
        }

        let hint = frame.uniform_type.unwrap_or(HAS_FIELD_TYPE);
        let offset = frame.offset;
        let child = CbField::parse(frame.remaining.clone(), hint).map_err(|err| {
            CbError::Validation(format!("child at offset {}: {}", offset, err))
        })?;
        if child.encoded_len() == 0 {
            return Err(CbError::Validation(format!(
                "zero-size child at offset {} with {} bytes remaining",
                offset,
                frame.remaining.len()
            )));
        }
        let _ = frame.remaining.split_to(child.encoded_len());
        frame.offset += child.encoded_len();
        frame.seen += 1;

        if mode.contains(ValidateMode::NAMES) {
            if frame.is_object {
                if child.name_bytes().is_empty() {
                    return Err(CbError::Validation(format!(
                        "unnamed object field at offset {}",
                        offset
                    )));
                }
                let name = Bytes::copy_from_slice(child.name_bytes());
                if !frame.names.insert(name) {
                    return Err(CbError::Validation(format!(
                        "duplicate object field name {:?}",
                        child.name()
                    )));
                }
            } else if child.has_name() {
                return Err(CbError::Validation(format!(
                    "named array item {:?} at offset {}",
                    child.name(),
                    offset
                )));
            }
        }

        check_field(&child, mode, limits)?;
        if field_type::has_fields(child.type_with_flags()) {
            let depth = stack.len();
            stack.push(open(&child, mode, limits, depth)?);
        }
    }
    Ok(())
}

fn open(field: &CbField, mode: ValidateMode, limits: &Limits, depth: usize) -> Result<Frame> {
    if depth >= limits.max_depth {
        return Err(CbError::LimitExceeded(format!(
            "nesting depth exceeds {}",
            limits.max_depth
        )));
    }
    let (remaining, declared_count, uniform_type) = field
        .container_parts()
        .map_err(|err| CbError::Validation(format!("container header: {}", err)))?;

    if let Some(tag) = uniform_type {
        let element = CbFieldType::from_u8(tag)
            .map_err(|err| CbError::Validation(format!("uniform element type: {}", err)))?;
        if field_type::is_object(field.type_with_flags()) != field_type::has_field_name(tag) {
            return Err(CbError::Validation(format!(
                "uniform element type {:#04x} has the wrong name flag for its container",
                tag
            )));
        }
        if mode.contains(ValidateMode::FORMAT)
            && field_type::is_array(field.type_with_flags())
            && element.fixed_payload_size() == Some(0)
        {
            return Err(CbError::Validation(format!(
                "uniform array of zero-size {:?} items",
                element
            )));
        }
    }

    Ok(Frame {
        remaining,
        offset: 0,
        uniform_type,
        is_object: field_type::is_object(field.type_with_flags()),
        names: HashSet::new(),
        declared_count,
        seen: 0,
    })
}

fn check_field(field: &CbField, mode: ValidateMode, limits: &Limits) -> Result<()> {
    if field.name_bytes().len() > limits.max_name_length {
        return Err(CbError::LimitExceeded(format!(
            "field name of {} bytes exceeds {}",
            field.name_bytes().len(),
            limits.max_name_length
        )));
    }
    let format = mode.contains(ValidateMode::FORMAT);
    if format && std::str::from_utf8(field.name_bytes()).is_err() {
        return Err(CbError::Validation("field name is not UTF-8".to_string()));
    }

    let malformed = match field.field_type() {
        CbFieldType::String if format => field.try_as_str().err(),
        CbFieldType::CustomById => field.try_as_custom_by_id().err(),
        CbFieldType::CustomByName => field.try_as_custom_by_name().err(),
        _ => None,
    };
    match malformed {
        Some(err) => Err(CbError::Validation(format!(
            "{:?} field {:?}: {}",
            field.field_type(),
            field.name(),
            err
        ))),
        None => Ok(()),
    }
}

impl CbField {
    /// See [`validate_field`].
    pub fn validate(&self, mode: ValidateMode, limits: &Limits) -> Result<()> {
        validate_field(self, mode, limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_type::HAS_FIELD_NAME;

    const NAMED_NULL: u8 = CbFieldType::Null as u8 | HAS_FIELD_NAME;

    fn check(bytes: Vec<u8>, mode: ValidateMode) -> Result<()> {
        validate(bytes, mode, &Limits::default())
    }

    #[test]
    fn test_well_formed_object() {
        let bytes = vec![0x02, 0x06, NAMED_NULL, 0x01, b'a', NAMED_NULL, 0x01, b'b'];
        assert!(check(bytes, ValidateMode::ALL).is_ok());
    }

    #[test]
    fn test_duplicate_names_only_fail_with_names_mode() {
        let bytes = vec![0x02, 0x06, NAMED_NULL, 0x01, b'a', NAMED_NULL, 0x01, b'a'];
        assert!(check(bytes.clone(), ValidateMode::DEFAULT).is_ok());
        assert!(matches!(
            check(bytes, ValidateMode::NAMES),
            Err(CbError::Validation(_))
        ));
    }

    #[test]
    fn test_named_array_item() {
        let bytes = vec![0x04, 0x04, 0x01, NAMED_NULL, 0x01, b'a'];
        assert!(check(bytes.clone(), ValidateMode::DEFAULT).is_ok());
        assert!(check(bytes, ValidateMode::NAMES).is_err());
    }

    #[test]
    fn test_item_count_mismatch() {
        let bytes = vec![0x04, 0x03, 0x02, 0x01, 0x01];
        assert!(check(bytes, ValidateMode::DEFAULT).is_ok());
        let bytes = vec![0x04, 0x03, 0x05, 0x01, 0x01];
        assert!(check(bytes, ValidateMode::DEFAULT).is_err());
    }

    #[test]
    fn test_malformed_child() {
        let bytes = vec![0x04, 0x03, 0x01, 0x07, 0x09];
        assert!(check(bytes, ValidateMode::DEFAULT).is_err());
    }

    #[test]
    fn test_zero_size_uniform_array() {
        let bytes = vec![0x05, 0x02, 0x03, CbFieldType::Null as u8];
        assert!(check(bytes.clone(), ValidateMode::DEFAULT).is_ok());
        assert!(check(bytes, ValidateMode::FORMAT).is_err());
    }

    #[test]
    fn test_uniform_object_of_null_fields() {
        // Items carry only a name, so each one still occupies bytes
        let bytes = vec![0x03, 0x05, NAMED_NULL, 0x01, b'a', 0x01, b'b'];
        assert!(check(bytes.clone(), ValidateMode::FORMAT).is_ok());
        assert!(check(bytes, ValidateMode::ALL).is_ok());
    }

    #[test]
    fn test_invalid_utf8() {
        let bytes = vec![0x07, 0x01, 0xff];
        assert!(check(bytes.clone(), ValidateMode::DEFAULT).is_ok());
        assert!(check(bytes, ValidateMode::FORMAT).is_err());
    }

    #[test]
    fn test_trailing_padding() {
        let bytes = vec![0x01, 0x00];
        assert!(check(bytes.clone(), ValidateMode::DEFAULT).is_ok());
        assert!(check(bytes, ValidateMode::PADDING).is_err());
    }

    #[test]
    fn test_depth_limit() {
        // 3 nested arrays
        let bytes = vec![0x04, 0x07, 0x01, 0x04, 0x04, 0x01, 0x04, 0x01, 0x00];
        let limits = Limits {
            max_depth: 2,
            ..Limits::default()
        };
        assert!(matches!(
            validate(bytes.clone(), ValidateMode::DEFAULT, &limits),
            Err(CbError::LimitExceeded(_))
        ));
        assert!(validate(bytes, ValidateMode::DEFAULT, &Limits::default()).is_ok());
    }

    #[test]
    fn test_mode_flags() {
        let mode = ValidateMode::NAMES | ValidateMode::FORMAT;
        assert!(mode.contains(ValidateMode::NAMES));
        assert!(!mode.contains(ValidateMode::PADDING));
        assert!(ValidateMode::ALL.contains(mode));
    }
}
