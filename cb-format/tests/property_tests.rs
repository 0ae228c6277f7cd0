//! Property-based tests for CB format primitives

use cb_format::varint::{encode_var_uint, measure_var_uint, read_var_uint, MAX_VAR_UINT_LEN};
use cb_format::{
    validate, CbField, CbFieldIter, CbFieldType, CbObject, FieldError, Limits, ValidateMode,
    HAS_FIELD_NAME,
};
use proptest::prelude::*;

fn positive_field(value: u64) -> Vec<u8> {
    let mut bytes = vec![CbFieldType::IntegerPositive as u8];
    bytes.extend_from_slice(&encode_var_uint(value));
    bytes
}

proptest! {
    #[test]
    fn var_uint_roundtrip_property(value in any::<u64>()) {
        let encoded = encode_var_uint(value);
        prop_assert_eq!(encoded.len(), measure_var_uint(value));
        let (decoded, len) = read_var_uint(&encoded).expect("Failed to decode VarUInt");
        prop_assert_eq!(value, decoded);
        prop_assert_eq!(len, encoded.len());
    }

    #[test]
    fn var_uint_size_property(value in any::<u64>()) {
        let encoded = encode_var_uint(value);
        prop_assert!(encoded.len() <= MAX_VAR_UINT_LEN);
        if value < 128 {
            prop_assert_eq!(encoded.len(), 1);
        } else if value < 16384 {
            prop_assert_eq!(encoded.len(), 2);
        }
    }

    #[test]
    fn field_parse_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        if let Ok(field) = CbField::from_bytes(bytes.clone()) {
            prop_assert!(field.encoded_len() <= bytes.len());
            let _ = field.to_json();
            let _ = field.iter().count();
            field.iterate_attachments(|_| {});
        }
        let _ = validate(bytes.clone(), ValidateMode::ALL, &Limits::default());
        let _ = CbFieldIter::from_bytes(bytes).count();
    }

    #[test]
    fn unsigned_access_matches_range(value in any::<u64>()) {
        let field = CbField::from_bytes(positive_field(value)).unwrap();
        prop_assert_eq!(field.as_u64(), value);
        let narrowed = field.try_as_u32();
        if value <= u32::MAX as u64 {
            prop_assert_eq!(narrowed, Ok(value as u32));
        } else {
            prop_assert_eq!(narrowed, Err(FieldError::Range));
        }
        let signed = field.try_as_i64();
        if value <= i64::MAX as u64 {
            prop_assert_eq!(signed, Ok(value as i64));
        } else {
            prop_assert_eq!(signed, Err(FieldError::Range));
        }
    }

    #[test]
    fn hash_ignores_name(value in any::<u64>(), name in "[a-z]{1,16}") {
        let unnamed = CbField::from_bytes(positive_field(value)).unwrap();

        let mut bytes = vec![CbFieldType::IntegerPositive as u8 | HAS_FIELD_NAME, name.len() as u8];
        bytes.extend_from_slice(name.as_bytes());
        bytes.extend_from_slice(&encode_var_uint(value));
        let named = CbField::from_bytes(bytes).unwrap();

        prop_assert_eq!(named.name(), name.as_str());
        prop_assert_eq!(named.hash(), unnamed.hash());
        prop_assert_eq!(named, unnamed);
    }

    #[test]
    fn object_lookup_finds_every_name(names in prop::collection::btree_set("[a-z]{1,8}", 1..20)) {
        let mut body = Vec::new();
        for (i, name) in names.iter().enumerate() {
            body.push(CbFieldType::IntegerPositive as u8 | HAS_FIELD_NAME);
            body.push(name.len() as u8);
            body.extend_from_slice(name.as_bytes());
            body.extend_from_slice(&encode_var_uint(i as u64));
        }
        let mut bytes = vec![CbFieldType::Object as u8];
        bytes.extend_from_slice(&encode_var_uint(body.len() as u64));
        bytes.extend_from_slice(&body);

        let object = CbObject::from_bytes(bytes).unwrap();
        prop_assert_eq!(object.len(), names.len());
        for (i, name) in names.iter().enumerate() {
            prop_assert_eq!(object.find(name).as_u64(), i as u64);
        }
        prop_assert!(validate(object.to_bytes(), ValidateMode::ALL, &Limits::default()).is_ok());
    }
}

#[test]
fn var_uint_boundaries() {
    let cases = [
        (0u64, 1usize),
        (127, 1),
        (128, 2),
        (16_383, 2),
        (16_384, 3),
        ((1 << 63) - 1, 9),
    ];
    for (value, len) in cases {
        let encoded = encode_var_uint(value);
        assert_eq!(encoded.len(), len, "length of {}", value);
        assert_eq!(read_var_uint(&encoded).unwrap(), (value, len));
    }
}
