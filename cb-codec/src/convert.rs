//! Typed mapping between Rust values and fields
//!
//! [`CbEncode`] writes a value at the writer's current position, picking up
//! any pending name; [`CbDecode`] reads one back from a field view.

use crate::writer::CbWriter;
use bytes::Bytes;
use cb_format::{
    CbArray, CbDateTime, CbField, CbFieldType, CbHash, CbObject, CbObjectId, CbTimeSpan,
    FieldError, Result, Uuid,
};

/// Value that can be written as one field
pub trait CbEncode {
    /// Write `self` as the next field.
    fn encode(&self, writer: &mut CbWriter) -> Result<()>;
}

/// Value that can be read from one field
pub trait CbDecode: Sized {
    /// Read a value of this type from `field`.
    fn decode(field: &CbField) -> std::result::Result<Self, FieldError>;
}

/// Encode `value` as a standalone field.
pub fn to_field<T: CbEncode + ?Sized>(value: &T) -> Result<CbField> {
    let mut writer = CbWriter::new();
    value.encode(&mut writer)?;
    writer.save_field()
}

/// Decode a value from `field`.
pub fn from_field<T: CbDecode>(field: &CbField) -> Result<T> {
    Ok(T::decode(field)?)
}

impl<T: CbEncode + ?Sized> CbEncode for &T {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        (**self).encode(writer)
    }
}

macro_rules! impl_integer {
    ($($ty:ty => $write:ident, $try_read:ident;)*) => {
        $(
            impl CbEncode for $ty {
                fn encode(&self, writer: &mut CbWriter) -> Result<()> {
                    writer.$write((*self).into())
                }
            }

            impl CbDecode for $ty {
                fn decode(field: &CbField) -> std::result::Result<Self, FieldError> {
                    field.$try_read()
                }
            }
        )*
    };
}

impl_integer! {
    i8 => write_i64, try_as_i8;
    i16 => write_i64, try_as_i16;
    i32 => write_i64, try_as_i32;
    i64 => write_i64, try_as_i64;
    u8 => write_u64, try_as_u8;
    u16 => write_u64, try_as_u16;
    u32 => write_u64, try_as_u32;
    u64 => write_u64, try_as_u64;
}

impl CbEncode for bool {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        writer.write_bool(*self)
    }
}

impl CbDecode for bool {
    fn decode(field: &CbField) -> std::result::Result<Self, FieldError> {
        field.try_as_bool()
    }
}

impl CbEncode for f32 {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        writer.write_f32(*self)
    }
}

impl CbDecode for f32 {
    fn decode(field: &CbField) -> std::result::Result<Self, FieldError> {
        field.try_as_f32()
    }
}

impl CbEncode for f64 {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        writer.write_f64(*self)
    }
}

impl CbDecode for f64 {
    fn decode(field: &CbField) -> std::result::Result<Self, FieldError> {
        field.try_as_f64()
    }
}

impl CbEncode for str {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        writer.write_str(self)
    }
}

impl CbEncode for String {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        writer.write_str(self)
    }
}

impl CbDecode for String {
    fn decode(field: &CbField) -> std::result::Result<Self, FieldError> {
        field.try_as_str().map(str::to_owned)
    }
}

impl CbEncode for Bytes {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        writer.write_binary_shared(self.clone())
    }
}

impl CbDecode for Bytes {
    fn decode(field: &CbField) -> std::result::Result<Self, FieldError> {
        field.try_as_binary_bytes()
    }
}

impl CbEncode for CbHash {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        writer.write_hash(self)
    }
}

impl CbDecode for CbHash {
    fn decode(field: &CbField) -> std::result::Result<Self, FieldError> {
        field.try_as_hash()
    }
}

impl CbEncode for Uuid {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        writer.write_uuid(self)
    }
}

impl CbDecode for Uuid {
    fn decode(field: &CbField) -> std::result::Result<Self, FieldError> {
        field.try_as_uuid()
    }
}

impl CbEncode for CbDateTime {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        writer.write_date_time(*self)
    }
}

impl CbDecode for CbDateTime {
    fn decode(field: &CbField) -> std::result::Result<Self, FieldError> {
        field.try_as_date_time()
    }
}

impl CbEncode for CbTimeSpan {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        writer.write_time_span(*self)
    }
}

impl CbDecode for CbTimeSpan {
    fn decode(field: &CbField) -> std::result::Result<Self, FieldError> {
        field.try_as_time_span()
    }
}

impl CbEncode for CbObjectId {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        writer.write_object_id(self)
    }
}

impl CbDecode for CbObjectId {
    fn decode(field: &CbField) -> std::result::Result<Self, FieldError> {
        field.try_as_object_id()
    }
}

impl CbEncode for CbObject {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        writer.write_object_copy(self)
    }
}

impl CbDecode for CbObject {
    fn decode(field: &CbField) -> std::result::Result<Self, FieldError> {
        field.try_as_object()
    }
}

impl CbEncode for CbArray {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        writer.write_array_copy(self)
    }
}

impl CbDecode for CbArray {
    fn decode(field: &CbField) -> std::result::Result<Self, FieldError> {
        field.try_as_array()
    }
}

/// `None` is written as null; null and the absent field decode to `None`.
impl<T: CbEncode> CbEncode for Option<T> {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        match self {
            Some(value) => value.encode(writer),
            None => writer.write_null(),
        }
    }
}

impl<T: CbDecode> CbDecode for Option<T> {
    fn decode(field: &CbField) -> std::result::Result<Self, FieldError> {
        match field.field_type() {
            CbFieldType::None | CbFieldType::Null => Ok(None),
            _ => T::decode(field).map(Some),
        }
    }
}

impl<T: CbEncode> CbEncode for [T] {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        writer.begin_array()?;
        for item in self {
            item.encode(writer)?;
        }
        writer.end_array()
    }
}

impl<T: CbEncode> CbEncode for Vec<T> {
    fn encode(&self, writer: &mut CbWriter) -> Result<()> {
        self.as_slice().encode(writer)
    }
}

impl<T: CbDecode> CbDecode for Vec<T> {
    fn decode(field: &CbField) -> std::result::Result<Self, FieldError> {
        let array = field.try_as_array()?;
        let mut items = Vec::with_capacity(array.len());
        for item in array.iter() {
            items.push(T::decode(&item)?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: CbEncode + CbDecode>(value: &T) -> T {
        let field = to_field(value).unwrap();
        from_field(&field).unwrap()
    }

    #[test]
    fn test_scalar_roundtrips() {
        assert_eq!(roundtrip(&-5i8), -5);
        assert_eq!(roundtrip(&u64::MAX), u64::MAX);
        assert_eq!(roundtrip(&i64::MIN), i64::MIN);
        assert!(roundtrip(&true));
        assert_eq!(roundtrip(&1.25f32), 1.25);
        assert_eq!(roundtrip(&"text".to_string()), "text");
        assert_eq!(roundtrip(&Bytes::from_static(b"\x00\x01")), Bytes::from_static(b"\x00\x01"));
        assert_eq!(roundtrip(&CbTimeSpan(-3)), CbTimeSpan(-3));
    }

    #[test]
    fn test_option_and_vec() {
        assert_eq!(roundtrip(&Some(3u16)), Some(3));
        assert_eq!(roundtrip(&None::<u16>), None);
        assert_eq!(roundtrip(&vec![1i32, -2, 3]), vec![1, -2, 3]);
        assert_eq!(roundtrip(&vec![Some("a".to_string()), None]), vec![Some("a".to_string()), None]);
    }

    #[test]
    fn test_decode_range_error() {
        let field = to_field(&300u32).unwrap();
        assert_eq!(u8::decode(&field), Err(FieldError::Range));
        assert!(matches!(
            from_field::<u8>(&field),
            Err(cb_format::CbError::Field(FieldError::Range))
        ));
    }

    #[test]
    fn test_named_values_in_object() {
        let mut writer = CbWriter::new();
        writer.begin_object().unwrap();
        writer.name("list");
        vec![1u8, 2].encode(&mut writer).unwrap();
        writer.name("label");
        "x".encode(&mut writer).unwrap();
        writer.end_object().unwrap();

        let object = writer.save_object().unwrap();
        assert_eq!(Vec::<u8>::decode(&object.find("list")), Ok(vec![1, 2]));
        assert_eq!(String::decode(&object.find("label")), Ok("x".to_string()));
        assert_eq!(Option::<String>::decode(&object.find("missing")), Ok(None));
    }
}
