//! Field type tag and classification predicates
//!
//! A type tag is one byte: a type code in the low five bits plus two flag
//! bits. The numeric values are part of the wire format and must never be
//! renumbered; the family predicates below rely on related types sharing
//! contiguous low-bit ranges so one `(tag & mask) == base` test classifies
//! a whole family regardless of flag bits.

use crate::error::{CbError, Result};

/// The encoded stream carries its own type byte at this position.
///
/// Never serialized. Absent only for children of uniform containers, whose
/// type is stored once by the parent.
pub const HAS_FIELD_TYPE: u8 = 0x40;

/// A VarUInt name length and the name bytes follow the type byte.
pub const HAS_FIELD_NAME: u8 = 0x80;

const TYPE_MASK: u8 = 0b0001_1111;
const SERIALIZED_TYPE_MASK: u8 = 0b1001_1111;

const OBJECT_MASK: u8 = 0b0001_1110;
const OBJECT_BASE: u8 = 0b0000_0010;

const ARRAY_MASK: u8 = 0b0001_1110;
const ARRAY_BASE: u8 = 0b0000_0100;

const INTEGER_MASK: u8 = 0b0001_1110;
const INTEGER_BASE: u8 = 0b0000_1000;

const FLOAT_MASK: u8 = 0b0001_1100;
const FLOAT_BASE: u8 = 0b0000_1000;

const BOOL_MASK: u8 = 0b0001_1110;
const BOOL_BASE: u8 = 0b0000_1100;

const ATTACHMENT_MASK: u8 = 0b0001_1110;
const ATTACHMENT_BASE: u8 = 0b0000_1110;

const DATE_TIME_MASK: u8 = 0b0001_1110;
const DATE_TIME_BASE: u8 = 0b0001_0010;

/// Field type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CbFieldType {
    /// Absent field; the canonical "no value" sentinel.
    #[default]
    None = 0x00,
    /// Null value with no payload.
    Null = 0x01,
    /// Object of named fields, each carrying its own type.
    Object = 0x02,
    /// Object of named fields sharing one type stored once.
    UniformObject = 0x03,
    /// Array of unnamed fields, each carrying its own type.
    Array = 0x04,
    /// Array of unnamed fields sharing one type stored once.
    UniformArray = 0x05,
    /// Binary blob with a VarUInt length prefix.
    Binary = 0x06,
    /// UTF-8 string with a VarUInt length prefix.
    String = 0x07,
    /// Non-negative integer stored as a VarUInt magnitude.
    IntegerPositive = 0x08,
    /// Negative integer stored as the VarUInt of its ones' complement.
    IntegerNegative = 0x09,
    /// Big-endian IEEE 754 single.
    Float32 = 0x0a,
    /// Big-endian IEEE 754 double.
    Float64 = 0x0b,
    /// `false` with no payload.
    BoolFalse = 0x0c,
    /// `true` with no payload.
    BoolTrue = 0x0d,
    /// 160-bit hash of an out-of-band object.
    ObjectAttachment = 0x0e,
    /// 160-bit hash of out-of-band binary data.
    BinaryAttachment = 0x0f,
    /// 160-bit hash value.
    Hash = 0x10,
    /// 128-bit UUID.
    Uuid = 0x11,
    /// Big-endian signed 100ns ticks since 0001-01-01.
    DateTime = 0x12,
    /// Big-endian signed 100ns ticks.
    TimeSpan = 0x13,
    /// 12-byte object identifier.
    ObjectId = 0x14,
    /// Custom value tagged by a numeric type id.
    CustomById = 0x1e,
    /// Custom value tagged by a type name.
    CustomByName = 0x1f,
}

impl CbFieldType {
    /// Convert a type code (flags ignored) into a field type.
    pub fn from_u8(tag: u8) -> Result<Self> {
        let field_type = match get_type(tag) {
            0x00 => CbFieldType::None,
            0x01 => CbFieldType::Null,
            0x02 => CbFieldType::Object,
            0x03 => CbFieldType::UniformObject,
            0x04 => CbFieldType::Array,
            0x05 => CbFieldType::UniformArray,
            0x06 => CbFieldType::Binary,
            0x07 => CbFieldType::String,
            0x08 => CbFieldType::IntegerPositive,
            0x09 => CbFieldType::IntegerNegative,
            0x0a => CbFieldType::Float32,
            0x0b => CbFieldType::Float64,
            0x0c => CbFieldType::BoolFalse,
            0x0d => CbFieldType::BoolTrue,
            0x0e => CbFieldType::ObjectAttachment,
            0x0f => CbFieldType::BinaryAttachment,
            0x10 => CbFieldType::Hash,
            0x11 => CbFieldType::Uuid,
            0x12 => CbFieldType::DateTime,
            0x13 => CbFieldType::TimeSpan,
            0x14 => CbFieldType::ObjectId,
            0x1e => CbFieldType::CustomById,
            0x1f => CbFieldType::CustomByName,
            _ => return Err(CbError::InvalidFieldType(tag)),
        };
        Ok(field_type)
    }

    /// Size of the payload when it is fixed by the type alone.
    ///
    /// Returns `None` for types whose payload starts with a VarUInt.
    pub fn fixed_payload_size(self) -> Option<usize> {
        match self {
            CbFieldType::None
            | CbFieldType::Null
            | CbFieldType::BoolFalse
            | CbFieldType::BoolTrue => Some(0),
            CbFieldType::Float32 => Some(4),
            CbFieldType::Float64 => Some(8),
            CbFieldType::ObjectAttachment | CbFieldType::BinaryAttachment | CbFieldType::Hash => {
                Some(20)
            }
            CbFieldType::Uuid => Some(16),
            CbFieldType::DateTime | CbFieldType::TimeSpan => Some(8),
            CbFieldType::ObjectId => Some(12),
            CbFieldType::Object
            | CbFieldType::UniformObject
            | CbFieldType::Array
            | CbFieldType::UniformArray
            | CbFieldType::Binary
            | CbFieldType::String
            | CbFieldType::IntegerPositive
            | CbFieldType::IntegerNegative
            | CbFieldType::CustomById
            | CbFieldType::CustomByName => None,
        }
    }
}

/// Type code with both flag bits cleared.
pub const fn get_type(tag: u8) -> u8 {
    tag & TYPE_MASK
}

/// Type as written to the wire: only the transient `HAS_FIELD_TYPE` bit is cleared.
pub const fn get_serialized_type(tag: u8) -> u8 {
    tag & SERIALIZED_TYPE_MASK
}

/// Whether the stream carries its own type byte.
pub const fn has_field_type(tag: u8) -> bool {
    tag & HAS_FIELD_TYPE != 0
}

/// Whether a name precedes the payload.
pub const fn has_field_name(tag: u8) -> bool {
    tag & HAS_FIELD_NAME != 0
}

/// Whether the type code is one of the defined codes.
pub const fn is_valid(tag: u8) -> bool {
    let t = get_type(tag);
    t <= CbFieldType::ObjectId as u8 || t >= CbFieldType::CustomById as u8
}

/// No value.
pub const fn is_none(tag: u8) -> bool {
    get_type(tag) == CbFieldType::None as u8
}

/// Null.
pub const fn is_null(tag: u8) -> bool {
    get_type(tag) == CbFieldType::Null as u8
}

/// Object or uniform object.
pub const fn is_object(tag: u8) -> bool {
    tag & OBJECT_MASK == OBJECT_BASE
}

/// Array or uniform array.
pub const fn is_array(tag: u8) -> bool {
    tag & ARRAY_MASK == ARRAY_BASE
}

/// Binary blob.
pub const fn is_binary(tag: u8) -> bool {
    get_type(tag) == CbFieldType::Binary as u8
}

/// UTF-8 string.
pub const fn is_string(tag: u8) -> bool {
    get_type(tag) == CbFieldType::String as u8
}

/// Positive or negative integer.
pub const fn is_integer(tag: u8) -> bool {
    tag & INTEGER_MASK == INTEGER_BASE
}

/// Float, or an integer that converts to a float implicitly.
pub const fn is_float(tag: u8) -> bool {
    tag & FLOAT_MASK == FLOAT_BASE
}

/// `true` or `false`.
pub const fn is_bool(tag: u8) -> bool {
    tag & BOOL_MASK == BOOL_BASE
}

/// Reference to an out-of-band object.
pub const fn is_object_attachment(tag: u8) -> bool {
    get_type(tag) == CbFieldType::ObjectAttachment as u8
}

/// Reference to out-of-band binary data.
pub const fn is_binary_attachment(tag: u8) -> bool {
    get_type(tag) == CbFieldType::BinaryAttachment as u8
}

/// Either attachment kind.
pub const fn is_attachment(tag: u8) -> bool {
    tag & ATTACHMENT_MASK == ATTACHMENT_BASE
}

/// Hash, or an attachment (which is also a hash).
pub const fn is_hash(tag: u8) -> bool {
    get_type(tag) == CbFieldType::Hash as u8 || is_attachment(tag)
}

/// UUID.
pub const fn is_uuid(tag: u8) -> bool {
    get_type(tag) == CbFieldType::Uuid as u8
}

/// Date-time.
pub const fn is_date_time(tag: u8) -> bool {
    get_type(tag) == CbFieldType::DateTime as u8
}

/// Time-span.
pub const fn is_time_span(tag: u8) -> bool {
    get_type(tag) == CbFieldType::TimeSpan as u8
}

/// Date-time or time-span; both are 8-byte tick counts.
pub const fn is_tick_count(tag: u8) -> bool {
    tag & DATE_TIME_MASK == DATE_TIME_BASE
}

/// Object id.
pub const fn is_object_id(tag: u8) -> bool {
    get_type(tag) == CbFieldType::ObjectId as u8
}

/// Custom type tagged by id or by name.
pub const fn is_custom(tag: u8) -> bool {
    get_type(tag) >= CbFieldType::CustomById as u8
}

/// Object or array of any kind.
pub const fn has_fields(tag: u8) -> bool {
    let t = get_type(tag);
    t >= CbFieldType::Object as u8 && t <= CbFieldType::UniformArray as u8
}

/// Uniform object or uniform array.
pub const fn has_uniform_fields(tag: u8) -> bool {
    let t = get_type(tag);
    t == CbFieldType::UniformObject as u8 || t == CbFieldType::UniformArray as u8
}

/// Is an attachment, or is a container that may hold one.
pub const fn may_contain_attachments(tag: u8) -> bool {
    is_object(tag) || is_array(tag) || is_attachment(tag)
}
