//! Zero-copy field view
//!
//! A [`CbField`] is a cheap projection over a reference-counted byte buffer:
//! cloning it never copies payload bytes, and the buffer is sliced to the
//! field's own extent at construction so a view never exposes a following
//! sibling. Typed accessors are error tolerant: on mismatch they return a
//! default and record a [`FieldError`] that stays on the view until the next
//! access overwrites it.
//!
//! The recorded error lives in a `Cell`, so a view is `Send` but not `Sync`.
//! Threads reading the same document share the buffer by cloning views.

use crate::container::{CbArray, CbObject};
use crate::error::{CbError, FieldError, Result};
use crate::field_type::{self, CbFieldType, HAS_FIELD_TYPE};
use crate::hash::{Blake3Hasher, CbHash, HashBuilder};
use crate::iter::CbFieldIter;
use crate::value::{CbDateTime, CbObjectId, CbTimeSpan};
use crate::varint::{measure_encoded_var_uint, read_var_uint};
use bytes::Bytes;
use std::cell::Cell;
use std::fmt;
use uuid::Uuid;

type FieldResult<T> = std::result::Result<T, FieldError>;

static EMPTY_OBJECT: [u8; 2] = [CbFieldType::Object as u8, 0x00];
static EMPTY_ARRAY: [u8; 3] = [CbFieldType::Array as u8, 0x01, 0x00];

/// Read-only view of one encoded field: optional name, type and payload
#[derive(Clone, Default)]
pub struct CbField {
    /// Exact encoded extent: own type byte (if stored), name, payload.
    data: Bytes,
    /// Serialized type; `HAS_FIELD_TYPE` is never set here.
    type_with_flags: u8,
    field_type: CbFieldType,
    /// 1 when `data` starts with the field's own type byte, 0 inside uniform containers.
    type_len: usize,
    name_len: usize,
    payload_offset: usize,
    error: Cell<Option<FieldError>>,
}

/// Offsets into a container payload, past its size prefix.
struct ContainerLayout {
    children_offset: usize,
    item_count: Option<u64>,
    uniform_type: Option<u8>,
}

/// Byte length of the payload of `field_type` starting at `payload`.
pub fn payload_size(field_type: CbFieldType, payload: &[u8]) -> Result<usize> {
    if let Some(size) = field_type.fixed_payload_size() {
        return Ok(size);
    }
    match field_type {
        CbFieldType::IntegerPositive | CbFieldType::IntegerNegative => {
            measure_encoded_var_uint(payload)
        }
        _ => {
            let (len, prefix) = read_var_uint(payload)?;
            usize::try_from(len)
                .ok()
                .and_then(|len| len.checked_add(prefix))
                .ok_or(CbError::UnexpectedEof)
        }
    }
}

impl CbField {
    /// Parse the field at the start of `bytes`.
    ///
    /// When `type_hint` has [`HAS_FIELD_TYPE`] set the type is read from the
    /// first byte; otherwise `type_hint` is the field's serialized type, as
    /// for children of uniform containers. Bytes past the field's extent are
    /// dropped from the view.
    pub fn parse(bytes: Bytes, type_hint: u8) -> Result<Self> {
        let mut pos = 0usize;
        let tag = if field_type::has_field_type(type_hint) {
            pos = 1;
            *bytes.first().ok_or(CbError::UnexpectedEof)?
        } else {
            type_hint
        };
        if field_type::has_field_type(tag) {
            return Err(CbError::InvalidFieldType(tag));
        }
        let field_type = CbFieldType::from_u8(tag)?;
        let type_len = pos;

        let mut name_len = 0usize;
        if field_type::has_field_name(tag) {
            let (len, prefix) = read_var_uint(&bytes[pos..])?;
            name_len = usize::try_from(len).map_err(|_| CbError::UnexpectedEof)?;
            pos = (pos + prefix)
                .checked_add(name_len)
                .filter(|end| *end <= bytes.len())
                .ok_or(CbError::UnexpectedEof)?;
        }

        let payload_offset = pos;
        let size = payload_size(field_type, &bytes[pos..])?;
        let end = pos
            .checked_add(size)
            .filter(|end| *end <= bytes.len())
            .ok_or(CbError::UnexpectedEof)?;

        Ok(Self {
            data: bytes.slice(..end),
            type_with_flags: tag,
            field_type,
            type_len,
            name_len,
            payload_offset,
            error: Cell::new(None),
        })
    }

    /// Parse a field that starts with its own type byte.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self> {
        Self::parse(bytes.into(), HAS_FIELD_TYPE)
    }

    /// Parse an unnamed payload whose type is supplied out of band.
    pub fn from_payload(field_type: CbFieldType, payload: impl Into<Bytes>) -> Result<Self> {
        Self::parse(payload.into(), field_type as u8)
    }

    /// The absent field.
    pub fn none() -> Self {
        Self::default()
    }

    pub(crate) fn empty_object() -> Self {
        Self::static_container(&EMPTY_OBJECT, CbFieldType::Object)
    }

    pub(crate) fn empty_array() -> Self {
        Self::static_container(&EMPTY_ARRAY, CbFieldType::Array)
    }

    fn static_container(bytes: &'static [u8], field_type: CbFieldType) -> Self {
        Self {
            data: Bytes::from_static(bytes),
            type_with_flags: field_type as u8,
            field_type,
            type_len: 1,
            name_len: 0,
            payload_offset: 1,
            error: Cell::new(None),
        }
    }

    /// Field type without flags.
    pub fn field_type(&self) -> CbFieldType {
        self.field_type
    }

    /// Serialized type byte, including the name flag when a name is present.
    pub fn type_with_flags(&self) -> u8 {
        self.type_with_flags
    }

    /// Whether this is anything other than the absent sentinel.
    pub fn has_value(&self) -> bool {
        self.field_type != CbFieldType::None
    }

    /// Whether the field carries a name.
    pub fn has_name(&self) -> bool {
        field_type::has_field_name(self.type_with_flags)
    }

    /// Name bytes; empty when unnamed.
    pub fn name_bytes(&self) -> &[u8] {
        &self.data[self.payload_offset - self.name_len..self.payload_offset]
    }

    /// Name as UTF-8; empty when unnamed or not valid UTF-8.
    pub fn name(&self) -> &str {
        std::str::from_utf8(self.name_bytes()).unwrap_or("")
    }

    /// Payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.data[self.payload_offset..]
    }

    /// Payload bytes sharing the backing buffer.
    pub fn payload_bytes(&self) -> Bytes {
        self.data.slice(self.payload_offset..)
    }

    /// Encoded bytes of this field as stored, including its type byte when it has one.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Encoded bytes without the type byte: name prefix, name and payload.
    pub fn view_no_type(&self) -> &[u8] {
        &self.data[self.type_len..]
    }

    /// Bytes occupied by this field inside its parent.
    pub fn encoded_len(&self) -> usize {
        self.data.len()
    }

    /// Size of the field when serialized with its own type byte.
    pub fn size(&self) -> usize {
        1 + self.data.len() - self.type_len
    }

    /// Error recorded by the most recent typed access.
    pub fn error(&self) -> Option<FieldError> {
        self.error.get()
    }

    /// Whether the most recent typed access failed.
    pub fn has_error(&self) -> bool {
        self.error.get().is_some()
    }

    fn record<T>(&self, result: FieldResult<T>, default: T) -> T {
        match result {
            Ok(value) => {
                self.error.set(None);
                value
            }
            Err(err) => {
                self.error.set(Some(err));
                default
            }
        }
    }

    /// Canonical bytes: type byte then payload, name excluded.
    ///
    /// Shares the backing buffer when the field is stored unnamed with its own type.
    pub fn canonical_bytes(&self) -> Bytes {
        if self.type_len == 1 && !self.has_name() {
            return self.data.clone();
        }
        let mut out = Vec::with_capacity(1 + self.payload().len());
        out.push(field_type::get_type(self.type_with_flags));
        out.extend_from_slice(self.payload());
        Bytes::from(out)
    }

    /// Feed the canonical bytes to `hasher`.
    pub fn append_hash<H: HashBuilder>(&self, hasher: &mut H) {
        hasher.update(&[field_type::get_type(self.type_with_flags)]);
        hasher.update(self.payload());
    }

    /// Content hash of the canonical bytes with the default primitive.
    pub fn hash(&self) -> CbHash {
        let mut hasher = Blake3Hasher::new();
        self.append_hash(&mut hasher);
        hasher.finalize()
    }

    fn fixed<const N: usize>(&self) -> FieldResult<[u8; N]> {
        self.payload()
            .get(..N)
            .and_then(|bytes| <[u8; N]>::try_from(bytes).ok())
            .ok_or(FieldError::Format)
    }

    /// Payload after its VarUInt length prefix.
    fn sized_payload(&self) -> FieldResult<&[u8]> {
        let payload = self.payload();
        let (len, prefix) = read_var_uint(payload).map_err(|_| FieldError::Format)?;
        let end = usize::try_from(len)
            .ok()
            .and_then(|len| len.checked_add(prefix))
            .ok_or(FieldError::Format)?;
        payload.get(prefix..end).ok_or(FieldError::Format)
    }

    fn try_integer(&self, magnitude_bits: u32, signed: bool) -> FieldResult<u64> {
        let negative = match self.field_type {
            CbFieldType::IntegerPositive => false,
            CbFieldType::IntegerNegative => true,
            _ => return Err(FieldError::Type),
        };
        if negative && !signed {
            return Err(FieldError::Range);
        }
        let (magnitude, _) = read_var_uint(self.payload()).map_err(|_| FieldError::Format)?;
        let value_bits = if signed {
            magnitude_bits - 1
        } else {
            magnitude_bits
        };
        if value_bits < 64 && magnitude >> value_bits != 0 {
            return Err(FieldError::Range);
        }
        Ok(if negative { !magnitude } else { magnitude })
    }

    fn try_integer_as_float(&self, mantissa_bits: u32) -> FieldResult<f64> {
        let negative = self.field_type == CbFieldType::IntegerNegative;
        let (magnitude, _) = read_var_uint(self.payload()).map_err(|_| FieldError::Format)?;
        let magnitude = magnitude
            .checked_add(negative as u64)
            .filter(|m| m >> mantissa_bits == 0)
            .ok_or(FieldError::Range)?;
        let value = magnitude as f64;
        Ok(if negative { -value } else { value })
    }

    /// Read as `f32`. Integers of up to 24 bits of magnitude convert
    /// implicitly; a double converts only when no precision is lost.
    pub fn try_as_f32(&self) -> FieldResult<f32> {
        match self.field_type {
            CbFieldType::IntegerPositive | CbFieldType::IntegerNegative => {
                self.try_integer_as_float(24).map(|v| v as f32)
            }
            CbFieldType::Float32 => Ok(f32::from_be_bytes(self.fixed()?)),
            CbFieldType::Float64 => {
                let value = f64::from_be_bytes(self.fixed()?);
                let narrow = value as f32;
                if narrow as f64 == value || value.is_nan() {
                    Ok(narrow)
                } else {
                    Err(FieldError::Range)
                }
            }
            _ => Err(FieldError::Type),
        }
    }

    /// Read as `f32`, `0.0` on error.
    pub fn as_f32(&self) -> f32 {
        self.as_f32_or(0.0)
    }

    /// Read as `f32`, `default` on error.
    pub fn as_f32_or(&self, default: f32) -> f32 {
        let result = self.try_as_f32();
        self.record(result, default)
    }

    /// Read as `f64`. Integers of up to 53 bits of magnitude convert implicitly.
    pub fn try_as_f64(&self) -> FieldResult<f64> {
        match self.field_type {
            CbFieldType::IntegerPositive | CbFieldType::IntegerNegative => {
                self.try_integer_as_float(53)
            }
            CbFieldType::Float32 => Ok(f32::from_be_bytes(self.fixed()?) as f64),
            CbFieldType::Float64 => Ok(f64::from_be_bytes(self.fixed()?)),
            _ => Err(FieldError::Type),
        }
    }

    /// Read as `f64`, `0.0` on error.
    pub fn as_f64(&self) -> f64 {
        self.as_f64_or(0.0)
    }

    /// Read as `f64`, `default` on error.
    pub fn as_f64_or(&self, default: f64) -> f64 {
        let result = self.try_as_f64();
        self.record(result, default)
    }

    /// Read as `bool`.
    pub fn try_as_bool(&self) -> FieldResult<bool> {
        match self.field_type {
            CbFieldType::BoolTrue => Ok(true),
            CbFieldType::BoolFalse => Ok(false),
            _ => Err(FieldError::Type),
        }
    }

    /// Read as `bool`, `false` on error.
    pub fn as_bool(&self) -> bool {
        self.as_bool_or(false)
    }

    /// Read as `bool`, `default` on error.
    pub fn as_bool_or(&self, default: bool) -> bool {
        let result = self.try_as_bool();
        self.record(result, default)
    }

    /// Read a string as raw bytes without checking UTF-8.
    pub fn try_as_str_bytes(&self) -> FieldResult<&[u8]> {
        if self.field_type != CbFieldType::String {
            return Err(FieldError::Type);
        }
        self.sized_payload()
    }

    /// Read as `&str`.
    pub fn try_as_str(&self) -> FieldResult<&str> {
        std::str::from_utf8(self.try_as_str_bytes()?).map_err(|_| FieldError::Format)
    }

    /// Read as `&str`, empty on error.
    pub fn as_str(&self) -> &str {
        self.as_str_or("")
    }

    /// Read as `&str`, `default` on error.
    pub fn as_str_or<'a>(&'a self, default: &'a str) -> &'a str {
        let result = self.try_as_str();
        self.record(result, default)
    }

    /// Read as a binary blob.
    pub fn try_as_binary(&self) -> FieldResult<&[u8]> {
        if self.field_type != CbFieldType::Binary {
            return Err(FieldError::Type);
        }
        self.sized_payload()
    }

    /// Read as a binary blob, empty on error.
    pub fn as_binary(&self) -> &[u8] {
        let result = self.try_as_binary();
        self.record(result, &[])
    }

    /// Read a binary blob sharing the backing buffer.
    pub fn try_as_binary_bytes(&self) -> FieldResult<Bytes> {
        let blob_len = self.try_as_binary()?.len();
        Ok(self.data.slice(self.data.len() - blob_len..))
    }

    /// Read a binary blob sharing the backing buffer, empty on error.
    pub fn as_binary_bytes(&self) -> Bytes {
        let result = self.try_as_binary_bytes();
        self.record(result, Bytes::new())
    }

    /// Read a hash; attachments are hashes too.
    pub fn try_as_hash(&self) -> FieldResult<CbHash> {
        if !field_type::is_hash(self.type_with_flags) {
            return Err(FieldError::Type);
        }
        Ok(CbHash(self.fixed()?))
    }

    /// Read a hash, zero on error.
    pub fn as_hash(&self) -> CbHash {
        let result = self.try_as_hash();
        self.record(result, CbHash::ZERO)
    }

    /// Read an object attachment reference.
    pub fn try_as_object_attachment(&self) -> FieldResult<CbHash> {
        if self.field_type != CbFieldType::ObjectAttachment {
            return Err(FieldError::Type);
        }
        Ok(CbHash(self.fixed()?))
    }

    /// Read an object attachment reference, zero on error.
    pub fn as_object_attachment(&self) -> CbHash {
        let result = self.try_as_object_attachment();
        self.record(result, CbHash::ZERO)
    }

    /// Read a binary attachment reference.
    pub fn try_as_binary_attachment(&self) -> FieldResult<CbHash> {
        if self.field_type != CbFieldType::BinaryAttachment {
            return Err(FieldError::Type);
        }
        Ok(CbHash(self.fixed()?))
    }

    /// Read a binary attachment reference, zero on error.
    pub fn as_binary_attachment(&self) -> CbHash {
        let result = self.try_as_binary_attachment();
        self.record(result, CbHash::ZERO)
    }

    /// Read either attachment kind.
    pub fn try_as_attachment(&self) -> FieldResult<CbHash> {
        if !field_type::is_attachment(self.type_with_flags) {
            return Err(FieldError::Type);
        }
        Ok(CbHash(self.fixed()?))
    }

    /// Read either attachment kind, zero on error.
    pub fn as_attachment(&self) -> CbHash {
        let result = self.try_as_attachment();
        self.record(result, CbHash::ZERO)
    }

    /// Read a UUID.
    pub fn try_as_uuid(&self) -> FieldResult<Uuid> {
        if self.field_type != CbFieldType::Uuid {
            return Err(FieldError::Type);
        }
        Ok(Uuid::from_bytes(self.fixed()?))
    }

    /// Read a UUID, nil on error.
    pub fn as_uuid(&self) -> Uuid {
        let result = self.try_as_uuid();
        self.record(result, Uuid::nil())
    }

    /// Read a date-time.
    pub fn try_as_date_time(&self) -> FieldResult<CbDateTime> {
        if self.field_type != CbFieldType::DateTime {
            return Err(FieldError::Type);
        }
        Ok(CbDateTime(i64::from_be_bytes(self.fixed()?)))
    }

    /// Read a date-time, tick zero on error.
    pub fn as_date_time(&self) -> CbDateTime {
        let result = self.try_as_date_time();
        self.record(result, CbDateTime::default())
    }

    /// Read a time-span.
    pub fn try_as_time_span(&self) -> FieldResult<CbTimeSpan> {
        if self.field_type != CbFieldType::TimeSpan {
            return Err(FieldError::Type);
        }
        Ok(CbTimeSpan(i64::from_be_bytes(self.fixed()?)))
    }

    /// Read a time-span, zero on error.
    pub fn as_time_span(&self) -> CbTimeSpan {
        let result = self.try_as_time_span();
        self.record(result, CbTimeSpan::default())
    }

    /// Read an object id.
    pub fn try_as_object_id(&self) -> FieldResult<CbObjectId> {
        if self.field_type != CbFieldType::ObjectId {
            return Err(FieldError::Type);
        }
        Ok(CbObjectId(self.fixed()?))
    }

    /// Read an object id, zero on error.
    pub fn as_object_id(&self) -> CbObjectId {
        let result = self.try_as_object_id();
        self.record(result, CbObjectId::default())
    }

    /// Read a custom value tagged by numeric type id: `(type_id, value)`.
    pub fn try_as_custom_by_id(&self) -> FieldResult<(u64, &[u8])> {
        if self.field_type != CbFieldType::CustomById {
            return Err(FieldError::Type);
        }
        let body = self.sized_payload()?;
        let (type_id, prefix) = read_var_uint(body).map_err(|_| FieldError::Format)?;
        Ok((type_id, &body[prefix..]))
    }

    /// Read a custom value tagged by type name: `(type_name, value)`.
    pub fn try_as_custom_by_name(&self) -> FieldResult<(&str, &[u8])> {
        if self.field_type != CbFieldType::CustomByName {
            return Err(FieldError::Type);
        }
        let body = self.sized_payload()?;
        let (len, prefix) = read_var_uint(body).map_err(|_| FieldError::Format)?;
        let name_end = usize::try_from(len)
            .ok()
            .and_then(|len| len.checked_add(prefix))
            .filter(|end| *end <= body.len())
            .ok_or(FieldError::Format)?;
        let name = std::str::from_utf8(&body[prefix..name_end]).map_err(|_| FieldError::Format)?;
        Ok((name, &body[name_end..]))
    }

    /// Read a custom value by type id, `(0, [])` on error.
    pub fn as_custom_by_id(&self) -> (u64, &[u8]) {
        let result = self.try_as_custom_by_id();
        self.record(result, (0, &[][..]))
    }

    /// Read a custom value by type name, `("", [])` on error.
    pub fn as_custom_by_name(&self) -> (&str, &[u8]) {
        let result = self.try_as_custom_by_name();
        self.record(result, ("", &[][..]))
    }

    /// View as an object.
    pub fn try_as_object(&self) -> FieldResult<CbObject> {
        if !field_type::is_object(self.type_with_flags) {
            return Err(FieldError::Type);
        }
        Ok(CbObject::from_field_unchecked(self.clone()))
    }

    /// View as an object, empty on error.
    pub fn as_object(&self) -> CbObject {
        let result = self.try_as_object();
        self.record(result, CbObject::default())
    }

    /// View as an array.
    pub fn try_as_array(&self) -> FieldResult<CbArray> {
        if !field_type::is_array(self.type_with_flags) {
            return Err(FieldError::Type);
        }
        Ok(CbArray::from_field_unchecked(self.clone()))
    }

    /// View as an array, empty on error.
    pub fn as_array(&self) -> CbArray {
        let result = self.try_as_array();
        self.record(result, CbArray::default())
    }

    fn container_layout(&self) -> FieldResult<ContainerLayout> {
        if !field_type::has_fields(self.type_with_flags) {
            return Err(FieldError::Type);
        }
        let payload = self.payload();
        let (_, mut pos) = read_var_uint(payload).map_err(|_| FieldError::Format)?;

        let mut item_count = None;
        if field_type::is_array(self.type_with_flags) {
            let rest = payload.get(pos..).ok_or(FieldError::Format)?;
            let (count, prefix) = read_var_uint(rest).map_err(|_| FieldError::Format)?;
            item_count = Some(count);
            pos += prefix;
        }

        let mut uniform_type = None;
        if field_type::has_uniform_fields(self.type_with_flags) {
            let tag = *payload.get(pos).ok_or(FieldError::Format)?;
            if field_type::has_field_type(tag) {
                return Err(FieldError::Format);
            }
            uniform_type = Some(tag);
            pos += 1;
        }

        if pos > payload.len() {
            return Err(FieldError::Format);
        }
        Ok(ContainerLayout {
            children_offset: self.payload_offset + pos,
            item_count,
            uniform_type,
        })
    }

    /// Children bytes, declared item count and uniform type of a container.
    pub(crate) fn container_parts(&self) -> FieldResult<(Bytes, Option<u64>, Option<u8>)> {
        let layout = self.container_layout()?;
        Ok((
            self.data.slice(layout.children_offset..),
            layout.item_count,
            layout.uniform_type,
        ))
    }

    /// Item count declared by an array payload.
    pub(crate) fn declared_item_count(&self) -> Option<u64> {
        self.container_layout().ok().and_then(|layout| layout.item_count)
    }

    /// Shared child type of a uniform container.
    pub fn uniform_type(&self) -> Option<u8> {
        self.container_layout()
            .ok()
            .and_then(|layout| layout.uniform_type)
    }

    /// Iterate the children of an object or array; empty for other types.
    ///
    /// For uniform containers the shared type byte is read once here and
    /// threaded through every child.
    pub fn iter(&self) -> CbFieldIter {
        match self.container_layout() {
            Ok(layout) => CbFieldIter::new(
                self.data.slice(layout.children_offset..),
                layout.uniform_type,
            ),
            Err(_) => CbFieldIter::default(),
        }
    }

    /// Invoke `visitor` on every attachment reference in this field and its descendants.
    ///
    /// Containers are walked with an explicit stack, and uniform containers
    /// whose element type cannot hold attachments are skipped whole.
    pub fn iterate_attachments<F: FnMut(&CbField)>(&self, mut visitor: F) {
        if field_type::is_attachment(self.type_with_flags) {
            visitor(self);
            return;
        }
        let mut stack = Vec::new();
        if let Some(iter) = attachment_scan(self) {
            stack.push(iter);
        }
        while let Some(iter) = stack.last_mut() {
            match iter.next() {
                Some(child) => {
                    if field_type::is_attachment(child.type_with_flags) {
                        visitor(&child);
                    } else if let Some(child_iter) = attachment_scan(&child) {
                        stack.push(child_iter);
                    }
                }
                None => {
                    stack.pop();
                }
            }
        }
    }
}

fn attachment_scan(field: &CbField) -> Option<CbFieldIter> {
    if !field_type::has_fields(field.type_with_flags) {
        return None;
    }
    let iter = field.iter();
    match iter.uniform_type() {
        Some(tag) if !field_type::may_contain_attachments(tag) => None,
        _ => Some(iter),
    }
}

macro_rules! integer_accessors {
    ($($ty:ty, $bits:expr, $signed:expr, $try_name:ident, $name:ident, $name_or:ident;)*) => {
        impl CbField {
            $(
                #[doc = concat!("Read as `", stringify!($ty), "`, rejecting magnitudes that do not fit.")]
                pub fn $try_name(&self) -> FieldResult<$ty> {
                    self.try_integer($bits, $signed).map(|value| value as $ty)
                }

                #[doc = concat!("Read as `", stringify!($ty), "`, zero on error.")]
                pub fn $name(&self) -> $ty {
                    self.$name_or(0)
                }

                #[doc = concat!("Read as `", stringify!($ty), "`, `default` on error.")]
                pub fn $name_or(&self, default: $ty) -> $ty {
                    let result = self.$try_name();
                    self.record(result, default)
                }
            )*
        }
    };
}

integer_accessors! {
    i8, 8, true, try_as_i8, as_i8, as_i8_or;
    i16, 16, true, try_as_i16, as_i16, as_i16_or;
    i32, 32, true, try_as_i32, as_i32, as_i32_or;
    i64, 64, true, try_as_i64, as_i64, as_i64_or;
    u8, 8, false, try_as_u8, as_u8, as_u8_or;
    u16, 16, false, try_as_u16, as_u16, as_u16_or;
    u32, 32, false, try_as_u32, as_u32, as_u32_or;
    u64, 64, false, try_as_u64, as_u64, as_u64_or;
}

impl PartialEq for CbField {
    /// Equal when type and payload bytes match; names are ignored.
    fn eq(&self, other: &Self) -> bool {
        field_type::get_type(self.type_with_flags) == field_type::get_type(other.type_with_flags)
            && self.payload() == other.payload()
    }
}

impl Eq for CbField {}

impl fmt::Debug for CbField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CbField")
            .field("type", &self.field_type)
            .field("name", &self.name())
            .field("payload_len", &self.payload().len())
            .field("error", &self.error.get())
            .finish()
    }
}

impl<'a> IntoIterator for &'a CbField {
    type Item = CbField;
    type IntoIter = CbFieldIter;

    fn into_iter(self) -> CbFieldIter {
        self.iter()
    }
}
