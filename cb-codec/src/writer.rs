//! Scope-stack writer producing Compact Binary encodings
//!
//! Every field is appended in document order to one growing buffer. A
//! container's header (type byte, name, payload size, item count, uniform
//! type) cannot be written until its children are known, so opening a scope
//! reserves a placeholder in the output segment list and closing it appends
//! the finished header to the buffer and points the placeholder at it. The
//! output is the segment list read in order; nothing is shifted or patched
//! in place and nothing recurses, so nesting depth is bounded only by memory.

use bytes::Bytes;
use cb_format::field::payload_size;
use cb_format::field_type::{self, CbFieldType, HAS_FIELD_NAME};
use cb_format::varint::{append_var_uint, encode_var_uint};
use cb_format::{
    Blake3Hasher, CbArray, CbDateTime, CbError, CbField, CbHash, CbObject, CbObjectId,
    CbTimeSpan, HashBuilder, Result, Uuid,
};
use smallvec::SmallVec;
use std::io::Write;
use std::ops::Range;

#[derive(Debug, Clone)]
enum Segment {
    /// Bytes of the writer's own buffer.
    Local(Range<usize>),
    /// Caller-owned bytes emitted without copying.
    Shared(Bytes),
    /// Header of a scope that is still open.
    Pending,
}

#[derive(Debug)]
struct Scope {
    field_type: CbFieldType,
    write_type: bool,
    uniform_type: Option<CbFieldType>,
    name: Option<String>,
    /// Index of the placeholder segment; `None` for the root.
    header_segment: Option<usize>,
    item_count: u64,
    children_len: u64,
}

impl Scope {
    fn root() -> Self {
        Self {
            field_type: CbFieldType::Array,
            write_type: true,
            uniform_type: None,
            name: None,
            header_segment: None,
            item_count: 0,
            children_len: 0,
        }
    }
}

/// Forward-only Compact Binary writer.
///
/// The root scope behaves as an array: top-level fields are unnamed. Names
/// are supplied with [`CbWriter::name`] immediately before the field they
/// label. Misplaced fields are rejected with [`CbError::Placement`] and
/// leave the output unchanged.
///
/// ```
/// use cb_codec::CbWriter;
///
/// let mut writer = CbWriter::new();
/// writer.begin_object()?;
/// writer.name("id").write_u64(7)?;
/// writer.name("tags").begin_array()?;
/// writer.write_str("a")?;
/// writer.end_array()?;
/// writer.end_object()?;
///
/// let object = writer.save_object()?;
/// assert_eq!(object.find("id").as_u64(), 7);
/// # Ok::<(), cb_format::CbError>(())
/// ```
#[derive(Debug)]
pub struct CbWriter {
    buffer: Vec<u8>,
    segments: Vec<Segment>,
    scopes: Vec<Scope>,
    pending_name: Option<String>,
    misuse: Option<String>,
}

impl Default for CbWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CbWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty writer whose buffer holds `capacity` bytes before growing
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            segments: Vec::new(),
            scopes: vec![Scope::root()],
            pending_name: None,
            misuse: None,
        }
    }

    /// Discard all output and open scopes, keeping allocated capacity for reuse
    pub fn clear(&mut self) {
        tracing::debug!(
            buffer_capacity = self.buffer.capacity(),
            segments = self.segments.len(),
            "clearing writer"
        );
        self.buffer.clear();
        self.segments.clear();
        self.scopes.clear();
        self.scopes.push(Scope::root());
        self.pending_name = None;
        self.misuse = None;
    }

    /// Name the next field or scope.
    ///
    /// Naming twice without writing in between makes the next write fail.
    pub fn name(&mut self, name: &str) -> &mut Self {
        if let Some(previous) = &self.pending_name {
            self.misuse = Some(format!(
                "name {:?} set while {:?} was still pending",
                name, previous
            ));
        }
        self.pending_name = Some(name.to_string());
        self
    }

    /// Whether all scopes are closed and no name is pending
    pub fn is_complete(&self) -> bool {
        self.scopes.len() == 1 && self.pending_name.is_none() && self.misuse.is_none()
    }

    /// Number of open scopes below the root
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    fn current(&self) -> &Scope {
        &self.scopes[self.scopes.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Validate placement of a new field in the current scope and consume the
    /// pending name. Returns the name and whether the field carries its own type byte.
    fn place(&mut self, field_type: CbFieldType) -> Result<(Option<String>, bool)> {
        let name = self.pending_name.take();
        if let Some(message) = self.misuse.take() {
            return Err(CbError::Placement(message));
        }
        if field_type == CbFieldType::None {
            return Err(CbError::Placement(
                "fields of type None cannot be written".to_string(),
            ));
        }

        let scope = self.current();
        let in_object = field_type::is_object(scope.field_type as u8);
        match (&name, in_object) {
            (None, true) => {
                return Err(CbError::Placement(format!(
                    "{:?} field in an object scope needs a name",
                    field_type
                )))
            }
            (Some(name), false) => {
                return Err(CbError::Placement(format!(
                    "{:?} field named {:?} in an array scope",
                    field_type, name
                )))
            }
            (Some(name), true) if name.is_empty() => {
                return Err(CbError::Placement(format!(
                    "{:?} field in an object scope has an empty name",
                    field_type
                )))
            }
            _ => {}
        }
        if let Some(uniform) = scope.uniform_type {
            if uniform != field_type {
                return Err(CbError::Placement(format!(
                    "{:?} field in a uniform scope of {:?}",
                    field_type, uniform
                )));
            }
        }

        let write_type = scope.uniform_type.is_none();
        self.current_mut().item_count += 1;
        Ok((name, write_type))
    }

    /// Place a scalar field and append its type byte and name.
    fn begin_field(&mut self, field_type: CbFieldType) -> Result<usize> {
        let (name, write_type) = self.place(field_type)?;
        let start = self.buffer.len();
        write_prefix(&mut self.buffer, field_type, name.as_deref(), write_type);
        Ok(start)
    }

    /// Record everything appended since `start` as one finished child.
    fn end_field(&mut self, start: usize) {
        let end = self.buffer.len();
        self.push_local(start..end);
        self.current_mut().children_len += (end - start) as u64;
    }

    fn push_local(&mut self, range: Range<usize>) {
        if let Some(Segment::Local(last)) = self.segments.last_mut() {
            if last.end == range.start {
                last.end = range.end;
                return;
            }
        }
        self.segments.push(Segment::Local(range));
    }

    fn begin_scope(&mut self, field_type: CbFieldType, uniform_type: Option<CbFieldType>) -> Result<()> {
        let (name, write_type) = self.place(field_type)?;
        self.segments.push(Segment::Pending);
        self.scopes.push(Scope {
            field_type,
            write_type,
            uniform_type,
            name,
            header_segment: Some(self.segments.len() - 1),
            item_count: 0,
            children_len: 0,
        });
        Ok(())
    }

    fn end_scope(&mut self, want_object: bool) -> Result<()> {
        let kind = if want_object { "object" } else { "array" };
        if self.scopes.len() == 1 {
            return Err(CbError::Placement(format!("no open {} to end", kind)));
        }
        let open_is_object = field_type::is_object(self.current().field_type as u8);
        if open_is_object != want_object {
            return Err(CbError::Placement(format!(
                "cannot end {} while a {} is open",
                kind,
                if open_is_object { "object" } else { "array" }
            )));
        }
        if let Some(name) = &self.pending_name {
            return Err(CbError::Placement(format!(
                "name {:?} was never used before end of {}",
                name, kind
            )));
        }

        let scope = self
            .scopes
            .pop()
            .ok_or_else(|| CbError::Internal("scope stack is empty".to_string()))?;

        // Fixed structural payload that precedes the children.
        let mut structural: SmallVec<[u8; 10]> = SmallVec::new();
        if field_type::is_array(scope.field_type as u8) {
            structural.extend_from_slice(&encode_var_uint(scope.item_count));
        }
        if let Some(uniform) = scope.uniform_type {
            let mut tag = uniform as u8;
            if want_object {
                tag |= HAS_FIELD_NAME;
            }
            structural.push(tag);
        }

        let start = self.buffer.len();
        write_prefix(
            &mut self.buffer,
            scope.field_type,
            scope.name.as_deref(),
            scope.write_type,
        );
        append_var_uint(structural.len() as u64 + scope.children_len, &mut self.buffer);
        self.buffer.extend_from_slice(&structural);
        let end = self.buffer.len();

        let index = scope
            .header_segment
            .ok_or_else(|| CbError::Internal("closing the root scope".to_string()))?;
        self.segments[index] = Segment::Local(start..end);
        self.current_mut().children_len += (end - start) as u64 + scope.children_len;
        Ok(())
    }

    /// Open an object whose fields each carry their own type
    pub fn begin_object(&mut self) -> Result<()> {
        self.begin_scope(CbFieldType::Object, None)
    }

    /// Open an object whose fields all have `element_type`, stored once
    pub fn begin_uniform_object(&mut self, element_type: CbFieldType) -> Result<()> {
        if element_type == CbFieldType::None {
            return Err(CbError::Placement(
                "uniform object of None fields".to_string(),
            ));
        }
        self.begin_scope(CbFieldType::UniformObject, Some(element_type))
    }

    /// Close the innermost object
    pub fn end_object(&mut self) -> Result<()> {
        self.end_scope(true)
    }

    /// Open an array whose items each carry their own type
    pub fn begin_array(&mut self) -> Result<()> {
        self.begin_scope(CbFieldType::Array, None)
    }

    /// Open an array whose items all have `element_type`, stored once.
    ///
    /// Types with an empty payload are rejected: their items would occupy no
    /// bytes at all.
    pub fn begin_uniform_array(&mut self, element_type: CbFieldType) -> Result<()> {
        if element_type.fixed_payload_size() == Some(0) {
            return Err(CbError::Placement(format!(
                "uniform array of zero-size {:?} items",
                element_type
            )));
        }
        self.begin_scope(CbFieldType::UniformArray, Some(element_type))
    }

    /// Close the innermost array
    pub fn end_array(&mut self) -> Result<()> {
        self.end_scope(false)
    }

    /// Write a field of `field_type` whose payload is already encoded.
    ///
    /// The payload must be exactly one well-formed payload of that type.
    pub fn write_payload(&mut self, field_type: CbFieldType, payload: &[u8]) -> Result<()> {
        let size = payload_size(field_type, payload)?;
        if size != payload.len() {
            return Err(CbError::Placement(format!(
                "{:?} payload of {} bytes declares {} bytes",
                field_type,
                payload.len(),
                size
            )));
        }
        let start = self.begin_field(field_type)?;
        self.buffer.extend_from_slice(payload);
        self.end_field(start);
        Ok(())
    }

    /// Write a null
    pub fn write_null(&mut self) -> Result<()> {
        let start = self.begin_field(CbFieldType::Null)?;
        self.end_field(start);
        Ok(())
    }

    /// Write a bool
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        let field_type = if value {
            CbFieldType::BoolTrue
        } else {
            CbFieldType::BoolFalse
        };
        let start = self.begin_field(field_type)?;
        self.end_field(start);
        Ok(())
    }

    /// Write a signed integer
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        if value >= 0 {
            return self.write_u64(value as u64);
        }
        let start = self.begin_field(CbFieldType::IntegerNegative)?;
        append_var_uint(!(value as u64), &mut self.buffer);
        self.end_field(start);
        Ok(())
    }

    /// Write an unsigned integer
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        let start = self.begin_field(CbFieldType::IntegerPositive)?;
        append_var_uint(value, &mut self.buffer);
        self.end_field(start);
        Ok(())
    }

    /// Write a 32-bit float
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        let start = self.begin_field(CbFieldType::Float32)?;
        self.buffer.extend_from_slice(&value.to_be_bytes());
        self.end_field(start);
        Ok(())
    }

    /// Write a 64-bit float
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        let start = self.begin_field(CbFieldType::Float64)?;
        self.buffer.extend_from_slice(&value.to_be_bytes());
        self.end_field(start);
        Ok(())
    }

    fn write_sized(&mut self, field_type: CbFieldType, value: &[u8]) -> Result<()> {
        let start = self.begin_field(field_type)?;
        append_var_uint(value.len() as u64, &mut self.buffer);
        self.buffer.extend_from_slice(value);
        self.end_field(start);
        Ok(())
    }

    /// Write a UTF-8 string
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.write_sized(CbFieldType::String, value.as_bytes())
    }

    /// Write a binary blob, copying it
    pub fn write_binary(&mut self, value: &[u8]) -> Result<()> {
        self.write_sized(CbFieldType::Binary, value)
    }

    /// Write a binary blob by reference; its bytes are emitted as their own
    /// segment and never copied into the writer's buffer.
    pub fn write_binary_shared(&mut self, value: Bytes) -> Result<()> {
        let start = self.begin_field(CbFieldType::Binary)?;
        append_var_uint(value.len() as u64, &mut self.buffer);
        let end = self.buffer.len();
        self.push_local(start..end);
        let total = (end - start + value.len()) as u64;
        if !value.is_empty() {
            self.segments.push(Segment::Shared(value));
        }
        self.current_mut().children_len += total;
        Ok(())
    }

    fn write_fixed(&mut self, field_type: CbFieldType, payload: &[u8]) -> Result<()> {
        let start = self.begin_field(field_type)?;
        self.buffer.extend_from_slice(payload);
        self.end_field(start);
        Ok(())
    }

    /// Write a hash value
    pub fn write_hash(&mut self, value: &CbHash) -> Result<()> {
        self.write_fixed(CbFieldType::Hash, value.as_bytes())
    }

    /// Write a reference to an out-of-band object
    pub fn write_object_attachment(&mut self, value: &CbHash) -> Result<()> {
        self.write_fixed(CbFieldType::ObjectAttachment, value.as_bytes())
    }

    /// Write a reference to out-of-band binary data
    pub fn write_binary_attachment(&mut self, value: &CbHash) -> Result<()> {
        self.write_fixed(CbFieldType::BinaryAttachment, value.as_bytes())
    }

    /// Write a UUID
    pub fn write_uuid(&mut self, value: &Uuid) -> Result<()> {
        self.write_fixed(CbFieldType::Uuid, value.as_bytes())
    }

    /// Write a date-time
    pub fn write_date_time(&mut self, value: CbDateTime) -> Result<()> {
        self.write_fixed(CbFieldType::DateTime, &value.ticks().to_be_bytes())
    }

    /// Write a time-span
    pub fn write_time_span(&mut self, value: CbTimeSpan) -> Result<()> {
        self.write_fixed(CbFieldType::TimeSpan, &value.ticks().to_be_bytes())
    }

    /// Write an object id
    pub fn write_object_id(&mut self, value: &CbObjectId) -> Result<()> {
        self.write_fixed(CbFieldType::ObjectId, value.as_bytes())
    }

    /// Write a custom value tagged with a numeric type id
    pub fn write_custom_by_id(&mut self, type_id: u64, value: &[u8]) -> Result<()> {
        let id = encode_var_uint(type_id);
        let start = self.begin_field(CbFieldType::CustomById)?;
        append_var_uint((id.len() + value.len()) as u64, &mut self.buffer);
        self.buffer.extend_from_slice(&id);
        self.buffer.extend_from_slice(value);
        self.end_field(start);
        Ok(())
    }

    /// Write a custom value tagged with a type name
    pub fn write_custom_by_name(&mut self, type_name: &str, value: &[u8]) -> Result<()> {
        let name_len = encode_var_uint(type_name.len() as u64);
        let start = self.begin_field(CbFieldType::CustomByName)?;
        append_var_uint(
            (name_len.len() + type_name.len() + value.len()) as u64,
            &mut self.buffer,
        );
        self.buffer.extend_from_slice(&name_len);
        self.buffer.extend_from_slice(type_name.as_bytes());
        self.buffer.extend_from_slice(value);
        self.end_field(start);
        Ok(())
    }

    /// Re-emit an existing field.
    ///
    /// Uses the pending name if one was set; otherwise, inside an object,
    /// the field keeps its own name.
    pub fn write_field_copy(&mut self, field: &CbField) -> Result<()> {
        if self.pending_name.is_none()
            && field.has_name()
            && field_type::is_object(self.current().field_type as u8)
        {
            self.pending_name = Some(field.name().to_string());
        }
        let start = self.begin_field(field.field_type())?;
        self.buffer.extend_from_slice(field.payload());
        self.end_field(start);
        Ok(())
    }

    /// Re-emit an existing object
    pub fn write_object_copy(&mut self, object: &CbObject) -> Result<()> {
        self.write_field_copy(object.as_field())
    }

    /// Re-emit an existing array
    pub fn write_array_copy(&mut self, array: &CbArray) -> Result<()> {
        self.write_field_copy(array.as_field())
    }

    fn ensure_complete(&self) -> Result<()> {
        if let Some(message) = &self.misuse {
            return Err(CbError::Placement(message.clone()));
        }
        if let Some(name) = &self.pending_name {
            return Err(CbError::Placement(format!(
                "name {:?} was never used",
                name
            )));
        }
        if self.scopes.len() > 1 {
            return Err(CbError::Placement(format!(
                "{} scopes are still open",
                self.scopes.len() - 1
            )));
        }
        Ok(())
    }

    /// Number of top-level fields written
    pub fn field_count(&self) -> u64 {
        self.scopes[0].item_count
    }

    /// Encoded size; all scopes must be closed
    pub fn size(&self) -> Result<usize> {
        self.ensure_complete()?;
        Ok(self.scopes[0].children_len as usize)
    }

    /// Output as a sequence of byte ranges in document order; all scopes must be closed
    pub fn segments(&self) -> Result<impl Iterator<Item = &[u8]> + '_> {
        self.ensure_complete()?;
        Ok(self.segments.iter().map(move |segment| match segment {
            Segment::Local(range) => &self.buffer[range.clone()],
            Segment::Shared(bytes) => bytes.as_ref(),
            Segment::Pending => &[][..],
        }))
    }

    /// Copy the output into the front of `out`, returning the bytes written
    pub fn copy_to(&self, out: &mut [u8]) -> Result<usize> {
        let size = self.size()?;
        if out.len() < size {
            return Err(CbError::Placement(format!(
                "output buffer of {} bytes cannot hold {} bytes",
                out.len(),
                size
            )));
        }
        let mut pos = 0;
        for segment in self.segments()? {
            out[pos..pos + segment.len()].copy_from_slice(segment);
            pos += segment.len();
        }
        Ok(pos)
    }

    /// Output as an owned vector
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.size()?];
        self.copy_to(&mut out)?;
        Ok(out)
    }

    /// Output as shared bytes
    pub fn to_bytes(&self) -> Result<Bytes> {
        self.to_vec().map(Bytes::from)
    }

    /// Stream the output to `writer`, returning the bytes written
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<u64> {
        let mut written = 0u64;
        for segment in self.segments()? {
            writer.write_all(segment)?;
            written += segment.len() as u64;
        }
        Ok(written)
    }

    /// Content hash of the output, fed segment by segment.
    ///
    /// For a single top-level field this equals the hash of the saved field.
    pub fn hash(&self) -> Result<CbHash> {
        let mut hasher = Blake3Hasher::new();
        for segment in self.segments()? {
            hasher.update(segment);
        }
        Ok(hasher.finalize())
    }

    /// Parse the output as its single top-level field
    pub fn save_field(&self) -> Result<CbField> {
        self.ensure_complete()?;
        if self.field_count() != 1 {
            return Err(CbError::Placement(format!(
                "expected one top-level field, found {}",
                self.field_count()
            )));
        }
        let bytes = self.to_bytes()?;
        tracing::debug!(size = bytes.len(), "saved writer output");
        CbField::from_bytes(bytes)
    }

    /// Parse the output as its single top-level object
    pub fn save_object(&self) -> Result<CbObject> {
        CbObject::from_field(self.save_field()?)
    }

    /// Parse the output as its single top-level array
    pub fn save_array(&self) -> Result<CbArray> {
        CbArray::from_field(self.save_field()?)
    }
}

fn write_prefix(buffer: &mut Vec<u8>, field_type: CbFieldType, name: Option<&str>, write_type: bool) {
    if write_type {
        let mut tag = field_type as u8;
        if name.is_some() {
            tag |= HAS_FIELD_NAME;
        }
        buffer.push(tag);
    }
    if let Some(name) = name {
        append_var_uint(name.len() as u64, buffer);
        buffer.extend_from_slice(name.as_bytes());
    }
}
