//! Rendering fields as JSON values

use crate::container::{CbArray, CbObject};
use crate::error::{CbError, Result};
use crate::field::CbField;
use crate::field_type::CbFieldType;
use crate::iter::CbFieldIter;
use crate::limits::Limits;
use crate::varint::read_var_uint;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Number, Value};

impl CbField {
    /// Render as a JSON value using default limits.
    pub fn to_json(&self) -> Result<Value> {
        self.to_json_with_limits(&Limits::default())
    }

    /// Render as a JSON value, failing past `limits.max_depth` nested containers.
    ///
    /// Binary payloads become base64 strings, hashes and attachments lowercase
    /// hex, UUIDs hyphenated strings and date-times RFC 3339 strings. Object
    /// fields with a repeated name keep the first occurrence.
    pub fn to_json_with_limits(&self, limits: &Limits) -> Result<Value> {
        render(self, limits.max_depth)
    }
}

impl CbObject {
    /// Render as a JSON object.
    pub fn to_json(&self) -> Result<Value> {
        self.as_field().to_json()
    }
}

impl CbArray {
    /// Render as a JSON array.
    pub fn to_json(&self) -> Result<Value> {
        self.as_field().to_json()
    }
}

/// Partially rendered container on the work stack.
struct Frame {
    children: CbFieldIter,
    name: String,
    partial: Partial,
}

enum Partial {
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

impl Frame {
    /// Next child still to render; repeated object names are skipped.
    fn next_child(&mut self) -> Option<CbField> {
        loop {
            let child = self.children.next()?;
            match &self.partial {
                Partial::Object(map) if map.contains_key(child.name()) => continue,
                _ => return Some(child),
            }
        }
    }

    fn insert(&mut self, name: &str, value: Value) {
        match &mut self.partial {
            Partial::Object(map) => {
                map.insert(name.to_string(), value);
            }
            Partial::Array(items) => items.push(value),
        }
    }

    fn finish(self) -> (String, Value) {
        let value = match self.partial {
            Partial::Object(map) => Value::Object(map),
            Partial::Array(items) => Value::Array(items),
        };
        (self.name, value)
    }
}

fn render(root: &CbField, max_depth: usize) -> Result<Value> {
    let mut stack = Vec::new();
    if let Some(value) = open(root, &mut stack, max_depth)? {
        return Ok(value);
    }

    while let Some(frame) = stack.last_mut() {
        match frame.next_child() {
            Some(child) => {
                if let Some(value) = open(&child, &mut stack, max_depth)? {
                    if let Some(parent) = stack.last_mut() {
                        parent.insert(child.name(), value);
                    }
                }
            }
            None => {
                let Some(done) = stack.pop() else { break };
                let (name, value) = done.finish();
                match stack.last_mut() {
                    Some(parent) => parent.insert(&name, value),
                    None => return Ok(value),
                }
            }
        }
    }
    Err(CbError::Internal("render stack emptied before the root closed".to_string()))
}

/// Push a frame for a container, or render a scalar in place.
fn open(field: &CbField, stack: &mut Vec<Frame>, max_depth: usize) -> Result<Option<Value>> {
    let partial = match field.field_type() {
        CbFieldType::Object | CbFieldType::UniformObject => Partial::Object(Map::new()),
        CbFieldType::Array | CbFieldType::UniformArray => Partial::Array(Vec::new()),
        _ => return Ok(Some(scalar(field))),
    };
    if stack.len() >= max_depth {
        return Err(CbError::LimitExceeded(format!(
            "nesting depth exceeds {}",
            max_depth
        )));
    }
    stack.push(Frame {
        children: field.iter(),
        name: field.name().to_string(),
        partial,
    });
    Ok(None)
}

fn scalar(field: &CbField) -> Value {
    match field.field_type() {
        CbFieldType::None
        | CbFieldType::Null
        | CbFieldType::Object
        | CbFieldType::UniformObject
        | CbFieldType::Array
        | CbFieldType::UniformArray => Value::Null,
        CbFieldType::Binary => Value::String(STANDARD.encode(field.as_binary())),
        CbFieldType::String => match field.try_as_str_bytes() {
            Ok(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
            Err(_) => Value::Null,
        },
        CbFieldType::IntegerPositive => Value::from(field.as_u64()),
        CbFieldType::IntegerNegative => match field.try_as_i64() {
            Ok(value) => Value::from(value),
            // Magnitudes past i64 are below i64::MIN; approximate.
            Err(_) => match read_var_uint(field.payload()) {
                Ok((magnitude, _)) => float(-(magnitude as f64) - 1.0),
                Err(_) => Value::Null,
            },
        },
        CbFieldType::Float32 => float(field.as_f32() as f64),
        CbFieldType::Float64 => float(field.as_f64()),
        CbFieldType::BoolFalse => Value::Bool(false),
        CbFieldType::BoolTrue => Value::Bool(true),
        CbFieldType::ObjectAttachment | CbFieldType::BinaryAttachment | CbFieldType::Hash => {
            Value::String(field.as_hash().to_string())
        }
        CbFieldType::Uuid => Value::String(field.as_uuid().hyphenated().to_string()),
        CbFieldType::DateTime => {
            let value = field.as_date_time();
            match value.to_chrono() {
                Some(time) => Value::String(time.to_rfc3339()),
                None => Value::from(value.ticks()),
            }
        }
        CbFieldType::TimeSpan => Value::from(field.as_time_span().ticks()),
        CbFieldType::ObjectId => Value::String(field.as_object_id().to_string()),
        CbFieldType::CustomById => match field.try_as_custom_by_id() {
            Ok((type_id, value)) => custom(Value::from(type_id), value),
            Err(_) => Value::Null,
        },
        CbFieldType::CustomByName => match field.try_as_custom_by_name() {
            Ok((type_name, value)) => custom(Value::from(type_name), value),
            Err(_) => Value::Null,
        },
    }
}

fn float(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn custom(type_tag: Value, value: &[u8]) -> Value {
    let mut map = Map::new();
    map.insert("$type".to_string(), type_tag);
    map.insert("$value".to_string(), Value::String(STANDARD.encode(value)));
    Value::Object(map)
}
